//! File system errors

use super::{RunnerError, error_constructors};

error_constructors! {
    not_found => FileNotFound { path };
    read_failed => FileReadFailed { path, reason };
    write_failed => FileWriteFailed { path, reason };
}

/// Creates an IO error
pub fn io_error(message: impl Into<String>) -> RunnerError {
    RunnerError::IoError {
        message: message.into(),
    }
}
