//! Configuration errors

use super::error_constructors;

error_constructors! {
    not_found => ConfigNotFound { path };
    parse_failed => ConfigParseFailed { path, reason };
    invalid => ConfigInvalid { message };
    read_failed => ConfigReadFailed { path, reason };
}
