//! Constructor helpers for error variants
//!
//! Each domain sub-module declares its constructors once, e.g.
//!
//! ```rust,ignore
//! error_constructors! {
//!     not_found => FileNotFound { path };
//!     read_failed => FileReadFailed { path, reason };
//! }
//! ```
//!
//! which expands to `pub fn not_found(path: impl Into<String>) -> RunnerError`
//! and so on.

macro_rules! error_constructors {
    ($($fn_name:ident => $variant:ident { $($field:ident),* $(,)? });+ $(;)?) => {
        $(
            #[allow(dead_code)]
            pub fn $fn_name($($field: impl Into<String>),*) -> $crate::error::RunnerError {
                $crate::error::RunnerError::$variant { $($field: $field.into()),* }
            }
        )+
    };
}

pub(crate) use error_constructors;
