//! Object storage errors

use super::error_constructors;

error_constructors! {
    invalid_key => InvalidStorageKey { key };
    not_found => ObjectNotFound { key };
    get_failed => StorageGetFailed { key, reason };
    put_failed => StoragePutFailed { key, reason };
}
