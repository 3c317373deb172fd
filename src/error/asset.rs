//! Asset download, verification and extraction errors

use super::error_constructors;

error_constructors! {
    unsupported_url => UnsupportedUrl { url };
    download_failed => DownloadFailed { url, reason };
    digest_mismatch => DigestMismatch { expected, actual };
    archive_corrupt => ArchiveCorrupt { path, reason };
    unsafe_entry => UnsafeArchiveEntry { entry };
    missing_entry => MissingExpectedEntry { entry };
    not_provisioned => NotProvisioned { dir };
    stamp_mismatch => StampMismatch { reason };
}
