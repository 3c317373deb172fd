//! Streaming download of the pinned asset archive
//!
//! The archive is written to a scratch file and hashed while it streams, so
//! the digest check never re-reads a large bundle from disk.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use blake3::Hasher;

use crate::error::{self, Result};
use crate::hash;
use crate::progress::DownloadProgress;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const READ_TIMEOUT: Duration = Duration::from_secs(300);

/// A completed download on local disk
#[derive(Debug, Clone)]
pub struct Downloaded {
    pub path: PathBuf,
    pub digest: String,
    pub bytes: u64,
}

/// Last path segment of a URL, without query or fragment
pub fn url_file_name(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .filter(|segment| !segment.contains(':'))
        .unwrap_or("asset.bin")
        .to_string()
}

/// Fetch `url` into `target`
///
/// Any failure (unreachable host, non-2xx status, truncated body) is fatal;
/// the caller owns `target`'s directory and discards it.
pub fn fetch(url: &str, target: &Path, show_progress: bool) -> Result<Downloaded> {
    if let Some(local) = url.strip_prefix("file://") {
        let source = File::open(local)
            .map_err(|e| error::asset::download_failed(url, e.to_string()))?;
        let total = source.metadata().ok().map(|m| m.len());
        return copy_hashed(url, source, total, target, show_progress);
    }

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(error::asset::unsupported_url(url));
    }

    let agent = ureq::AgentBuilder::new()
        .timeout_connect(CONNECT_TIMEOUT)
        .timeout_read(READ_TIMEOUT)
        .build();

    tracing::info!(url = %url, "Downloading asset bundle");

    let response = agent.get(url).call().map_err(|e| match e {
        ureq::Error::Status(code, _) => {
            error::asset::download_failed(url, format!("server responded with HTTP {code}"))
        }
        ureq::Error::Transport(t) => error::asset::download_failed(url, t.to_string()),
    })?;

    let content_length: Option<u64> = response
        .header("Content-Length")
        .and_then(|s| s.parse().ok());

    copy_hashed(url, response.into_reader(), content_length, target, show_progress)
}

fn copy_hashed(
    url: &str,
    mut reader: impl Read,
    content_length: Option<u64>,
    target: &Path,
    show_progress: bool,
) -> Result<Downloaded> {
    let file = File::create(target)
        .map_err(|e| error::fs::write_failed(target.display().to_string(), e.to_string()))?;
    let mut writer = BufWriter::new(file);

    let progress = DownloadProgress::new(content_length, show_progress);
    progress.set_message(&url_file_name(url));

    let mut hasher = Hasher::new();
    let mut buffer = [0u8; 64 * 1024];
    let mut downloaded: u64 = 0;

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                progress.abandon();
                return Err(error::asset::download_failed(url, e.to_string()));
            }
        };

        writer.write_all(&buffer[..bytes_read]).map_err(|e| {
            progress.abandon();
            error::fs::write_failed(target.display().to_string(), e.to_string())
        })?;
        hasher.update(&buffer[..bytes_read]);

        downloaded += bytes_read as u64;
        progress.inc(bytes_read as u64);
    }

    writer
        .flush()
        .map_err(|e| error::fs::write_failed(target.display().to_string(), e.to_string()))?;

    if let Some(expected) = content_length {
        if downloaded != expected {
            progress.abandon();
            return Err(error::asset::download_failed(
                url,
                format!("download incomplete: expected {expected} bytes, got {downloaded}"),
            ));
        }
    }

    progress.finish();

    let digest = hash::format_digest(&hasher);
    tracing::info!(bytes = downloaded, digest = %digest, "Asset bundle downloaded");

    Ok(Downloaded {
        path: target.to_path_buf(),
        digest,
        bytes: downloaded,
    })
}
