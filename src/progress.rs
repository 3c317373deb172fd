//! Progress bar display for downloads and batch analysis

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Progress display for an asset download
pub struct DownloadProgress {
    pb: ProgressBar,
}

impl DownloadProgress {
    /// Create a byte progress bar; a spinner when the size is unknown
    pub fn new(total_bytes: Option<u64>, show: bool) -> Self {
        let pb = match total_bytes {
            Some(total) => {
                let pb = ProgressBar::new(total);
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("[{bar:40.cyan/blue}] {bytes}/{total_bytes} {bytes_per_sec} {msg}")
                {
                    pb.set_style(style.progress_chars("#>-"));
                }
                pb
            }
            None => ProgressBar::new_spinner(),
        };

        if !show {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }

        Self { pb }
    }

    pub fn set_message(&self, msg: &str) {
        self.pb.set_message(msg.to_string());
    }

    pub fn inc(&self, bytes: u64) {
        self.pb.inc(bytes);
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }

    /// Abandon on error
    pub fn abandon(&self) {
        self.pb.abandon();
    }
}

/// Progress display for analyzing several files
pub struct BatchProgress {
    pb: ProgressBar,
}

impl BatchProgress {
    pub fn new(total_files: u64, show: bool) -> Self {
        let pb = ProgressBar::new(total_files);
        if let Ok(style) = ProgressStyle::default_bar().template("[{bar:40.green/yellow}] {pos}/{len} files {msg}") {
            pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
        }
        if !show {
            pb.set_draw_target(ProgressDrawTarget::hidden());
        }
        Self { pb }
    }

    /// Update to show current file being analyzed
    pub fn update_file(&self, file_path: &str) {
        // Truncate long paths for display
        let display_path = if file_path.chars().count() > 50 {
            let tail: String = file_path
                .chars()
                .rev()
                .take(47)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("...{tail}")
        } else {
            file_path.to_string()
        };
        self.pb.set_message(display_path);
    }

    pub fn inc(&self) {
        self.pb.inc(1);
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}
