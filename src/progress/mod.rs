use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;

use crate::pipeline::report::format_size;

#[derive(Debug)]
pub struct UploadProgress {
    pub total_bytes: u64,
    pub start_time: Instant,
    pub progress_bar: ProgressBar,
}

impl UploadProgress {
    pub fn new(total_bytes: u64, silent: bool) -> Self {
        let progress_bar = if silent {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total_bytes)
        };

        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta}) | {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        progress_bar.set_style(style);
        progress_bar.set_message("Starting upload...");

        Self {
            total_bytes,
            start_time: Instant::now(),
            progress_bar,
        }
    }

    /// Sets the length again for every provider, since each one re-sends the dump.
    pub fn restart(&self) {
        self.progress_bar.set_length(self.total_bytes);
        self.progress_bar.set_position(0);
    }

    pub fn advance(&self, bytes: u64) {
        self.progress_bar.inc(bytes);
    }

    pub fn set_file(&self, provider: &str, key: &str) {
        self.progress_bar.set_message(format!("{provider}: {key}"));
    }

    pub fn fail(&self, message: &str) {
        self.progress_bar.abandon_with_message(format!("❌ {message}"));
    }

    pub fn finish(&self, message: &str) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            (self.total_bytes as f64 / elapsed) as u64
        } else {
            0
        };
        self.progress_bar.finish_with_message(format!(
            "{message} | Total time: {elapsed:.2}s | Avg rate: {}/s",
            format_size(rate)
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_progress_bar_not_silent() {
        let progress = UploadProgress::new(100, false);
        assert_eq!(progress.total_bytes, 100);
        assert_eq!(progress.progress_bar.length(), Some(100));
    }

    #[test]
    fn test_new_progress_bar_silent() {
        let progress = UploadProgress::new(50, true);
        assert_eq!(progress.total_bytes, 50);
        assert!(progress.progress_bar.is_hidden());
    }

    #[test]
    fn test_file_message_names_provider() {
        let progress = UploadProgress::new(10, false);
        progress.set_file("Azure", "dump-2024-03-01/shop/orders.bson.gz");
        assert_eq!(
            progress.progress_bar.message(),
            "Azure: dump-2024-03-01/shop/orders.bson.gz"
        );
    }

    #[test]
    fn test_restart_resets_position() {
        let progress = UploadProgress::new(50, true);
        progress.advance(30);
        assert_eq!(progress.progress_bar.position(), 30);
        progress.restart();
        assert_eq!(progress.progress_bar.position(), 0);
    }
}
