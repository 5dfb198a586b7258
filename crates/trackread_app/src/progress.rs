//! Progress bar for dumps written to a file.

use indicatif::{ProgressBar, ProgressStyle};

/// Byte-based progress bar on stderr. Hidden when stderr is not a terminal.
pub struct ProgressReporter {
    bar: ProgressBar,
    block_size: u64,
}

impl ProgressReporter {
    pub fn new(total_bytes: u64, block_size: u32, message: String) -> Self {
        let bar = ProgressBar::new(total_bytes);
        let style = ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_message(message);

        Self {
            bar,
            block_size: u64::from(block_size),
        }
    }

    pub fn for_dump(total_bytes: u64, block_size: u32, device: &str) -> Self {
        Self::new(total_bytes, block_size, format!("Reading {device}..."))
    }

    /// Records `blocks_done` delivered blocks.
    pub fn update(&self, blocks_done: u64) {
        self.bar.set_position(blocks_done * self.block_size);
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Leaves the bar where the dump stopped.
    pub fn abandon(&self) {
        self.bar.abandon();
    }
}
