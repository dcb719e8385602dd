//! CLI-specific progress handling for isochrone
//!
//! Draws the batched matrix requests as a progress bar on stderr.

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use isochrone::ProgressCallback;

/// Creates a progress bar counting provider requests
pub fn create_progress_bar(total_requests: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_requests);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} requests ({percent}%) ETA: {eta}")
            .expect("Failed to create progress style")
            .progress_chars("#>-")
    );
    pb
}

/// Progress manager for batched matrix requests
pub struct ProgressManager {
    pub pb: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_requests: u64, message: &str) -> Self {
        let pb = create_progress_bar(total_requests);

        // Print initial message to stderr
        eprintln!("{message}");

        Self { pb }
    }

    /// Callback for the engine; the total is only known once the grid is built
    pub fn callback(&self) -> ProgressCallback {
        let pb = self.pb.clone();
        Arc::new(move |done, total| {
            let (done, total) = (done as u64, total as u64);
            if pb.length().unwrap_or(0) != total {
                pb.set_length(total);
            }
            pb.set_position(done);
            if done >= total {
                pb.finish_with_message("✅ Travel times received");
            }
        })
    }
}
