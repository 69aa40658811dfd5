//! Terminal output for a running job.

use std::io::{self, Write};

use imgsync_core::orchestrator::{SyncListener, SyncPhase};

/// Prints job log lines as they arrive and one line per pushed batch.
#[derive(Debug, Default)]
pub struct TerminalListener;

impl TerminalListener {
    pub fn new() -> Self {
        Self
    }
}

impl SyncListener for TerminalListener {
    fn on_log(&self, line: &str) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{line}");
    }

    fn on_progress(&self, folder: &str, done: usize, total: usize) {
        let percent = if total == 0 { 100 } else { done * 100 / total };
        println!(">> {folder}: {done}/{total} images pushed ({percent}%)");
    }

    fn on_phase(&self, phase: &SyncPhase) {
        tracing::debug!("Phase: {}", phase);
    }

    fn on_transfer_rate(&self, rate: &str) {
        tracing::trace!("Transfer rate: {}", rate);
    }
}
