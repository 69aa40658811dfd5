//! Listener surface through which a running job reports to its consumer.

use std::sync::mpsc::{self, Receiver, Sender};

use super::types::{SyncPhase, SyncReport};

/// Receives events from a running job.
///
/// Called from the worker thread. Log lines arrive in emission order, and
/// progress only after a batch's push succeeded.
pub trait SyncListener: Send + Sync {
    /// One formatted job log line.
    fn on_log(&self, _line: &str) {}

    /// `done` of `total` images of `folder` are pushed.
    fn on_progress(&self, _folder: &str, _done: usize, _total: usize) {}

    fn on_phase(&self, _phase: &SyncPhase) {}

    /// Transfer rate parsed from pull/push output, e.g. `2.40 MiB/s`.
    fn on_transfer_rate(&self, _rate: &str) {}

    /// Called exactly once when the job stops.
    fn on_finished(&self, _report: &SyncReport) {}
}

/// Listener that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullListener;

impl SyncListener for NullListener {}

/// Owned event form of the [`SyncListener`] callbacks.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    Log(String),
    Progress {
        folder: String,
        done: usize,
        total: usize,
    },
    Phase(SyncPhase),
    TransferRate(String),
    Finished(Box<SyncReport>),
}

/// Forwards every callback into an mpsc channel.
///
/// Send errors (receiver dropped) are ignored; the job keeps running.
pub struct ChannelListener {
    sender: Sender<SyncEvent>,
}

impl ChannelListener {
    pub fn new() -> (Self, Receiver<SyncEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender }, receiver)
    }

    fn send(&self, event: SyncEvent) {
        let _ = self.sender.send(event);
    }
}

impl SyncListener for ChannelListener {
    fn on_log(&self, line: &str) {
        self.send(SyncEvent::Log(line.to_string()));
    }

    fn on_progress(&self, folder: &str, done: usize, total: usize) {
        self.send(SyncEvent::Progress {
            folder: folder.to_string(),
            done,
            total,
        });
    }

    fn on_phase(&self, phase: &SyncPhase) {
        self.send(SyncEvent::Phase(phase.clone()));
    }

    fn on_transfer_rate(&self, rate: &str) {
        self.send(SyncEvent::TransferRate(rate.to_string()));
    }

    fn on_finished(&self, report: &SyncReport) {
        self.send(SyncEvent::Finished(Box::new(report.clone())));
    }
}
