use std::sync::mpsc;

use crate::WalkEvent;

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: WalkEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<WalkEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<WalkEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: WalkEvent) {
        let _ = self.tx.send(event);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
    fn emit(&self, _event: WalkEvent) {}
}
