use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::warn;

use crate::report::ResultMessage;

/// Many-producer, single-consumer collection of [`ResultMessage`]s.
///
/// Workers push through cloned [`SinkProducer`]s; the owner drains once the
/// batch is complete. Drain order is whatever order messages arrived in.
pub struct ResultSink {
    tx: UnboundedSender<ResultMessage>,
    rx: UnboundedReceiver<ResultMessage>,
}

#[derive(Clone)]
pub struct SinkProducer {
    tx: UnboundedSender<ResultMessage>,
}

impl SinkProducer {
    pub fn push(&self, message: ResultMessage) {
        if let Err(mpsc::error::SendError(message)) = self.tx.send(message) {
            warn!(path = %message.path, "Result sink closed, dropping message");
        }
    }
}

impl ResultSink {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn producer(&self) -> SinkProducer {
        SinkProducer {
            tx: self.tx.clone(),
        }
    }

    pub fn push(&self, message: ResultMessage) {
        self.producer().push(message);
    }

    /// Take every message pushed so far, leaving the sink empty.
    pub fn drain_all(&mut self) -> Vec<ResultMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            messages.push(message);
        }
        messages
    }
}

impl Default for ResultSink {
    fn default() -> Self {
        Self::new()
    }
}
