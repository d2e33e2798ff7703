//! The single exit for externally visible state.
//!
//! Messages go out through an unbounded channel so nothing is dropped while
//! the consumer lags, and they arrive in the order they were published.
//! Every job-originated message is published under one gate after a final
//! check of the job's cancellation token, and preemption cancels its victims
//! under the same gate (see [`UpdatePublisher::fence`]). Together these mean
//! that once a job has been preempted or aborted it can never emit again.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::message::OutboundMessage;

/// Receiving half handed to the consumer.
pub type UpdateReceiver = mpsc::UnboundedReceiver<OutboundMessage>;

/// Cloneable handle used by jobs to emit messages.
#[derive(Debug, Clone)]
pub struct UpdatePublisher {
    tx: mpsc::UnboundedSender<OutboundMessage>,
    gate: Arc<Mutex<()>>,
}

impl UpdatePublisher {
    /// Creates a publisher and the receiver that drains it.
    pub fn channel() -> (Self, UpdateReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                gate: Arc::new(Mutex::new(())),
            },
            rx,
        )
    }

    /// Publishes `message` on behalf of the job owning `cancellation`.
    ///
    /// Returns `false` without sending if the job has been cancelled.
    pub async fn publish(&self, message: OutboundMessage, cancellation: &CancellationToken) -> bool {
        let _gate = self.gate.lock().await;
        if cancellation.is_cancelled() {
            trace!(kind = message.kind(), "Suppressed message from cancelled job");
            return false;
        }
        self.send(message);
        true
    }

    /// Publishes a message that does not belong to any job.
    pub async fn publish_detached(&self, message: OutboundMessage) {
        let _gate = self.gate.lock().await;
        self.send(message);
    }

    /// Runs `f` while holding the publish gate.
    ///
    /// Any job whose token is cancelled inside `f` is guaranteed not to
    /// publish afterwards.
    pub async fn fence<R>(&self, f: impl FnOnce() -> R) -> R {
        let _gate = self.gate.lock().await;
        f()
    }

    /// Returns true once the consumer has dropped its receiver.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, message: OutboundMessage) {
        let kind = message.kind();
        if self.tx.send(message).is_err() {
            debug!(kind, "Update receiver dropped, message discarded");
        }
    }
}
