//! State observation.

use crate::core::SessionState;
use tokio::sync::broadcast::{self, error::RecvError};

/// A stream of session states.
///
/// Yields the state current at subscription time first, then one state per
/// dispatch in dispatch order. A subscriber that falls more than the
/// configured capacity behind skips the oldest updates and carries on.
#[derive(Debug)]
pub struct StateSubscription {
    first: Option<SessionState>,
    rx: broadcast::Receiver<SessionState>,
}

impl StateSubscription {
    pub(crate) fn new(current: SessionState, rx: broadcast::Receiver<SessionState>) -> Self {
        Self {
            first: Some(current),
            rx,
        }
    }

    /// Next state, or `None` once the orchestrator is gone.
    pub async fn next(&mut self) -> Option<SessionState> {
        if let Some(state) = self.first.take() {
            return Some(state);
        }
        loop {
            match self.rx.recv().await {
                Ok(state) => return Some(state),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "state subscriber lagged, dropping oldest updates");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`next`](Self::next); `None` when nothing is queued.
    pub fn try_next(&mut self) -> Option<SessionState> {
        if let Some(state) = self.first.take() {
            return Some(state);
        }
        loop {
            match self.rx.try_recv() {
                Ok(state) => return Some(state),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "state subscriber lagged, dropping oldest updates");
                }
                Err(_) => return None,
            }
        }
    }
}
