//! The producer side of a run's event stream.
//!
//! Each streaming run gets one bounded channel. The run task is the only
//! producer; when the channel is full the run waits. If the consumer drops
//! its receiver the next emission fails with `Cancelled`, which ends the run.

use tokio::sync::mpsc;

use autobook_contracts::{
    error::{AutobookError, AutobookResult},
    event::RunEvent,
};

use crate::oracle::TokenSink;

/// Sends `RunEvent`s to the consumer of a streaming run, or nowhere.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<RunEvent>>,
}

impl EventSink {
    /// A sink for non-streaming runs. Every emission succeeds and is dropped.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Create a bounded channel and the sink feeding it.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<RunEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx: Some(tx) }, rx)
    }

    /// Deliver one event, waiting while the channel is full.
    pub async fn emit(&self, event: RunEvent) -> AutobookResult<()> {
        match &self.tx {
            None => Ok(()),
            Some(tx) => tx.send(event).await.map_err(|_| AutobookError::Cancelled {
                reason: "event stream consumer disconnected".to_string(),
            }),
        }
    }

    /// A token sink that forwards oracle output as `Content` events.
    pub fn tokens(&self) -> TokenSink {
        TokenSink::new(self.clone())
    }
}
