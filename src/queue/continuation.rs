use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tracing::warn;

use crate::error::ServiceError;

/// A message whose only job is to make the orchestrator re-examine one
/// payment's state at some later time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuationMessage {
    pub payment_id: String,
}

/// Thin adapter over the workflow queue. Delayed delivery is a spawned
/// sleep-then-send; the delay is capped at the queue's configured maximum.
#[derive(Clone)]
pub struct ContinuationQueue {
    sender: Sender<ContinuationMessage>,
    max_delay_secs: u64,
}

impl ContinuationQueue {
    pub fn new(buffer: usize, max_delay_secs: u64) -> (Self, Receiver<ContinuationMessage>) {
        let (sender, receiver) = mpsc::channel(buffer);
        (
            Self {
                sender,
                max_delay_secs,
            },
            receiver,
        )
    }

    /// Publish for immediate delivery.
    pub async fn publish(&self, payment_id: &str) -> Result<(), ServiceError> {
        self.sender
            .send(ContinuationMessage {
                payment_id: payment_id.to_string(),
            })
            .await
            .map_err(|_| ServiceError::Infrastructure("continuation queue closed".to_string()))
    }

    /// Publish with a delivery delay. Zero falls through to an immediate
    /// send; anything above the cap is clamped.
    pub async fn publish_delayed(
        &self,
        payment_id: &str,
        delay_secs: u64,
    ) -> Result<(), ServiceError> {
        if delay_secs == 0 {
            return self.publish(payment_id).await;
        }
        let delay = Duration::from_secs(delay_secs.min(self.max_delay_secs));
        let sender = self.sender.clone();
        let message = ContinuationMessage {
            payment_id: payment_id.to_string(),
        };
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if sender.send(message.clone()).await.is_err() {
                warn!(
                    payment_id = %message.payment_id,
                    "continuation queue closed before delayed delivery"
                );
            }
        });
        Ok(())
    }
}
