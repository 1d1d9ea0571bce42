use tokio::sync::broadcast;
use tracing::info;

use crate::models::event::PaymentEvent;

/// Terminal-state side channel. Delivery beyond the broadcast channel is a
/// downstream concern; publishing with no subscribers is not an error.
pub struct EventPublisher {
    sender: broadcast::Sender<PaymentEvent>,
}

impl EventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PaymentEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: PaymentEvent) {
        info!(
            event_type = %event.event_type,
            payment_id = %event.payment_id,
            status = ?event.status,
            amount = event.amount,
            "payment reached terminal state"
        );
        let _ = self.sender.send(event);
    }
}
