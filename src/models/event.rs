use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::payment::{Payment, PaymentStatus};

/// Terminal-state notification published for downstream consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub event_type: String,
    pub payment_id: String,
    pub status: PaymentStatus,
    pub amount: u64,
    pub currency: String,
    pub fees: Option<u64>,
    pub inbound_transfer_id: Option<String>,
    pub outbound_transfer_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl PaymentEvent {
    /// Builds the event for a payment that has just reached a terminal state.
    pub fn terminal(payment: &Payment) -> Self {
        let event_type = match payment.status {
            PaymentStatus::Completed => "payment.completed",
            _ => "payment.failed",
        };
        Self {
            event_type: event_type.to_string(),
            payment_id: payment.id.clone(),
            status: payment.status,
            amount: payment.amount,
            currency: payment.currency.clone(),
            fees: payment.locked_fees,
            inbound_transfer_id: payment.inbound_transfer_id.clone(),
            outbound_transfer_id: payment.outbound_transfer_id.clone(),
            timestamp: Utc::now(),
        }
    }
}
