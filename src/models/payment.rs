use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    InboundPending,
    InboundComplete,
    OutboundPending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }

    /// The state machine's edge set. `Failed` is reachable from every
    /// non-terminal state.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        match (self, next) {
            (Pending, InboundPending)
            | (InboundPending, InboundComplete)
            | (InboundComplete, OutboundPending)
            | (OutboundPending, Completed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// One append-only audit entry. The last entry's `to` always equals the
/// payment's current status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: PaymentStatus,
    pub to: PaymentStatus,
    pub at: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub idempotency_key: String,
    pub amount: u64,
    pub currency: String,
    pub source_account: String,
    pub dest_account: String,
    pub status: PaymentStatus,
    pub quote_id: Option<String>,
    pub guaranteed_payout: Option<u64>,
    pub payout_currency: Option<String>,
    /// Total fees locked at quote time, kept for the terminal event since
    /// the quote itself may be reclaimed before settlement.
    pub locked_fees: Option<u64>,
    pub inbound_transfer_id: Option<String>,
    pub outbound_transfer_id: Option<String>,
    pub inbound_poll_count: u32,
    pub outbound_poll_count: u32,
    pub transitions: Vec<StateTransition>,
    pub error_message: Option<String>,
    /// Bumped by the store on every successful update; stale writers lose.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn new(request: &CreatePaymentRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            idempotency_key: request.idempotency_key.clone(),
            amount: request.amount,
            currency: request.currency.clone(),
            source_account: request.source_account.clone(),
            dest_account: request.dest_account.clone(),
            status: PaymentStatus::Pending,
            quote_id: None,
            guaranteed_payout: None,
            payout_currency: None,
            locked_fees: None,
            inbound_transfer_id: None,
            outbound_transfer_id: None,
            inbound_poll_count: 0,
            outbound_poll_count: 0,
            transitions: Vec::new(),
            error_message: None,
            version: 0,
            created_at: now,
            updated_at: now,
            processed_at: None,
        }
    }

    /// Moves to `next` along a legal edge, appending the audit entry.
    pub fn transition_to(
        &mut self,
        next: PaymentStatus,
        message: impl Into<String>,
    ) -> Result<(), ServiceError> {
        if !self.status.can_transition_to(next) {
            return Err(ServiceError::Infrastructure(format!(
                "illegal transition {:?} -> {:?} for payment {}",
                self.status, next, self.id
            )));
        }
        self.transitions.push(StateTransition {
            from: self.status,
            to: next,
            at: Utc::now(),
            message: message.into(),
        });
        self.status = next;
        Ok(())
    }

    /// Terminal failure: records the transition and the error in one step.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), ServiceError> {
        let reason = reason.into();
        self.transition_to(PaymentStatus::Failed, reason.clone())?;
        self.error_message = Some(reason);
        Ok(())
    }

    /// The amount to move on the outbound leg: the payout locked at quote
    /// time when a quote is attached, the raw amount otherwise.
    pub fn outbound_amount(&self) -> u64 {
        self.guaranteed_payout.unwrap_or(self.amount)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub amount: u64,
    pub currency: String,
    pub source_account: String,
    pub dest_account: String,
    pub idempotency_key: String,
    pub quote_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentResponse {
    pub payment_id: String,
    pub status: PaymentStatus,
}
