use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, error, info, warn};

use crate::error::ServiceError;
use crate::models::event::PaymentEvent;
use crate::models::payment::{Payment, PaymentStatus};
use crate::queue::{ContinuationMessage, ContinuationQueue};
use crate::services::events::EventPublisher;
use crate::services::settlement::{SettlementProvider, TransferStatus};
use crate::store::PaymentStore;

/// Drives one payment one step forward per continuation message.
///
/// Each invocation performs at most one externally-visible side effect
/// (initiate a leg, poll a leg, or finalize), persists the new state, and
/// publishes zero or one follow-up messages. All waiting is expressed as a
/// delayed message; nothing here blocks across a poll interval.
pub struct Orchestrator {
    payments: Arc<PaymentStore>,
    inbound: Arc<dyn SettlementProvider>,
    outbound: Arc<dyn SettlementProvider>,
    queue: ContinuationQueue,
    events: Arc<EventPublisher>,
    poll_delay_secs: u64,
}

impl Orchestrator {
    pub fn new(
        payments: Arc<PaymentStore>,
        inbound: Arc<dyn SettlementProvider>,
        outbound: Arc<dyn SettlementProvider>,
        queue: ContinuationQueue,
        events: Arc<EventPublisher>,
        poll_delay_secs: u64,
    ) -> Self {
        Self {
            payments,
            inbound,
            outbound,
            queue,
            events,
            poll_delay_secs,
        }
    }

    /// Worker loop: one message, one unit of work. A retryable failure
    /// re-publishes the message after the poll delay, standing in for the
    /// queue's visibility-timeout redelivery; state was not touched, so the
    /// retry re-reads and repeats the same step.
    pub async fn run(&self, mut receiver: Receiver<ContinuationMessage>) {
        info!("starting workflow orchestrator worker");
        while let Some(message) = receiver.recv().await {
            if let Err(e) = self.advance(&message.payment_id).await {
                if e.is_retryable() {
                    warn!(payment_id = %message.payment_id, "step failed, re-queueing: {e}");
                    if let Err(e) = self
                        .queue
                        .publish_delayed(&message.payment_id, self.poll_delay_secs)
                        .await
                    {
                        error!(payment_id = %message.payment_id, "could not re-queue: {e}");
                    }
                } else {
                    error!(payment_id = %message.payment_id, "unrecoverable step failure: {e}");
                }
            }
        }
    }

    /// Advances the payment one step. Safe under duplicate or late message
    /// delivery: terminal payments no-op, and the dispatch always acts on
    /// the state read fresh from the store, never on what the message was
    /// originally published for.
    pub async fn advance(&self, payment_id: &str) -> Result<(), ServiceError> {
        let payment = self
            .payments
            .get(payment_id)
            .ok_or_else(|| ServiceError::Infrastructure(format!("payment '{payment_id}' missing")))?;

        if payment.status.is_terminal() {
            debug!(payment_id, status = ?payment.status, "duplicate delivery for terminal payment, ignoring");
            return Ok(());
        }

        match payment.status {
            PaymentStatus::Pending => self.initiate_inbound(payment).await,
            PaymentStatus::InboundPending => self.poll_inbound(payment).await,
            PaymentStatus::InboundComplete => self.initiate_outbound(payment).await,
            PaymentStatus::OutboundPending => self.poll_outbound(payment).await,
            PaymentStatus::Completed | PaymentStatus::Failed => Ok(()),
        }
    }

    async fn initiate_inbound(&self, mut payment: Payment) -> Result<(), ServiceError> {
        // A recorded transfer id means the leg was already initiated and an
        // earlier persist half-landed; reuse it rather than initiating twice.
        let transfer_id = match payment.inbound_transfer_id.clone() {
            Some(id) => id,
            None => match self
                .inbound
                .initiate_transfer(payment.amount, &payment.currency)
                .await
            {
                Ok(id) => id,
                Err(cause @ ServiceError::LegInitiation(_)) => {
                    return self.fail_payment(payment, cause).await;
                }
                Err(e) => return Err(e),
            },
        };

        payment.inbound_transfer_id = Some(transfer_id.clone());
        payment.transition_to(
            PaymentStatus::InboundPending,
            format!("inbound transfer {transfer_id} initiated"),
        )?;
        self.payments.update(payment.clone())?;
        self.queue
            .publish_delayed(&payment.id, self.poll_delay_secs)
            .await
    }

    async fn poll_inbound(&self, mut payment: Payment) -> Result<(), ServiceError> {
        let transfer_id = payment.inbound_transfer_id.clone().ok_or_else(|| {
            ServiceError::Infrastructure(format!("payment {} has no inbound transfer id", payment.id))
        })?;
        let status = self.leg_status(&self.inbound, &transfer_id).await?;
        payment.inbound_poll_count += 1;

        match status {
            TransferStatus::Pending => {
                self.payments.update(payment.clone())?;
                self.queue
                    .publish_delayed(&payment.id, self.poll_delay_secs)
                    .await
            }
            TransferStatus::Settled => {
                payment.transition_to(
                    PaymentStatus::InboundComplete,
                    format!("inbound transfer {transfer_id} settled"),
                )?;
                self.payments.update(payment.clone())?;
                // The next step has no external latency; continue at once.
                self.queue.publish(&payment.id).await
            }
            TransferStatus::Failed => {
                let cause =
                    ServiceError::LegSettlement(format!("inbound transfer {transfer_id} failed"));
                self.fail_payment(payment, cause).await
            }
        }
    }

    async fn initiate_outbound(&self, mut payment: Payment) -> Result<(), ServiceError> {
        let amount = payment.outbound_amount();
        let currency = payment
            .payout_currency
            .clone()
            .unwrap_or_else(|| payment.currency.clone());

        let transfer_id = match payment.outbound_transfer_id.clone() {
            Some(id) => id,
            None => match self.outbound.initiate_transfer(amount, &currency).await {
                Ok(id) => id,
                Err(cause @ ServiceError::LegInitiation(_)) => {
                    return self.fail_payment(payment, cause).await;
                }
                Err(e) => return Err(e),
            },
        };

        payment.outbound_transfer_id = Some(transfer_id.clone());
        payment.transition_to(
            PaymentStatus::OutboundPending,
            format!("outbound transfer {transfer_id} initiated for {amount} {currency}"),
        )?;
        self.payments.update(payment.clone())?;
        self.queue
            .publish_delayed(&payment.id, self.poll_delay_secs)
            .await
    }

    async fn poll_outbound(&self, mut payment: Payment) -> Result<(), ServiceError> {
        let transfer_id = payment.outbound_transfer_id.clone().ok_or_else(|| {
            ServiceError::Infrastructure(format!("payment {} has no outbound transfer id", payment.id))
        })?;
        let status = self.leg_status(&self.outbound, &transfer_id).await?;
        payment.outbound_poll_count += 1;

        match status {
            TransferStatus::Pending => {
                self.payments.update(payment.clone())?;
                self.queue
                    .publish_delayed(&payment.id, self.poll_delay_secs)
                    .await
            }
            TransferStatus::Settled => {
                payment.transition_to(
                    PaymentStatus::Completed,
                    format!("outbound transfer {transfer_id} settled"),
                )?;
                payment.processed_at = Some(Utc::now());
                let persisted = self.payments.update(payment)?;
                self.events.publish(PaymentEvent::terminal(&persisted));
                Ok(())
            }
            TransferStatus::Failed => {
                let cause =
                    ServiceError::LegSettlement(format!("outbound transfer {transfer_id} failed"));
                self.fail_payment(payment, cause).await
            }
        }
    }

    /// A provider losing track of a transfer we recorded can only be store
    /// inconsistency on one side or the other, so it is surfaced as a
    /// retryable fault rather than a payment failure.
    async fn leg_status(
        &self,
        provider: &Arc<dyn SettlementProvider>,
        transfer_id: &str,
    ) -> Result<TransferStatus, ServiceError> {
        provider.get_status(transfer_id).await.map_err(|e| match e {
            ServiceError::NotFound(detail) => ServiceError::Infrastructure(detail),
            other => other,
        })
    }

    /// Terminal failure: record the leg-level cause, persist, emit the
    /// event. No follow-up message is published.
    async fn fail_payment(
        &self,
        mut payment: Payment,
        cause: ServiceError,
    ) -> Result<(), ServiceError> {
        warn!(payment_id = %payment.id, "payment failed: {cause}");
        payment.fail(cause.to_string())?;
        let persisted = self.payments.update(payment)?;
        self.events.publish(PaymentEvent::terminal(&persisted));
        Ok(())
    }
}
