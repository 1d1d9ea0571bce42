use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::ServiceError;
use crate::models::payment::{CreatePaymentRequest, CreatePaymentResponse, Payment};
use crate::queue::ContinuationQueue;
use crate::store::{PaymentStore, QuoteStore};

/// Intake path: validates, enforces idempotency, attaches the quote, and
/// publishes the first continuation message. Everything after that belongs
/// to the orchestrator.
pub struct PaymentService {
    payments: Arc<PaymentStore>,
    quotes: Arc<QuoteStore>,
    queue: ContinuationQueue,
}

impl PaymentService {
    pub fn new(
        payments: Arc<PaymentStore>,
        quotes: Arc<QuoteStore>,
        queue: ContinuationQueue,
    ) -> Self {
        Self {
            payments,
            quotes,
            queue,
        }
    }

    pub async fn create_payment(
        &self,
        request: CreatePaymentRequest,
    ) -> Result<CreatePaymentResponse, ServiceError> {
        self.validate(&request)?;

        // Fast path before building a record; the store's conditional write
        // still backstops the race.
        if let Some(existing_id) = self.payments.find_by_idempotency_key(&request.idempotency_key)
        {
            warn!(
                idempotency_key = %request.idempotency_key,
                payment_id = %existing_id,
                "duplicate payment submission"
            );
            return Err(ServiceError::DuplicateRequest(request.idempotency_key));
        }

        let mut payment = Payment::new(&request);
        if let Some(quote_id) = &request.quote_id {
            self.attach_quote(&mut payment, quote_id)?;
        }

        let payment_id = payment.id.clone();
        let status = payment.status;
        self.payments.create(payment)?;
        info!(payment_id = %payment_id, amount = request.amount, "payment accepted");

        // First workflow message; the orchestrator takes over from here.
        self.queue.publish(&payment_id).await?;

        Ok(CreatePaymentResponse { payment_id, status })
    }

    pub fn get_payment(&self, payment_id: &str) -> Result<Payment, ServiceError> {
        self.payments
            .get(payment_id)
            .ok_or_else(|| ServiceError::NotFound(format!("payment '{payment_id}'")))
    }

    fn validate(&self, request: &CreatePaymentRequest) -> Result<(), ServiceError> {
        if request.amount == 0 {
            return Err(ServiceError::Validation(
                "amount must be positive".to_string(),
            ));
        }
        if request.idempotency_key.trim().is_empty() {
            return Err(ServiceError::Validation(
                "idempotency key must not be empty".to_string(),
            ));
        }
        if request.source_account.trim().is_empty() || request.dest_account.trim().is_empty() {
            return Err(ServiceError::Validation(
                "source and destination accounts are required".to_string(),
            ));
        }
        Ok(())
    }

    /// Copies the quote's locked terms onto the payment verbatim. An absent
    /// quote and a reclaimed one both read as expired to the caller.
    fn attach_quote(&self, payment: &mut Payment, quote_id: &str) -> Result<(), ServiceError> {
        let quote = self
            .quotes
            .get(quote_id)
            .ok_or_else(|| ServiceError::QuoteExpired(quote_id.to_string()))?;
        if quote.is_expired(Utc::now()) {
            return Err(ServiceError::QuoteExpired(quote_id.to_string()));
        }
        if quote.amount != payment.amount {
            return Err(ServiceError::QuoteMismatch(format!(
                "quote is for {} but payment is for {}",
                quote.amount, payment.amount
            )));
        }
        if quote.from_currency != payment.currency {
            return Err(ServiceError::QuoteMismatch(format!(
                "quote is for {} but payment is in {}",
                quote.from_currency, payment.currency
            )));
        }
        payment.quote_id = Some(quote.id);
        payment.guaranteed_payout = Some(quote.guaranteed_payout);
        payment.payout_currency = Some(quote.payout_currency);
        payment.locked_fees = Some(quote.fees.total());
        Ok(())
    }
}
