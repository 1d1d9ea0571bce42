//! End-to-end workflow scenarios: quote intake, idempotent payment intake,
//! and the orchestrator driven purely off the continuation queue.

use std::sync::Arc;

use tokio::sync::mpsc::Receiver;

use fxbridge::error::ServiceError;
use fxbridge::models::payment::{CreatePaymentRequest, PaymentStatus};
use fxbridge::models::quote::CreateQuoteRequest;
use fxbridge::queue::{ContinuationMessage, ContinuationQueue};
use fxbridge::services::rates;
use fxbridge::services::routing::StaticRouteAdvisor;
use fxbridge::services::settlement::{SettlementSimulator, SimulatorConfig};
use fxbridge::services::{EventPublisher, Orchestrator, PaymentService, QuoteService};
use fxbridge::store::{PaymentStore, QuoteStore};

struct Stack {
    payments: Arc<PaymentStore>,
    quotes: Arc<QuoteStore>,
    payment_service: PaymentService,
    quote_service: QuoteService,
    orchestrator: Orchestrator,
    outbound: Arc<SettlementSimulator>,
    receiver: Receiver<ContinuationMessage>,
}

/// Full stack with deterministic settlement (no random failures, fixed
/// poll thresholds) and zero poll delay so tests drive the queue directly.
fn stack(settle_after_polls: u32) -> Stack {
    let payments = Arc::new(PaymentStore::new());
    let quotes = Arc::new(QuoteStore::new());
    let (queue, receiver) = ContinuationQueue::new(256, 900);
    let events = Arc::new(EventPublisher::new(64));

    let inbound = Arc::new(SettlementSimulator::new(
        "inbound",
        SimulatorConfig::deterministic(settle_after_polls),
    ));
    let outbound = Arc::new(SettlementSimulator::new(
        "outbound",
        SimulatorConfig::deterministic(settle_after_polls),
    ));

    let quote_service = QuoteService::new(
        quotes.clone(),
        Arc::new(StaticRouteAdvisor),
        rates::default_sources(),
        60,
    );
    let payment_service = PaymentService::new(payments.clone(), quotes.clone(), queue.clone());
    let orchestrator = Orchestrator::new(
        payments.clone(),
        inbound,
        outbound.clone(),
        queue,
        events,
        0,
    );

    Stack {
        payments,
        quotes,
        payment_service,
        quote_service,
        orchestrator,
        outbound,
        receiver,
    }
}

fn payment_request(key: &str, quote_id: Option<String>) -> CreatePaymentRequest {
    CreatePaymentRequest {
        amount: 100_000,
        currency: "USD".to_string(),
        source_account: "acct-alice".to_string(),
        dest_account: "acct-bob".to_string(),
        idempotency_key: key.to_string(),
        quote_id,
    }
}

/// Consumes continuation messages until the payment is terminal, the way
/// the worker loop would.
async fn drive_to_terminal(stack: &mut Stack, payment_id: &str) {
    while !stack.payments.get(payment_id).unwrap().status.is_terminal() {
        let message = stack.receiver.recv().await.unwrap();
        stack.orchestrator.advance(&message.payment_id).await.unwrap();
    }
}

#[tokio::test]
async fn quoted_payment_completes_with_the_locked_payout() {
    let mut stack = stack(2);

    let quote = stack
        .quote_service
        .create_quote(CreateQuoteRequest {
            from_currency: "USD".to_string(),
            to_currency: "EUR".to_string(),
            amount: 100_000,
        })
        .await
        .unwrap();
    assert_eq!(
        quote.guaranteed_payout,
        ((100_000 - quote.fees.total()) as f64 * quote.rate).floor() as u64
    );

    let response = stack
        .payment_service
        .create_payment(payment_request("e2e-1", Some(quote.id.clone())))
        .await
        .unwrap();
    drive_to_terminal(&mut stack, &response.payment_id).await;

    let payment = stack.payments.get(&response.payment_id).unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.inbound_poll_count, 2);
    assert_eq!(payment.outbound_poll_count, 2);
    assert!(payment.processed_at.is_some());

    // The outbound leg moved exactly the payout locked at quote time.
    let outbound_id = payment.outbound_transfer_id.as_deref().unwrap();
    let transfer = stack.outbound.transfer(outbound_id).unwrap();
    assert_eq!(transfer.amount, quote.guaranteed_payout);
    assert_eq!(transfer.currency, "EUR");
}

#[tokio::test]
async fn transition_history_is_a_valid_walk_of_the_state_graph() {
    let mut stack = stack(2);
    let response = stack
        .payment_service
        .create_payment(payment_request("e2e-2", None))
        .await
        .unwrap();
    drive_to_terminal(&mut stack, &response.payment_id).await;

    let payment = stack.payments.get(&response.payment_id).unwrap();
    let mut current = PaymentStatus::Pending;
    for transition in &payment.transitions {
        assert_eq!(transition.from, current);
        assert!(transition.from.can_transition_to(transition.to));
        current = transition.to;
    }
    assert_eq!(current, payment.status);
}

#[tokio::test]
async fn duplicate_idempotency_key_with_different_amount_conflicts() {
    let stack = stack(2);
    let first = stack
        .payment_service
        .create_payment(payment_request("e2e-3", None))
        .await
        .unwrap();

    let mut duplicate = payment_request("e2e-3", None);
    duplicate.amount = 42;
    let err = stack
        .payment_service
        .create_payment(duplicate)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::DuplicateRequest(_)));
    assert_eq!(stack.payments.count(), 1);
    assert_eq!(stack.payments.get(&first.payment_id).unwrap().amount, 100_000);
}

#[tokio::test]
async fn a_sixty_one_second_old_quote_is_rejected() {
    let stack = stack(2);
    let quote = stack
        .quote_service
        .create_quote(CreateQuoteRequest {
            from_currency: "USD".to_string(),
            to_currency: "EUR".to_string(),
            amount: 100_000,
        })
        .await
        .unwrap();

    // Age the stored quote past its 60s validity window.
    let mut aged = stack.quotes.get(&quote.id).unwrap();
    aged.created_at -= chrono::Duration::seconds(61);
    aged.expires_at -= chrono::Duration::seconds(61);
    stack.quotes.put(aged);

    let err = stack
        .payment_service
        .create_payment(payment_request("e2e-4", Some(quote.id)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::QuoteExpired(_)));
}

#[tokio::test]
async fn late_messages_never_reinitiate_a_finished_leg() {
    let mut stack = stack(2);
    let response = stack
        .payment_service
        .create_payment(payment_request("e2e-5", None))
        .await
        .unwrap();
    let id = response.payment_id;

    // Drive until the outbound leg has been initiated.
    while stack.payments.get(&id).unwrap().status != PaymentStatus::OutboundPending {
        let message = stack.receiver.recv().await.unwrap();
        stack.orchestrator.advance(&message.payment_id).await.unwrap();
    }
    let mid = stack.payments.get(&id).unwrap();
    let inbound_transfer = mid.inbound_transfer_id.clone().unwrap();
    let inbound_polls = mid.inbound_poll_count;

    // A late redelivery of an earlier message is just another advance; it
    // must act on the current state and leave the inbound leg alone.
    stack.orchestrator.advance(&id).await.unwrap();

    let after = stack.payments.get(&id).unwrap();
    assert_eq!(after.inbound_transfer_id.as_ref(), Some(&inbound_transfer));
    assert_eq!(after.inbound_poll_count, inbound_polls);
    assert_eq!(after.outbound_poll_count, mid.outbound_poll_count + 1);
}

#[tokio::test]
async fn replaying_messages_after_completion_changes_nothing() {
    let mut stack = stack(1);
    let response = stack
        .payment_service
        .create_payment(payment_request("e2e-6", None))
        .await
        .unwrap();
    drive_to_terminal(&mut stack, &response.payment_id).await;

    let before = stack.payments.get(&response.payment_id).unwrap();
    assert_eq!(before.status, PaymentStatus::Completed);

    for _ in 0..3 {
        stack.orchestrator.advance(&response.payment_id).await.unwrap();
    }

    let after = stack.payments.get(&response.payment_id).unwrap();
    assert_eq!(after.version, before.version);
    assert_eq!(after.transitions.len(), before.transitions.len());
    assert_eq!(after.inbound_poll_count, before.inbound_poll_count);
    assert_eq!(after.outbound_poll_count, before.outbound_poll_count);
}
