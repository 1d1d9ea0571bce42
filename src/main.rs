use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

use fxbridge::app::config::Config;
use fxbridge::handlers::{self, AppState};
use fxbridge::queue::ContinuationQueue;
use fxbridge::services::rates;
use fxbridge::services::routing::{RemoteRouteAdvisor, RouteAdvisor, StaticRouteAdvisor};
use fxbridge::services::settlement::{SettlementSimulator, SimulatorConfig};
use fxbridge::services::{EventPublisher, Orchestrator, PaymentService, QuoteService};
use fxbridge::store::{PaymentStore, QuoteStore};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    info!("starting fxbridge on port {}", config.server_port);

    let payment_store = Arc::new(PaymentStore::new());
    let quote_store = Arc::new(QuoteStore::new());
    let (queue, receiver) = ContinuationQueue::new(config.queue_buffer_size, config.max_queue_delay_secs);
    let events = Arc::new(EventPublisher::new(256));

    let simulator_config = SimulatorConfig {
        initiation_failure_rate: config.initiation_failure_rate,
        settlement_failure_rate: config.settlement_failure_rate,
        min_settle_polls: config.min_settle_polls,
        max_settle_polls: config.max_settle_polls,
    };
    let inbound = Arc::new(SettlementSimulator::new("inbound", simulator_config.clone()));
    let outbound = Arc::new(SettlementSimulator::new("outbound", simulator_config));

    let advisor: Arc<dyn RouteAdvisor> = match &config.route_advisor_url {
        Some(url) => match RemoteRouteAdvisor::new(url.clone()) {
            Ok(remote) => Arc::new(remote),
            Err(e) => {
                warn!("could not build remote route advisor, using static: {e}");
                Arc::new(StaticRouteAdvisor)
            }
        },
        None => Arc::new(StaticRouteAdvisor),
    };

    let quote_service = Arc::new(QuoteService::new(
        quote_store.clone(),
        advisor,
        rates::default_sources(),
        config.quote_validity_secs,
    ));
    let payment_service = Arc::new(PaymentService::new(
        payment_store.clone(),
        quote_store.clone(),
        queue.clone(),
    ));
    let orchestrator = Arc::new(Orchestrator::new(
        payment_store,
        inbound,
        outbound,
        queue,
        events,
        config.poll_delay_secs,
    ));

    // Workflow worker: consumes continuation messages one at a time.
    tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move {
            orchestrator.run(receiver).await;
        }
    });

    // Expired-quote sweep.
    tokio::spawn({
        let quote_store = quote_store.clone();
        async move {
            loop {
                tokio::time::sleep(Duration::from_secs(30)).await;
                let purged = quote_store.purge_expired();
                if purged > 0 {
                    info!(purged, "reclaimed expired quotes");
                }
            }
        }
    });

    let state = AppState {
        payments: payment_service,
        quotes: quote_service,
    };

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/quotes", post(handlers::quotes::create_quote))
        .route("/quotes/:id", get(handlers::quotes::get_quote))
        .route("/payments", post(handlers::payments::create_payment))
        .route("/payments/:id", get(handlers::payments::get_payment))
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {addr}: {e}"));
    info!("listening on {addr}");

    if let Err(e) = axum::serve(listener, app).await {
        panic!("server error: {e}");
    }
}

async fn health_handler() -> StatusCode {
    StatusCode::OK
}
