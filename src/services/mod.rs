pub mod events;
pub mod fees;
pub mod orchestrator;
pub mod payments;
pub mod quotes;
pub mod rates;
pub mod routing;
pub mod settlement;

pub use events::EventPublisher;
pub use orchestrator::Orchestrator;
pub use payments::PaymentService;
pub use quotes::QuoteService;
