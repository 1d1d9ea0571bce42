pub mod payment_store;
pub mod quote_store;

pub use payment_store::PaymentStore;
pub use quote_store::QuoteStore;
