pub mod event;
pub mod payment;
pub mod quote;
