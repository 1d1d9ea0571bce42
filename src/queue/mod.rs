pub mod continuation;

pub use continuation::{ContinuationMessage, ContinuationQueue};
