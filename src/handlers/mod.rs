pub mod payments;
pub mod quotes;

use std::sync::Arc;

use axum::http::StatusCode;

use crate::error::ServiceError;
use crate::services::{PaymentService, QuoteService};

#[derive(Clone)]
pub struct AppState {
    pub payments: Arc<PaymentService>,
    pub quotes: Arc<QuoteService>,
}

/// Taxonomy to HTTP status. Leg failures never show up here; they surface
/// asynchronously via the terminal event and the persisted error message.
pub fn status_for(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::Validation(_)
        | ServiceError::QuoteExpired(_)
        | ServiceError::QuoteMismatch(_) => StatusCode::BAD_REQUEST,
        ServiceError::DuplicateRequest(_) => StatusCode::CONFLICT,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::VersionConflict(_) | ServiceError::Infrastructure(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ServiceError::LegInitiation(_) | ServiceError::LegSettlement(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
