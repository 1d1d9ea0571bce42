use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;
use tracing::{error, info};

use crate::handlers::{status_for, AppState};
use crate::models::payment::{CreatePaymentRequest, CreatePaymentResponse, Payment};

pub async fn create_payment(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<CreatePaymentResponse>, StatusCode> {
    let request: CreatePaymentRequest = match serde_json::from_value(payload) {
        Ok(req) => req,
        Err(e) => {
            error!("invalid payment request: {e}");
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    info!(idempotency_key = %request.idempotency_key, "received payment request");

    match state.payments.create_payment(request).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!("failed to create payment: {e}");
            Err(status_for(&e))
        }
    }
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<Json<Payment>, StatusCode> {
    match state.payments.get_payment(&payment_id) {
        Ok(payment) => Ok(Json(payment)),
        Err(e) => Err(status_for(&e)),
    }
}
