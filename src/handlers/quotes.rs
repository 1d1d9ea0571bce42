use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;
use tracing::error;

use crate::handlers::{status_for, AppState};
use crate::models::quote::{CreateQuoteRequest, CreateQuoteResponse};

pub async fn create_quote(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<CreateQuoteResponse>, StatusCode> {
    let request: CreateQuoteRequest = match serde_json::from_value(payload) {
        Ok(req) => req,
        Err(e) => {
            error!("invalid quote request: {e}");
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    match state.quotes.create_quote(request).await {
        Ok(quote) => Ok(Json(CreateQuoteResponse::from(&quote))),
        Err(e) => {
            error!("failed to create quote: {e}");
            Err(status_for(&e))
        }
    }
}

pub async fn get_quote(
    State(state): State<AppState>,
    Path(quote_id): Path<String>,
) -> Result<Json<CreateQuoteResponse>, StatusCode> {
    match state.quotes.get_quote(&quote_id) {
        Ok(quote) => Ok(Json(CreateQuoteResponse::from(&quote))),
        Err(e) => Err(status_for(&e)),
    }
}
