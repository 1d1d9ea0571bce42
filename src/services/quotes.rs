use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::quote::{CreateQuoteRequest, Quote};
use crate::services::rates::{self, RateSource};
use crate::services::routing::{RouteAdvisor, RouteRequest};
use crate::store::QuoteStore;

/// Quote calculator and store front. A quote locks the rate, the fee
/// breakdown, and the payout the user will receive no matter how long the
/// two legs take to settle.
pub struct QuoteService {
    store: Arc<QuoteStore>,
    advisor: Arc<dyn RouteAdvisor>,
    sources: Vec<Box<dyn RateSource>>,
    validity_secs: u64,
}

impl QuoteService {
    pub fn new(
        store: Arc<QuoteStore>,
        advisor: Arc<dyn RouteAdvisor>,
        sources: Vec<Box<dyn RateSource>>,
        validity_secs: u64,
    ) -> Self {
        Self {
            store,
            advisor,
            sources,
            validity_secs,
        }
    }

    pub async fn create_quote(&self, request: CreateQuoteRequest) -> Result<Quote, ServiceError> {
        if request.amount == 0 {
            return Err(ServiceError::Validation(
                "amount must be positive".to_string(),
            ));
        }
        let best = rates::best_rate(&self.sources, &request.from_currency, &request.to_currency)
            .ok_or_else(|| {
                ServiceError::Validation(format!(
                    "unsupported currency pair {}->{}",
                    request.from_currency, request.to_currency
                ))
            })?;

        let recommendation = self
            .advisor
            .recommend_route(&RouteRequest {
                from_currency: request.from_currency.clone(),
                to_currency: request.to_currency.clone(),
                amount: request.amount,
            })
            .await;
        let total_fees = recommendation.fees.total();
        if total_fees >= request.amount {
            return Err(ServiceError::Validation(format!(
                "fees ({total_fees}) exceed amount ({})",
                request.amount
            )));
        }

        // The locked payout: floor((amount - fees) * rate).
        let net = request.amount - total_fees;
        let guaranteed_payout = (net as f64 * best.rate).floor() as u64;

        let created_at = Utc::now();
        let quote = Quote {
            id: Uuid::new_v4().to_string(),
            from_currency: request.from_currency,
            to_currency: request.to_currency.clone(),
            amount: request.amount,
            rate: best.rate,
            fees: recommendation.fees,
            guaranteed_payout,
            payout_currency: request.to_currency,
            rate_source: best.source.to_string(),
            created_at,
            expires_at: created_at + Duration::seconds(self.validity_secs as i64),
            valid_for_secs: self.validity_secs,
        };
        self.store.put(quote.clone());
        info!(
            quote_id = %quote.id,
            rate = quote.rate,
            rate_source = %quote.rate_source,
            guaranteed_payout,
            "quote created"
        );
        Ok(quote)
    }

    /// Absent and already-reclaimed quotes are indistinguishable here.
    pub fn get_quote(&self, quote_id: &str) -> Result<Quote, ServiceError> {
        self.store
            .get(quote_id)
            .ok_or_else(|| ServiceError::NotFound(format!("quote '{quote_id}'")))
    }
}
