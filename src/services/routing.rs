//! Pluggable fee/routing advisor. The remote advisor is best-effort: any
//! failure falls back to the deterministic static recommendation, so quote
//! generation never depends on the advisor endpoint being up.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::quote::FeeBreakdown;
use crate::services::fees;

#[derive(Debug, Clone, Serialize)]
pub struct RouteRequest {
    pub from_currency: String,
    pub to_currency: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRecommendation {
    pub fees: FeeBreakdown,
    pub chain: Vec<String>,
    pub reasoning: String,
}

#[async_trait]
pub trait RouteAdvisor: Send + Sync {
    async fn recommend_route(&self, request: &RouteRequest) -> RouteRecommendation;
}

/// Deterministic fallback: tiered fee schedule, single-hop stablecoin chain.
pub struct StaticRouteAdvisor;

#[async_trait]
impl RouteAdvisor for StaticRouteAdvisor {
    async fn recommend_route(&self, request: &RouteRequest) -> RouteRecommendation {
        RouteRecommendation {
            fees: fees::estimate_fees(request.amount),
            chain: vec![
                request.from_currency.clone(),
                "USDC".to_string(),
                request.to_currency.clone(),
            ],
            reasoning: "static tiered fee schedule".to_string(),
        }
    }
}

/// Calls an external advisory endpoint with a short timeout. Anything other
/// than a well-formed 2xx answer falls back to `StaticRouteAdvisor`.
pub struct RemoteRouteAdvisor {
    client: reqwest::Client,
    url: String,
    fallback: StaticRouteAdvisor,
}

impl RemoteRouteAdvisor {
    pub fn new(url: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(2_000))
            .build()?;
        Ok(Self {
            client,
            url,
            fallback: StaticRouteAdvisor,
        })
    }

    async fn try_remote(&self, request: &RouteRequest) -> Result<RouteRecommendation, reqwest::Error> {
        let response = self
            .client
            .post(format!("{}/recommend", self.url))
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        response.json::<RouteRecommendation>().await
    }
}

#[async_trait]
impl RouteAdvisor for RemoteRouteAdvisor {
    async fn recommend_route(&self, request: &RouteRequest) -> RouteRecommendation {
        match self.try_remote(request).await {
            Ok(recommendation) => {
                info!(
                    from = %request.from_currency,
                    to = %request.to_currency,
                    chain = ?recommendation.chain,
                    "using remote route recommendation"
                );
                recommendation
            }
            Err(e) => {
                warn!("route advisor unavailable, using static fallback: {e}");
                self.fallback.recommend_route(request).await
            }
        }
    }
}
