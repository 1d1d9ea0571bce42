use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fee components in source-currency minor units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub platform_fee: u64,
    pub inbound_fee: u64,
    pub outbound_fee: u64,
}

impl FeeBreakdown {
    pub fn total(&self) -> u64 {
        self.platform_fee + self.inbound_fee + self.outbound_fee
    }
}

/// A locked-rate offer. Immutable once created; logical expiry is the
/// caller's responsibility even before the store reclaims the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub id: String,
    pub from_currency: String,
    pub to_currency: String,
    pub amount: u64,
    pub rate: f64,
    pub fees: FeeBreakdown,
    pub guaranteed_payout: u64,
    pub payout_currency: String,
    pub rate_source: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub valid_for_secs: u64,
}

impl Quote {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuoteRequest {
    pub from_currency: String,
    pub to_currency: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateQuoteResponse {
    pub quote_id: String,
    pub rate: f64,
    pub fees: FeeBreakdown,
    pub guaranteed_payout: u64,
    pub payout_currency: String,
    pub expires_at: DateTime<Utc>,
    pub valid_for_secs: u64,
}

impl From<&Quote> for CreateQuoteResponse {
    fn from(quote: &Quote) -> Self {
        Self {
            quote_id: quote.id.clone(),
            rate: quote.rate,
            fees: quote.fees,
            guaranteed_payout: quote.guaranteed_payout,
            payout_currency: quote.payout_currency.clone(),
            expires_at: quote.expires_at,
            valid_for_secs: quote.valid_for_secs,
        }
    }
}
