use chrono::{Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::models::quote::Quote;

/// Grace period between logical expiry and reclaim, so a caller holding a
/// just-expired id still gets a precise rejection instead of a bare miss.
const RECLAIM_GRACE_SECS: i64 = 300;

/// Expiration-aware quote store. Reads reclaim lazily; `purge_expired` is
/// run periodically from a background task for quotes nobody reads again.
pub struct QuoteStore {
    quotes: DashMap<String, Quote>,
}

impl QuoteStore {
    pub fn new() -> Self {
        Self {
            quotes: DashMap::new(),
        }
    }

    pub fn put(&self, quote: Quote) {
        self.quotes.insert(quote.id.clone(), quote);
    }

    /// `None` covers both "never existed" and "expired and reclaimed".
    pub fn get(&self, quote_id: &str) -> Option<Quote> {
        let reclaim = match self.quotes.get(quote_id) {
            None => return None,
            Some(entry) => {
                let cutoff = entry.expires_at + Duration::seconds(RECLAIM_GRACE_SECS);
                if Utc::now() > cutoff {
                    true
                } else {
                    return Some(entry.clone());
                }
            }
        };
        if reclaim {
            self.quotes.remove(quote_id);
            debug!(quote_id, "reclaimed expired quote on read");
        }
        None
    }

    /// Sweeps quotes past their reclaim cutoff. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let cutoff = Utc::now() - Duration::seconds(RECLAIM_GRACE_SECS);
        let before = self.quotes.len();
        self.quotes.retain(|_, quote| quote.expires_at >= cutoff);
        before - self.quotes.len()
    }

    pub fn count(&self) -> usize {
        self.quotes.len()
    }
}

impl Default for QuoteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quote::FeeBreakdown;

    fn quote(id: &str, expires_offset_secs: i64) -> Quote {
        let now = Utc::now();
        Quote {
            id: id.to_string(),
            from_currency: "USD".to_string(),
            to_currency: "EUR".to_string(),
            amount: 100_000,
            rate: 0.92,
            fees: FeeBreakdown {
                platform_fee: 1_000,
                inbound_fee: 500,
                outbound_fee: 300,
            },
            guaranteed_payout: 90_344,
            payout_currency: "EUR".to_string(),
            rate_source: "primary-desk".to_string(),
            created_at: now + Duration::seconds(expires_offset_secs - 60),
            expires_at: now + Duration::seconds(expires_offset_secs),
            valid_for_secs: 60,
        }
    }

    #[test]
    fn live_quote_round_trips() {
        let store = QuoteStore::new();
        store.put(quote("q1", 60));
        assert_eq!(store.get("q1").unwrap().id, "q1");
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn reads_reclaim_quotes_past_the_grace_window() {
        let store = QuoteStore::new();
        store.put(quote("q2", -(RECLAIM_GRACE_SECS + 10)));
        assert!(store.get("q2").is_none());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn expired_but_within_grace_is_still_readable() {
        // Logical expiry is the caller's check; the store only reclaims.
        let store = QuoteStore::new();
        store.put(quote("q3", -10));
        let got = store.get("q3").unwrap();
        assert!(got.is_expired(Utc::now()));
    }

    #[test]
    fn purge_removes_only_reclaimable_quotes() {
        let store = QuoteStore::new();
        store.put(quote("live", 60));
        store.put(quote("dead", -(RECLAIM_GRACE_SECS + 10)));
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.count(), 1);
        assert!(store.get("live").is_some());
    }
}
