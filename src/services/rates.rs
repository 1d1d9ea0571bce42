//! Exchange-rate sources. Every configured source is queried and the rate
//! most favorable to the payer (highest destination units per source unit)
//! wins.

/// A rate together with the label of the desk that quoted it.
#[derive(Debug, Clone, PartialEq)]
pub struct RateQuote {
    pub source: &'static str,
    pub rate: f64,
}

pub trait RateSource: Send + Sync {
    fn name(&self) -> &'static str;
    /// `None` when the source does not make a market in this pair.
    fn rate(&self, from_currency: &str, to_currency: &str) -> Option<f64>;
}

/// The house liquidity desk.
pub struct PrimaryDesk;

impl RateSource for PrimaryDesk {
    fn name(&self) -> &'static str {
        "primary-desk"
    }

    fn rate(&self, from_currency: &str, to_currency: &str) -> Option<f64> {
        match (from_currency, to_currency) {
            ("USD", "EUR") => Some(0.9180),
            ("USD", "GBP") => Some(0.7850),
            ("USD", "NGN") => Some(1_525.0),
            ("EUR", "USD") => Some(1.0870),
            ("GBP", "USD") => Some(1.2720),
            _ => None,
        }
    }
}

/// A partner desk with a narrower book but occasionally better pricing.
pub struct PartnerDesk;

impl RateSource for PartnerDesk {
    fn name(&self) -> &'static str {
        "partner-desk"
    }

    fn rate(&self, from_currency: &str, to_currency: &str) -> Option<f64> {
        match (from_currency, to_currency) {
            ("USD", "EUR") => Some(0.9205),
            ("USD", "NGN") => Some(1_518.5),
            ("EUR", "USD") => Some(1.0845),
            _ => None,
        }
    }
}

pub fn default_sources() -> Vec<Box<dyn RateSource>> {
    vec![Box::new(PrimaryDesk), Box::new(PartnerDesk)]
}

/// Best available rate across sources, or `None` for an unsupported pair.
pub fn best_rate(
    sources: &[Box<dyn RateSource>],
    from_currency: &str,
    to_currency: &str,
) -> Option<RateQuote> {
    sources
        .iter()
        .filter_map(|source| {
            source
                .rate(from_currency, to_currency)
                .map(|rate| RateQuote {
                    source: source.name(),
                    rate,
                })
        })
        .max_by(|a, b| a.rate.total_cmp(&b.rate))
}
