use thiserror::Error;

/// Error taxonomy for the whole service.
///
/// The split that matters operationally: `LegInitiation` and `LegSettlement`
/// are expected terminal outcomes recorded on the payment itself, while
/// `VersionConflict` and `Infrastructure` are faults of our own plumbing and
/// must never mutate payment state — the continuation message is simply
/// retried from the state already persisted.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("duplicate request: idempotency key '{0}' already used")]
    DuplicateRequest(String),

    #[error("quote '{0}' has expired or does not exist")]
    QuoteExpired(String),

    #[error("quote mismatch: {0}")]
    QuoteMismatch(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("leg initiation failed: {0}")]
    LegInitiation(String),

    #[error("leg settlement failed: {0}")]
    LegSettlement(String),

    #[error("concurrent update detected for payment '{0}'")]
    VersionConflict(String),

    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl ServiceError {
    /// Whether redelivering the triggering message may succeed. Only faults
    /// that left state untouched qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::VersionConflict(_) | ServiceError::Infrastructure(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_operational_faults_are_retryable() {
        assert!(ServiceError::Infrastructure("queue closed".into()).is_retryable());
        assert!(ServiceError::VersionConflict("p1".into()).is_retryable());
        assert!(!ServiceError::LegInitiation("rejected".into()).is_retryable());
        assert!(!ServiceError::LegSettlement("failed at threshold".into()).is_retryable());
        assert!(!ServiceError::DuplicateRequest("k1".into()).is_retryable());
        assert!(!ServiceError::Validation("bad amount".into()).is_retryable());
    }

    #[test]
    fn display_carries_the_detail() {
        let e = ServiceError::QuoteExpired("q-123".into());
        assert_eq!(e.to_string(), "quote 'q-123' has expired or does not exist");
    }
}
