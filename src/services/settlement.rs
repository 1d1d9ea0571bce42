//! Settlement leg providers. The simulator stands in for a real conversion
//! partner: transfers stay pending for a randomized number of status polls
//! before settling, and a small slice fail at initiation or at settlement.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Settled,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct Transfer {
    pub id: String,
    pub status: TransferStatus,
    pub amount: u64,
    pub currency: String,
    pub poll_count: u32,
    /// Fixed at creation; the transfer resolves exactly when `poll_count`
    /// reaches this.
    pub settle_after_polls: u32,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

/// One settlement leg. Swappable for a real integration without touching
/// the orchestrator.
#[async_trait]
pub trait SettlementProvider: Send + Sync {
    /// Starts a transfer and returns its id, or `LegInitiation` when the
    /// provider rejects it outright.
    async fn initiate_transfer(&self, amount: u64, currency: &str) -> Result<String, ServiceError>;

    /// One status check. Each call advances the provider's view by exactly
    /// one poll.
    async fn get_status(&self, transfer_id: &str) -> Result<TransferStatus, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub initiation_failure_rate: f64,
    pub settlement_failure_rate: f64,
    pub min_settle_polls: u32,
    pub max_settle_polls: u32,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            initiation_failure_rate: 0.05,
            settlement_failure_rate: 0.03,
            min_settle_polls: 2,
            max_settle_polls: 4,
        }
    }
}

impl SimulatorConfig {
    /// No random failures, fixed poll threshold. Used by tests.
    pub fn deterministic(settle_after_polls: u32) -> Self {
        Self {
            initiation_failure_rate: 0.0,
            settlement_failure_rate: 0.0,
            min_settle_polls: settle_after_polls,
            max_settle_polls: settle_after_polls,
        }
    }
}

pub struct SettlementSimulator {
    name: &'static str,
    config: SimulatorConfig,
    // Single writer per mutation: poll-count increments and status flips
    // both happen under the write lock. Transfers are never removed.
    transfers: RwLock<HashMap<String, Transfer>>,
}

impl SettlementSimulator {
    pub fn new(name: &'static str, config: SimulatorConfig) -> Self {
        Self {
            name,
            config,
            transfers: RwLock::new(HashMap::new()),
        }
    }

    /// Read-only snapshot, mainly for diagnostics and tests.
    pub fn transfer(&self, transfer_id: &str) -> Option<Transfer> {
        self.transfers.read().get(transfer_id).cloned()
    }
}

#[async_trait]
impl SettlementProvider for SettlementSimulator {
    async fn initiate_transfer(&self, amount: u64, currency: &str) -> Result<String, ServiceError> {
        if rand::thread_rng().gen_bool(self.config.initiation_failure_rate) {
            warn!(leg = self.name, amount, currency, "provider rejected transfer");
            return Err(ServiceError::LegInitiation(format!(
                "{} provider rejected the transfer",
                self.name
            )));
        }

        let settle_after_polls = rand::thread_rng()
            .gen_range(self.config.min_settle_polls..=self.config.max_settle_polls);
        let transfer = Transfer {
            id: Uuid::new_v4().to_string(),
            status: TransferStatus::Pending,
            amount,
            currency: currency.to_string(),
            poll_count: 0,
            settle_after_polls,
            created_at: Utc::now(),
            settled_at: None,
        };
        let id = transfer.id.clone();
        self.transfers.write().insert(id.clone(), transfer);
        info!(
            leg = self.name,
            transfer_id = %id,
            amount,
            currency,
            settle_after_polls,
            "transfer initiated"
        );
        Ok(id)
    }

    async fn get_status(&self, transfer_id: &str) -> Result<TransferStatus, ServiceError> {
        let mut transfers = self.transfers.write();
        let transfer = transfers.get_mut(transfer_id).ok_or_else(|| {
            ServiceError::NotFound(format!("transfer '{transfer_id}' on {} leg", self.name))
        })?;

        if transfer.status != TransferStatus::Pending {
            return Ok(transfer.status);
        }

        transfer.poll_count += 1;
        if transfer.poll_count >= transfer.settle_after_polls {
            let failed = rand::thread_rng().gen_bool(self.config.settlement_failure_rate);
            transfer.status = if failed {
                TransferStatus::Failed
            } else {
                TransferStatus::Settled
            };
            transfer.settled_at = Some(Utc::now());
            info!(
                leg = self.name,
                transfer_id,
                polls = transfer.poll_count,
                status = ?transfer.status,
                "transfer resolved"
            );
        }
        Ok(transfer.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn settles_exactly_at_the_poll_threshold() {
        let sim = SettlementSimulator::new("inbound", SimulatorConfig::deterministic(3));
        let id = sim.initiate_transfer(100_000, "USD").await.unwrap();

        assert_eq!(sim.get_status(&id).await.unwrap(), TransferStatus::Pending);
        assert_eq!(sim.get_status(&id).await.unwrap(), TransferStatus::Pending);
        assert_eq!(sim.get_status(&id).await.unwrap(), TransferStatus::Settled);

        let transfer = sim.transfer(&id).unwrap();
        assert_eq!(transfer.poll_count, 3);
        assert!(transfer.settled_at.is_some());
    }

    #[tokio::test]
    async fn status_never_reverts_and_polls_stop_counting_after_settlement() {
        let sim = SettlementSimulator::new("inbound", SimulatorConfig::deterministic(2));
        let id = sim.initiate_transfer(5_000, "USD").await.unwrap();

        sim.get_status(&id).await.unwrap();
        sim.get_status(&id).await.unwrap();
        assert_eq!(sim.get_status(&id).await.unwrap(), TransferStatus::Settled);
        assert_eq!(sim.transfer(&id).unwrap().poll_count, 2);
    }

    #[tokio::test]
    async fn unknown_transfer_is_not_found() {
        let sim = SettlementSimulator::new("outbound", SimulatorConfig::default());
        let err = sim.get_status("missing").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn certain_initiation_failure_is_a_leg_error() {
        let config = SimulatorConfig {
            initiation_failure_rate: 1.0,
            ..SimulatorConfig::default()
        };
        let sim = SettlementSimulator::new("inbound", config);
        let err = sim.initiate_transfer(100, "USD").await.unwrap_err();
        assert!(matches!(err, ServiceError::LegInitiation(_)));
    }

    #[tokio::test]
    async fn certain_settlement_failure_resolves_to_failed() {
        let config = SimulatorConfig {
            initiation_failure_rate: 0.0,
            settlement_failure_rate: 1.0,
            min_settle_polls: 1,
            max_settle_polls: 1,
        };
        let sim = SettlementSimulator::new("outbound", config);
        let id = sim.initiate_transfer(100, "EUR").await.unwrap();
        assert_eq!(sim.get_status(&id).await.unwrap(), TransferStatus::Failed);
        // A later poll reports the same terminal status.
        assert_eq!(sim.get_status(&id).await.unwrap(), TransferStatus::Failed);
    }
}
