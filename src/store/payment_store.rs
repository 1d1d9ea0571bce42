use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::ServiceError;
use crate::models::payment::Payment;

/// In-memory payment record store.
///
/// Two maps: the records themselves keyed by payment id, and an idempotency
/// index keyed by the client-supplied key. Creation goes through the index's
/// entry API so the uniqueness check and the reservation happen under one
/// shard lock — a lookup-then-insert would race under concurrent duplicate
/// submissions. Records are never deleted.
pub struct PaymentStore {
    payments: DashMap<String, Payment>,
    idempotency_index: DashMap<String, String>,
}

impl PaymentStore {
    pub fn new() -> Self {
        Self {
            payments: DashMap::new(),
            idempotency_index: DashMap::new(),
        }
    }

    /// Atomic conditional create: fails with `DuplicateRequest` when another
    /// record already holds the idempotency key.
    pub fn create(&self, payment: Payment) -> Result<(), ServiceError> {
        match self.idempotency_index.entry(payment.idempotency_key.clone()) {
            Entry::Occupied(_) => Err(ServiceError::DuplicateRequest(
                payment.idempotency_key.clone(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(payment.id.clone());
                self.payments.insert(payment.id.clone(), payment);
                Ok(())
            }
        }
    }

    /// Fast-path duplicate detection: the existing payment id, if any.
    pub fn find_by_idempotency_key(&self, key: &str) -> Option<String> {
        self.idempotency_index.get(key).map(|id| id.clone())
    }

    pub fn get(&self, payment_id: &str) -> Option<Payment> {
        self.payments.get(payment_id).map(|entry| entry.clone())
    }

    /// Version-checked update. The caller's copy must carry the version it
    /// was read at; a mismatch means another handler got there first and the
    /// write is rejected without touching the record.
    pub fn update(&self, mut payment: Payment) -> Result<Payment, ServiceError> {
        let mut entry = self
            .payments
            .get_mut(&payment.id)
            .ok_or_else(|| ServiceError::NotFound(format!("payment '{}'", payment.id)))?;
        if entry.version != payment.version {
            return Err(ServiceError::VersionConflict(payment.id.clone()));
        }
        payment.version += 1;
        payment.updated_at = Utc::now();
        *entry = payment.clone();
        Ok(payment)
    }

    pub fn count(&self) -> usize {
        self.payments.len()
    }
}

impl Default for PaymentStore {
    fn default() -> Self {
        Self::new()
    }
}
