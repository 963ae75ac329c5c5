//! Storage collaborator for calculation records.
//!
//! The engine never touches storage.  Callers persist each computed
//! record through a [`CalculationRepository`]; one generic trait serves
//! both record kinds.  [`InMemoryRepository`] is the implementation the
//! binary ships with.  A database-backed store implements the same trait.

use crate::error::{Error, Result};
use crate::models::{RentCalculationRecord, TripCostRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A record that can be kept by a [`CalculationRepository`].
pub trait StoredCalculation: Clone + Send + Sync + 'static {
    /// Human-readable kind, used in `NotFound` errors and logs.
    const KIND: &'static str;

    fn id(&self) -> Uuid;
}

impl StoredCalculation for TripCostRecord {
    const KIND: &'static str = "trip cost calculation";

    fn id(&self) -> Uuid {
        self.id
    }
}

impl StoredCalculation for RentCalculationRecord {
    const KIND: &'static str = "rent calculation";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Trait for calculation record storage.
///
/// Records are written whole.  `replace` swaps the complete stored
/// record for a freshly computed one and fails with
/// [`Error::NotFound`] if the id is unknown.
#[async_trait]
pub trait CalculationRepository<R: StoredCalculation>: Send + Sync {
    async fn insert(&self, record: R) -> Result<R>;
    async fn replace(&self, record: R) -> Result<R>;
    async fn get(&self, id: Uuid) -> Result<Option<R>>;
    async fn list(&self) -> Result<Vec<R>>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Process-local repository backed by a map.
///
/// Listing returns records in insertion order.
pub struct InMemoryRepository<R> {
    inner: RwLock<Store<R>>,
}

struct Store<R> {
    records: HashMap<Uuid, R>,
    order: Vec<Uuid>,
}

impl<R> InMemoryRepository<R> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Store {
                records: HashMap::new(),
                order: Vec::new(),
            }),
        }
    }
}

impl<R> Default for InMemoryRepository<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: StoredCalculation> CalculationRepository<R> for InMemoryRepository<R> {
    async fn insert(&self, record: R) -> Result<R> {
        let id = record.id();
        let mut store = self.inner.write().await;
        if store.records.contains_key(&id) {
            return Err(Error::Storage(format!("{} {id} already exists", R::KIND)));
        }
        store.records.insert(id, record.clone());
        store.order.push(id);
        Ok(record)
    }

    async fn replace(&self, record: R) -> Result<R> {
        let id = record.id();
        let mut store = self.inner.write().await;
        match store.records.get_mut(&id) {
            Some(slot) => {
                *slot = record.clone();
                Ok(record)
            }
            None => Err(Error::NotFound { kind: R::KIND, id }),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<R>> {
        Ok(self.inner.read().await.records.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<R>> {
        let store = self.inner.read().await;
        Ok(store
            .order
            .iter()
            .filter_map(|id| store.records.get(id).cloned())
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut store = self.inner.write().await;
        if store.records.remove(&id).is_none() {
            return Err(Error::NotFound { kind: R::KIND, id });
        }
        store.order.retain(|existing| *existing != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TripCostInput;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn record(total: Decimal) -> TripCostRecord {
        let now = Utc::now();
        TripCostRecord {
            id: Uuid::new_v4(),
            inquiry_id: None,
            input: TripCostInput {
                distance_km: Decimal::ZERO,
                toll_charges: Decimal::ZERO,
                fuel_cost: total,
                operator_cost: Decimal::ZERO,
                maintenance_cost: Decimal::ZERO,
                additional_costs: Decimal::ZERO,
            },
            total_cost: total,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_then_list_in_order() {
        let repo: InMemoryRepository<TripCostRecord> = InMemoryRepository::new();
        let first = repo.insert(record(dec!(1))).await.unwrap();
        let second = repo.insert(record(dec!(2))).await.unwrap();
        let listed = repo.list().await.unwrap();
        assert_eq!(listed, vec![first, second]);
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_rejected() {
        let repo: InMemoryRepository<TripCostRecord> = InMemoryRepository::new();
        let rec = record(dec!(1));
        repo.insert(rec.clone()).await.unwrap();
        assert!(matches!(repo.insert(rec).await, Err(Error::Storage(_))));
    }

    #[tokio::test]
    async fn test_replace_unknown_id_is_not_found() {
        let repo: InMemoryRepository<TripCostRecord> = InMemoryRepository::new();
        let result = repo.replace(record(dec!(1))).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_replace_swaps_whole_record() {
        let repo: InMemoryRepository<TripCostRecord> = InMemoryRepository::new();
        let original = repo.insert(record(dec!(1))).await.unwrap();
        let updated = TripCostRecord {
            total_cost: dec!(99),
            ..original.clone()
        };
        repo.replace(updated.clone()).await.unwrap();
        assert_eq!(repo.get(original.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let repo: InMemoryRepository<TripCostRecord> = InMemoryRepository::new();
        let rec = repo.insert(record(dec!(1))).await.unwrap();
        repo.delete(rec.id).await.unwrap();
        assert_eq!(repo.get(rec.id).await.unwrap(), None);
        assert!(repo.list().await.unwrap().is_empty());
        assert!(matches!(
            repo.delete(rec.id).await,
            Err(Error::NotFound { .. })
        ));
    }
}
