//! Calculation service: parse, compute, persist.
//!
//! [`CalculationService`] is what the CRUD layer talks to.  It maps a
//! submitted form onto a typed input, runs the engine against the
//! loaded pricing tables, and hands a complete record to the storage
//! collaborator.  Edits are never patched into a stored record: the
//! edited form is recomputed from scratch and the whole record replaced.

use crate::engine::{compute_rent_with, compute_trip_cost};
use crate::error::{Error, Result};
use crate::form::{RentCalculationForm, TripCostForm};
use crate::models::{RentCalculationInput, RentCalculationRecord, TripCostInput, TripCostRecord};
use crate::rates::PricingConfig;
use crate::repository::{CalculationRepository, InMemoryRepository, StoredCalculation};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Front door for creating, editing and reading stored calculations.
///
/// Cheap to clone: the pricing tables and repositories are shared.
#[derive(Clone)]
pub struct CalculationService {
    pricing: Arc<PricingConfig>,
    trips: Arc<dyn CalculationRepository<TripCostRecord>>,
    rents: Arc<dyn CalculationRepository<RentCalculationRecord>>,
}

impl CalculationService {
    /// Service over caller-supplied repositories, e.g. a database store.
    pub fn new(
        pricing: Arc<PricingConfig>,
        trips: Arc<dyn CalculationRepository<TripCostRecord>>,
        rents: Arc<dyn CalculationRepository<RentCalculationRecord>>,
    ) -> Self {
        Self {
            pricing,
            trips,
            rents,
        }
    }

    /// Service backed by process-local repositories.
    pub fn in_memory(pricing: Arc<PricingConfig>) -> Self {
        Self::new(
            pricing,
            Arc::new(InMemoryRepository::<TripCostRecord>::new()),
            Arc::new(InMemoryRepository::<RentCalculationRecord>::new()),
        )
    }

    /// The rate table and tariff every calculation is priced against.
    pub fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }

    /// Validates and prices `form`, then stores it under a fresh id.
    ///
    /// Nothing is stored when the form is rejected.
    pub async fn create_trip_cost(&self, form: TripCostForm) -> Result<TripCostRecord> {
        let record = self.build_trip_record(Uuid::new_v4(), None, form)?;
        let record = self.trips.insert(record).await?;
        tracing::info!(id = %record.id, total_cost = %record.total_cost, "stored trip cost calculation");
        Ok(record)
    }

    /// Reprices the edited `form` and replaces record `id` with it,
    /// keeping the original `created_at`.  Fails with
    /// [`Error::NotFound`] if no such record exists.
    pub async fn update_trip_cost(&self, id: Uuid, form: TripCostForm) -> Result<TripCostRecord> {
        let existing = fetch(self.trips.as_ref(), id).await?;
        let record = self.build_trip_record(id, Some(existing.created_at), form)?;
        let record = self.trips.replace(record).await?;
        tracing::info!(id = %record.id, total_cost = %record.total_cost, "recomputed trip cost calculation");
        Ok(record)
    }

    /// Fetches one trip cost record.
    pub async fn get_trip_cost(&self, id: Uuid) -> Result<TripCostRecord> {
        fetch(self.trips.as_ref(), id).await
    }

    /// All trip cost records in storage order.
    pub async fn list_trip_costs(&self) -> Result<Vec<TripCostRecord>> {
        self.trips.list().await
    }

    /// Removes trip cost record `id`.
    pub async fn delete_trip_cost(&self, id: Uuid) -> Result<()> {
        self.trips.delete(id).await?;
        tracing::info!(%id, "deleted trip cost calculation");
        Ok(())
    }

    /// Validates and prices `form` against [`Self::pricing`], then stores
    /// it under a fresh id.
    pub async fn create_rent(&self, form: RentCalculationForm) -> Result<RentCalculationRecord> {
        let record = self.build_rent_record(Uuid::new_v4(), None, form)?;
        let record = self.rents.insert(record).await?;
        tracing::info!(id = %record.id, total_rent = %record.result.total_rent, "stored rent calculation");
        Ok(record)
    }

    /// Reprices the edited `form` and replaces record `id` with it.
    pub async fn update_rent(
        &self,
        id: Uuid,
        form: RentCalculationForm,
    ) -> Result<RentCalculationRecord> {
        let existing = fetch(self.rents.as_ref(), id).await?;
        let record = self.build_rent_record(id, Some(existing.created_at), form)?;
        let record = self.rents.replace(record).await?;
        tracing::info!(id = %record.id, total_rent = %record.result.total_rent, "recomputed rent calculation");
        Ok(record)
    }

    /// Fetches one rent calculation record.
    pub async fn get_rent(&self, id: Uuid) -> Result<RentCalculationRecord> {
        fetch(self.rents.as_ref(), id).await
    }

    /// All rent calculation records in storage order.
    pub async fn list_rents(&self) -> Result<Vec<RentCalculationRecord>> {
        self.rents.list().await
    }

    /// Removes rent calculation record `id`.
    pub async fn delete_rent(&self, id: Uuid) -> Result<()> {
        self.rents.delete(id).await?;
        tracing::info!(%id, "deleted rent calculation");
        Ok(())
    }

    fn build_trip_record(
        &self,
        id: Uuid,
        created_at: Option<chrono::DateTime<Utc>>,
        form: TripCostForm,
    ) -> Result<TripCostRecord> {
        let inquiry_id = form.inquiry_id.clone().filter(|i| !i.trim().is_empty());
        let input = TripCostInput::try_from(form)?;
        let result = compute_trip_cost(&input)?;
        let now = Utc::now();
        Ok(TripCostRecord {
            id,
            inquiry_id,
            input,
            total_cost: result.total_cost,
            created_at: created_at.unwrap_or(now),
            updated_at: now,
        })
    }

    fn build_rent_record(
        &self,
        id: Uuid,
        created_at: Option<chrono::DateTime<Utc>>,
        form: RentCalculationForm,
    ) -> Result<RentCalculationRecord> {
        let input = RentCalculationInput::try_from(form)?;
        let result = compute_rent_with(&input, &self.pricing.machine_rates, &self.pricing.tariff)?;
        let now = Utc::now();
        Ok(RentCalculationRecord {
            id,
            input,
            result,
            created_at: created_at.unwrap_or(now),
            updated_at: now,
        })
    }
}

async fn fetch<R: StoredCalculation>(repo: &dyn CalculationRepository<R>, id: Uuid) -> Result<R> {
    repo.get(id)
        .await?
        .ok_or(Error::NotFound { kind: R::KIND, id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn service() -> CalculationService {
        CalculationService::in_memory(Arc::new(PricingConfig::default()))
    }

    fn trip_form() -> TripCostForm {
        TripCostForm {
            inquiry_id: Some("INQ-1042".into()),
            distance_km: Some(85.0),
            toll_charges: Some(420.0),
            fuel_cost: Some(3100.0),
            operator_cost: Some(1500.0),
            maintenance_cost: Some(600.0),
            additional_costs: Some(0.0),
        }
    }

    fn rent_form() -> RentCalculationForm {
        RentCalculationForm {
            order_type: Some("large".into()),
            machine_type: Some("crane_model_a".into()),
            hours_per_day: Some(0.0),
            day_night: Some("day".into()),
            shift: Some("single".into()),
            sunday_working: Some("no".into()),
            usage_profile: Some("light".into()),
            deal_type: Some("no_advance".into()),
            gst_billing: Some("no_gst".into()),
            risk_factor: Some("low".into()),
            contract_days: Some(60.0),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_trip_cost_persists_total() {
        let svc = service();
        let record = svc.create_trip_cost(trip_form()).await.unwrap();
        assert_eq!(record.total_cost, dec!(5790));
        assert_eq!(record.inquiry_id.as_deref(), Some("INQ-1042"));
        assert_eq!(svc.get_trip_cost(record.id).await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_invalid_form_is_not_stored() {
        let svc = service();
        let form = TripCostForm {
            fuel_cost: Some(-1.0),
            ..trip_form()
        };
        let err = svc.create_trip_cost(form).await.unwrap_err();
        match err {
            Error::Validation(v) => assert_eq!(v.field, "fuel_cost"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(svc.list_trip_costs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_rent_recomputes_from_form() {
        let svc = service();
        let created = svc.create_rent(rent_form()).await.unwrap();
        assert_eq!(created.result.total_rent, dec!(533500));

        let edited = RentCalculationForm {
            gst_billing: Some("gst".into()),
            ..rent_form()
        };
        let updated = svc.update_rent(created.id, edited).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.result.pre_tax_total, dec!(533500));
        assert_eq!(updated.result.total_rent, dec!(629530));
        assert_eq!(svc.list_rents().await.unwrap(), vec![updated]);
    }

    #[tokio::test]
    async fn test_update_unknown_rent_is_not_found() {
        let svc = service();
        let err = svc.update_rent(Uuid::new_v4(), rent_form()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_trip_cost() {
        let svc = service();
        let record = svc.create_trip_cost(trip_form()).await.unwrap();
        svc.delete_trip_cost(record.id).await.unwrap();
        assert!(matches!(
            svc.get_trip_cost(record.id).await,
            Err(Error::NotFound { .. })
        ));
    }
}
