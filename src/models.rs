//! Data models for the Rent Engine.
//!
//! The `models` module defines the typed inputs and outputs of the two
//! calculators, the enums describing a rental request, and the records
//! handed to the storage collaborator.  All amounts are
//! [`rust_decimal::Decimal`] so that totals are exact and repeatable.
//! These types derive `Serialize` and `Deserialize` so that they can be
//! persisted or transmitted over a network as-is.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inputs of a trip (transport) cost calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripCostInput {
    /// One-way distance to site.  Billed twice to model the return leg.
    pub distance_km: Decimal,
    pub toll_charges: Decimal,
    pub fuel_cost: Decimal,
    pub operator_cost: Decimal,
    pub maintenance_cost: Decimal,
    pub additional_costs: Decimal,
}

/// Output of [`crate::engine::compute_trip_cost`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripCostResult {
    pub total_cost: Decimal,
}

/// Contract size classification.  Selects the H3 duration branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Micro,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayNight {
    Day,
    Night,
}

/// Number of shifts worked per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shift {
    Single,
    Double,
}

impl Shift {
    /// Multiplier applied to the duration factor.
    pub fn factor(self) -> u32 {
        match self {
            Shift::Single => 1,
            Shift::Double => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SundayWorking {
    Yes,
    No,
}

/// How hard the machine will be worked.  Keys the usage surcharge (H5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageProfile {
    Heavy,
    Light,
}

/// Payment terms of the deal.  Informational: only the accompanying
/// `deal_extra_charge` is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealType {
    NoAdvance,
    Credit,
    LongCredit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GstBilling {
    Gst,
    NoGst,
}

/// Risk classification of the job site.  Keys the risk surcharge (H9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    High,
    Medium,
    Low,
}

/// Reason for the "other factors" charge (H11).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtherFactorType {
    Area,
    Condition,
    CustomerReputation,
    #[default]
    None,
}

/// A fully typed rental request.
///
/// Build one from a raw submission with
/// [`RentCalculationForm`](crate::form::RentCalculationForm) or construct
/// it directly; [`crate::engine::compute_rent`] re-checks the amounts
/// either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentCalculationInput {
    pub order_type: OrderType,
    /// Key into the machine rate table.  Unknown keys price at the
    /// `default` rate.
    pub machine_type: String,
    pub hours_per_day: Decimal,
    pub day_night: DayNight,
    pub shift: Shift,
    pub sunday_working: SundayWorking,
    pub food_resource_count: Decimal,
    pub food_cost_per_resource: Decimal,
    pub accommodation_resource_count: Decimal,
    pub accommodation_cost_per_resource: Decimal,
    pub usage_profile: UsageProfile,
    // Mobilization group (H6).  Recorded but never summed into the total.
    pub site_distance_km: Decimal,
    pub trailer_cost: Decimal,
    pub mob_demob_relaxation: Decimal,
    pub deal_type: DealType,
    pub deal_extra_charge: Decimal,
    pub gst_billing: GstBilling,
    pub risk_factor: RiskFactor,
    pub incidental_charges: Decimal,
    pub other_factor_type: OtherFactorType,
    pub other_factor_charges: Decimal,
    /// Length of the contract in days; at least 1.
    pub contract_days: u32,
}

/// Named sub-components of the rent tariff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentComponents {
    /// Base rate of the machine.
    pub h2: Decimal,
    /// Duration factor.
    pub h3: Decimal,
    /// Food and accommodation.
    pub h4: Decimal,
    /// Usage surcharge.
    pub h5: Decimal,
    /// H2 x H3 (P15).
    pub working_cost: Decimal,
    /// Uplift on working cost (P16).  Folded into H7, not summed itself.
    pub elongation: Decimal,
    /// Fuel cost: working cost plus elongation.
    pub h7: Decimal,
    /// Commercial charge.
    pub h8: Decimal,
    /// Risk surcharge.
    pub h9: Decimal,
    /// Incidental charges.
    pub h10: Decimal,
    /// Other factors charge.
    pub h11: Decimal,
}

/// Output of [`crate::engine::compute_rent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentCalculationResult {
    pub total_rent: Decimal,
    pub pre_tax_total: Decimal,
    pub components: RentComponents,
    /// True when the machine type was missing from the rate table and
    /// H2 was taken from the `default` entry.
    pub used_default_rate: bool,
}

/// A stored trip cost calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripCostRecord {
    pub id: Uuid,
    /// Inquiry this trip was costed for, if any.
    pub inquiry_id: Option<String>,
    #[serde(flatten)]
    pub input: TripCostInput,
    pub total_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored rent calculation: the input that produced it and the full
/// component breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentCalculationRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub input: RentCalculationInput,
    #[serde(flatten)]
    pub result: RentCalculationResult,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
