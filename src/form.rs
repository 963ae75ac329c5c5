//! Mapping from raw form submissions to typed calculator inputs.
//!
//! Forms arrive with every field optional: numbers as `f64` and choices
//! as free strings.  Each form maps onto its typed input field by field
//! through `TryFrom`, so a failure always names exactly one field.
//! Column names used by the older CRM records (`p1_order_type`,
//! `p2_type_of_machine`, ...) are accepted as aliases.

use crate::error::ValidationError;
use crate::models::{
    DayNight, DealType, GstBilling, OrderType, OtherFactorType, RentCalculationInput, RiskFactor,
    Shift, SundayWorking, TripCostInput, UsageProfile,
};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A raw trip cost submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripCostForm {
    pub inquiry_id: Option<String>,
    pub distance_km: Option<f64>,
    pub toll_charges: Option<f64>,
    pub fuel_cost: Option<f64>,
    pub operator_cost: Option<f64>,
    pub maintenance_cost: Option<f64>,
    pub additional_costs: Option<f64>,
}

impl TryFrom<TripCostForm> for TripCostInput {
    type Error = ValidationError;

    fn try_from(form: TripCostForm) -> Result<Self, Self::Error> {
        Ok(TripCostInput {
            distance_km: required_amount("distance_km", form.distance_km)?,
            toll_charges: required_amount("toll_charges", form.toll_charges)?,
            fuel_cost: required_amount("fuel_cost", form.fuel_cost)?,
            operator_cost: required_amount("operator_cost", form.operator_cost)?,
            maintenance_cost: required_amount("maintenance_cost", form.maintenance_cost)?,
            additional_costs: required_amount("additional_costs", form.additional_costs)?,
        })
    }
}

/// A raw rent calculation submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RentCalculationForm {
    #[serde(alias = "p1_order_type")]
    pub order_type: Option<String>,
    #[serde(alias = "p2_type_of_machine")]
    pub machine_type: Option<String>,
    #[serde(alias = "p3_no_of_hours_working")]
    pub hours_per_day: Option<f64>,
    #[serde(alias = "p4_day_night")]
    pub day_night: Option<String>,
    #[serde(alias = "p5_shift")]
    pub shift: Option<String>,
    #[serde(alias = "p6_sunday_working")]
    pub sunday_working: Option<String>,
    #[serde(alias = "p7_food_resources")]
    pub food_resource_count: Option<f64>,
    #[serde(alias = "p7_food_cost_per_resource")]
    pub food_cost_per_resource: Option<f64>,
    #[serde(alias = "p10_accommodation_resources")]
    pub accommodation_resource_count: Option<f64>,
    #[serde(alias = "p10_accommodation_cost_per_resource")]
    pub accommodation_cost_per_resource: Option<f64>,
    #[serde(alias = "p11_usage")]
    pub usage_profile: Option<String>,
    #[serde(alias = "p12_distance_of_site")]
    pub site_distance_km: Option<f64>,
    #[serde(alias = "p13_trailer_cost")]
    pub trailer_cost: Option<f64>,
    #[serde(alias = "p14_mob_relaxation_given")]
    pub mob_demob_relaxation: Option<f64>,
    #[serde(alias = "p17_type_of_deal")]
    pub deal_type: Option<String>,
    #[serde(alias = "p18_extra_charge_for_p17")]
    pub deal_extra_charge: Option<f64>,
    #[serde(alias = "billing_gst")]
    pub gst_billing: Option<String>,
    #[serde(alias = "p19_risk_factor")]
    pub risk_factor: Option<String>,
    #[serde(alias = "p20_incidental_charges")]
    pub incidental_charges: Option<f64>,
    #[serde(alias = "p21_other_factors")]
    pub other_factor_type: Option<String>,
    #[serde(alias = "p22_charges_for_other_factors")]
    pub other_factor_charges: Option<f64>,
    pub contract_days: Option<f64>,
}

impl TryFrom<RentCalculationForm> for RentCalculationInput {
    type Error = ValidationError;

    fn try_from(form: RentCalculationForm) -> Result<Self, Self::Error> {
        let machine_type = form
            .machine_type
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .ok_or_else(|| ValidationError::required("machine_type"))?;

        Ok(RentCalculationInput {
            order_type: required_choice("order_type", form.order_type)?,
            machine_type,
            hours_per_day: required_amount("hours_per_day", form.hours_per_day)?,
            day_night: required_choice("day_night", form.day_night)?,
            shift: required_choice("shift", form.shift)?,
            sunday_working: required_choice("sunday_working", form.sunday_working)?,
            food_resource_count: optional_amount("food_resource_count", form.food_resource_count)?,
            food_cost_per_resource: optional_amount(
                "food_cost_per_resource",
                form.food_cost_per_resource,
            )?,
            accommodation_resource_count: optional_amount(
                "accommodation_resource_count",
                form.accommodation_resource_count,
            )?,
            accommodation_cost_per_resource: optional_amount(
                "accommodation_cost_per_resource",
                form.accommodation_cost_per_resource,
            )?,
            usage_profile: required_choice("usage_profile", form.usage_profile)?,
            site_distance_km: optional_amount("site_distance_km", form.site_distance_km)?,
            trailer_cost: optional_amount("trailer_cost", form.trailer_cost)?,
            mob_demob_relaxation: optional_amount(
                "mob_demob_relaxation",
                form.mob_demob_relaxation,
            )?,
            deal_type: required_choice("deal_type", form.deal_type)?,
            deal_extra_charge: optional_amount("deal_extra_charge", form.deal_extra_charge)?,
            gst_billing: required_choice("gst_billing", form.gst_billing)?,
            risk_factor: required_choice("risk_factor", form.risk_factor)?,
            incidental_charges: optional_amount("incidental_charges", form.incidental_charges)?,
            other_factor_type: match form.other_factor_type {
                Some(raw) => parse_choice("other_factor_type", &raw)?,
                None => OtherFactorType::None,
            },
            other_factor_charges: optional_amount(
                "other_factor_charges",
                form.other_factor_charges,
            )?,
            contract_days: contract_days(form.contract_days)?,
        })
    }
}

/// A closed set of string choices on a form.
trait Choice: Sized + Copy + 'static {
    const CHOICES: &'static [(&'static str, Self)];
}

impl Choice for OrderType {
    const CHOICES: &'static [(&'static str, Self)] =
        &[("micro", OrderType::Micro), ("large", OrderType::Large)];
}

impl Choice for DayNight {
    const CHOICES: &'static [(&'static str, Self)] =
        &[("day", DayNight::Day), ("night", DayNight::Night)];
}

impl Choice for Shift {
    const CHOICES: &'static [(&'static str, Self)] =
        &[("single", Shift::Single), ("double", Shift::Double)];
}

impl Choice for SundayWorking {
    const CHOICES: &'static [(&'static str, Self)] =
        &[("yes", SundayWorking::Yes), ("no", SundayWorking::No)];
}

impl Choice for UsageProfile {
    const CHOICES: &'static [(&'static str, Self)] =
        &[("heavy", UsageProfile::Heavy), ("light", UsageProfile::Light)];
}

impl Choice for DealType {
    const CHOICES: &'static [(&'static str, Self)] = &[
        ("no_advance", DealType::NoAdvance),
        ("credit", DealType::Credit),
        ("long_credit", DealType::LongCredit),
    ];
}

impl Choice for GstBilling {
    const CHOICES: &'static [(&'static str, Self)] =
        &[("gst", GstBilling::Gst), ("no_gst", GstBilling::NoGst)];
}

impl Choice for RiskFactor {
    const CHOICES: &'static [(&'static str, Self)] = &[
        ("high", RiskFactor::High),
        ("medium", RiskFactor::Medium),
        ("low", RiskFactor::Low),
    ];
}

impl Choice for OtherFactorType {
    // The CRM stores "no other factor" as an empty string.
    const CHOICES: &'static [(&'static str, Self)] = &[
        ("area", OtherFactorType::Area),
        ("condition", OtherFactorType::Condition),
        ("customer_reputation", OtherFactorType::CustomerReputation),
        ("none", OtherFactorType::None),
        ("", OtherFactorType::None),
    ];
}

fn parse_choice<T: Choice>(field: &str, raw: &str) -> Result<T, ValidationError> {
    let wanted = raw.trim();
    T::CHOICES
        .iter()
        .find(|(name, _)| *name == wanted)
        .map(|(_, value)| *value)
        .ok_or_else(|| {
            let names: Vec<&str> = T::CHOICES
                .iter()
                .map(|(name, _)| *name)
                .filter(|name| !name.is_empty())
                .collect();
            ValidationError::new(field, format!("must be one of: {}", names.join(", ")))
        })
}

fn required_choice<T: Choice>(field: &str, raw: Option<String>) -> Result<T, ValidationError> {
    match raw {
        Some(raw) => parse_choice(field, &raw),
        None => Err(ValidationError::required(field)),
    }
}

fn amount(field: &str, value: f64) -> Result<Decimal, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::new(field, "must be a finite number"));
    }
    if value < 0.0 {
        return Err(ValidationError::negative(field));
    }
    Decimal::from_f64(value)
        .ok_or_else(|| ValidationError::new(field, "is out of the supported range"))
}

fn required_amount(field: &str, value: Option<f64>) -> Result<Decimal, ValidationError> {
    value
        .ok_or_else(|| ValidationError::required(field))
        .and_then(|v| amount(field, v))
}

fn optional_amount(field: &str, value: Option<f64>) -> Result<Decimal, ValidationError> {
    value.map_or(Ok(Decimal::ZERO), |v| amount(field, v))
}

fn contract_days(value: Option<f64>) -> Result<u32, ValidationError> {
    let Some(days) = value else {
        return Ok(1);
    };
    if !days.is_finite() || days < 1.0 || days.fract() != 0.0 || days > f64::from(u32::MAX) {
        return Err(ValidationError::new(
            "contract_days",
            "must be a positive whole number",
        ));
    }
    Ok(days as u32)
}
