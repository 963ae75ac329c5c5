//! Pricing computation engine.
//!
//! The `engine` module turns a [`TripCostInput`] into a
//! [`TripCostResult`] and a [`RentCalculationInput`] into a
//! [`RentCalculationResult`].  Every function here is pure: the only
//! shared data is a read-only [`MachineRateTable`] and [`Tariff`], so
//! calls may run concurrently without coordination.  Batches are spread
//! across CPU cores with [`rayon`].

use crate::error::ValidationError;
use crate::models::{
    GstBilling, OrderType, RentCalculationInput, RentCalculationResult, RentComponents,
    TripCostInput, TripCostResult,
};
use crate::rates::{MachineRateTable, Tariff};
use rayon::prelude::*;
use rust_decimal::Decimal;

/// Distance is billed both ways.
const ROUND_TRIP_FACTOR: u32 = 2;

/// Contracts longer than this many days are billed in monthly blocks
/// when the order is large.
const MONTHLY_BILLING_THRESHOLD_DAYS: u32 = 30;
const DAYS_PER_BILLING_MONTH: u32 = 30;
const WORKING_DAYS_PER_MONTH: u32 = 26;
const HOURLY_BILLING_MULTIPLIER: u32 = 10;

/// Computes the cost of moving a machine to site and back.
///
/// An amount large enough to overflow the total is rejected against the
/// field that pushed it over.
pub fn compute_trip_cost(input: &TripCostInput) -> Result<TripCostResult, ValidationError> {
    non_negative("distance_km", input.distance_km)?;
    non_negative("toll_charges", input.toll_charges)?;
    non_negative("fuel_cost", input.fuel_cost)?;
    non_negative("operator_cost", input.operator_cost)?;
    non_negative("maintenance_cost", input.maintenance_cost)?;
    non_negative("additional_costs", input.additional_costs)?;

    let travel = checked(
        "distance_km",
        Decimal::from(ROUND_TRIP_FACTOR).checked_mul(input.distance_km),
    )?;
    let total_cost = checked_sum(
        travel,
        [
            ("toll_charges", input.toll_charges),
            ("fuel_cost", input.fuel_cost),
            ("operator_cost", input.operator_cost),
            ("maintenance_cost", input.maintenance_cost),
            ("additional_costs", input.additional_costs),
        ],
    )?;
    tracing::debug!(%total_cost, "computed trip cost");
    Ok(TripCostResult { total_cost })
}

/// Computes the rent for `input` using the standard [`Tariff`].
pub fn compute_rent(
    input: &RentCalculationInput,
    rates: &MachineRateTable,
) -> Result<RentCalculationResult, ValidationError> {
    compute_rent_with(input, rates, &Tariff::standard())
}

/// Computes the rent for `input` using an explicit tariff.
///
/// The pre-tax total is `working_cost + H4 + H5 + H7 + H8 + H9 + H10 +
/// H11`.  Working cost is counted both on its own and inside H7.
pub fn compute_rent_with(
    input: &RentCalculationInput,
    rates: &MachineRateTable,
    tariff: &Tariff,
) -> Result<RentCalculationResult, ValidationError> {
    validate_rent_input(input)?;

    let (h2, used_default_rate) = rates.lookup(&input.machine_type);
    if used_default_rate {
        tracing::warn!(
            machine_type = %input.machine_type,
            default_rate = %h2,
            "machine type missing from rate table, using default rate"
        );
    }

    // Working cost scales with the rate on the monthly branch and with
    // the hours worked on the hourly one.
    let working_field = if bills_monthly(input) {
        "machine_type"
    } else {
        "hours_per_day"
    };

    let h3 = duration_factor(input)?;
    let working_cost = checked(working_field, h2.checked_mul(h3))?;
    let food = checked(
        "food_cost_per_resource",
        input
            .food_resource_count
            .checked_mul(input.food_cost_per_resource),
    )?;
    let accommodation = checked(
        "accommodation_cost_per_resource",
        input
            .accommodation_resource_count
            .checked_mul(input.accommodation_cost_per_resource),
    )?;
    let h4_field = if food >= accommodation {
        "food_cost_per_resource"
    } else {
        "accommodation_cost_per_resource"
    };
    let h4 = checked(h4_field, food.checked_add(accommodation))?;
    let h5 = checked(
        "machine_type",
        h2.checked_mul(tariff.usage_percentage(input.usage_profile)),
    )?;
    let elongation = checked(
        working_field,
        working_cost.checked_mul(tariff.elongation_percentage),
    )?;
    let h7 = checked(working_field, working_cost.checked_add(elongation))?;
    let h9 = checked(
        "machine_type",
        h2.checked_mul(tariff.risk_percentage(input.risk_factor)),
    )?;

    let components = RentComponents {
        h2,
        h3,
        h4,
        h5,
        working_cost,
        elongation,
        h7,
        h8: input.deal_extra_charge,
        h9,
        h10: input.incidental_charges,
        h11: input.other_factor_charges,
    };
    let pre_tax_total = checked_sum(
        components.working_cost,
        [
            (h4_field, components.h4),
            ("machine_type", components.h5),
            (working_field, components.h7),
            ("deal_extra_charge", components.h8),
            ("machine_type", components.h9),
            ("incidental_charges", components.h10),
            ("other_factor_charges", components.h11),
        ],
    )?;
    let total_rent = match input.gst_billing {
        GstBilling::Gst => checked(
            "gst_billing",
            (Decimal::ONE + tariff.gst_rate).checked_mul(pre_tax_total),
        )?,
        GstBilling::NoGst => pre_tax_total,
    };
    tracing::debug!(
        machine_type = %input.machine_type,
        %pre_tax_total,
        %total_rent,
        "computed rent"
    );

    Ok(RentCalculationResult {
        total_rent,
        pre_tax_total,
        components,
        used_default_rate,
    })
}

/// Computes many rent calculations in parallel.
///
/// Results are returned in input order; a failing input does not affect
/// its neighbours.
pub fn compute_rent_batch(
    inputs: Vec<RentCalculationInput>,
    rates: &MachineRateTable,
    tariff: &Tariff,
) -> Vec<Result<RentCalculationResult, ValidationError>> {
    inputs
        .par_iter()
        .map(|input| compute_rent_with(input, rates, tariff))
        .collect()
}

fn bills_monthly(input: &RentCalculationInput) -> bool {
    input.contract_days > MONTHLY_BILLING_THRESHOLD_DAYS && input.order_type == OrderType::Large
}

/// H3.  Large multi-month contracts bill in blocks of 26 working days
/// per 30 calendar days; everything else bills per hour-equivalent.
fn duration_factor(input: &RentCalculationInput) -> Result<Decimal, ValidationError> {
    let shift_factor = input.shift.factor();
    if bills_monthly(input) {
        // At most 52 x 143_165_576, well inside Decimal.
        let months = (input.contract_days / DAYS_PER_BILLING_MONTH).max(1);
        Ok(Decimal::from(WORKING_DAYS_PER_MONTH * shift_factor) * Decimal::from(months))
    } else {
        let per_day = checked(
            "hours_per_day",
            input
                .hours_per_day
                .checked_mul(Decimal::from(shift_factor * HOURLY_BILLING_MULTIPLIER)),
        )?;
        checked(
            "hours_per_day",
            per_day.checked_mul(Decimal::from(input.contract_days)),
        )
    }
}

fn checked(field: &str, value: Option<Decimal>) -> Result<Decimal, ValidationError> {
    value.ok_or_else(|| ValidationError::too_large(field))
}

fn checked_sum<const N: usize>(
    first: Decimal,
    rest: [(&str, Decimal); N],
) -> Result<Decimal, ValidationError> {
    rest.into_iter().try_fold(first, |total, (field, amount)| {
        checked(field, total.checked_add(amount))
    })
}

fn validate_rent_input(input: &RentCalculationInput) -> Result<(), ValidationError> {
    non_negative("hours_per_day", input.hours_per_day)?;
    non_negative("food_resource_count", input.food_resource_count)?;
    non_negative("food_cost_per_resource", input.food_cost_per_resource)?;
    non_negative("accommodation_resource_count", input.accommodation_resource_count)?;
    non_negative(
        "accommodation_cost_per_resource",
        input.accommodation_cost_per_resource,
    )?;
    non_negative("site_distance_km", input.site_distance_km)?;
    non_negative("trailer_cost", input.trailer_cost)?;
    non_negative("mob_demob_relaxation", input.mob_demob_relaxation)?;
    non_negative("deal_extra_charge", input.deal_extra_charge)?;
    non_negative("incidental_charges", input.incidental_charges)?;
    non_negative("other_factor_charges", input.other_factor_charges)?;
    if input.contract_days == 0 {
        return Err(ValidationError::new(
            "contract_days",
            "must be a positive whole number",
        ));
    }
    Ok(())
}

fn non_negative(field: &str, value: Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::negative(field));
    }
    Ok(())
}
