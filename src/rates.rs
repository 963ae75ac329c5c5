//! Static reference tables used by the rent calculator.
//!
//! The `rates` module holds the machine base-rate table and the
//! [`Tariff`] of percentages applied on top of it.  Both are loaded once
//! at startup, either from a JSON file or from the built-in defaults,
//! and then shared read-only for the lifetime of the process.

use crate::error::{Error, Result};
use crate::models::{RiskFactor, UsageProfile};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Key of the fallback entry every rate table must carry.
pub const DEFAULT_MACHINE: &str = "default";

/// Mapping from machine type to its base rate (H2).
///
/// Construction guarantees a [`DEFAULT_MACHINE`] entry, so lookups never
/// fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HashMap<String, Decimal>", into = "HashMap<String, Decimal>")]
pub struct MachineRateTable {
    rates: HashMap<String, Decimal>,
    default_rate: Decimal,
}

impl MachineRateTable {
    pub fn new(rates: HashMap<String, Decimal>) -> Result<Self> {
        let default_rate = *rates.get(DEFAULT_MACHINE).ok_or_else(|| {
            Error::Config(format!("machine rate table has no '{DEFAULT_MACHINE}' entry"))
        })?;
        if let Some((machine, rate)) = rates.iter().find(|(_, rate)| rate.is_sign_negative()) {
            return Err(Error::Config(format!(
                "machine rate for '{machine}' is negative ({rate})"
            )));
        }
        Ok(Self {
            rates,
            default_rate,
        })
    }

    /// Rate for `machine_type`, and whether the default was used.
    pub fn lookup(&self, machine_type: &str) -> (Decimal, bool) {
        match self.rates.get(machine_type) {
            Some(rate) => (*rate, false),
            None => (self.default_rate, true),
        }
    }

    fn len(&self) -> usize {
        self.rates.len()
    }
}

impl Default for MachineRateTable {
    fn default() -> Self {
        let rates: HashMap<String, Decimal> = [
            ("crane_model_a", dec!(5000)),
            ("crane_model_b", dec!(7500)),
            ("crane_model_c", dec!(10000)),
            ("excavator_model_a", dec!(4000)),
            ("excavator_model_b", dec!(6000)),
            ("bulldozer_model_a", dec!(8000)),
            (DEFAULT_MACHINE, dec!(6000)),
        ]
        .into_iter()
        .map(|(machine, rate)| (machine.to_string(), rate))
        .collect();
        Self {
            rates,
            default_rate: dec!(6000),
        }
    }
}

impl TryFrom<HashMap<String, Decimal>> for MachineRateTable {
    type Error = Error;

    fn try_from(rates: HashMap<String, Decimal>) -> Result<Self> {
        Self::new(rates)
    }
}

impl From<MachineRateTable> for HashMap<String, Decimal> {
    fn from(table: MachineRateTable) -> Self {
        table.rates
    }
}

/// Percentages and flat rates applied by the rent formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tariff {
    /// Usage surcharge (H5) as a fraction of the base rate.
    pub usage_percentages: HashMap<UsageProfile, Decimal>,
    /// Risk surcharge (H9) as a fraction of the base rate.
    pub risk_percentages: HashMap<RiskFactor, Decimal>,
    pub gst_rate: Decimal,
    /// Uplift on working cost folded into H7.
    pub elongation_percentage: Decimal,
}

impl Tariff {
    /// The standard tariff: usage 10%/5%, risk 15%/10%/5%, GST 18%,
    /// elongation 5%.
    pub fn standard() -> Self {
        Self {
            usage_percentages: HashMap::from([
                (UsageProfile::Heavy, dec!(0.10)),
                (UsageProfile::Light, dec!(0.05)),
            ]),
            risk_percentages: HashMap::from([
                (RiskFactor::High, dec!(0.15)),
                (RiskFactor::Medium, dec!(0.10)),
                (RiskFactor::Low, dec!(0.05)),
            ]),
            gst_rate: dec!(0.18),
            elongation_percentage: dec!(0.05),
        }
    }

    pub fn usage_percentage(&self, usage: UsageProfile) -> Decimal {
        self.usage_percentages
            .get(&usage)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn risk_percentage(&self, risk: RiskFactor) -> Decimal {
        self.risk_percentages
            .get(&risk)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

impl Default for Tariff {
    fn default() -> Self {
        Self::standard()
    }
}

/// The complete pricing configuration document.
///
/// Either section may be omitted from the JSON file, in which case the
/// built-in values are used for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub machine_rates: MachineRateTable,
    pub tariff: Tariff,
}

/// Load the pricing configuration from a JSON file.
///
/// A missing file is not an error: the built-in tables are returned and
/// a warning is logged.  A file that exists but cannot be parsed, or
/// whose machine table lacks a `default` entry, is rejected.
pub fn load_pricing_config(path: &Path) -> Result<PricingConfig> {
    if !path.is_file() {
        tracing::warn!(
            path = %path.display(),
            "rate file not found, using built-in pricing tables"
        );
        return Ok(PricingConfig::default());
    }
    let data = std::fs::read_to_string(path)
        .map_err(|err| Error::Config(format!("failed to read {}: {err}", path.display())))?;
    let config: PricingConfig = serde_json::from_str(&data)
        .map_err(|err| Error::Config(format!("failed to parse {}: {err}", path.display())))?;
    tracing::info!(
        path = %path.display(),
        machines = config.machine_rates.len(),
        "loaded pricing tables"
    );
    Ok(config)
}
