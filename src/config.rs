//! Runtime settings read from the environment.
//!
//! Variables may also be supplied through a `.env` file, which the
//! binary loads with `dotenvy` before calling [`Settings::from_env`].

use std::path::PathBuf;

pub const BIND_ADDR_VAR: &str = "RENT_BIND_ADDR";
pub const RATES_FILE_VAR: &str = "RENT_RATES_FILE";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_RATES_FILE: &str = "config/rates.json";

/// Process-wide settings for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// JSON file holding the machine rate table and tariff.
    pub rates_file: PathBuf,
}

impl Settings {
    /// Reads [`BIND_ADDR_VAR`] and [`RATES_FILE_VAR`].  Unset or blank
    /// variables fall back to `127.0.0.1:3000` and `config/rates.json`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            bind_addr: non_empty(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            rates_file: non_empty(RATES_FILE_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RATES_FILE)),
        }
    }
}
