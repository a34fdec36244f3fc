//! Address and shipping origin types

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Destination of an order. Any field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub state_code: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zip: String,
}

impl Address {
    pub fn new(country_code: &str, state_code: &str, city: &str, zip: &str) -> Self {
        Self {
            country_code: country_code.to_string(),
            state_code: state_code.to_string(),
            city: city.to_string(),
            zip: zip.to_string(),
        }
    }
}

/// Parses `COUNTRY,STATE,CITY,ZIP`. Trailing fields may be omitted.
impl FromStr for Address {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() > 4 {
            bail!("Invalid address '{}': expected COUNTRY,STATE,CITY,ZIP", s);
        }
        let field = |i: usize| parts.get(i).copied().unwrap_or_default();
        Ok(Address::new(field(0), field(1), field(2), field(3)))
    }
}

fn default_true() -> bool {
    true
}

/// Where orders ship from, and which calculation tiers are enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginConfig {
    /// Use the order-based rate, which needs the shipping origin.
    #[serde(default = "default_true")]
    pub use_extended_method: bool,
    /// Fall back to the location-based rate when the order-based one fails.
    #[serde(default = "default_true")]
    pub use_standard_rate: bool,
    #[serde(default)]
    pub from_country: String,
    #[serde(default)]
    pub from_state: String,
    /// 5-digit ZIP or ZIP+4
    #[serde(default)]
    pub from_zip: String,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            use_extended_method: true,
            use_standard_rate: true,
            from_country: String::new(),
            from_state: String::new(),
            from_zip: String::new(),
        }
    }
}

impl OriginConfig {
    pub fn country_code(&self) -> String {
        self.from_country.trim().to_uppercase()
    }

    /// Uppercase state abbreviation, never longer than two characters.
    pub fn state_code(&self) -> String {
        self.from_state.trim().chars().take(2).collect::<String>().to_uppercase()
    }
}
