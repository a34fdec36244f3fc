//! Tax rate abstractions and core types

use crate::core::error::ProviderError;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Location-based rate as reported by the provider.
///
/// US and Canadian locations are broken down by jurisdiction, other
/// countries by VAT band.
#[derive(Debug, Clone, PartialEq)]
pub enum RateBreakdown {
    UsCanada {
        zip: String,
        country: String,
        country_rate: Decimal,
        state: String,
        state_rate: Decimal,
        county: String,
        county_rate: Decimal,
        city: String,
        city_rate: Decimal,
        combined_district_rate: Decimal,
        combined_rate: Decimal,
    },
    International {
        country: String,
        name: String,
        standard_rate: Decimal,
        reduced_rate: Decimal,
        super_reduced_rate: Decimal,
        parking_rate: Decimal,
    },
}

/// Outcome of a single resolution.
///
/// A result carrying an `error` is a non-fatal failure: the rate fields are
/// zero and must not be used.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateResult {
    pub standard_rate: Decimal,
    pub combined_rate: Decimal,
    pub breakdown: Option<RateBreakdown>,
    pub error: Option<ProviderError>,
}

impl RateResult {
    /// Rate computed by the order-based tier.
    pub fn from_order_rate(rate: Decimal) -> Self {
        Self {
            standard_rate: rate,
            combined_rate: rate,
            ..Self::default()
        }
    }

    pub fn from_breakdown(breakdown: RateBreakdown) -> Self {
        let (standard_rate, combined_rate) = match &breakdown {
            RateBreakdown::UsCanada { combined_rate, .. } => (Decimal::ZERO, *combined_rate),
            RateBreakdown::International { standard_rate, .. } => (*standard_rate, Decimal::ZERO),
        };
        Self {
            standard_rate,
            combined_rate,
            breakdown: Some(breakdown),
            error: None,
        }
    }

    pub fn from_error(error: ProviderError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Effective rate as a fraction, e.g. `0.08875`.
    pub fn rate_fraction(&self) -> Decimal {
        if self.combined_rate.is_zero() {
            self.standard_rate
        } else {
            self.combined_rate
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    pub fn is_us_canada_format(&self) -> bool {
        matches!(self.breakdown, Some(RateBreakdown::UsCanada { .. }))
    }
}

/// Converts a rate fraction to percent, `None` on overflow.
pub fn rate_to_percent(fraction: Decimal) -> Option<Decimal> {
    fraction.checked_mul(Decimal::ONE_HUNDRED)
}

/// Parameters of an order-based rate lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTaxParams {
    pub from_country: String,
    pub from_zip: String,
    pub from_state: String,
    pub to_country: String,
    pub to_zip: String,
    pub to_state: String,
    pub amount: Decimal,
    pub shipping: Decimal,
}

#[async_trait]
pub trait TaxRateProvider: Send + Sync {
    /// Rate for a specific order shipped between two locations.
    async fn rate_for_order(&self, params: &OrderTaxParams) -> Result<Decimal, ProviderError>;

    /// Rate for a destination only.
    async fn rate_for_location(
        &self,
        zip: &str,
        city: &str,
        country: &str,
    ) -> Result<RateBreakdown, ProviderError>;
}
