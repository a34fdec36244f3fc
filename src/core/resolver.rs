//! Tiered tax rate lookup: order-based first, location-based as fallback.

use crate::core::address::{Address, OriginConfig};
use crate::core::error::TaxError;
use crate::core::rate::{OrderTaxParams, RateResult, TaxRateProvider};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[derive(Clone)]
pub struct RateResolver {
    provider: Arc<dyn TaxRateProvider>,
}

impl RateResolver {
    pub fn new(provider: Arc<dyn TaxRateProvider>) -> Self {
        Self { provider }
    }

    /// Resolves the rate for `destination`.
    ///
    /// Provider failures of the last attempted tier are returned inside the
    /// [`RateResult`]. `Err` is reserved for an order-based failure when the
    /// location-based fallback is disabled.
    #[instrument(
        name = "ResolveTaxRate",
        skip(self, origin, destination),
        fields(zip = %destination.zip, country = %destination.country_code)
    )]
    pub async fn resolve(
        &self,
        origin: &OriginConfig,
        destination: &Address,
        price: Decimal,
    ) -> Result<RateResult, TaxError> {
        let mut result = RateResult::default();

        if origin.use_extended_method {
            let params = OrderTaxParams {
                from_country: origin.country_code(),
                from_zip: origin.from_zip.clone(),
                from_state: origin.state_code(),
                to_country: destination.country_code.clone(),
                to_zip: destination.zip.clone(),
                to_state: destination.state_code.clone(),
                amount: price,
                shipping: Decimal::ZERO,
            };

            match self.provider.rate_for_order(&params).await {
                Ok(rate) => {
                    debug!(%rate, "Order-based rate resolved");
                    result = RateResult::from_order_rate(rate);
                }
                Err(e) if !origin.use_standard_rate => {
                    return Err(TaxError::FatalConfigurationMismatch(e));
                }
                Err(e) => {
                    warn!(error = %e, "Order-based rate failed, falling back to location rate");
                }
            }
        }

        if result.combined_rate.is_zero()
            && (!origin.use_extended_method || origin.use_standard_rate)
        {
            result = match self
                .provider
                .rate_for_location(&destination.zip, &destination.city, &destination.country_code)
                .await
            {
                Ok(breakdown) => RateResult::from_breakdown(breakdown),
                Err(e) => RateResult::from_error(e),
            };
            debug!(rate = %result.rate_fraction(), succeeded = result.succeeded(), "Location-based rate resolved");
        }

        Ok(result)
    }
}
