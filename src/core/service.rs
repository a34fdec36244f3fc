//! Entry point used by order pricing: resolves a rate and reports it in percent.

use crate::core::address::{Address, OriginConfig};
use crate::core::error::TaxError;
use crate::core::rate::{RateResult, rate_to_percent};
use crate::core::rate_cache::RateCache;
use crate::core::resolver::RateResolver;
use rust_decimal::Decimal;
use tracing::{debug, error};

#[derive(Debug, Clone, Default)]
pub struct CalculateTaxRequest {
    pub address: Option<Address>,
    /// Taxable amount, used only by the order-based tier.
    pub price: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalculateTaxResult {
    /// Rate in percent, e.g. `8.875`.
    pub tax_rate: Decimal,
    pub errors: Vec<String>,
}

impl CalculateTaxResult {
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Price used when checking the settings against a sample address.
pub const TEST_PRICE: Decimal = Decimal::ONE_HUNDRED;

#[derive(Clone)]
pub struct TaxService {
    origin: OriginConfig,
    resolver: RateResolver,
    cache: RateCache,
}

impl TaxService {
    pub fn new(origin: OriginConfig, resolver: RateResolver, cache: RateCache) -> Self {
        Self {
            origin,
            resolver,
            cache,
        }
    }

    /// Cached lookup of the rate fraction for a request.
    pub async fn tax_rate_fraction(&self, request: &CalculateTaxRequest) -> Result<Decimal, TaxError> {
        let price = request.price;
        self.cache
            .get_or_resolve(request.address.as_ref(), |destination| async move {
                self.resolver.resolve(&self.origin, &destination, price).await
            })
            .await
    }

    pub async fn compute_tax_rate(&self, request: &CalculateTaxRequest) -> CalculateTaxResult {
        let percent = self
            .tax_rate_fraction(request)
            .await
            .and_then(|rate| rate_to_percent(rate).ok_or(TaxError::RateOutOfRange(rate)));
        match percent {
            Ok(tax_rate) => {
                debug!(%tax_rate, "Computed tax rate");
                CalculateTaxResult {
                    tax_rate,
                    errors: Vec::new(),
                }
            }
            Err(e) => {
                error!(error = %e, "Tax rate lookup failed");
                CalculateTaxResult {
                    tax_rate: Decimal::ZERO,
                    errors: vec![e.to_string()],
                }
            }
        }
    }

    /// Uncached resolution at [`TEST_PRICE`], keeping the full breakdown.
    pub async fn test_tax_rate(&self, address: &Address) -> Result<RateResult, TaxError> {
        self.resolver
            .resolve(&self.origin, address, TEST_PRICE)
            .await
    }
}
