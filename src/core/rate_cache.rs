//! Short-lived cache of resolved rates, keyed by destination.

use crate::core::address::Address;
use crate::core::cache::Cache;
use crate::core::error::TaxError;
use crate::core::rate::RateResult;
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// How long a resolved rate stays usable.
pub const RATE_TTL: Duration = Duration::from_secs(60);

/// Builds the cache key for a destination.
///
/// Only zip, country and city participate: two orders to the same place with
/// different amounts or origins share an entry for the length of the TTL.
pub fn cache_key(address: &Address) -> String {
    let country = if address.country_code.is_empty() {
        "0"
    } else {
        address.country_code.as_str()
    };
    format!(
        "taxrate-by-address-{}-{}-{}",
        address.zip, country, address.city
    )
}

#[derive(Clone)]
pub struct RateCache {
    cache: Arc<dyn Cache<String, Decimal>>,
    ttl: Duration,
}

impl RateCache {
    pub fn new(cache: Arc<dyn Cache<String, Decimal>>) -> Self {
        Self {
            cache,
            ttl: RATE_TTL,
        }
    }

    /// Returns the cached rate fraction for `destination`, or runs `resolve`
    /// and caches its rate when it succeeded. Failures are never cached.
    pub async fn get_or_resolve<F, Fut>(
        &self,
        destination: Option<&Address>,
        resolve: F,
    ) -> Result<Decimal, TaxError>
    where
        F: FnOnce(Address) -> Fut,
        Fut: Future<Output = Result<RateResult, TaxError>>,
    {
        let destination = destination.ok_or(TaxError::AddressNotSet)?;
        let key = cache_key(destination);

        if let Some(rate) = self.cache.get(&key).await {
            debug!(%key, %rate, "Using cached tax rate");
            return Ok(rate);
        }

        let result = resolve(destination.clone()).await?;
        if let Some(error) = result.error {
            return Err(TaxError::Provider(error));
        }

        let rate = result.rate_fraction();
        self.cache.put(key, rate, Some(self.ttl)).await;
        Ok(rate)
    }
}
