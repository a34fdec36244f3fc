pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::{Address, RateCache, RateResolver, TaxService};
use anyhow::{Result, bail};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    /// Resolve rates for one or more destinations.
    Rate {
        addresses: Vec<Address>,
        price: Decimal,
    },
    /// Check the settings against a sample destination.
    Test { address: Option<Address> },
}

/// Wires the TaxJar provider, resolver and an in-memory cache from `config`.
pub fn build_service(config: &AppConfig) -> Result<TaxService> {
    let taxjar = &config.providers.taxjar;
    let provider = providers::TaxJarProvider::new(
        &taxjar.base_url,
        &config.api_token,
        taxjar.timeout(),
    )?;
    let cache = Arc::new(store::MemoryCache::<String, Decimal>::new());

    Ok(TaxService::new(
        config.origin.clone(),
        RateResolver::new(Arc::new(provider)),
        RateCache::new(cache),
    ))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Tax rate lookup starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {:#?}", config.origin);

    let service = build_service(&config)?;

    match command {
        AppCommand::Rate { addresses, price } => cli::rate::run(&service, &addresses, price).await,
        AppCommand::Test { address } => {
            let Some(address) = address.or(config.test_address) else {
                bail!("No address given and no test_address in the configuration");
            };
            cli::test_rate::run(&service, &address).await
        }
    }
}
