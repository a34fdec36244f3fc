//! Core business logic abstractions

pub mod address;
pub mod cache;
pub mod config;
pub mod error;
pub mod log;
pub mod rate;
pub mod rate_cache;
pub mod resolver;
pub mod service;

// Re-export main types for cleaner imports
pub use address::{Address, OriginConfig};
pub use error::{ProviderError, TaxError};
pub use rate::{OrderTaxParams, RateBreakdown, RateResult, TaxRateProvider};
pub use rate_cache::RateCache;
pub use resolver::RateResolver;
pub use service::{CalculateTaxRequest, CalculateTaxResult, TaxService};
