//! Error types for tax rate resolution.

use thiserror::Error;

/// Failure reported by a tax rate provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider answered with a non-success status and a structured body.
    #[error("{status} {error}: {detail}")]
    Api {
        status: u16,
        error: String,
        detail: String,
    },

    /// The request never produced a response (connect, timeout, TLS, ...).
    #[error("Request error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("Failed to parse response: {0}")]
    Decode(String),
}

/// Errors surfaced to callers of the rate lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxError {
    /// No destination address was supplied.
    #[error("Address is not set")]
    AddressNotSet,

    /// The last attempted tier failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The order-based tier failed and falling back to the location-based
    /// rate is disabled in the settings.
    #[error("Extended tax rate failed and standard rate fallback is disabled: {0}")]
    FatalConfigurationMismatch(ProviderError),

    /// The resolved rate cannot be expressed in percent.
    #[error("Tax rate {0} is out of range")]
    RateOutOfRange(rust_decimal::Decimal),
}

impl TaxError {
    /// Whether the failure should be fixed by an operator rather than retried.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, TaxError::FatalConfigurationMismatch(_))
    }
}
