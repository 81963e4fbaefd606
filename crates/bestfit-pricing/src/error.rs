//! Pricing error types.

use thiserror::Error;

use bestfit_core::ProviderError;

/// Result type alias for price resolution.
pub type PricingResult<T> = Result<T, PricingError>;

/// Errors that abort a whole price-resolution batch.
#[derive(Debug, Error)]
pub enum PricingError {
    #[error("price provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("price lookup worker failed: {0}")]
    Worker(String),
}
