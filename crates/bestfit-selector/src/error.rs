//! Selector error types.

use std::time::Duration;

use thiserror::Error;

use bestfit_catalog::CatalogError;
use bestfit_core::{ConfigError, ProviderError, ValidationError};
use bestfit_pricing::PricingError;

/// Errors returned by a selection call.
#[derive(Debug, Error)]
pub enum SelectorError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("catalog error: {0}")]
    Catalog(CatalogError),

    #[error("pricing error: {0}")]
    Pricing(PricingError),

    #[error("selection timed out after {0:?}")]
    Timeout(Duration),

    #[error("instance type not found: {0}")]
    InstanceTypeNotFound(String),
}

pub type SelectorResult<T> = Result<T, SelectorError>;

impl From<CatalogError> for SelectorError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Provider(e) => SelectorError::Provider(e),
            other => SelectorError::Catalog(other),
        }
    }
}

impl From<PricingError> for SelectorError {
    fn from(e: PricingError) -> Self {
        match e {
            PricingError::Provider(e) => SelectorError::Provider(e),
            other => SelectorError::Pricing(other),
        }
    }
}
