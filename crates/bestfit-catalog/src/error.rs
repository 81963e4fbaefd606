//! Catalog error types.

use thiserror::Error;

use bestfit_core::ProviderError;

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur while loading or interpreting catalog data.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("catalog provider returned page token {0} twice")]
    RepeatedPageToken(String),

    #[error("invalid interruption table: {0}")]
    InvalidTable(String),
}
