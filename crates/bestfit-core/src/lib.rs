//! bestfit-core — shared types for the bestfit instance selector.
//!
//! Holds everything the engine crates agree on: catalog descriptors,
//! the selection request and its validation, price and interruption
//! types, selector configuration, and the provider traits that the
//! catalog, on-demand pricing, and spot-history services implement.

pub mod config;
pub mod error;
pub mod provider;
pub mod region;
pub mod request;
pub mod types;

pub use config::{RetryConfig, SelectorConfig};
pub use error::{ConfigError, ConfigResult, ProviderError, ProviderResult, ValidationError, ValidationResult};
pub use provider::{
    CatalogPage, CatalogProvider, OnDemandPriceProvider, Providers, SpotPricePoint, SpotPriceProvider,
    SpotPriceQuery,
};
pub use request::SelectionRequest;
pub use types::*;
