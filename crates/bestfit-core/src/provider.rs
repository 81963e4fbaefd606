//! Contracts for the remote catalog, pricing, and spot-history services.
//!
//! The engine never talks to a cloud API directly. It calls these traits,
//! which a real SDK client, a snapshot file, or a test double implements.
//! Implementations are expected to be cheap to share (`Arc<dyn _>`).

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderResult;
use crate::types::{InstanceTypeSpec, OperatingSystem, ProductDescription};

/// One page of a region's instance-type catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogPage {
    pub instance_types: Vec<InstanceTypeSpec>,
    /// Token for the next page; `None` on the last page.
    pub next_token: Option<String>,
}

/// A spot-history lookup for one instance type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpotPriceQuery {
    pub region: String,
    pub instance_type: String,
    /// Zones to restrict the history to; empty means every zone.
    pub zones: Vec<String>,
    /// Products to restrict the history to; empty means every product.
    pub product_descriptions: Vec<ProductDescription>,
    /// Trailing window in seconds.
    pub window_secs: u64,
}

/// A single observed spot price.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpotPricePoint {
    pub zone: String,
    pub price: f64,
    /// Unix timestamp (seconds) of the observation.
    pub timestamp: u64,
}

/// Lists the instance types a region offers.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn list_instance_types(
        &self,
        region: &str,
        page_token: Option<&str>,
    ) -> ProviderResult<CatalogPage>;
}

/// Looks up the on-demand hourly price of an instance type.
#[async_trait]
pub trait OnDemandPriceProvider: Send + Sync {
    /// `Ok(None)` when the service has no price for this combination.
    async fn get_on_demand_price(
        &self,
        region: &str,
        instance_type: &str,
        operating_system: OperatingSystem,
    ) -> ProviderResult<Option<f64>>;
}

/// Reads recent spot price history.
#[async_trait]
pub trait SpotPriceProvider: Send + Sync {
    async fn get_spot_price_history(&self, query: &SpotPriceQuery) -> ProviderResult<Vec<SpotPricePoint>>;
}

/// The three collaborators a selector is built from.
#[derive(Clone)]
pub struct Providers {
    pub catalog: Arc<dyn CatalogProvider>,
    pub on_demand: Arc<dyn OnDemandPriceProvider>,
    pub spot: Arc<dyn SpotPriceProvider>,
}

impl Providers {
    /// Use one value for all three roles.
    pub fn from_single<P>(provider: Arc<P>) -> Self
    where
        P: CatalogProvider + OnDemandPriceProvider + SpotPriceProvider + 'static,
    {
        Self {
            catalog: provider.clone(),
            on_demand: provider.clone(),
            spot: provider,
        }
    }
}
