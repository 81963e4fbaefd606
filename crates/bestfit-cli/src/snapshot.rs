//! Offline provider backed by a JSON snapshot.
//!
//! ```json
//! {
//!   "region": "us-east-1",
//!   "catalog": [ { "instance_type": "m5.large", "vcpu": 2, "memory_gb": 8, ... } ],
//!   "on_demand_prices": { "m5.large": { "Linux": 0.096, "Windows": 0.188 } },
//!   "spot_history": [
//!     { "instance_type": "m5.large", "zone": "us-east-1a", "price": 0.035,
//!       "timestamp": 1700000000, "product_description": "Linux/UNIX" }
//!   ]
//! }
//! ```
//!
//! Spot windows are measured back from `captured_at`, or from the newest
//! history point when the snapshot does not record one.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use bestfit_core::{
    CatalogPage, CatalogProvider, InstanceTypeSpec, OnDemandPriceProvider, OperatingSystem,
    ProductDescription, ProviderError, ProviderResult, SpotPricePoint, SpotPriceProvider,
    SpotPriceQuery,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Snapshot {
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    captured_at: Option<u64>,
    catalog: Vec<InstanceTypeSpec>,
    #[serde(default)]
    on_demand_prices: BTreeMap<String, BTreeMap<OperatingSystem, f64>>,
    #[serde(default)]
    spot_history: Vec<SpotRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpotRecord {
    instance_type: String,
    zone: String,
    price: f64,
    timestamp: u64,
    #[serde(default)]
    product_description: Option<ProductDescription>,
}

/// Serves catalog, on-demand and spot data from one snapshot.
#[derive(Debug)]
pub struct SnapshotProvider {
    snapshot: Snapshot,
    now: u64,
}

impl SnapshotProvider {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json).context("invalid snapshot")?;
        let now = snapshot.captured_at.unwrap_or_else(|| {
            snapshot
                .spot_history
                .iter()
                .map(|r| r.timestamp)
                .max()
                .unwrap_or(0)
        });
        Ok(Self { snapshot, now })
    }

    pub fn instance_type_count(&self) -> usize {
        self.snapshot.catalog.len()
    }

    fn check_region(&self, region: &str) -> ProviderResult<()> {
        match &self.snapshot.region {
            Some(captured) if captured != region => Err(ProviderError::InvalidRegion(format!(
                "snapshot covers {captured}, not {region}"
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl CatalogProvider for SnapshotProvider {
    async fn list_instance_types(&self, region: &str, _page_token: Option<&str>) -> ProviderResult<CatalogPage> {
        self.check_region(region)?;
        Ok(CatalogPage {
            instance_types: self.snapshot.catalog.clone(),
            next_token: None,
        })
    }
}

#[async_trait]
impl OnDemandPriceProvider for SnapshotProvider {
    async fn get_on_demand_price(
        &self,
        region: &str,
        instance_type: &str,
        operating_system: OperatingSystem,
    ) -> ProviderResult<Option<f64>> {
        self.check_region(region)?;
        Ok(self
            .snapshot
            .on_demand_prices
            .get(instance_type)
            .and_then(|prices| prices.get(&operating_system))
            .copied())
    }
}

#[async_trait]
impl SpotPriceProvider for SnapshotProvider {
    async fn get_spot_price_history(&self, query: &SpotPriceQuery) -> ProviderResult<Vec<SpotPricePoint>> {
        self.check_region(&query.region)?;
        let since = self.now.saturating_sub(query.window_secs);

        Ok(self
            .snapshot
            .spot_history
            .iter()
            .filter(|r| r.instance_type == query.instance_type)
            .filter(|r| r.timestamp >= since)
            .filter(|r| query.zones.is_empty() || query.zones.contains(&r.zone))
            .filter(|r| match r.product_description {
                Some(pd) => query.product_descriptions.is_empty() || query.product_descriptions.contains(&pd),
                None => true,
            })
            .map(|r| SpotPricePoint {
                zone: r.zone.clone(),
                price: r.price,
                timestamp: r.timestamp,
            })
            .collect())
    }
}
