//! Selector — the selection orchestrator.
//!
//! Owns the catalog and price caches for one region and drives a request
//! through filtering, interruption screening, pricing and ranking. Clones
//! share caches, providers and the interruption table.

use std::sync::Arc;

use tracing::{debug, info, warn};

use bestfit_cache::{CacheKey, TtlCache};
use bestfit_catalog::{CatalogFilter, InterruptionTable, filter_catalog, load_catalog};
use bestfit_core::{
    InstanceTypeSpec, OperatingSystem, PriceQuote, Providers, SelectionRequest, SelectionResult,
    SelectorConfig, UsageClass,
};
use bestfit_pricing::{PriceRequest, PriceResolver, with_retry};

use crate::error::{SelectorError, SelectorResult};
use crate::rank::rank_by_price;

/// Instance-type selector bound to one region.
#[derive(Clone)]
pub struct Selector {
    config: Arc<SelectorConfig>,
    providers: Providers,
    interruption: Arc<InterruptionTable>,
    catalog_cache: TtlCache<Arc<Vec<InstanceTypeSpec>>>,
    prices: Arc<PriceResolver>,
}

impl Selector {
    /// Create a selector. Providers are wrapped with the configured retry
    /// policy; the built-in interruption table is used.
    pub fn new(config: SelectorConfig, providers: Providers) -> SelectorResult<Self> {
        config.validate()?;
        let providers = with_retry(providers, &config.retry);
        let prices = PriceResolver::new(&config, &providers);
        Ok(Self {
            config: Arc::new(config),
            providers,
            interruption: Arc::new(InterruptionTable::builtin()),
            catalog_cache: TtlCache::new(),
            prices: Arc::new(prices),
        })
    }

    /// Replace the interruption table.
    pub fn with_interruption_table(mut self, table: InterruptionTable) -> Self {
        self.interruption = Arc::new(table);
        self
    }

    /// Share a price cache with other selectors.
    pub fn with_price_cache(mut self, cache: TtlCache<Option<PriceQuote>>) -> Self {
        self.prices = Arc::new(PriceResolver::new(&self.config, &self.providers).with_cache(cache));
        self
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn price_cache(&self) -> &TtlCache<Option<PriceQuote>> {
        self.prices.cache()
    }

    /// The region's full catalog, fetched once per TTL.
    pub async fn catalog(&self) -> SelectorResult<Arc<Vec<InstanceTypeSpec>>> {
        let region = self.config.region.as_str();
        let key = CacheKey::builder("catalog").part(region).finish();
        let catalog = self
            .catalog_cache
            .try_get_or_compute(&key, self.config.cache_ttl(), || async {
                load_catalog(self.providers.catalog.as_ref(), region)
                    .await
                    .map(Arc::new)
            })
            .await?;
        Ok(catalog)
    }

    /// Instance types satisfying `request`, cheapest first when
    /// `is_best_price` is set, otherwise in catalog order.
    pub async fn get_best_instance_types(
        &self,
        request: &SelectionRequest,
    ) -> SelectorResult<Vec<SelectionResult>> {
        let operating_system = request.validate()?;

        match self.config.selection_timeout() {
            Some(limit) => tokio::time::timeout(limit, self.select(request, operating_system))
                .await
                .map_err(|_| {
                    warn!(?limit, "selection timed out");
                    SelectorError::Timeout(limit)
                })?,
            None => self.select(request, operating_system).await,
        }
    }

    async fn select(
        &self,
        request: &SelectionRequest,
        operating_system: OperatingSystem,
    ) -> SelectorResult<Vec<SelectionResult>> {
        let region = self.config.region.as_str();
        let catalog = self.catalog().await?;

        let filter = CatalogFilter::from(request);
        let mut candidates = filter_catalog(&catalog, &filter);

        let spot = request.usage_class == UsageClass::Spot;
        if spot && let Some(ceiling) = request.interruption_ceiling() {
            let before = candidates.len();
            candidates.retain(|spec| match self.interruption.classify(&spec.instance_type, region) {
                Some(freq) => freq.admits(ceiling),
                None => {
                    warn!(instance_type = %spec.instance_type, %region, "interruption frequency unknown, excluding");
                    false
                }
            });
            debug!(ceiling, before, after = candidates.len(), "interruption screening");
        }

        if !request.is_best_price {
            let mut results: Vec<SelectionResult> = candidates
                .iter()
                .map(|spec| SelectionResult::bare(spec.instance_type.as_str()))
                .collect();
            if let Some(limit) = request.limit {
                results.truncate(limit);
            }
            info!(%region, usage_class = %request.usage_class, results = results.len(), "selection complete");
            return Ok(results);
        }

        let quotes = self
            .prices
            .resolve(&candidates, &PriceRequest::from_selection(request, operating_system))
            .await?;

        let classify = |instance_type: &str| {
            if spot {
                self.interruption.classify(instance_type, region)
            } else {
                None
            }
        };
        let results = rank_by_price(&candidates, quotes, &classify, request.limit);

        info!(
            %region,
            usage_class = %request.usage_class,
            candidates = candidates.len(),
            results = results.len(),
            cheapest = results.first().map(|r| r.instance_type.as_str()),
            "selection complete"
        );
        Ok(results)
    }

    /// Whether `instance_type` supports instance-store volumes.
    pub async fn is_instance_storage_supported_for_instance_type(
        &self,
        instance_type: &str,
    ) -> SelectorResult<bool> {
        let catalog = self.catalog().await?;
        catalog
            .iter()
            .find(|spec| spec.instance_type == instance_type)
            .map(|spec| spec.instance_storage_supported)
            .ok_or_else(|| SelectorError::InstanceTypeNotFound(instance_type.to_string()))
    }

    /// Drop expired entries from both caches.
    pub async fn purge_expired(&self) -> usize {
        self.catalog_cache.purge_expired().await + self.prices.cache().purge_expired().await
    }
}
