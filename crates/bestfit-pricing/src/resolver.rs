//! Price resolution for a batch of candidates.
//!
//! Each candidate is first looked up in the shared price cache; only misses
//! reach the provider, through the worker pool for the request's usage
//! class. Results are cached as lookups complete, including "no price"
//! answers. Per-item failures (a malformed payload for one type) exclude
//! that type and are never cached; call-fatal errors abort the batch.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use bestfit_cache::{CacheKey, TtlCache};
use bestfit_core::{
    InstanceTypeSpec, OnDemandPriceProvider, OperatingSystem, PriceQuote, PriceSource,
    ProductDescription, ProviderError, Providers, SelectionRequest, SelectorConfig, SpotPricePoint,
    SpotPriceProvider, SpotPriceQuery, SpotPriceStrategy, UsageClass, round_price,
};

use crate::aggregate::{aggregate_prices, latest_by_zone};
use crate::error::{PricingError, PricingResult};
use crate::pool::WorkerPool;

/// Pricing-relevant part of a selection request.
#[derive(Debug, Clone, Copy)]
pub struct PriceRequest<'a> {
    pub usage_class: UsageClass,
    pub operating_system: OperatingSystem,
    pub product_descriptions: &'a BTreeSet<ProductDescription>,
    pub availability_zones: Option<&'a BTreeSet<String>>,
    pub strategy: SpotPriceStrategy,
}

impl<'a> PriceRequest<'a> {
    pub fn from_selection(request: &'a SelectionRequest, operating_system: OperatingSystem) -> Self {
        Self {
            usage_class: request.usage_class,
            operating_system,
            product_descriptions: &request.product_descriptions,
            availability_zones: request.zones(),
            strategy: request.final_spot_price_determination_strategy,
        }
    }
}

/// Resolves representative prices through bounded worker pools.
pub struct PriceResolver {
    region: String,
    on_demand: Arc<dyn OnDemandPriceProvider>,
    spot: Arc<dyn SpotPriceProvider>,
    on_demand_pool: WorkerPool,
    spot_pool: WorkerPool,
    cache: TtlCache<Option<PriceQuote>>,
    ttl: Duration,
    spot_window: Duration,
    spot_uses_product_descriptions: bool,
}

/// One spot-history call: a type restricted to at most one zone.
struct SpotLookup {
    candidate: usize,
    instance_type: String,
    zones: Vec<String>,
}

impl PriceResolver {
    pub fn new(config: &SelectorConfig, providers: &Providers) -> Self {
        Self {
            region: config.region.clone(),
            on_demand: Arc::clone(&providers.on_demand),
            spot: Arc::clone(&providers.spot),
            on_demand_pool: WorkerPool::new("on-demand-price", config.describe_on_demand_price_concurrency),
            spot_pool: WorkerPool::new("spot-price-history", config.describe_spot_price_history_concurrency),
            cache: TtlCache::new(),
            ttl: config.cache_ttl(),
            spot_window: config.spot_price_history_window(),
            spot_uses_product_descriptions: config.spot_uses_product_descriptions,
        }
    }

    /// Use an existing (possibly shared) price cache.
    pub fn with_cache(mut self, cache: TtlCache<Option<PriceQuote>>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &TtlCache<Option<PriceQuote>> {
        &self.cache
    }

    /// Price every candidate. Types missing from the map have no price.
    pub async fn resolve(
        &self,
        candidates: &[InstanceTypeSpec],
        request: &PriceRequest<'_>,
    ) -> PricingResult<HashMap<String, PriceQuote>> {
        let quotes = match request.usage_class {
            UsageClass::OnDemand => self.resolve_on_demand(candidates, request.operating_system).await?,
            UsageClass::Spot => self.resolve_spot(candidates, request).await?,
        };
        debug!(
            usage_class = %request.usage_class,
            candidates = candidates.len(),
            priced = quotes.len(),
            "prices resolved"
        );
        Ok(quotes)
    }

    async fn resolve_on_demand(
        &self,
        candidates: &[InstanceTypeSpec],
        operating_system: OperatingSystem,
    ) -> PricingResult<HashMap<String, PriceQuote>> {
        let mut quotes = HashMap::new();
        let mut misses = Vec::new();

        for spec in candidates {
            let key = CacheKey::builder("on-demand-price")
                .part(&self.region)
                .part(&spec.instance_type)
                .part(operating_system.as_str())
                .finish();
            match self.cache.get(&key).await {
                Some(cached) => {
                    if let Some(quote) = cached {
                        quotes.insert(quote.instance_type.clone(), quote);
                    }
                }
                None => misses.push((spec.instance_type.clone(), key)),
            }
        }

        let provider = Arc::clone(&self.on_demand);
        let cache = self.cache.clone();
        let region = self.region.clone();
        let ttl = self.ttl;

        let resolved = self
            .on_demand_pool
            .run(misses, move |(instance_type, key)| {
                let provider = Arc::clone(&provider);
                let cache = cache.clone();
                let region = region.clone();
                async move {
                    let quote = match provider
                        .get_on_demand_price(&region, &instance_type, operating_system)
                        .await
                    {
                        Ok(Some(price)) if price.is_finite() && price > 0.0 => Some(PriceQuote {
                            instance_type: instance_type.clone(),
                            price: round_price(price),
                            source: PriceSource::OnDemand,
                            zone: None,
                            zone_prices: BTreeMap::new(),
                        }),
                        Ok(Some(price)) => {
                            debug!(%instance_type, price, "ignoring non-positive on-demand price");
                            None
                        }
                        Ok(None) => {
                            debug!(%instance_type, %operating_system, "no on-demand price");
                            None
                        }
                        Err(e) => {
                            tolerate(&instance_type, e)?;
                            return Ok(None);
                        }
                    };
                    cache.insert(key, quote.clone(), ttl).await;
                    Ok::<_, PricingError>(quote)
                }
            })
            .await?;

        quotes.extend(
            resolved
                .into_iter()
                .flatten()
                .map(|quote| (quote.instance_type.clone(), quote)),
        );
        Ok(quotes)
    }

    async fn resolve_spot(
        &self,
        candidates: &[InstanceTypeSpec],
        request: &PriceRequest<'_>,
    ) -> PricingResult<HashMap<String, PriceQuote>> {
        let descriptions: Vec<ProductDescription> = if self.spot_uses_product_descriptions {
            request.product_descriptions.iter().copied().collect()
        } else {
            Vec::new()
        };

        let requested_zones = request.availability_zones.filter(|zones| !zones.is_empty());

        let mut quotes = HashMap::new();
        let mut misses: Vec<(String, CacheKey)> = Vec::new();
        let mut lookups = Vec::new();

        for spec in candidates {
            let zones: Vec<String> = match requested_zones {
                Some(requested) => requested.intersection(&spec.supported_zones).cloned().collect(),
                None => Vec::new(),
            };
            if requested_zones.is_some() && zones.is_empty() {
                continue;
            }

            let key = CacheKey::builder("spot-price")
                .part(&self.region)
                .part(&spec.instance_type)
                .parts(descriptions.iter().map(ProductDescription::as_str))
                .parts(&zones)
                .part(request.strategy.as_str())
                .part(self.spot_window.as_secs().to_string())
                .finish();

            if let Some(cached) = self.cache.get(&key).await {
                if let Some(quote) = cached {
                    quotes.insert(quote.instance_type.clone(), quote);
                }
                continue;
            }

            let candidate = misses.len();
            if zones.is_empty() {
                lookups.push(SpotLookup {
                    candidate,
                    instance_type: spec.instance_type.clone(),
                    zones: Vec::new(),
                });
            } else {
                lookups.extend(zones.into_iter().map(|zone| SpotLookup {
                    candidate,
                    instance_type: spec.instance_type.clone(),
                    zones: vec![zone],
                }));
            }
            misses.push((spec.instance_type.clone(), key));
        }

        let provider = Arc::clone(&self.spot);
        let region = self.region.clone();
        let window_secs = self.spot_window.as_secs();

        let results = self
            .spot_pool
            .run(lookups, move |lookup| {
                let provider = Arc::clone(&provider);
                let candidate = lookup.candidate;
                let query = SpotPriceQuery {
                    region: region.clone(),
                    instance_type: lookup.instance_type,
                    zones: lookup.zones,
                    product_descriptions: descriptions.clone(),
                    window_secs,
                };
                async move {
                    match provider.get_spot_price_history(&query).await {
                        Ok(points) => Ok::<_, PricingError>((candidate, Some(points))),
                        Err(e) => {
                            tolerate(&query.instance_type, e)?;
                            Ok((candidate, None))
                        }
                    }
                }
            })
            .await?;

        // Points per candidate; `None` once any of its lookups was skipped.
        let mut collected: Vec<Option<Vec<SpotPricePoint>>> = vec![Some(Vec::new()); misses.len()];
        for (candidate, points) in results {
            let slot = &mut collected[candidate];
            match points {
                Some(points) => {
                    if let Some(all) = slot {
                        all.extend(points);
                    }
                }
                None => *slot = None,
            }
        }

        for ((instance_type, key), points) in misses.into_iter().zip(collected) {
            let Some(points) = points else { continue };
            let points: Vec<SpotPricePoint> = points
                .into_iter()
                .filter(|p| p.price.is_finite() && p.price >= 0.0)
                .collect();

            let quote = aggregate_prices(&points, request.strategy).map(|(price, zone)| PriceQuote {
                instance_type: instance_type.clone(),
                price,
                source: PriceSource::Spot,
                zone,
                zone_prices: latest_by_zone(&points),
            });
            if quote.is_none() {
                debug!(%instance_type, "no spot price history");
            }

            self.cache.insert(key, quote.clone(), self.ttl).await;
            if let Some(quote) = quote {
                quotes.insert(instance_type, quote);
            }
        }

        Ok(quotes)
    }
}

/// Per-item errors drop the type; anything else aborts the batch.
fn tolerate(instance_type: &str, error: ProviderError) -> PricingResult<()> {
    if error.is_call_fatal() {
        return Err(error.into());
    }
    warn!(%instance_type, error = %error, "skipping instance type");
    Ok(())
}
