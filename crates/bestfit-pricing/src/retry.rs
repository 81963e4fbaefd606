//! Retry decorator for provider collaborators.
//!
//! Transient failures (throttling, timeouts) are retried with exponential
//! backoff: the delay starts at `base_delay_ms`, doubles on every failure
//! and is capped at `max_delay_ms`. Once `max_attempts` calls have failed
//! the error surfaces as [`ProviderError::RetriesExhausted`]. Any other
//! error is returned on the first attempt.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use bestfit_core::{
    CatalogPage, CatalogProvider, OnDemandPriceProvider, OperatingSystem, ProviderError,
    ProviderResult, Providers, RetryConfig, SpotPricePoint, SpotPriceProvider, SpotPriceQuery,
};

/// Wraps a collaborator and retries its transient failures.
pub struct RetryingProvider<P: ?Sized> {
    inner: Arc<P>,
    config: RetryConfig,
}

impl<P: ?Sized> RetryingProvider<P> {
    pub fn new(inner: Arc<P>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    async fn call<T, F, Fut>(&self, operation: &'static str, mut call: F) -> ProviderResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProviderResult<T>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "provider call recovered");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() => {
                    if attempt >= max_attempts {
                        warn!(operation, attempts = attempt, error = %e, "provider retries exhausted");
                        return Err(ProviderError::RetriesExhausted {
                            attempts: attempt,
                            last: e.to_string(),
                        });
                    }
                    let delay = self.config.delay_for(attempt);
                    debug!(operation, attempt, ?delay, error = %e, "retrying provider call");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl<P: CatalogProvider + ?Sized> CatalogProvider for RetryingProvider<P> {
    async fn list_instance_types(
        &self,
        region: &str,
        page_token: Option<&str>,
    ) -> ProviderResult<CatalogPage> {
        self.call("list_instance_types", || self.inner.list_instance_types(region, page_token))
            .await
    }
}

#[async_trait]
impl<P: OnDemandPriceProvider + ?Sized> OnDemandPriceProvider for RetryingProvider<P> {
    async fn get_on_demand_price(
        &self,
        region: &str,
        instance_type: &str,
        operating_system: OperatingSystem,
    ) -> ProviderResult<Option<f64>> {
        self.call("get_on_demand_price", || {
            self.inner.get_on_demand_price(region, instance_type, operating_system)
        })
        .await
    }
}

#[async_trait]
impl<P: SpotPriceProvider + ?Sized> SpotPriceProvider for RetryingProvider<P> {
    async fn get_spot_price_history(&self, query: &SpotPriceQuery) -> ProviderResult<Vec<SpotPricePoint>> {
        self.call("get_spot_price_history", || self.inner.get_spot_price_history(query))
            .await
    }
}

/// Wrap all three collaborators in [`RetryingProvider`].
pub fn with_retry(providers: Providers, config: &RetryConfig) -> Providers {
    Providers {
        catalog: Arc::new(RetryingProvider::new(providers.catalog, config.clone())),
        on_demand: Arc::new(RetryingProvider::new(providers.on_demand, config.clone())),
        spot: Arc::new(RetryingProvider::new(providers.spot, config.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Fails with queued errors before answering with a fixed price.
    struct Flaky {
        failures: Mutex<Vec<ProviderError>>,
        calls: Mutex<Vec<tokio::time::Instant>>,
    }

    impl Flaky {
        fn new(failures: Vec<ProviderError>) -> Self {
            Self {
                failures: Mutex::new(failures),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<tokio::time::Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OnDemandPriceProvider for Flaky {
        async fn get_on_demand_price(
            &self,
            _region: &str,
            _instance_type: &str,
            _operating_system: OperatingSystem,
        ) -> ProviderResult<Option<f64>> {
            self.calls.lock().unwrap().push(tokio::time::Instant::now());
            let mut failures = self.failures.lock().unwrap();
            if failures.is_empty() {
                Ok(Some(0.096))
            } else {
                Err(failures.remove(0))
            }
        }
    }

    fn config() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 300,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried_with_backoff() {
        let inner = Arc::new(Flaky::new(vec![
            ProviderError::Throttled("slow down".into()),
            ProviderError::Timeout("deadline".into()),
        ]));
        let provider = RetryingProvider::new(Arc::clone(&inner), config());

        let price = provider
            .get_on_demand_price("us-east-1", "m5.large", OperatingSystem::Linux)
            .await
            .unwrap();
        assert_eq!(price, Some(0.096));

        let calls = inner.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1] - calls[0], Duration::from_millis(200));
        // doubled to 400ms, capped at 300ms
        assert_eq!(calls[2] - calls[1], Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_are_reported() {
        let inner = Arc::new(Flaky::new(vec![
            ProviderError::Throttled("1".into()),
            ProviderError::Throttled("2".into()),
            ProviderError::Throttled("3".into()),
        ]));
        let provider = RetryingProvider::new(Arc::clone(&inner), config());

        let err = provider
            .get_on_demand_price("us-east-1", "m5.large", OperatingSystem::Linux)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ProviderError::RetriesExhausted {
                attempts: 3,
                last: ProviderError::Throttled("3".into()).to_string(),
            }
        );
        assert!(err.is_call_fatal());
        assert_eq!(inner.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_errors_are_not_retried() {
        let inner = Arc::new(Flaky::new(vec![ProviderError::Unauthorized("no creds".into())]));
        let provider = RetryingProvider::new(Arc::clone(&inner), config());

        let err = provider
            .get_on_demand_price("us-east-1", "m5.large", OperatingSystem::Linux)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unauthorized(_)));
        assert_eq!(inner.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn wraps_trait_objects() {
        let inner: Arc<dyn OnDemandPriceProvider> =
            Arc::new(Flaky::new(vec![ProviderError::Timeout("once".into())]));
        let provider: Arc<dyn OnDemandPriceProvider> =
            Arc::new(RetryingProvider::new(inner, config()));

        let price = provider
            .get_on_demand_price("us-east-1", "m5.large", OperatingSystem::Linux)
            .await
            .unwrap();
        assert_eq!(price, Some(0.096));
    }
}
