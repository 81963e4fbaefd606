//! Fixed-size worker pool.
//!
//! `N` workers pull jobs from a shared queue in insertion order, so at most
//! `N` lookups are in flight and the next one starts as soon as a worker
//! frees up. The caller waits until every job has finished. The first
//! error stops the batch: remaining workers are aborted and queued jobs
//! never start.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::{PricingError, PricingResult};

/// A bounded pool of lookup workers.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    name: &'static str,
    size: usize,
}

impl WorkerPool {
    /// Create a pool with `size` workers (at least one).
    pub fn new(name: &'static str, size: usize) -> Self {
        Self {
            name,
            size: size.max(1),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `job` over every item and return the outputs in item order.
    pub async fn run<I, T, F, Fut>(&self, items: Vec<I>, job: F) -> PricingResult<Vec<T>>
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PricingResult<T>> + Send + 'static,
    {
        let total = items.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let queue = Arc::new(Mutex::new(items.into_iter().enumerate()));
        let job = Arc::new(job);
        let workers = self.size.min(total);
        let mut set = JoinSet::new();

        for _ in 0..workers {
            let queue = Arc::clone(&queue);
            let job = Arc::clone(&job);
            set.spawn(async move {
                let mut done = Vec::new();
                loop {
                    let next = queue.lock().await.next();
                    let Some((index, item)) = next else { break };
                    done.push((index, job(item).await?));
                }
                Ok::<_, PricingError>(done)
            });
        }

        debug!(pool = self.name, jobs = total, workers, "dispatched lookups");

        let mut results = Vec::with_capacity(total);
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(done)) => results.extend(done),
                Ok(Err(e)) => {
                    warn!(pool = self.name, error = %e, "lookup batch aborted");
                    set.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    set.abort_all();
                    return Err(PricingError::Worker(e.to_string()));
                }
            }
        }

        results.sort_unstable_by_key(|(index, _)| *index);
        Ok(results.into_iter().map(|(_, output)| output).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use bestfit_core::ProviderError;

    /// Tracks how many jobs run at once.
    #[derive(Default)]
    struct Gauge {
        current: AtomicUsize,
        peak: AtomicUsize,
        started: AtomicUsize,
    }

    impl Gauge {
        fn enter(&self) {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
        }

        fn exit(&self) {
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn never_exceeds_pool_size() {
        let gauge = Arc::new(Gauge::default());
        let pool = WorkerPool::new("test", 3);

        let g = Arc::clone(&gauge);
        let out = pool
            .run((0..20u64).collect(), move |i| {
                let g = Arc::clone(&g);
                async move {
                    g.enter();
                    tokio::time::sleep(Duration::from_millis(10 + (i % 4) * 5)).await;
                    g.exit();
                    Ok(i * 2)
                }
            })
            .await
            .unwrap();

        assert_eq!(out, (0..20u64).map(|i| i * 2).collect::<Vec<_>>());
        assert_eq!(gauge.peak.load(Ordering::SeqCst), 3);
        assert_eq!(gauge.started.load(Ordering::SeqCst), 20);
    }

    #[tokio::test]
    async fn empty_batch_is_empty() {
        let pool = WorkerPool::new("test", 4);
        let out: Vec<u32> = pool.run(Vec::<u32>::new(), |i| async move { Ok(i) }).await.unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn first_error_stops_batch() {
        let gauge = Arc::new(Gauge::default());
        let pool = WorkerPool::new("test", 2);

        let g = Arc::clone(&gauge);
        let err = pool
            .run((0..50u32).collect(), move |i| {
                let g = Arc::clone(&g);
                async move {
                    g.enter();
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    g.exit();
                    if i == 3 {
                        Err(ProviderError::Unauthorized("expired token".into()).into())
                    } else {
                        Ok(i)
                    }
                }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PricingError::Provider(ProviderError::Unauthorized(_))));
        assert!(gauge.started.load(Ordering::SeqCst) < 50);
    }

    #[tokio::test]
    async fn zero_size_means_one_worker() {
        let pool = WorkerPool::new("test", 0);
        assert_eq!(pool.size(), 1);
        let out = pool.run(vec![1, 2, 3], |i| async move { Ok(i + 1) }).await.unwrap();
        assert_eq!(out, vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn panicking_job_is_worker_error() {
        let pool = WorkerPool::new("test", 2);
        let err = pool
            .run(vec![1u32, 2], |i| async move {
                if i == 2 {
                    panic!("boom");
                }
                Ok(i)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PricingError::Worker(_)));
    }
}
