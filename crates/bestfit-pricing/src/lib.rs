//! bestfit-pricing — resolves a representative price per candidate.
//!
//! # Components
//!
//! - **`pool`** — fixed-size worker pool with insertion-order dispatch
//! - **`aggregate`** — min/max/average reduction of spot price points
//! - **`resolver`** — on-demand and spot resolution fronted by the cache
//! - **`retry`** — backoff decorator for transient provider errors
//!
//! # Fan-out / fan-in
//!
//! ```text
//! candidates ──► cache lookups ──► misses ──► WorkerPool(N) ──► provider
//!                    │                              │
//!                    └──────────── merge ◄──────────┘ (waits for all)
//! ```
//!
//! On-demand and spot lookups use separate pools sized by
//! `describe_on_demand_price_concurrency` and
//! `describe_spot_price_history_concurrency`.

pub mod aggregate;
pub mod error;
pub mod pool;
pub mod resolver;
pub mod retry;

pub use aggregate::{aggregate_prices, latest_by_zone};
pub use error::{PricingError, PricingResult};
pub use pool::WorkerPool;
pub use resolver::{PriceRequest, PriceResolver};
pub use retry::{RetryingProvider, with_retry};
