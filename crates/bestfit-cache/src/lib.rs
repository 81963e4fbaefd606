//! bestfit-cache — time-bounded cache for catalog and price lookups.
//!
//! # Architecture
//!
//! A [`TtlCache`] is `Clone` + `Send` + `Sync` (backed by an `Arc`) and is
//! meant to outlive individual selection calls, so repeated requests in
//! the same process reuse catalog snapshots and price quotes.
//!
//! Keys are SHA-256 digests built from the operation kind and the
//! parameters that influence the cached value (see [`CacheKey`]). Entries
//! carry an absolute `expires_at`; an entry is never returned at or after
//! that instant. Expired entries are dropped lazily on lookup, or in bulk
//! with [`TtlCache::purge_expired`].
//!
//! Time is read from `tokio::time::Instant`, so tests can pause and
//! advance the clock.

pub mod key;
pub mod store;

pub use key::CacheKey;
pub use store::{CacheStats, TtlCache};
