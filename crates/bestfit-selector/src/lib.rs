//! bestfit-selector — answers "which instance types fit, and which is cheapest".
//!
//! # Architecture
//!
//! ```text
//! SelectionRequest
//!   │ validate (no collaborator calls on failure)
//!   ▼
//! catalog (cache-or-fetch, paged) ──► CatalogFilter ──► candidates
//!   │
//!   ├─ spot + interruption ceiling ──► InterruptionTable drops unknown/risky types
//!   │
//!   ├─ is_best_price = false ──► names in catalog order
//!   │
//!   └─ is_best_price = true ──► PriceResolver (bounded pools, cached quotes)
//!                                  └─► rank by price, then name; truncate to limit
//! ```

pub mod error;
pub mod rank;
pub mod selector;

pub use error::{SelectorError, SelectorResult};
pub use rank::rank_by_price;
pub use selector::Selector;
