//! bestfit-catalog — everything decided from the catalog alone.
//!
//! # Components
//!
//! - **`filter`** — floor/flag predicate over instance-type descriptors
//! - **`interruption`** — static spot interruption-frequency table
//! - **`loader`** — follows catalog pages until the region is complete

pub mod error;
pub mod filter;
pub mod interruption;
pub mod loader;

pub use error::{CatalogError, CatalogResult};
pub use filter::{CatalogFilter, Rejection, filter_catalog};
pub use interruption::InterruptionTable;
pub use loader::load_catalog;
