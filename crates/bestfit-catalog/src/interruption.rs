//! Spot interruption-frequency classification.
//!
//! The provider publishes, per instance type, a bucket index 0..=4 for the
//! share of spot instances reclaimed over the last month. The table below
//! ships those buckets per family; exact instance types and per-region
//! entries can be layered on top from a JSON document.
//!
//! Lookup order for `classify(instance_type, region)`:
//! 1. region entry for the exact instance type
//! 2. region entry for the family
//! 3. exact instance type
//! 4. family
//!
//! Types absent from all four are unknown and never pass a ceiling.

use std::collections::HashMap;

use serde::Deserialize;

use bestfit_core::{InterruptionFrequency, InterruptionRate, instance_family};

use crate::error::{CatalogError, CatalogResult};

/// Built-in family → bucket index.
const BUILTIN_FAMILIES: &[(&str, u8)] = &[
    ("a1", 0),
    ("c4", 1),
    ("c5", 2),
    ("c5a", 1),
    ("c5ad", 1),
    ("c5d", 2),
    ("c5n", 3),
    ("c6a", 1),
    ("c6g", 0),
    ("c6gd", 0),
    ("c6i", 2),
    ("c6id", 2),
    ("c7g", 1),
    ("c7i", 2),
    ("d2", 0),
    ("d3", 1),
    ("g4dn", 3),
    ("g5", 4),
    ("i3", 1),
    ("i3en", 2),
    ("i4i", 1),
    ("inf1", 1),
    ("m4", 0),
    ("m5", 1),
    ("m5a", 0),
    ("m5ad", 0),
    ("m5d", 1),
    ("m5n", 2),
    ("m5zn", 2),
    ("m6a", 1),
    ("m6g", 0),
    ("m6gd", 0),
    ("m6i", 1),
    ("m6id", 2),
    ("m7g", 0),
    ("m7i", 1),
    ("p3", 4),
    ("r4", 0),
    ("r5", 1),
    ("r5a", 0),
    ("r5ad", 0),
    ("r5b", 1),
    ("r5d", 1),
    ("r5n", 1),
    ("r6a", 0),
    ("r6g", 0),
    ("r6i", 1),
    ("r6id", 1),
    ("r7g", 0),
    ("t2", 0),
    ("t3", 0),
    ("t3a", 1),
    ("t4g", 0),
    ("x1", 0),
    ("x1e", 0),
    ("x2idn", 1),
    ("z1d", 2),
];

/// JSON overlay accepted by [`InterruptionTable::merge_json`].
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TableOverlay {
    families: HashMap<String, u8>,
    instance_types: HashMap<String, u8>,
    /// region → (instance type or family) → bucket index
    regions: HashMap<String, HashMap<String, u8>>,
}

/// Static interruption-frequency lookup.
#[derive(Debug, Clone, Default)]
pub struct InterruptionTable {
    families: HashMap<String, InterruptionRate>,
    instance_types: HashMap<String, InterruptionRate>,
    regions: HashMap<String, HashMap<String, InterruptionRate>>,
}

impl InterruptionTable {
    /// An empty table: every type is unknown.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The table shipped with bestfit.
    pub fn builtin() -> Self {
        let families = BUILTIN_FAMILIES
            .iter()
            .filter_map(|(family, index)| {
                InterruptionRate::from_index(*index).map(|rate| (family.to_string(), rate))
            })
            .collect();
        Self {
            families,
            ..Self::default()
        }
    }

    /// Layer a JSON document of bucket indices over this table.
    ///
    /// The table is left untouched when any entry is invalid.
    pub fn merge_json(&mut self, json: &str) -> CatalogResult<()> {
        let overlay: TableOverlay =
            serde_json::from_str(json).map_err(|e| CatalogError::InvalidTable(e.to_string()))?;

        let families = rates_for(overlay.families)?;
        let instance_types = rates_for(overlay.instance_types)?;
        let regions = overlay
            .regions
            .into_iter()
            .map(|(region, entries)| Ok((region, rates_for(entries)?)))
            .collect::<CatalogResult<Vec<_>>>()?;

        self.families.extend(families);
        self.instance_types.extend(instance_types);
        for (region, entries) in regions {
            self.regions.entry(region).or_default().extend(entries);
        }
        Ok(())
    }

    /// Set the bucket of a family.
    pub fn insert_family(&mut self, family: &str, rate: InterruptionRate) {
        self.families.insert(family.to_string(), rate);
    }

    /// Set the bucket of an exact instance type.
    pub fn insert_instance_type(&mut self, instance_type: &str, rate: InterruptionRate) {
        self.instance_types.insert(instance_type.to_string(), rate);
    }

    /// Interruption frequency of `instance_type` in `region`, if known.
    pub fn classify(&self, instance_type: &str, region: &str) -> Option<InterruptionFrequency> {
        let family = instance_family(instance_type);
        let regional = self.regions.get(region);

        regional
            .and_then(|entries| entries.get(instance_type).or_else(|| entries.get(family)))
            .or_else(|| self.instance_types.get(instance_type))
            .or_else(|| self.families.get(family))
            .copied()
            .map(InterruptionFrequency::from)
    }

    pub fn len(&self) -> usize {
        self.families.len()
            + self.instance_types.len()
            + self.regions.values().map(HashMap::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn rates_for(entries: HashMap<String, u8>) -> CatalogResult<HashMap<String, InterruptionRate>> {
    entries
        .into_iter()
        .map(|(name, index)| {
            InterruptionRate::from_index(index)
                .map(|rate| (name, rate))
                .ok_or_else(|| CatalogError::InvalidTable(format!("bucket index {index} is outside 0..=4")))
        })
        .collect()
}
