//! Selection request and its validation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::types::{Architecture, OperatingSystem, ProductDescription, SpotPriceStrategy, UsageClass};

/// What the caller is looking for.
///
/// `vcpu` and `memory_gb` are floors: larger instance types match too.
/// Optional booleans stay `None` when the caller does not care, which is
/// different from an explicit `false`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SelectionRequest {
    pub vcpu: f64,
    pub memory_gb: f64,
    #[serde(default)]
    pub usage_class: UsageClass,
    #[serde(default)]
    pub burstable: Option<bool>,
    #[serde(default)]
    pub architecture: Option<Architecture>,
    #[serde(default = "default_product_descriptions", alias = "operating_systems", alias = "operation_systems")]
    pub product_descriptions: BTreeSet<ProductDescription>,
    #[serde(default)]
    pub is_current_generation: Option<bool>,
    #[serde(default)]
    pub is_instance_storage_supported: Option<bool>,
    #[serde(default)]
    pub is_best_price: bool,
    #[serde(default)]
    pub max_interruption_frequency: Option<u32>,
    #[serde(default)]
    pub availability_zones: Option<BTreeSet<String>>,
    #[serde(default)]
    pub final_spot_price_determination_strategy: SpotPriceStrategy,
    /// Keep at most this many results after ranking.
    #[serde(default)]
    pub limit: Option<usize>,
}

fn default_product_descriptions() -> BTreeSet<ProductDescription> {
    BTreeSet::from([ProductDescription::LinuxUnix])
}

impl SelectionRequest {
    /// A request with only the resource floors set.
    pub fn new(vcpu: f64, memory_gb: f64) -> Self {
        Self {
            vcpu,
            memory_gb,
            usage_class: UsageClass::default(),
            burstable: None,
            architecture: None,
            product_descriptions: default_product_descriptions(),
            is_current_generation: None,
            is_instance_storage_supported: None,
            is_best_price: false,
            max_interruption_frequency: None,
            availability_zones: None,
            final_spot_price_determination_strategy: SpotPriceStrategy::default(),
            limit: None,
        }
    }

    /// Parse a JSON request, reporting missing floors by name.
    pub fn from_json(input: &str) -> ValidationResult<Self> {
        let value: serde_json::Value =
            serde_json::from_str(input).map_err(|e| ValidationError::Malformed(e.to_string()))?;
        for field in ["vcpu", "memory_gb"] {
            if value.get(field).is_none_or(serde_json::Value::is_null) {
                return Err(ValidationError::MissingField(field));
            }
        }
        serde_json::from_value(value).map_err(|e| ValidationError::Malformed(e.to_string()))
    }

    /// Check the request and return the single operating system its
    /// product descriptions resolve to.
    pub fn validate(&self) -> ValidationResult<OperatingSystem> {
        check_resource("vcpu", self.vcpu)?;
        check_resource("memory_gb", self.memory_gb)?;

        if let Some(freq) = self.max_interruption_frequency
            && freq > 100
        {
            return Err(ValidationError::InvalidInterruptionFrequency(freq));
        }

        if self.limit == Some(0) {
            return Err(ValidationError::ZeroLimit);
        }

        self.operating_system()
    }

    /// Operating system shared by every requested product description.
    pub fn operating_system(&self) -> ValidationResult<OperatingSystem> {
        let systems: BTreeSet<OperatingSystem> = self
            .product_descriptions
            .iter()
            .map(ProductDescription::operating_system)
            .collect();

        let mut iter = systems.iter();
        match (iter.next(), iter.next()) {
            (Some(os), None) => Ok(*os),
            (None, _) => Err(ValidationError::NoProductDescriptions),
            (Some(_), Some(_)) => Err(ValidationError::MixedOperatingSystems(
                systems.iter().map(|os| os.as_str()).collect::<Vec<_>>().join(", "),
            )),
        }
    }

    /// Requested zones; an empty set means no zone restriction.
    pub fn zones(&self) -> Option<&BTreeSet<String>> {
        self.availability_zones.as_ref().filter(|zones| !zones.is_empty())
    }

    /// Interruption ceiling as a percentage, once validated.
    pub fn interruption_ceiling(&self) -> Option<u8> {
        self.max_interruption_frequency
            .map(|f| u8::try_from(f.min(100)).unwrap_or(100))
    }
}

fn check_resource(field: &'static str, value: f64) -> ValidationResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidResource { field, value })
    }
}
