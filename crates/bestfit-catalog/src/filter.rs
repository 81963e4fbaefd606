//! Catalog filtering.
//!
//! Rejects instance types that violate any hard constraint of a request:
//! - **Floors**: vCPU and memory must be at least what was asked for
//! - **Flags**: usage class, architecture, burstable, generation, storage
//! - **Zones**: offered in at least one requested availability zone
//!
//! Over-provisioned types pass. Operating system is not a catalog
//! property and is handled at pricing.

use std::collections::BTreeSet;

use tracing::debug;

use bestfit_core::{Architecture, InstanceTypeSpec, SelectionRequest, UsageClass};

/// Constraints applied to every catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogFilter {
    pub vcpu_min: f64,
    pub memory_gb_min: f64,
    pub usage_class: Option<UsageClass>,
    pub architecture: Option<Architecture>,
    pub burstable: Option<bool>,
    pub is_current_generation: Option<bool>,
    pub is_instance_storage_supported: Option<bool>,
    pub availability_zones: Option<BTreeSet<String>>,
}

/// Why an instance type was filtered out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Vcpu,
    Memory,
    UsageClass,
    Architecture,
    Burstable,
    Generation,
    InstanceStorage,
    Zone,
}

impl From<&SelectionRequest> for CatalogFilter {
    fn from(req: &SelectionRequest) -> Self {
        Self {
            vcpu_min: req.vcpu,
            memory_gb_min: req.memory_gb,
            usage_class: Some(req.usage_class),
            architecture: req.architecture,
            burstable: req.burstable,
            is_current_generation: req.is_current_generation,
            is_instance_storage_supported: req.is_instance_storage_supported,
            availability_zones: req.zones().cloned(),
        }
    }
}

impl CatalogFilter {
    /// A filter with only resource floors.
    pub fn floors(vcpu_min: f64, memory_gb_min: f64) -> Self {
        Self {
            vcpu_min,
            memory_gb_min,
            usage_class: None,
            architecture: None,
            burstable: None,
            is_current_generation: None,
            is_instance_storage_supported: None,
            availability_zones: None,
        }
    }

    /// Check one spec, reporting the first violated constraint.
    pub fn check(&self, spec: &InstanceTypeSpec) -> Result<(), Rejection> {
        if spec.vcpu < self.vcpu_min {
            return Err(Rejection::Vcpu);
        }
        if spec.memory_gb < self.memory_gb_min {
            return Err(Rejection::Memory);
        }
        if let Some(class) = self.usage_class
            && !spec.usage_classes_supported.contains(&class)
        {
            return Err(Rejection::UsageClass);
        }
        if let Some(arch) = self.architecture
            && !spec.architectures.contains(&arch)
        {
            return Err(Rejection::Architecture);
        }
        if self.burstable.is_some_and(|b| b != spec.is_burstable) {
            return Err(Rejection::Burstable);
        }
        if self
            .is_current_generation
            .is_some_and(|g| g != spec.is_current_generation)
        {
            return Err(Rejection::Generation);
        }
        if self
            .is_instance_storage_supported
            .is_some_and(|s| s != spec.instance_storage_supported)
        {
            return Err(Rejection::InstanceStorage);
        }
        if let Some(zones) = &self.availability_zones
            && spec.supported_zones.is_disjoint(zones)
        {
            return Err(Rejection::Zone);
        }
        Ok(())
    }

    pub fn matches(&self, spec: &InstanceTypeSpec) -> bool {
        self.check(spec).is_ok()
    }
}

/// Keep the catalog entries that satisfy `filter`, in catalog order.
pub fn filter_catalog(catalog: &[InstanceTypeSpec], filter: &CatalogFilter) -> Vec<InstanceTypeSpec> {
    let kept: Vec<InstanceTypeSpec> = catalog
        .iter()
        .filter(|spec| filter.matches(spec))
        .cloned()
        .collect();
    debug!(before = catalog.len(), after = kept.len(), "catalog filtered");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, vcpu: f64, memory_gb: f64) -> InstanceTypeSpec {
        InstanceTypeSpec {
            instance_type: name.to_string(),
            vcpu,
            memory_gb,
            architectures: BTreeSet::from([Architecture::X86_64]),
            usage_classes_supported: BTreeSet::from([UsageClass::OnDemand, UsageClass::Spot]),
            is_burstable: false,
            is_current_generation: true,
            instance_storage_supported: false,
            supported_zones: BTreeSet::from(["us-east-1a".to_string(), "us-east-1b".to_string()]),
        }
    }

    #[test]
    fn floors_exclude_smaller_types() {
        let catalog = vec![spec("c5n.2xlarge", 8.0, 21.0), spec("t2.micro", 1.0, 1.0)];
        let req = SelectionRequest::new(1.0, 2.0);

        let kept = filter_catalog(&catalog, &CatalogFilter::from(&req));

        let names: Vec<_> = kept.iter().map(|s| s.instance_type.as_str()).collect();
        assert_eq!(names, vec!["c5n.2xlarge"]);
    }

    #[test]
    fn floors_are_inclusive() {
        let filter = CatalogFilter::floors(2.0, 4.0);
        assert!(filter.matches(&spec("m5.large", 2.0, 4.0)));
        assert_eq!(filter.check(&spec("m5.small", 1.0, 4.0)), Err(Rejection::Vcpu));
        assert_eq!(filter.check(&spec("m5.tiny", 2.0, 3.9)), Err(Rejection::Memory));
    }

    #[test]
    fn usage_class_must_be_supported() {
        let mut on_demand_only = spec("mac1.metal", 12.0, 32.0);
        on_demand_only.usage_classes_supported = BTreeSet::from([UsageClass::OnDemand]);

        let mut filter = CatalogFilter::floors(1.0, 1.0);
        filter.usage_class = Some(UsageClass::Spot);
        assert_eq!(filter.check(&on_demand_only), Err(Rejection::UsageClass));

        filter.usage_class = Some(UsageClass::OnDemand);
        assert!(filter.matches(&on_demand_only));
    }

    #[test]
    fn architecture_filter() {
        let mut graviton = spec("m6g.large", 2.0, 8.0);
        graviton.architectures = BTreeSet::from([Architecture::Arm64]);

        let mut filter = CatalogFilter::floors(1.0, 1.0);
        filter.architecture = Some(Architecture::X86_64);
        assert_eq!(filter.check(&graviton), Err(Rejection::Architecture));

        filter.architecture = Some(Architecture::Arm64);
        assert!(filter.matches(&graviton));
    }

    #[test]
    fn unset_burstable_accepts_both() {
        let mut t3 = spec("t3.large", 2.0, 8.0);
        t3.is_burstable = true;
        let m5 = spec("m5.large", 2.0, 8.0);

        let mut filter = CatalogFilter::floors(1.0, 1.0);
        assert!(filter.matches(&t3));
        assert!(filter.matches(&m5));

        filter.burstable = Some(false);
        assert_eq!(filter.check(&t3), Err(Rejection::Burstable));
        assert!(filter.matches(&m5));

        filter.burstable = Some(true);
        assert!(filter.matches(&t3));
        assert_eq!(filter.check(&m5), Err(Rejection::Burstable));
    }

    #[test]
    fn generation_and_storage_flags() {
        let mut legacy = spec("m3.large", 2.0, 7.5);
        legacy.is_current_generation = false;
        legacy.instance_storage_supported = true;

        let mut filter = CatalogFilter::floors(1.0, 1.0);
        filter.is_current_generation = Some(true);
        assert_eq!(filter.check(&legacy), Err(Rejection::Generation));

        filter.is_current_generation = Some(false);
        filter.is_instance_storage_supported = Some(false);
        assert_eq!(filter.check(&legacy), Err(Rejection::InstanceStorage));

        filter.is_instance_storage_supported = Some(true);
        assert!(filter.matches(&legacy));
    }

    #[test]
    fn zone_overlap_required() {
        let s = spec("m5.large", 2.0, 8.0);
        let mut filter = CatalogFilter::floors(1.0, 1.0);

        filter.availability_zones = Some(BTreeSet::from(["us-east-1f".to_string()]));
        assert_eq!(filter.check(&s), Err(Rejection::Zone));

        filter.availability_zones =
            Some(BTreeSet::from(["us-east-1f".to_string(), "us-east-1b".to_string()]));
        assert!(filter.matches(&s));
    }

    #[test]
    fn no_match_is_empty() {
        let catalog = vec![spec("t2.micro", 1.0, 1.0)];
        let kept = filter_catalog(&catalog, &CatalogFilter::floors(64.0, 256.0));
        assert!(kept.is_empty());
    }

    #[test]
    fn preserves_catalog_order() {
        let catalog = vec![
            spec("r5.xlarge", 4.0, 32.0),
            spec("c5.xlarge", 4.0, 8.0),
            spec("m5.xlarge", 4.0, 16.0),
        ];
        let kept = filter_catalog(&catalog, &CatalogFilter::floors(4.0, 8.0));
        let names: Vec<_> = kept.iter().map(|s| s.instance_type.as_str()).collect();
        assert_eq!(names, vec!["r5.xlarge", "c5.xlarge", "m5.xlarge"]);
    }

    #[test]
    fn request_conversion_carries_every_field() {
        let mut req = SelectionRequest::new(4.0, 16.0);
        req.usage_class = UsageClass::Spot;
        req.architecture = Some(Architecture::Arm64);
        req.burstable = Some(false);
        req.is_current_generation = Some(true);
        req.is_instance_storage_supported = Some(true);
        req.availability_zones = Some(BTreeSet::from(["eu-west-1a".to_string()]));

        let filter = CatalogFilter::from(&req);
        assert_eq!(filter.vcpu_min, 4.0);
        assert_eq!(filter.memory_gb_min, 16.0);
        assert_eq!(filter.usage_class, Some(UsageClass::Spot));
        assert_eq!(filter.architecture, Some(Architecture::Arm64));
        assert_eq!(filter.burstable, Some(false));
        assert_eq!(filter.is_current_generation, Some(true));
        assert_eq!(filter.is_instance_storage_supported, Some(true));
        assert_eq!(filter.availability_zones.map(|z| z.len()), Some(1));
    }

    #[test]
    fn empty_zone_list_does_not_restrict() {
        let mut req = SelectionRequest::new(1.0, 1.0);
        req.availability_zones = Some(BTreeSet::new());

        let filter = CatalogFilter::from(&req);
        assert!(filter.availability_zones.is_none());
        assert!(filter.check(&spec("m5.large", 2.0, 8.0)).is_ok());
    }
}
