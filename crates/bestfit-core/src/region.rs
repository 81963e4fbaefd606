//! Region codes bestfit can price.

const REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "af-south-1",
    "ap-east-1",
    "ap-south-1",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-southeast-3",
    "ca-central-1",
    "cn-north-1",
    "cn-northwest-1",
    "eu-central-1",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-north-1",
    "eu-south-1",
    "il-central-1",
    "me-south-1",
    "sa-east-1",
];

/// Whether the region code is one bestfit can price.
pub fn is_known_region(region: &str) -> bool {
    REGIONS.contains(&region)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_regions_resolve() {
        assert!(is_known_region("us-east-1"));
        assert!(is_known_region("eu-north-1"));
        assert!(is_known_region("sa-east-1"));
    }

    #[test]
    fn unknown_region_is_rejected() {
        assert!(!is_known_region("mars-north-1"));
        assert!(!is_known_region(""));
        assert!(!is_known_region("US-EAST-1"));
    }

    #[test]
    fn codes_are_unique() {
        let mut codes = REGIONS.to_vec();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), REGIONS.len());
    }
}
