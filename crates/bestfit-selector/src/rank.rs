//! Merge prices into candidates and order them.

use std::cmp::Ordering;
use std::collections::HashMap;

use bestfit_core::{InstanceTypeSpec, InterruptionFrequency, PriceQuote, SelectionResult};

/// Build priced results, cheapest first.
///
/// Candidates without a quote are dropped. Equal prices are ordered by
/// instance type name so the output is deterministic.
pub fn rank_by_price(
    candidates: &[InstanceTypeSpec],
    mut quotes: HashMap<String, PriceQuote>,
    interruption: &dyn Fn(&str) -> Option<InterruptionFrequency>,
    limit: Option<usize>,
) -> Vec<SelectionResult> {
    let mut results: Vec<SelectionResult> = candidates
        .iter()
        .filter_map(|spec| {
            let quote = quotes.remove(&spec.instance_type)?;
            Some(SelectionResult {
                interruption_frequency: interruption(&spec.instance_type),
                instance_type: quote.instance_type,
                price: Some(quote.price),
                zone_prices: quote.zone_prices,
            })
        })
        .collect();

    results.sort_by(compare);
    if let Some(limit) = limit {
        results.truncate(limit);
    }
    results
}

fn compare(a: &SelectionResult, b: &SelectionResult) -> Ordering {
    let pa = a.price.unwrap_or(f64::INFINITY);
    let pb = b.price.unwrap_or(f64::INFINITY);
    pa.total_cmp(&pb)
        .then_with(|| a.instance_type.cmp(&b.instance_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    use bestfit_core::{Architecture, InterruptionRate, PriceSource, UsageClass};

    fn make_spec(name: &str) -> InstanceTypeSpec {
        InstanceTypeSpec {
            instance_type: name.to_string(),
            vcpu: 4.0,
            memory_gb: 16.0,
            architectures: BTreeSet::from([Architecture::X86_64]),
            usage_classes_supported: BTreeSet::from([UsageClass::OnDemand]),
            is_burstable: false,
            is_current_generation: true,
            instance_storage_supported: false,
            supported_zones: BTreeSet::new(),
        }
    }

    fn quotes(prices: &[(&str, f64)]) -> HashMap<String, PriceQuote> {
        prices
            .iter()
            .map(|(name, price)| {
                (
                    name.to_string(),
                    PriceQuote {
                        instance_type: name.to_string(),
                        price: *price,
                        source: PriceSource::OnDemand,
                        zone: None,
                        zone_prices: BTreeMap::new(),
                    },
                )
            })
            .collect()
    }

    fn names(results: &[SelectionResult]) -> Vec<&str> {
        results.iter().map(|r| r.instance_type.as_str()).collect()
    }

    #[test]
    fn cheapest_first_and_unpriced_dropped() {
        let candidates = [make_spec("m5.xlarge"), make_spec("c5.xlarge"), make_spec("r5.xlarge")];
        let ranked = rank_by_price(
            &candidates,
            quotes(&[("m5.xlarge", 0.192), ("c5.xlarge", 0.17)]),
            &|_| None,
            None,
        );

        assert_eq!(names(&ranked), vec!["c5.xlarge", "m5.xlarge"]);
        assert_eq!(ranked[0].price, Some(0.17));
        assert!(ranked.iter().all(|r| r.interruption_frequency.is_none()));
    }

    #[test]
    fn ties_break_by_name() {
        let candidates = [make_spec("m6i.xlarge"), make_spec("m5.xlarge"), make_spec("m6a.xlarge")];
        let ranked = rank_by_price(
            &candidates,
            quotes(&[("m6i.xlarge", 0.192), ("m5.xlarge", 0.192), ("m6a.xlarge", 0.1728)]),
            &|_| None,
            None,
        );
        assert_eq!(names(&ranked), vec!["m6a.xlarge", "m5.xlarge", "m6i.xlarge"]);
    }

    #[test]
    fn limit_truncates_after_sorting() {
        let candidates = [make_spec("a.large"), make_spec("b.large"), make_spec("c.large")];
        let ranked = rank_by_price(
            &candidates,
            quotes(&[("a.large", 3.0), ("b.large", 1.0), ("c.large", 2.0)]),
            &|_| None,
            Some(2),
        );
        assert_eq!(names(&ranked), vec!["b.large", "c.large"]);
    }

    #[test]
    fn attaches_interruption_frequency() {
        let candidates = [make_spec("r5a.8xlarge")];
        let ranked = rank_by_price(
            &candidates,
            quotes(&[("r5a.8xlarge", 0.6001)]),
            &|_| Some(InterruptionRate::UnderFive.into()),
            None,
        );
        assert_eq!(
            ranked[0].interruption_frequency.map(|f| f.rate),
            Some(InterruptionRate::UnderFive)
        );
    }
}
