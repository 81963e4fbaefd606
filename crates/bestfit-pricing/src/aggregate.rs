//! Spot price reduction.

use std::collections::BTreeMap;

use bestfit_core::{SpotPricePoint, SpotPriceStrategy, round_price};

/// Reduce all points of one instance type to a single rounded price.
///
/// Returns the price and, for `min`/`max`, the zone the chosen point came
/// from. `None` when there are no points.
pub fn aggregate_prices(
    points: &[SpotPricePoint],
    strategy: SpotPriceStrategy,
) -> Option<(f64, Option<String>)> {
    if points.is_empty() {
        return None;
    }

    match strategy {
        SpotPriceStrategy::Min => points
            .iter()
            .min_by(|a, b| a.price.total_cmp(&b.price))
            .map(|p| (round_price(p.price), Some(p.zone.clone()))),
        SpotPriceStrategy::Max => points
            .iter()
            .max_by(|a, b| a.price.total_cmp(&b.price))
            .map(|p| (round_price(p.price), Some(p.zone.clone()))),
        SpotPriceStrategy::Average => {
            let sum: f64 = points.iter().map(|p| p.price).sum();
            Some((round_price(sum / points.len() as f64), None))
        }
    }
}

/// Most recent price seen in each zone.
pub fn latest_by_zone(points: &[SpotPricePoint]) -> BTreeMap<String, f64> {
    let mut latest: BTreeMap<String, (u64, f64)> = BTreeMap::new();
    for point in points {
        match latest.get(&point.zone) {
            Some((ts, _)) if *ts >= point.timestamp => {}
            _ => {
                latest.insert(point.zone.clone(), (point.timestamp, point.price));
            }
        }
    }
    latest
        .into_iter()
        .map(|(zone, (_, price))| (zone, round_price(price)))
        .collect()
}
