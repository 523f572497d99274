use crate::models::price::PriceRecord;
use crate::models::statistics::Statistics;

/// Computes descriptive statistics over a slice of price records.
///
/// Sale and rent are filtered independently: a record with a valid rent
/// but a missing or non-positive sale price still counts toward the rent
/// aggregates, and vice versa. The ratio only uses records where both are
/// valid. Nothing here is order-sensitive.
pub struct StatisticsAggregator;

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn compute(&self, slice: &[PriceRecord]) -> Statistics {
        let sales: Vec<f64> = slice.iter().filter_map(PriceRecord::valid_sale).collect();
        let rents: Vec<f64> = slice.iter().filter_map(PriceRecord::valid_rent).collect();
        let ratios: Vec<f64> = slice
            .iter()
            .filter_map(PriceRecord::rent_to_sale_pct)
            .collect();

        Statistics {
            avg_sale: mean(&sales),
            avg_rent: mean(&rents),
            max_sale: max(&sales),
            min_sale: min(&sales),
            max_rent: max(&rents),
            min_rent: min(&rents),
            rent_to_sale_ratio_avg: mean(&ratios),
            sample_count: sales.len(),
        }
    }
}

impl Default for StatisticsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    // Sum in sorted order so a permuted slice gives bit-identical results.
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.iter().sum::<f64>() / sorted.len() as f64
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
