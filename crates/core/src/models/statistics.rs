use serde::{Deserialize, Serialize};

/// Descriptive statistics over a slice of price records.
///
/// Always a fresh snapshot of whatever slice it was computed from.
/// Every field is `0.0` when no valid input contributed to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Mean of valid sale prices
    pub avg_sale: f64,

    /// Mean of valid rent prices
    pub avg_rent: f64,

    pub max_sale: f64,
    pub min_sale: f64,

    pub max_rent: f64,
    pub min_rent: f64,

    /// Mean of `rent / sale × 100` over records where both prices are valid
    pub rent_to_sale_ratio_avg: f64,

    /// Number of records with a valid sale price
    pub sample_count: usize,
}

impl Statistics {
    /// True when nothing in the input slice was usable.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
