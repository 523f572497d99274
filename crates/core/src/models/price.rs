use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One monthly observation for a (complex, unit type) pair.
///
/// Prices are in the provider's unit (10,000 KRW) and are passed through
/// exactly as received. `None` means the provider had no quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub sale_price: Option<f64>,
    pub rent_price: Option<f64>,
}

impl PriceRecord {
    pub fn new(date: NaiveDate, sale_price: Option<f64>, rent_price: Option<f64>) -> Self {
        Self {
            date,
            sale_price,
            rent_price,
        }
    }

    /// Sale price if it is a finite, strictly positive number.
    pub fn valid_sale(&self) -> Option<f64> {
        valid_price(self.sale_price)
    }

    /// Rent (jeonse deposit) price if it is a finite, strictly positive number.
    pub fn valid_rent(&self) -> Option<f64> {
        valid_price(self.rent_price)
    }

    /// The taller of the two valid prices, used for chart Y scaling.
    pub fn peak_price(&self) -> Option<f64> {
        match (self.valid_sale(), self.valid_rent()) {
            (Some(s), Some(r)) => Some(s.max(r)),
            (Some(s), None) => Some(s),
            (None, Some(r)) => Some(r),
            (None, None) => None,
        }
    }

    /// Rent as a percentage of sale, when both prices are valid.
    pub fn rent_to_sale_pct(&self) -> Option<f64> {
        let sale = self.valid_sale()?;
        let rent = self.valid_rent()?;
        Some(rent / sale * 100.0)
    }
}

fn valid_price(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// The full known price history of one (complex, unit type) pair.
///
/// Records are expected in strictly ascending, unique date order. The
/// provider layer guarantees that when it normalizes a payload; this type
/// never re-sorts what it is given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    records: Vec<PriceRecord>,
}

impl TimeSeries {
    /// Wrap records as-is. Order is preserved.
    pub fn new(records: Vec<PriceRecord>) -> Self {
        Self { records }
    }

    /// Sort ascending by date and keep the last record for each date.
    pub fn normalized(mut records: Vec<PriceRecord>) -> Self {
        // Stable sort keeps arrival order among equal dates, so the last one wins below.
        records.sort_by_key(|r| r.date);
        let mut out: Vec<PriceRecord> = Vec::with_capacity(records.len());
        for record in records {
            match out.last_mut() {
                Some(last) if last.date == record.date => *last = record,
                _ => out.push(record),
            }
        }
        Self { records: out }
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest date by value, not by position.
    pub fn min_date(&self) -> Option<NaiveDate> {
        self.records.iter().map(|r| r.date).min()
    }

    /// Latest date by value, not by position.
    pub fn max_date(&self) -> Option<NaiveDate> {
        self.records.iter().map(|r| r.date).max()
    }

    /// True when dates are strictly ascending (sorted and unique).
    pub fn is_strictly_ascending(&self) -> bool {
        self.records.windows(2).all(|w| w[0].date < w[1].date)
    }
}

impl From<Vec<PriceRecord>> for TimeSeries {
    fn from(records: Vec<PriceRecord>) -> Self {
        Self::new(records)
    }
}
