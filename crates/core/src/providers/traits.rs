use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::complex::{ComplexDetails, SearchHit, UnitType};
use crate::models::price::TimeSeries;

// The dashboard only depends on these four contracts. The KB Land client
// implements all of them; tests swap in mocks.

/// Keyword search over apartment complexes.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait SearchProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    async fn search(&self, keyword: &str) -> Result<Vec<SearchHit>, CoreError>;
}

/// Resolves a search hit's display name to a complex id and address.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait DetailProvider: Send + Sync {
    async fn fetch_details(&self, display_name: &str) -> Result<ComplexDetails, CoreError>;
}

/// Lists the unit types (floor plans) of a complex.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait UnitTypeProvider: Send + Sync {
    async fn fetch_unit_types(&self, complex_id: &str) -> Result<Vec<UnitType>, CoreError>;
}

/// Monthly sale/rent price history of one unit type.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PriceHistoryProvider: Send + Sync {
    /// Returns a series already sorted ascending with unique dates.
    async fn fetch_history(
        &self,
        complex_id: &str,
        type_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeSeries, CoreError>;
}

/// A provider that serves every contract the dashboard needs.
pub trait RealEstateProvider:
    SearchProvider + DetailProvider + UnitTypeProvider + PriceHistoryProvider
{
}

impl<T> RealEstateProvider for T where
    T: SearchProvider + DetailProvider + UnitTypeProvider + PriceHistoryProvider
{
}
