use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::price::TimeSeries;
use crate::models::window::DateWindow;
use crate::providers::traits::PriceHistoryProvider;
use crate::services::time_series_store::TimeSeriesStore;

/// One issued price-history fetch. Carries the generation it was issued
/// under so a late response can be recognised as stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRequest {
    pub generation: u64,
    pub complex_id: String,
    pub type_id: String,
    pub range: DateWindow,
}

/// What happened to a fetched response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyOutcome {
    /// Loaded into the store.
    Applied { records: usize },
    /// A newer request (or a selection change) superseded this one; ignored.
    Stale,
    /// No complex/unit type selected, so nothing was fetched.
    Skipped,
}

/// Issues price-history requests and decides which responses to keep.
///
/// Only the response to the most recently issued request is applied.
/// Anything older is dropped without touching the store, whether it
/// succeeded or failed. Retries are left to the provider.
#[derive(Debug, Default)]
pub struct HistoryService {
    latest_generation: u64,
}

impl HistoryService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, complex_id: &str, type_id: &str, range: DateWindow) -> HistoryRequest {
        self.latest_generation += 1;
        debug!(generation = self.latest_generation, complex_id, type_id, %range, "history request issued");
        HistoryRequest {
            generation: self.latest_generation,
            complex_id: complex_id.to_string(),
            type_id: type_id.to_string(),
            range,
        }
    }

    /// Make every outstanding request stale without issuing a new one.
    pub fn invalidate(&mut self) {
        self.latest_generation += 1;
    }

    pub fn is_current(&self, request: &HistoryRequest) -> bool {
        request.generation == self.latest_generation
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest_generation
    }

    /// Run the provider call for `request`.
    pub async fn fetch<P>(provider: &P, request: &HistoryRequest) -> Result<TimeSeries, CoreError>
    where
        P: PriceHistoryProvider + ?Sized,
    {
        let series = provider
            .fetch_history(
                &request.complex_id,
                &request.type_id,
                request.range.start,
                request.range.end,
            )
            .await?;
        if !series.is_strictly_ascending() {
            // Not re-sorted here: the store shows exactly what the provider produced.
            warn!(generation = request.generation, "provider returned an unsorted or duplicated series");
        }
        Ok(series)
    }

    /// Load `result` into `store` if `request` is still the latest.
    pub fn apply(
        &self,
        store: &mut TimeSeriesStore,
        request: &HistoryRequest,
        result: Result<TimeSeries, CoreError>,
    ) -> Result<ApplyOutcome, CoreError> {
        if !self.is_current(request) {
            debug!(
                generation = request.generation,
                latest = self.latest_generation,
                "discarding stale history response"
            );
            return Ok(ApplyOutcome::Stale);
        }

        let series = result?;
        let records = series.len();
        store.load(series);
        Ok(ApplyOutcome::Applied { records })
    }
}
