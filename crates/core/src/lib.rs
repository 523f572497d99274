pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod telemetry;

use chrono::{Months, NaiveDate};
use models::{
    complex::{ComplexDetails, SearchHit, Selection, UnitType},
    price::{PriceRecord, TimeSeries},
    report::Workbook,
    settings::Settings,
    statistics::Statistics,
    window::DateWindow,
    zoom::{YDomain, ZoomState},
};
use providers::kbland::KbLandProvider;
use providers::traits::RealEstateProvider;
use services::{
    history_service::{ApplyOutcome, HistoryRequest, HistoryService},
    report_exporter::ReportExporter,
    statistics_aggregator::StatisticsAggregator,
    time_series_store::TimeSeriesStore,
};
use tracing::{debug, warn};

use errors::CoreError;

/// Main entry point for the apartment price dashboard core.
///
/// Wires the selection flow (search → complex → unit type → date range)
/// to the price-history provider, and exposes the windowed series,
/// statistics, chart zoom and report export to the UI shell.
#[must_use]
pub struct PriceDashboard {
    settings: Settings,
    provider: Box<dyn RealEstateProvider>,
    search_hits: Vec<SearchHit>,
    complex: Option<ComplexDetails>,
    unit_types: Vec<UnitType>,
    unit_type: Option<UnitType>,
    /// Range sent to the provider on the next history fetch.
    query_range: DateWindow,
    store: TimeSeriesStore,
    history_service: HistoryService,
    statistics: StatisticsAggregator,
    exporter: ReportExporter,
    /// Set while the latest issued history request is unresolved.
    loading: bool,
}

impl std::fmt::Debug for PriceDashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceDashboard")
            .field("complex", &self.complex.as_ref().map(|c| &c.name))
            .field("unit_type", &self.unit_type.as_ref().map(|u| &u.type_id))
            .field("query_range", &self.query_range)
            .field("records", &self.store.series().len())
            .field("window", &self.store.window())
            .field("loading", &self.loading)
            .finish()
    }
}

/// `[today - months, today]`, clamped to `today` if the subtraction underflows.
pub fn default_query_range(today: NaiveDate, months: u32) -> DateWindow {
    let start = today.checked_sub_months(Months::new(months)).unwrap_or(today);
    DateWindow::new(start, today)
}

impl PriceDashboard {
    /// Create a dashboard backed by the KB Land API.
    pub fn new(settings: Settings) -> Result<Self, CoreError> {
        settings.validate()?;
        let provider = KbLandProvider::new(&settings);
        Self::with_provider(settings, Box::new(provider))
    }

    /// Create a dashboard backed by any provider (mocks, alternative APIs).
    pub fn with_provider(
        settings: Settings,
        provider: Box<dyn RealEstateProvider>,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        let today = chrono::Utc::now().date_naive();
        let query_range = default_query_range(today, settings.default_lookback_months);
        Ok(Self {
            settings,
            provider,
            search_hits: Vec::new(),
            complex: None,
            unit_types: Vec::new(),
            unit_type: None,
            query_range,
            store: TimeSeriesStore::new(),
            history_service: HistoryService::new(),
            statistics: StatisticsAggregator::new(),
            exporter: ReportExporter::new(),
            loading: false,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ── Selection ───────────────────────────────────────────────────

    /// Search apartment complexes by keyword. A blank keyword clears the
    /// hits without calling the provider.
    pub async fn search(&mut self, keyword: &str) -> Result<&[SearchHit], CoreError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            self.search_hits.clear();
            return Ok(&self.search_hits);
        }
        match self.provider.search(keyword).await {
            Ok(hits) => {
                debug!(hits = hits.len(), "search completed");
                self.search_hits = hits;
                Ok(&self.search_hits)
            }
            Err(e) => {
                self.search_hits.clear();
                Err(e)
            }
        }
    }

    #[must_use]
    pub fn search_hits(&self) -> &[SearchHit] {
        &self.search_hits
    }

    /// Resolve a search hit and load its unit types.
    ///
    /// Any previous unit-type selection and loaded series are dropped, and
    /// in-flight history responses become stale.
    pub async fn select_complex(&mut self, display_name: &str) -> Result<&ComplexDetails, CoreError> {
        self.complex = None;
        self.unit_types.clear();
        self.unit_type = None;
        self.reset_series();

        let details = self.provider.fetch_details(display_name).await?;
        let complex = self.complex.insert(details);
        debug!(complex_id = %complex.complex_id, name = %complex.name, "complex selected");

        match self.provider.fetch_unit_types(&complex.complex_id).await {
            Ok(types) => self.unit_types = types,
            Err(e) => {
                warn!(error = %e, "failed to load unit types");
                return Err(e);
            }
        }

        self.complex
            .as_ref()
            .ok_or(CoreError::MissingSelection("apartment"))
    }

    #[must_use]
    pub fn complex(&self) -> Option<&ComplexDetails> {
        self.complex.as_ref()
    }

    #[must_use]
    pub fn unit_types(&self) -> &[UnitType] {
        &self.unit_types
    }

    /// Choose one of the loaded unit types by id.
    pub fn select_unit_type(&mut self, type_id: &str) -> Result<(), CoreError> {
        if self.complex.is_none() {
            return Err(CoreError::MissingSelection("apartment"));
        }
        let unit = self
            .unit_types
            .iter()
            .find(|u| u.type_id == type_id)
            .cloned()
            .ok_or_else(|| {
                CoreError::ValidationError(format!("Unknown unit type '{type_id}' for this complex"))
            })?;
        self.unit_type = Some(unit);
        self.reset_series();
        Ok(())
    }

    #[must_use]
    pub fn unit_type(&self) -> Option<&UnitType> {
        self.unit_type.as_ref()
    }

    /// Change the date range. Inverted bounds are swapped.
    ///
    /// The store window is narrowed immediately (zoom history is kept);
    /// the new range also becomes the range of the next history fetch.
    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.query_range = DateWindow::new(start, end);
        self.store.set_window(start, end);
    }

    #[must_use]
    pub fn query_range(&self) -> DateWindow {
        self.query_range
    }

    /// Export metadata for the current complex and unit type.
    #[must_use]
    pub fn selection(&self) -> Option<Selection> {
        match (&self.complex, &self.unit_type) {
            (Some(complex), Some(unit)) => Some(Selection::from_parts(complex, unit)),
            _ => None,
        }
    }

    fn reset_series(&mut self) {
        self.history_service.invalidate();
        self.store.clear();
        self.loading = false;
    }

    // ── Price history ───────────────────────────────────────────────

    /// Issue a history request for the current selection, or `None` when
    /// the complex or unit type is missing. Supersedes any earlier request.
    pub fn begin_history_request(&mut self) -> Option<HistoryRequest> {
        let complex = self.complex.as_ref()?;
        let unit = self.unit_type.as_ref()?;
        let request = self
            .history_service
            .issue(&complex.complex_id, &unit.type_id, self.query_range);
        self.loading = true;
        Some(request)
    }

    /// Run the provider call for an issued request. Does not touch state,
    /// so several requests may be in flight at once.
    pub async fn fetch_history(&self, request: &HistoryRequest) -> Result<TimeSeries, CoreError> {
        HistoryService::fetch(self.provider.as_ref(), request).await
    }

    /// Apply a fetched response. Stale responses are ignored; a provider
    /// failure of the latest request is returned after clearing `loading`.
    pub fn apply_history(
        &mut self,
        request: &HistoryRequest,
        result: Result<TimeSeries, CoreError>,
    ) -> Result<ApplyOutcome, CoreError> {
        if self.history_service.is_current(request) {
            self.loading = false;
        }
        let outcome = self
            .history_service
            .apply(&mut self.store, request, result);
        if let Err(e) = &outcome {
            warn!(error = %e, "price history fetch failed");
        }
        outcome
    }

    /// Issue, fetch and apply in one step.
    pub async fn refresh_history(&mut self) -> Result<ApplyOutcome, CoreError> {
        let Some(request) = self.begin_history_request() else {
            return Ok(ApplyOutcome::Skipped);
        };
        let result = self.fetch_history(&request).await;
        self.apply_history(&request, result)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    // ── Series & statistics ─────────────────────────────────────────

    #[must_use]
    pub fn window(&self) -> Option<DateWindow> {
        self.store.window()
    }

    #[must_use]
    pub fn windowed_series(&self) -> &[PriceRecord] {
        self.store.windowed_series()
    }

    /// What the chart draws: the windowed series narrowed by the active zoom.
    #[must_use]
    pub fn visible_series(&self) -> Vec<&PriceRecord> {
        self.store.visible_series()
    }

    #[must_use]
    pub fn y_domain(&self) -> YDomain {
        self.store.y_domain()
    }

    /// Statistics over the windowed series (zoom does not affect them).
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        self.statistics.compute(self.store.windowed_series())
    }

    // ── Chart zoom ──────────────────────────────────────────────────

    #[must_use]
    pub fn zoom_state(&self) -> ZoomState {
        self.store.zoom().state()
    }

    pub fn zoom_press(&mut self, date: NaiveDate) {
        self.store.zoom_press(date);
    }

    pub fn zoom_move(&mut self, date: NaiveDate) {
        self.store.zoom_move(date);
    }

    /// Returns `true` when the drag committed a new zoom frame.
    pub fn zoom_release(&mut self) -> bool {
        self.store.zoom_release()
    }

    pub fn zoom_undo(&mut self) -> bool {
        self.store.zoom_undo()
    }

    pub fn zoom_redo(&mut self) -> bool {
        self.store.zoom_redo()
    }

    pub fn zoom_reset(&mut self) {
        self.store.zoom_reset()
    }

    #[must_use]
    pub fn can_undo_zoom(&self) -> bool {
        self.store.zoom().can_undo()
    }

    #[must_use]
    pub fn can_redo_zoom(&self) -> bool {
        self.store.zoom().can_redo()
    }

    // ── Export ──────────────────────────────────────────────────────

    #[must_use]
    pub fn is_exportable(&self) -> bool {
        self.exporter.is_exportable(
            self.selection().as_ref(),
            self.store.window(),
            self.store.windowed_series(),
        )
    }

    /// Build the report over the windowed series, or `None` when not exportable.
    #[must_use]
    pub fn build_report(&self, today: NaiveDate) -> Option<Workbook> {
        self.exporter.build(
            self.selection().as_ref(),
            self.store.window(),
            self.store.windowed_series(),
            today,
        )
    }

    /// Report file name with the configured extension.
    #[must_use]
    pub fn export_file_name(&self, today: NaiveDate) -> Option<String> {
        self.build_report(today)
            .map(|wb| wb.file_name(&self.settings.export_extension))
    }

    /// Write the report workbook into `dir` under [`Self::export_file_name`].
    /// Returns `None` (and writes nothing) when not exportable.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn write_report(
        &self,
        dir: &std::path::Path,
        today: NaiveDate,
    ) -> Result<Option<std::path::PathBuf>, CoreError> {
        let Some(workbook) = self.build_report(today) else {
            return Ok(None);
        };
        let path = dir.join(workbook.file_name(&self.settings.export_extension));
        services::report_exporter::write_xlsx(&workbook, &path)?;
        Ok(Some(path))
    }

    /// Write the report as one CSV per sheet. Writes nothing (and returns
    /// an empty list) when not exportable.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn write_report_csv(
        &self,
        dir: &std::path::Path,
        today: NaiveDate,
    ) -> Result<Vec<std::path::PathBuf>, CoreError> {
        match self.build_report(today) {
            Some(workbook) => services::report_exporter::write_csv(&workbook, dir),
            None => Ok(Vec::new()),
        }
    }
}
