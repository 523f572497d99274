use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use apartment_price_core::errors::CoreError;
use apartment_price_core::models::complex::{ComplexDetails, SearchHit, UnitType};
use apartment_price_core::models::price::{PriceRecord, TimeSeries};
use apartment_price_core::models::settings::Settings;
use apartment_price_core::models::window::DateWindow;
use apartment_price_core::models::zoom::{YDomain, ZoomState};
use apartment_price_core::providers::traits::{
    DetailProvider, PriceHistoryProvider, SearchProvider, UnitTypeProvider,
};
use apartment_price_core::services::history_service::ApplyOutcome;
use apartment_price_core::services::report_exporter::SUMMARY_SHEET;
use apartment_price_core::{default_query_range, PriceDashboard};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// Mock Real-Estate Provider (for testing without real API calls)
// ═══════════════════════════════════════════════════════════════════

struct MockProvider {
    /// Series served per unit type id.
    histories: HashMap<String, TimeSeries>,
    fail_history: bool,
    history_calls: Arc<AtomicUsize>,
}

impl MockProvider {
    fn new() -> Self {
        let mut histories = HashMap::new();
        histories.insert(
            "101".to_string(),
            TimeSeries::new(
                (1..=12)
                    .map(|m| {
                        PriceRecord::new(
                            d(2023, m, 1),
                            Some(50000.0 + 500.0 * m as f64),
                            Some(25000.0 + 250.0 * m as f64),
                        )
                    })
                    .collect(),
            ),
        );
        histories.insert(
            "102".to_string(),
            TimeSeries::new(vec![
                PriceRecord::new(d(2023, 1, 1), Some(38000.0), Some(21000.0)),
                PriceRecord::new(d(2023, 2, 1), Some(39000.0), None),
            ]),
        );
        Self {
            histories,
            fail_history: false,
            history_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn failing() -> Self {
        Self {
            fail_history: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl SearchProvider for MockProvider {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn search(&self, keyword: &str) -> Result<Vec<SearchHit>, CoreError> {
        if !"광안자이".contains(keyword) {
            return Ok(Vec::new());
        }
        Ok(vec![SearchHit {
            text: "광안자이".into(),
            display_name: "(수영구 광안동)광안자이".into(),
            address: "수영구 광안동".into(),
        }])
    }
}

#[async_trait]
impl DetailProvider for MockProvider {
    async fn fetch_details(&self, display_name: &str) -> Result<ComplexDetails, CoreError> {
        if display_name != "(수영구 광안동)광안자이" {
            return Err(CoreError::NotFound(format!("No complex matches '{display_name}'")));
        }
        Ok(ComplexDetails {
            complex_id: "12345".into(),
            name: "광안자이".into(),
            address: "부산광역시 수영구 광안동 1234".into(),
            road_address: None,
            households: Some(975),
        })
    }
}

#[async_trait]
impl UnitTypeProvider for MockProvider {
    async fn fetch_unit_types(&self, _complex_id: &str) -> Result<Vec<UnitType>, CoreError> {
        Ok(vec![
            UnitType {
                type_id: "101".into(),
                exclusive_area_sqm: 84.97,
                supply_area_sqm: 112.4,
                type_label: Some("A".into()),
                households: Some(320),
            },
            UnitType {
                type_id: "102".into(),
                exclusive_area_sqm: 59.0,
                supply_area_sqm: 79.0,
                type_label: None,
                households: None,
            },
        ])
    }
}

#[async_trait]
impl PriceHistoryProvider for MockProvider {
    async fn fetch_history(
        &self,
        _complex_id: &str,
        type_id: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<TimeSeries, CoreError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_history {
            return Err(CoreError::Network("connection reset".into()));
        }
        Ok(self.histories.get(type_id).cloned().unwrap_or_default())
    }
}

fn dashboard(provider: MockProvider) -> PriceDashboard {
    PriceDashboard::with_provider(Settings::default(), Box::new(provider)).unwrap()
}

/// Dashboard with complex "광안자이" and unit type `type_id` selected.
async fn selected(provider: MockProvider, type_id: &str) -> PriceDashboard {
    let mut dash = dashboard(provider);
    dash.select_complex("(수영구 광안동)광안자이").await.unwrap();
    dash.select_unit_type(type_id).unwrap();
    dash
}

// ═══════════════════════════════════════════════════════════════════
// Construction & defaults
// ═══════════════════════════════════════════════════════════════════

mod construction {
    use super::*;

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = Settings {
            request_timeout_secs: 0,
            ..Settings::default()
        };
        let err = PriceDashboard::with_provider(settings, Box::new(MockProvider::new())).unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn fresh_dashboard_is_empty() {
        let dash = dashboard(MockProvider::new());
        assert!(dash.complex().is_none());
        assert!(dash.unit_type().is_none());
        assert!(dash.selection().is_none());
        assert!(dash.window().is_none());
        assert!(dash.windowed_series().is_empty());
        assert!(!dash.is_loading());
        assert!(!dash.is_exportable());
        assert_eq!(dash.zoom_state(), ZoomState::Idle);
    }

    #[test]
    fn default_range_spans_lookback() {
        let dash = dashboard(MockProvider::new());
        let range = dash.query_range();
        let expected = default_query_range(range.end, 12);
        assert_eq!(range, expected);
    }

    #[test]
    fn default_query_range_subtracts_months() {
        let range = default_query_range(d(2024, 3, 31), 1);
        assert_eq!(range, DateWindow::new(d(2024, 2, 29), d(2024, 3, 31)));
    }

    #[test]
    fn default_tracing_installs_at_most_once() {
        let _ = apartment_price_core::telemetry::init_default_tracing();
        assert!(!apartment_price_core::telemetry::init_default_tracing());
    }

    #[test]
    fn debug_output_omits_provider() {
        let dash = dashboard(MockProvider::new());
        let debug = format!("{dash:?}");
        assert!(debug.starts_with("PriceDashboard"));
        assert!(debug.contains("loading"));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Selection flow
// ═══════════════════════════════════════════════════════════════════

mod selection {
    use super::*;

    #[tokio::test]
    async fn search_returns_hits() {
        let mut dash = dashboard(MockProvider::new());
        let hits = dash.search("광안").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].display_name, "(수영구 광안동)광안자이");
        assert_eq!(dash.search_hits().len(), 1);
    }

    #[tokio::test]
    async fn blank_search_clears_hits() {
        let mut dash = dashboard(MockProvider::new());
        dash.search("광안").await.unwrap();
        assert!(dash.search("   ").await.unwrap().is_empty());
        assert!(dash.search_hits().is_empty());
    }

    #[tokio::test]
    async fn select_complex_loads_unit_types() {
        let mut dash = dashboard(MockProvider::new());
        let complex = dash.select_complex("(수영구 광안동)광안자이").await.unwrap();
        assert_eq!(complex.complex_id, "12345");
        assert_eq!(dash.unit_types().len(), 2);
        assert!(dash.unit_type().is_none());
    }

    #[tokio::test]
    async fn unknown_complex_is_not_found() {
        let mut dash = dashboard(MockProvider::new());
        let err = dash.select_complex("없는단지").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        assert!(dash.complex().is_none());
        assert!(dash.unit_types().is_empty());
    }

    #[test]
    fn unit_type_without_complex_is_missing_selection() {
        let mut dash = dashboard(MockProvider::new());
        let err = dash.select_unit_type("101").unwrap_err();
        assert!(matches!(err, CoreError::MissingSelection("apartment")));
    }

    #[tokio::test]
    async fn unknown_unit_type_is_validation_error() {
        let mut dash = dashboard(MockProvider::new());
        dash.select_complex("(수영구 광안동)광안자이").await.unwrap();
        let err = dash.select_unit_type("999").unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
        assert!(dash.unit_type().is_none());
    }

    #[tokio::test]
    async fn selection_carries_export_metadata() {
        let dash = selected(MockProvider::new(), "101").await;
        let sel = dash.selection().unwrap();
        assert_eq!(sel.apartment_name, "광안자이");
        assert_eq!(sel.address, "부산광역시 수영구 광안동 1234");
        assert_eq!(sel.unit_area_label, "84.97㎡");
    }

    #[test]
    fn inverted_date_range_is_swapped() {
        let mut dash = dashboard(MockProvider::new());
        dash.set_date_range(d(2023, 6, 30), d(2023, 1, 1));
        assert_eq!(dash.query_range(), DateWindow::new(d(2023, 1, 1), d(2023, 6, 30)));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Price history
// ═══════════════════════════════════════════════════════════════════

mod history {
    use super::*;

    #[tokio::test]
    async fn refresh_without_selection_is_skipped() {
        let mut dash = dashboard(MockProvider::new());
        let outcome = dash.refresh_history().await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Skipped);
        assert!(!dash.is_loading());
        assert!(dash.begin_history_request().is_none());
    }

    #[tokio::test]
    async fn refresh_loads_series_and_window() {
        let mut dash = selected(MockProvider::new(), "101").await;
        let outcome = dash.refresh_history().await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied { records: 12 });
        assert!(!dash.is_loading());
        assert_eq!(dash.window(), Some(DateWindow::new(d(2023, 1, 1), d(2023, 12, 1))));
        assert_eq!(dash.windowed_series().len(), 12);
        assert_eq!(dash.visible_series().len(), 12);
    }

    #[tokio::test]
    async fn loading_flag_tracks_latest_request() {
        let mut dash = selected(MockProvider::new(), "101").await;
        let request = dash.begin_history_request().unwrap();
        assert!(dash.is_loading());
        let result = dash.fetch_history(&request).await;
        dash.apply_history(&request, result).unwrap();
        assert!(!dash.is_loading());
    }

    #[tokio::test]
    async fn stale_response_is_discarded() {
        let mut dash = selected(MockProvider::new(), "101").await;
        let older = dash.begin_history_request().unwrap();
        let older_result = dash.fetch_history(&older).await;

        dash.select_unit_type("102").unwrap();
        let newer = dash.begin_history_request().unwrap();
        let newer_result = dash.fetch_history(&newer).await;

        // The newer response arrives first; the older one must not overwrite it.
        assert_eq!(
            dash.apply_history(&newer, newer_result).unwrap(),
            ApplyOutcome::Applied { records: 2 }
        );
        assert_eq!(dash.apply_history(&older, older_result).unwrap(), ApplyOutcome::Stale);

        assert_eq!(dash.windowed_series().len(), 2);
        assert_eq!(dash.windowed_series()[0].sale_price, Some(38000.0));
        assert!(!dash.is_loading());
    }

    #[tokio::test]
    async fn response_after_selection_change_is_stale() {
        let mut dash = selected(MockProvider::new(), "101").await;
        let request = dash.begin_history_request().unwrap();
        let result = dash.fetch_history(&request).await;

        dash.select_unit_type("102").unwrap();
        assert!(!dash.is_loading());
        assert_eq!(dash.apply_history(&request, result).unwrap(), ApplyOutcome::Stale);
        assert!(dash.windowed_series().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_clears_loading() {
        let mut dash = selected(MockProvider::failing(), "101").await;
        let err = dash.refresh_history().await.unwrap_err();
        assert!(matches!(err, CoreError::Network(_)));
        assert!(!dash.is_loading());
        assert!(dash.windowed_series().is_empty());
    }

    #[tokio::test]
    async fn date_range_narrows_loaded_series() {
        let mut dash = selected(MockProvider::new(), "101").await;
        dash.refresh_history().await.unwrap();
        dash.set_date_range(d(2023, 3, 1), d(2023, 5, 31));
        assert_eq!(dash.windowed_series().len(), 3);
        assert_eq!(dash.query_range(), DateWindow::new(d(2023, 3, 1), d(2023, 5, 31)));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Statistics, zoom & export over the dashboard
// ═══════════════════════════════════════════════════════════════════

mod end_to_end {
    use super::*;

    #[tokio::test]
    async fn statistics_follow_the_window() {
        let mut dash = selected(MockProvider::new(), "101").await;
        dash.refresh_history().await.unwrap();

        let all = dash.statistics();
        assert_eq!(all.sample_count, 12);
        assert_eq!(all.max_sale, 56000.0);
        assert_eq!(all.min_sale, 50500.0);
        assert_eq!(all.rent_to_sale_ratio_avg, 50.0);

        dash.set_date_range(d(2023, 1, 1), d(2023, 2, 28));
        let narrowed = dash.statistics();
        assert_eq!(narrowed.sample_count, 2);
        assert_eq!(narrowed.avg_sale, 50750.0);
    }

    #[tokio::test]
    async fn zoom_does_not_change_statistics() {
        let mut dash = selected(MockProvider::new(), "101").await;
        dash.refresh_history().await.unwrap();
        let before = dash.statistics();

        dash.zoom_press(d(2023, 3, 1));
        dash.zoom_move(d(2023, 5, 1));
        assert!(dash.zoom_release());
        assert_eq!(dash.zoom_state(), ZoomState::Zoomed);
        assert_eq!(dash.visible_series().len(), 3);
        assert_eq!(dash.statistics(), before);
    }

    #[tokio::test]
    async fn zoom_undo_redo_reset() {
        let mut dash = selected(MockProvider::new(), "101").await;
        dash.refresh_history().await.unwrap();

        dash.zoom_press(d(2023, 3, 1));
        dash.zoom_move(d(2023, 5, 1));
        dash.zoom_release();
        // May sale price 52500 → ceil(57750)
        assert_eq!(dash.y_domain(), YDomain::new(0.0, 57750.0));

        assert!(dash.can_undo_zoom());
        assert!(dash.zoom_undo());
        assert_eq!(dash.zoom_state(), ZoomState::Idle);
        assert_eq!(dash.visible_series().len(), 12);
        assert_eq!(dash.y_domain(), YDomain::new(0.0, 61600.0));

        assert!(dash.can_redo_zoom());
        assert!(dash.zoom_redo());
        assert_eq!(dash.visible_series().len(), 3);

        dash.zoom_reset();
        assert_eq!(dash.zoom_state(), ZoomState::Idle);
        assert!(!dash.can_redo_zoom());
    }

    #[tokio::test]
    async fn reloading_clears_zoom() {
        let mut dash = selected(MockProvider::new(), "101").await;
        dash.refresh_history().await.unwrap();
        dash.zoom_press(d(2023, 3, 1));
        dash.zoom_move(d(2023, 5, 1));
        dash.zoom_release();

        dash.refresh_history().await.unwrap();
        assert_eq!(dash.zoom_state(), ZoomState::Idle);
        assert!(!dash.can_undo_zoom());
    }

    #[tokio::test]
    async fn export_requires_loaded_data() {
        let dash = selected(MockProvider::new(), "101").await;
        assert!(!dash.is_exportable());
        assert!(dash.build_report(d(2024, 1, 2)).is_none());
        assert!(dash.export_file_name(d(2024, 1, 2)).is_none());
    }

    #[tokio::test]
    async fn export_file_name_uses_configured_extension() {
        let mut dash = selected(MockProvider::new(), "101").await;
        dash.refresh_history().await.unwrap();
        assert!(dash.is_exportable());
        assert_eq!(
            dash.export_file_name(d(2024, 1, 2)).as_deref(),
            Some("광안자이_84.97㎡_20240102.xlsx")
        );
    }

    #[tokio::test]
    async fn report_covers_windowed_series() {
        let mut dash = selected(MockProvider::new(), "101").await;
        dash.refresh_history().await.unwrap();
        dash.set_date_range(d(2023, 1, 1), d(2023, 3, 31));

        let wb = dash.build_report(d(2024, 1, 2)).unwrap();
        let summary = wb.sheet(SUMMARY_SHEET).unwrap();
        assert!(summary.find_row("2023-03-01").is_some());
        assert!(summary.find_row("2023-04-01").is_none());
        assert_eq!(
            summary.find_row("Period").unwrap()[1].as_text(),
            Some("2023-01-01 ~ 2023-03-31")
        );
    }

    #[tokio::test]
    async fn write_report_uses_advertised_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut dash = selected(MockProvider::new(), "101").await;
        assert!(dash.write_report(dir.path(), d(2024, 1, 2)).unwrap().is_none());

        dash.refresh_history().await.unwrap();
        let path = dash.write_report(dir.path(), d(2024, 1, 2)).unwrap().unwrap();
        let advertised = dash.export_file_name(d(2024, 1, 2)).unwrap();
        assert_eq!(path, dir.path().join(&advertised));
        assert_eq!(advertised, "광안자이_84.97㎡_20240102.xlsx");
        assert!(path.is_file());

        // One workbook file, not one file per sheet.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn write_report_csv_writes_both_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let mut dash = selected(MockProvider::new(), "102").await;

        // Nothing loaded yet: nothing written.
        assert!(dash.write_report_csv(dir.path(), d(2024, 1, 2)).unwrap().is_empty());

        dash.refresh_history().await.unwrap();
        let paths = dash.write_report_csv(dir.path(), d(2024, 1, 2)).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.exists()));

        let summary = std::fs::read_to_string(&paths[0]).unwrap();
        assert!(summary.contains("광안자이"));
        assert!(summary.contains("2023-02-01,39000,,0"));
    }

    #[tokio::test]
    async fn provider_is_called_once_per_refresh() {
        let provider = MockProvider::new();
        let calls = Arc::clone(&provider.history_calls);
        let mut dash = dashboard(provider);

        dash.refresh_history().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        dash.select_complex("(수영구 광안동)광안자이").await.unwrap();
        dash.select_unit_type("101").unwrap();
        dash.refresh_history().await.unwrap();
        dash.refresh_history().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(dash.windowed_series().len(), 12);
    }
}
