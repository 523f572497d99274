use chrono::NaiveDate;
use tracing::debug;

use crate::models::price::{PriceRecord, TimeSeries};
use crate::models::window::DateWindow;
use crate::models::zoom::YDomain;
use crate::services::zoom_navigator::ZoomNavigator;

/// Holds the full price series of the current selection and the date
/// window applied to it.
///
/// The store owns the zoom navigator so that loading a new series always
/// clears the zoom history. Changing the window does NOT clear it: zoom
/// frames keep applying on top of whatever is currently windowed.
///
/// The series is kept in the order it was loaded; sorting is the provider's
/// job.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesStore {
    series: TimeSeries,
    window: Option<DateWindow>,
    /// Cached `window`-filtered copy of `series`.
    windowed: Vec<PriceRecord>,
    zoom: ZoomNavigator,
}

impl TimeSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the series, reset the window to its full date span and
    /// clear the zoom history. An empty series leaves the window unset.
    pub fn load(&mut self, series: TimeSeries) {
        self.window = match (series.min_date(), series.max_date()) {
            (Some(start), Some(end)) => Some(DateWindow::new(start, end)),
            _ => None,
        };
        debug!(records = series.len(), window = ?self.window, "series loaded");
        self.series = series;
        self.zoom.clear();
        self.recompute();
    }

    /// Drop the series entirely (selection changed, nothing loaded yet).
    pub fn clear(&mut self) {
        self.load(TimeSeries::default());
    }

    /// Set the visible window. Inverted bounds are swapped, not rejected.
    pub fn set_window(&mut self, start: NaiveDate, end: NaiveDate) {
        let window = DateWindow::new(start, end);
        debug!(%window, "window set");
        self.window = Some(window);
        self.recompute();
    }

    fn recompute(&mut self) {
        self.windowed = match self.window {
            Some(window) => self
                .series
                .records()
                .iter()
                .filter(|r| window.contains(r.date))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn window(&self) -> Option<DateWindow> {
        self.window
    }

    /// Records with `start <= date <= end`, in load order.
    pub fn windowed_series(&self) -> &[PriceRecord] {
        &self.windowed
    }

    pub fn is_loaded(&self) -> bool {
        !self.series.is_empty()
    }

    // ── Zoom ────────────────────────────────────────────────────────

    pub fn zoom(&self) -> &ZoomNavigator {
        &self.zoom
    }

    pub fn zoom_press(&mut self, date: NaiveDate) {
        self.zoom.press(date);
    }

    pub fn zoom_move(&mut self, date: NaiveDate) {
        self.zoom.move_to(date);
    }

    pub fn zoom_release(&mut self) -> bool {
        self.zoom.release(&self.windowed)
    }

    pub fn zoom_undo(&mut self) -> bool {
        self.zoom.undo()
    }

    pub fn zoom_redo(&mut self) -> bool {
        self.zoom.redo()
    }

    pub fn zoom_reset(&mut self) {
        self.zoom.reset(&self.windowed)
    }

    /// Windowed records narrowed further by the active zoom frame.
    pub fn visible_series(&self) -> Vec<&PriceRecord> {
        self.zoom.visible(&self.windowed)
    }

    pub fn y_domain(&self) -> YDomain {
        self.zoom.y_domain(&self.windowed)
    }
}
