use chrono::NaiveDate;
use tracing::debug;

use crate::models::complex::Selection;
use crate::models::price::PriceRecord;
use crate::models::report::{Cell, Sheet, Workbook};
use crate::models::window::DateWindow;
use crate::services::statistics_aggregator::{round2, StatisticsAggregator};

pub const SUMMARY_SHEET: &str = "Summary";
pub const CHART_DATA_SHEET: &str = "ChartData";

/// Shown where a value has no meaningful definition (ratio of extremes,
/// ratio with a zero sale price).
pub const PLACEHOLDER: &str = "-";

/// Extension of the workbook file written by [`write_xlsx`].
pub const XLSX_EXTENSION: &str = "xlsx";

const SALE_HEADER: &str = "Sale (10k KRW)";
const RENT_HEADER: &str = "Rent (10k KRW)";
const RATIO_HEADER: &str = "Rent/Sale (%)";

const COLUMN_WIDTHS: [u16; 4] = [15, 12, 12, 12];

/// Builds the two-sheet spreadsheet report for the current selection.
///
/// Aggregates are rounded to 2 decimals; per-record prices pass through
/// untouched. A missing selection, window or data never raises: the
/// exporter reports "not exportable" and builds nothing.
pub struct ReportExporter {
    aggregator: StatisticsAggregator,
}

impl ReportExporter {
    pub fn new() -> Self {
        Self {
            aggregator: StatisticsAggregator::new(),
        }
    }

    /// Whether `build` would produce a workbook. Drives UI enablement.
    pub fn is_exportable(
        &self,
        selection: Option<&Selection>,
        window: Option<DateWindow>,
        slice: &[PriceRecord],
    ) -> bool {
        selection.is_some_and(|s| !s.apartment_name.trim().is_empty())
            && window.is_some()
            && !slice.is_empty()
    }

    pub fn build(
        &self,
        selection: Option<&Selection>,
        window: Option<DateWindow>,
        slice: &[PriceRecord],
        today: NaiveDate,
    ) -> Option<Workbook> {
        if !self.is_exportable(selection, window, slice) {
            return None;
        }
        let selection = selection?;
        let window = window?;

        let workbook = Workbook {
            file_stem: file_stem(selection, today),
            sheets: vec![
                self.summary_sheet(selection, window, slice),
                chart_data_sheet(slice),
            ],
        };
        debug!(file_stem = %workbook.file_stem, records = slice.len(), "report built");
        Some(workbook)
    }

    fn summary_sheet(&self, selection: &Selection, window: DateWindow, slice: &[PriceRecord]) -> Sheet {
        let stats = self.aggregator.compute(slice);
        let mut sheet = Sheet::new(SUMMARY_SHEET, COLUMN_WIDTHS.to_vec());

        sheet.push_row(vec![Cell::text("Apartment")]);
        sheet.push_row(vec![Cell::text("Name"), Cell::text(&selection.apartment_name)]);
        sheet.push_row(vec![Cell::text("Address"), Cell::text(&selection.address)]);
        sheet.push_row(vec![Cell::text("Unit area"), Cell::text(&selection.unit_area_label)]);
        sheet.push_row(vec![Cell::text("Period"), Cell::text(window.label())]);
        sheet.push_blank();

        sheet.push_row(vec![Cell::text("Price statistics")]);
        sheet.push_row(header_row("Metric"));
        sheet.push_row(vec![
            Cell::text("Average"),
            Cell::Number(round2(stats.avg_sale)),
            Cell::Number(round2(stats.avg_rent)),
            Cell::Number(round2(stats.rent_to_sale_ratio_avg)),
        ]);
        sheet.push_row(vec![
            Cell::text("Max"),
            Cell::Number(round2(stats.max_sale)),
            Cell::Number(round2(stats.max_rent)),
            Cell::text(PLACEHOLDER),
        ]);
        sheet.push_row(vec![
            Cell::text("Min"),
            Cell::Number(round2(stats.min_sale)),
            Cell::Number(round2(stats.min_rent)),
            Cell::text(PLACEHOLDER),
        ]);
        sheet.push_blank();

        sheet.push_row(vec![Cell::text("Details")]);
        sheet.push_row(header_row("Date"));
        for record in slice {
            let ratio = detail_ratio(record)
                .map_or_else(|| Cell::text(PLACEHOLDER), |pct| Cell::Number(round2(pct)));
            sheet.push_row(vec![
                Cell::text(record.date.format("%Y-%m-%d").to_string()),
                Cell::number_or_empty(record.sale_price),
                Cell::number_or_empty(record.rent_price),
                ratio,
            ]);
        }

        sheet
    }
}

impl Default for ReportExporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-record rent/sale percentage. Only an unusable sale price yields no
/// value; a missing rent counts as zero.
fn detail_ratio(record: &PriceRecord) -> Option<f64> {
    let sale = record.valid_sale()?;
    Some(record.valid_rent().unwrap_or(0.0) / sale * 100.0)
}

fn header_row(first: &str) -> Vec<Cell> {
    vec![
        Cell::text(first),
        Cell::text(SALE_HEADER),
        Cell::text(RENT_HEADER),
        Cell::text(RATIO_HEADER),
    ]
}

fn chart_data_sheet(slice: &[PriceRecord]) -> Sheet {
    let mut sheet = Sheet::new(CHART_DATA_SHEET, COLUMN_WIDTHS[..3].to_vec());
    sheet.push_row(vec![Cell::text("Sale/rent price trend")]);
    sheet.push_row(vec![
        Cell::text("Date"),
        Cell::text(SALE_HEADER),
        Cell::text(RENT_HEADER),
    ]);
    for record in slice {
        sheet.push_row(vec![
            Cell::text(record.date.format("%Y-%m-%d").to_string()),
            Cell::number_or_empty(record.sale_price),
            Cell::number_or_empty(record.rent_price),
        ]);
    }
    sheet
}

/// `{apartment}_{area}_{YYYYMMDD}`, with path-hostile characters replaced.
pub fn file_stem(selection: &Selection, today: NaiveDate) -> String {
    let raw = format!(
        "{}_{}_{}",
        selection.apartment_name.trim(),
        selection.unit_area_label.trim(),
        today.format("%Y%m%d")
    );
    raw.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

/// Write the workbook as a single `.xlsx` file at `path`, one worksheet per
/// sheet with its column widths applied. Empty cells are left unwritten.
#[cfg(not(target_arch = "wasm32"))]
pub fn write_xlsx(
    workbook: &Workbook,
    path: &std::path::Path,
) -> Result<(), crate::errors::CoreError> {
    let mut book = rust_xlsxwriter::Workbook::new();
    for sheet in &workbook.sheets {
        let worksheet = book.add_worksheet();
        worksheet.set_name(sheet.name.as_str())?;
        for (col, width) in sheet.column_widths.iter().enumerate() {
            worksheet.set_column_width(col as u16, f64::from(*width))?;
        }
        for (row, cells) in sheet.rows.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                let (row, col) = (row as u32, col as u16);
                match cell {
                    Cell::Text(text) => {
                        worksheet.write_string(row, col, text.as_str())?;
                    }
                    Cell::Number(n) => {
                        worksheet.write_number(row, col, *n)?;
                    }
                    Cell::Empty => {}
                }
            }
        }
    }
    book.save(path)?;
    debug!(path = %path.display(), sheets = workbook.sheets.len(), "report written as xlsx");
    Ok(())
}

/// Write each sheet as `{file_stem}_{sheet}.csv` into `dir`.
/// Returns the written paths in sheet order.
#[cfg(not(target_arch = "wasm32"))]
pub fn write_csv(
    workbook: &Workbook,
    dir: &std::path::Path,
) -> Result<Vec<std::path::PathBuf>, crate::errors::CoreError> {
    let mut written = Vec::with_capacity(workbook.sheets.len());
    for sheet in &workbook.sheets {
        let path = dir.join(format!("{}_{}.csv", workbook.file_stem, sheet.name));
        let mut writer = csv::WriterBuilder::new().flexible(true).from_path(&path)?;
        for row in &sheet.rows {
            writer.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        writer.flush()?;
        written.push(path);
    }
    debug!(files = written.len(), "report written as csv");
    Ok(written)
}
