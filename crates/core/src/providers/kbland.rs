use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::complex::{ComplexDetails, SearchHit, UnitType};
use crate::models::price::{PriceRecord, TimeSeries};
use crate::models::settings::Settings;
use super::traits::{DetailProvider, PriceHistoryProvider, SearchProvider, UnitTypeProvider};

const PROVIDER_NAME: &str = "KB Land";

const SEARCH_PATH: &str = "/land-complex/serch/autoKywrSerch";
const DETAILS_PATH: &str = "/land-complex/serch/intgraSerch";
const UNIT_TYPES_PATH: &str = "/land-complex/complex/mpriByType";
const PRICE_CHART_PATH: &str = "/land-price/price/PerMn/IntgrationChart";

/// Result code the API puts in `dataHeader` on success.
const RESULT_OK: &str = "10000";

/// Search collections queried by the keyword search. Only apartment hits
/// (`COL_AT_HSCM`) are surfaced.
const SEARCH_COLLECTIONS: [&str; 5] = [
    "COL_AT_JUSO",
    "COL_AT_SCHOOL",
    "COL_AT_SUBWAY",
    "COL_AT_HSCM",
    "COL_AT_VILLA",
];

/// KB Land (kbland.kr) real-estate API client.
///
/// - **Free**: no API key.
/// - **Coverage**: Korean apartment complexes, monthly KB quotes.
/// - **Units**: prices are in 10,000 KRW (만원).
///
/// Query parameter names are Korean, as the API expects them.
pub struct KbLandProvider {
    client: Client,
    base_url: String,
    search_result_limit: u32,
}

impl KbLandProvider {
    pub fn new(settings: &Settings) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(settings.request_timeout_secs));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: settings.api_base().to_string(),
            search_result_limit: settings.search_result_limit,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String, CoreError> {
        let url = format!("{}{path}", self.base_url);
        debug!(path, "kbland request");
        let body = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

impl Default for KbLandProvider {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

// ── KB Land API response types ──────────────────────────────────────

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(rename = "dataHeader", default)]
    header: Option<DataHeader>,
    #[serde(rename = "dataBody")]
    body: Option<DataBody<T>>,
}

#[derive(Deserialize)]
struct DataHeader {
    #[serde(rename = "resultCode", deserialize_with = "lenient_string")]
    result_code: String,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct DataBody<T> {
    data: Option<T>,
}

#[derive(Deserialize)]
struct SearchCollection {
    #[serde(rename = "COL_AT_HSCM", default)]
    apartments: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    #[serde(default)]
    text: String,
    #[serde(default)]
    addr: String,
    #[serde(rename = "textTemp", default)]
    text_temp: String,
}

/// The detail payload has been seen both with and without an extra
/// `data` level around `HSCM`.
#[derive(Deserialize)]
struct DetailsData {
    data: Option<DetailsInner>,
    #[serde(rename = "HSCM")]
    hscm: Option<HscmBlock>,
}

#[derive(Deserialize)]
struct DetailsInner {
    #[serde(rename = "HSCM")]
    hscm: Option<HscmBlock>,
}

#[derive(Deserialize)]
struct HscmBlock {
    #[serde(default)]
    data: Vec<HscmRow>,
}

#[derive(Deserialize)]
struct HscmRow {
    #[serde(rename = "COMPLEX_NO", deserialize_with = "lenient_string")]
    complex_no: String,
    #[serde(rename = "HSCM_NM", default)]
    name: String,
    #[serde(rename = "BUBADDR", default)]
    address: String,
    #[serde(rename = "NEWADDRESS", default)]
    road_address: Option<String>,
    #[serde(rename = "THS_NUM", default, deserialize_with = "lenient_opt_f64")]
    households: Option<f64>,
}

#[derive(Deserialize)]
struct UnitTypeRow {
    #[serde(rename = "면적일련번호", deserialize_with = "lenient_string")]
    area_id: String,
    #[serde(rename = "전용면적", default, deserialize_with = "lenient_opt_f64")]
    exclusive_area: Option<f64>,
    #[serde(rename = "공급면적", default, deserialize_with = "lenient_opt_f64")]
    supply_area: Option<f64>,
    #[serde(rename = "주택형타입내용", default)]
    type_label: Option<String>,
    #[serde(rename = "세대수", default, deserialize_with = "lenient_opt_f64")]
    households: Option<f64>,
}

#[derive(Deserialize, Default)]
struct PriceChartData {
    #[serde(rename = "시세", default)]
    quotes: Vec<YearGroup>,
}

#[derive(Deserialize)]
struct YearGroup {
    #[serde(default)]
    items: Vec<MonthItem>,
}

#[derive(Deserialize)]
struct MonthItem {
    #[serde(rename = "기준년월", deserialize_with = "lenient_string")]
    year_month: String,
    #[serde(rename = "매매일반거래가", default, deserialize_with = "lenient_opt_f64")]
    sale: Option<f64>,
    #[serde(rename = "전세일반거래가", default, deserialize_with = "lenient_opt_f64")]
    rent: Option<f64>,
}

// ── Lenient field decoding ──────────────────────────────────────────
// The API mixes numbers and numeric strings for the same field across endpoints.

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn lenient_opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    })
}

// ── Payload parsing (pure, no I/O) ──────────────────────────────────

fn parse_envelope<T: DeserializeOwned>(json: &str, what: &str) -> Result<Option<T>, CoreError> {
    let envelope: Envelope<T> = serde_json::from_str(json).map_err(|e| CoreError::Api {
        provider: PROVIDER_NAME.into(),
        message: format!("Failed to parse {what} response: {e}"),
    })?;

    if let Some(header) = &envelope.header {
        if header.result_code != RESULT_OK {
            return Err(CoreError::Api {
                provider: PROVIDER_NAME.into(),
                message: format!(
                    "{what} failed with result code {}: {}",
                    header.result_code, header.message
                ),
            });
        }
    }

    Ok(envelope.body.and_then(|b| b.data))
}

/// Parse a keyword-search payload into apartment hits.
pub fn parse_search_response(json: &str) -> Result<Vec<SearchHit>, CoreError> {
    let collections: Vec<SearchCollection> = parse_envelope(json, "search")?.unwrap_or_default();
    Ok(collections
        .into_iter()
        .flat_map(|c| c.apartments)
        .map(|item| SearchHit {
            text: item.text,
            display_name: item.text_temp,
            address: item.addr,
        })
        .collect())
}

/// Parse an integrated-search payload into the first complex it lists.
pub fn parse_details_response(json: &str, display_name: &str) -> Result<ComplexDetails, CoreError> {
    let data: Option<DetailsData> = parse_envelope(json, "complex details")?;
    let row = data
        .and_then(|d| d.hscm.or_else(|| d.data.and_then(|inner| inner.hscm)))
        .and_then(|block| block.data.into_iter().next())
        .ok_or_else(|| CoreError::NotFound(format!("No complex matches '{display_name}'")))?;

    Ok(ComplexDetails {
        complex_id: row.complex_no,
        name: row.name,
        address: row.address,
        road_address: row.road_address.filter(|s| !s.trim().is_empty()),
        households: row.households.map(|h| h as u32),
    })
}

/// Parse a unit-type payload. Rows without an exclusive area are skipped.
pub fn parse_unit_types_response(json: &str) -> Result<Vec<UnitType>, CoreError> {
    let rows: Vec<UnitTypeRow> = parse_envelope(json, "unit types")?.unwrap_or_default();
    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let Some(exclusive) = row.exclusive_area else {
                warn!(area_id = %row.area_id, "skipping unit type without exclusive area");
                return None;
            };
            Some(UnitType {
                type_id: row.area_id,
                exclusive_area_sqm: exclusive,
                supply_area_sqm: row.supply_area.unwrap_or(exclusive),
                type_label: row.type_label.filter(|s| !s.trim().is_empty()),
                households: row.households.map(|h| h as u32),
            })
        })
        .collect())
}

/// Parse a price-chart payload into a normalized series.
///
/// Year groups are flattened; each `YYYYMM` key becomes the first day of
/// that month. The result is sorted ascending with one record per date.
pub fn parse_price_chart_response(json: &str) -> Result<TimeSeries, CoreError> {
    let data: PriceChartData = parse_envelope(json, "price chart")?.unwrap_or_default();

    let records: Vec<PriceRecord> = data
        .quotes
        .into_iter()
        .flat_map(|group| group.items)
        .filter_map(|item| {
            let Some(date) = parse_year_month(&item.year_month) else {
                warn!(key = %item.year_month, "skipping price item with unparsable month");
                return None;
            };
            Some(PriceRecord::new(date, item.sale, item.rent))
        })
        .collect();

    Ok(TimeSeries::normalized(records))
}

/// `"202301"` (or `"2023-01"`, `"2023.01"`) → 2023-01-01.
pub fn parse_year_month(key: &str) -> Option<NaiveDate> {
    let digits: String = key.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 6 {
        return None;
    }
    let year: i32 = digits[..4].parse().ok()?;
    let month: u32 = digits[4..].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl SearchProvider for KbLandProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn search(&self, keyword: &str) -> Result<Vec<SearchHit>, CoreError> {
        let limit = self.search_result_limit;
        let collections = SEARCH_COLLECTIONS
            .iter()
            .map(|c| format!("{c}:{limit}"))
            .collect::<Vec<_>>()
            .join(";");

        let body = self
            .get_text(
                SEARCH_PATH,
                &[("컬렉션설정명", collections), ("검색키워드", keyword.to_string())],
            )
            .await?;
        let hits = parse_search_response(&body)?;
        debug!(hits = hits.len(), "kbland search parsed");
        Ok(hits)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl DetailProvider for KbLandProvider {
    async fn fetch_details(&self, display_name: &str) -> Result<ComplexDetails, CoreError> {
        let body = self
            .get_text(
                DETAILS_PATH,
                &[
                    ("검색설정명", "SRC_HSCM".to_string()),
                    ("검색키워드", display_name.to_string()),
                    ("출력갯수", "2".to_string()),
                    ("페이지설정값", "1".to_string()),
                ],
            )
            .await?;
        parse_details_response(&body, display_name)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl UnitTypeProvider for KbLandProvider {
    async fn fetch_unit_types(&self, complex_id: &str) -> Result<Vec<UnitType>, CoreError> {
        let body = self
            .get_text(UNIT_TYPES_PATH, &[("단지기본일련번호", complex_id.to_string())])
            .await?;
        parse_unit_types_response(&body)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PriceHistoryProvider for KbLandProvider {
    async fn fetch_history(
        &self,
        complex_id: &str,
        type_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeSeries, CoreError> {
        let body = self
            .get_text(
                PRICE_CHART_PATH,
                &[
                    ("단지기본일련번호", complex_id.to_string()),
                    ("면적일련번호", type_id.to_string()),
                    ("거래구분", "0".to_string()),
                    ("조회구분", "0".to_string()),
                    ("조회시작일", compact_date(start)),
                    ("조회종료일", compact_date(end)),
                ],
            )
            .await?;
        let series = parse_price_chart_response(&body)?;
        debug!(complex_id, type_id, records = series.len(), "kbland price history parsed");
        Ok(series)
    }
}
