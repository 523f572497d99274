use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::services::report_exporter::XLSX_EXTENSION;

/// Runtime configuration for the dashboard core.
///
/// Every field has a default, so a partial JSON document is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the KB Land API (no trailing slash).
    pub base_url: String,

    /// Per-request timeout in seconds (native targets only).
    pub request_timeout_secs: u64,

    /// The initial query range ends today and starts this many months earlier.
    pub default_lookback_months: u32,

    /// Maximum hits requested per search collection.
    pub search_result_limit: u32,

    /// Extension of the exported workbook file. Only `xlsx` is written.
    pub export_extension: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "https://api.kbland.kr".to_string(),
            request_timeout_secs: 30,
            default_lookback_months: 12,
            search_result_limit: 100,
            export_extension: XLSX_EXTENSION.to_string(),
        }
    }
}

impl Settings {
    /// Parse settings from JSON, filling missing fields with defaults.
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.base_url.trim().is_empty() {
            return Err(CoreError::ValidationError("base_url must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::ValidationError(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.default_lookback_months == 0 {
            return Err(CoreError::ValidationError(
                "default_lookback_months must be greater than zero".into(),
            ));
        }
        if self.search_result_limit == 0 {
            return Err(CoreError::ValidationError(
                "search_result_limit must be greater than zero".into(),
            ));
        }
        let ext = &self.export_extension;
        if !ext.eq_ignore_ascii_case(XLSX_EXTENSION) {
            return Err(CoreError::ValidationError(format!(
                "Unsupported export extension '{ext}': reports are written as '{XLSX_EXTENSION}'"
            )));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
