//! Thin client for the USDA NASS Quick Stats API.

use crate::error::{AgentError, Result};
use crate::params::{ParamKey, ParamMap, ParamValue};
use polars::prelude::*;
use serde_json::Value;
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

pub const USDA_BASE_URL: &str = "https://quickstats.nass.usda.gov/api/api_GET/";

/// Columns shown first in previews, in this order.
pub const PREFERRED_COLUMNS: [&str; 18] = [
    "commodity_desc",
    "class_desc",
    "prodn_practice_desc",
    "util_practice_desc",
    "statisticcat_desc",
    "unit_desc",
    "sector_desc",
    "group_desc",
    "agg_level_desc",
    "state_alpha",
    "state_name",
    "county_name",
    "year",
    "freq_desc",
    "reference_period_desc",
    "short_desc",
    "domain_desc",
    "value",
];

/// Small query used to check that the API answers.
pub fn default_example_params() -> ParamMap {
    let mut params = ParamMap::new();
    for (key, value) in [
        (ParamKey::CommodityDesc, "CORN"),
        (ParamKey::StatisticcatDesc, "YIELD"),
        (ParamKey::UnitDesc, "BU / ACRE"),
        (ParamKey::AggLevelDesc, "STATE"),
        (ParamKey::StateAlpha, "IA"),
        (ParamKey::Year, "2023"),
    ] {
        params.insert(key, ParamValue::Single(value.to_string()));
    }
    params
}

pub struct UsdaClient {
    api_key: String,
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl UsdaClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AgentError::Configuration("USDA API key is required".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Usda(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            api_key,
            base_url: USDA_BASE_URL.to_string(),
            timeout,
            http,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn query(&self, params: &ParamMap) -> Vec<(&'static str, String)> {
        let mut query = vec![("key", self.api_key.clone())];
        query.extend(params.query_pairs());
        query
    }

    async fn get(&self, params: &ParamMap) -> Result<Value> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&self.query(params))
            .send()
            .await
            .map_err(|e| AgentError::Usda(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AgentError::Usda(format!("HTTP {}: {}", status, error_text)));
        }

        response
            .json()
            .await
            .map_err(|e| AgentError::Usda(format!("Invalid response body: {}", e)))
    }

    /// Fetch the rows matching `params`.
    pub async fn fetch(&self, params: &ParamMap) -> Result<QueryResult> {
        info!("Querying Quick Stats with {} parameter(s)", params.len());
        let body = self.get(params).await?;
        let records: &[Value] = match body.get("data") {
            Some(Value::Array(records)) => records.as_slice(),
            _ => &[],
        };
        let result = QueryResult::from_records(records)?;
        info!("Quick Stats returned {} row(s)", result.rows());
        Ok(result)
    }

    /// True when the example query succeeds.
    pub async fn check_connection(&self) -> bool {
        match self.get(&default_example_params()).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Error connecting to USDA API: {}", e);
                false
            }
        }
    }
}

/// Tabular Quick Stats result. Every column is kept as text, the way the API
/// reports it (e.g. `"1,234"` or `"(D)"` in `value`).
#[derive(Debug, Clone)]
pub struct QueryResult {
    frame: DataFrame,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self { frame: DataFrame::empty() }
    }

    /// Build a frame from JSON records. Columns appear in first-seen order;
    /// missing fields become nulls.
    pub fn from_records(records: &[Value]) -> Result<Self> {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            if let Value::Object(fields) = record {
                for name in fields.keys() {
                    if !columns.iter().any(|c| c == name) {
                        columns.push(name.clone());
                    }
                }
            }
        }
        if columns.is_empty() {
            return Ok(Self::empty());
        }

        let series: Vec<Series> = columns
            .iter()
            .map(|name| {
                let values: Vec<Option<String>> = records
                    .iter()
                    .map(|record| record.get(name).and_then(cell_text))
                    .collect();
                Series::new(name, values)
            })
            .collect();

        Ok(Self { frame: DataFrame::new(series)? })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn rows(&self) -> usize {
        self.frame.height()
    }

    pub fn cols(&self) -> usize {
        self.frame.width()
    }

    pub fn columns(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|c| c.to_string())
            .collect()
    }

    /// Text of a single cell, `None` for nulls or unknown columns.
    pub fn cell(&self, column: &str, row: usize) -> Option<String> {
        let series = self.frame.column(column).ok()?;
        series.str().ok()?.get(row).map(|s| s.to_string())
    }

    /// All cells of one column; empty for unknown columns.
    pub fn column_values(&self, column: &str) -> Vec<Option<String>> {
        let Ok(series) = self.frame.column(column) else {
            return Vec::new();
        };
        match series.str() {
            Ok(ca) => ca.into_iter().map(|v| v.map(|s| s.to_string())).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// First `max_rows` rows with the preferred columns moved to the front.
    pub fn preview(&self, max_rows: usize) -> Result<DataFrame> {
        if self.cols() == 0 {
            return Ok(DataFrame::empty());
        }
        let columns = self.columns();
        let mut ordered: Vec<String> = PREFERRED_COLUMNS
            .iter()
            .filter(|p| columns.iter().any(|c| c == *p))
            .map(|p| p.to_string())
            .collect();
        ordered.extend(columns.into_iter().filter(|c| !PREFERRED_COLUMNS.contains(&c.as_str())));

        Ok(self.frame.select(ordered)?.head(Some(max_rows)))
    }

    /// First `max_rows` rows as JSON records.
    pub fn records(&self, max_rows: usize) -> Vec<serde_json::Map<String, Value>> {
        let columns = self.columns();
        (0..self.rows().min(max_rows))
            .map(|row| {
                columns
                    .iter()
                    .map(|c| {
                        let cell = self.cell(c, row).map(Value::String).unwrap_or(Value::Null);
                        (c.clone(), cell)
                    })
                    .collect()
            })
            .collect()
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        let mut frame = self.frame.clone();
        CsvWriter::new(&mut file).finish(&mut frame)?;
        Ok(())
    }

    /// Write the CSV only when there are rows. Returns whether a file was written.
    pub fn save_csv(&self, path: &Path) -> Result<bool> {
        if self.rows() == 0 {
            info!("No rows to save, skipping {}", path.display());
            return Ok(false);
        }
        self.write_csv(path)?;
        Ok(true)
    }
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
