//! Historical snapshot store on the Google Sheets v4 values API

mod rows;

pub use rows::{parse_rows, trend, HistoricalRow, ParsedRows, RowLayout};

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::shared::errors::SheetError;

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

/// Credentials handed in from configuration. Minting them is not our job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetsAuth {
    Bearer(String),
    ApiKey(String),
    Anonymous,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    #[serde(default)]
    updates: Option<AppendUpdates>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    #[serde(default)]
    updated_range: Option<String>,
}

/// Read/append client for one spreadsheet
pub struct SheetsClient {
    http_client: Client,
    base_url: String,
    spreadsheet_id: String,
    auth: SheetsAuth,
}

impl SheetsClient {
    pub fn new(
        base_url: &str,
        spreadsheet_id: impl Into<String>,
        auth: SheetsAuth,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http_client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            auth,
        })
    }

    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, SheetError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| SheetError::InvalidRange(e.to_string()))?;
        let last = format!("{}{}", range, suffix);
        url.path_segments_mut()
            .map_err(|_| SheetError::InvalidRange(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", last.as_str()]);
        if let SheetsAuth::ApiKey(key) = &self.auth {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            SheetsAuth::Bearer(token) => request.bearer_auth(token),
            _ => request,
        }
    }

    /// Read a range in store order (oldest first).
    pub async fn read_rows(&self, range: &str, layout: RowLayout) -> Result<ParsedRows, SheetError> {
        let url = self.values_url(range, "")?;
        info!("Reading sheet range {}", range);
        debug!("GET {}", url);

        let response = self.authorize(self.http_client.get(url)).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SheetError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value_range: ValueRange =
            serde_json::from_str(&body).map_err(|e| SheetError::Decode(e.to_string()))?;
        let parsed = parse_rows(&value_range.values, layout);
        info!("Read {} rows from {} ({} skipped)", parsed.rows.len(), range, parsed.skipped);
        Ok(parsed)
    }

    /// Append one row, laid out as `layout`, after the last row of `range`.
    pub async fn append_row(&self, range: &str, layout: RowLayout, row: &HistoricalRow) -> Result<(), SheetError> {
        if !matches!(self.auth, SheetsAuth::Bearer(_)) {
            return Err(SheetError::MissingAuth("appending rows needs an access token"));
        }
        let mut url = self.values_url(range, ":append")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let body = json!({ "values": [row.to_cells(layout)] });
        let response = self
            .authorize(self.http_client.post(url))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(SheetError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let appended: AppendResponse =
            serde_json::from_str(&text).map_err(|e| SheetError::Decode(e.to_string()))?;
        let updated = appended
            .updates
            .and_then(|u| u.updated_range)
            .unwrap_or_else(|| range.to_string());
        info!("Appended snapshot to {}", updated);
        Ok(())
    }
}
