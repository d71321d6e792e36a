//! Spreadsheet export sink.
//!
//! Best-effort secondary persistence: accepted text is appended to a
//! Google-Sheets-backed log, one row per call, newest row directly under the
//! header. Nothing here ever raises to its caller; failures are logged and
//! folded into an [`ExportResult`] the caller is free to ignore.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::ExportConfig;

/// Outcome of an append; informational only.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportResult {
    pub success: bool,
    pub message: String,
}

#[derive(Debug)]
enum ExportError {
    Request(reqwest::Error),
    Api { status: u16, message: String },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Request(e) => write!(f, "HTTP request failed: {e}"),
            ExportError::Api { status, message } => {
                write!(f, "Sheets API error (status {status}): {message}")
            }
        }
    }
}

impl From<reqwest::Error> for ExportError {
    fn from(err: reqwest::Error) -> Self {
        ExportError::Request(err)
    }
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

struct Target {
    spreadsheet_id: String,
    sheet_name: String,
    access_token: String,
    base_url: String,
}

/// Clonable handle to the export sink. Unconfigured sinks are a no-op.
#[derive(Clone)]
pub struct SheetsExporter {
    client: Client,
    target: Option<Arc<Target>>,
    // Numeric sheet id resolved from the spreadsheet metadata on first use.
    sheet_id: Arc<Mutex<Option<i64>>>,
}

impl SheetsExporter {
    pub fn new(config: &ExportConfig) -> Self {
        let target = match (&config.spreadsheet_id, &config.access_token) {
            (Some(spreadsheet_id), Some(access_token)) => Some(Arc::new(Target {
                spreadsheet_id: spreadsheet_id.clone(),
                sheet_name: config.sheet_name.clone(),
                access_token: access_token.clone(),
                base_url: config.base_url.trim_end_matches('/').to_string(),
            })),
            _ => None,
        };
        if target.is_none() {
            info!("export sink not configured; accepted text will not be exported");
        }
        Self {
            client: Client::new(),
            target,
            sheet_id: Arc::new(Mutex::new(None)),
        }
    }

    /// Unconfigured sink for tests and minimal deployments.
    pub fn disabled() -> Self {
        Self {
            client: Client::new(),
            target: None,
            sheet_id: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.target.is_some()
    }

    /// Append one row of `[date, text]` to the sheet. Never fails the caller.
    pub async fn append(&self, text: &str) -> ExportResult {
        let Some(target) = &self.target else {
            return ExportResult {
                success: true,
                message: "Export sink not configured, skipping".to_string(),
            };
        };

        match self.try_append(target, text).await {
            Ok(()) => ExportResult {
                success: true,
                message: "Message added to spreadsheet successfully".to_string(),
            },
            Err(e) => {
                warn!("spreadsheet append failed: {e}");
                ExportResult {
                    success: false,
                    message: format!("Failed to add message to spreadsheet: {e}"),
                }
            }
        }
    }

    async fn try_append(&self, target: &Target, text: &str) -> Result<(), ExportError> {
        let sheet_id = self.resolve_sheet_id(target).await?;

        // Insert a blank row directly under the header, inheriting its format.
        let insert = json!({
            "requests": [{
                "insertDimension": {
                    "range": {
                        "sheetId": sheet_id,
                        "dimension": "ROWS",
                        "startIndex": 1,
                        "endIndex": 2
                    },
                    "inheritFromBefore": true
                }
            }]
        });
        self.post(
            target,
            &format!("/{}:batchUpdate", target.spreadsheet_id),
            &insert,
        )
        .await?;

        let date = Utc::now().format("%d/%m/%Y").to_string();
        let values = json!({ "values": [[date, text]] });
        let range = format!("{}!A2:B2", target.sheet_name);
        let url = format!(
            "{}/{}/values/{}?valueInputOption=RAW",
            target.base_url, target.spreadsheet_id, range
        );
        let response = self
            .client
            .put(url)
            .bearer_auth(&target.access_token)
            .json(&values)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Look the sheet id up once and cache it. Falls back to sheet 0 when
    /// the configured name is not present, matching the sheet API default.
    async fn resolve_sheet_id(&self, target: &Target) -> Result<i64, ExportError> {
        let mut cached = self.sheet_id.lock().await;
        if let Some(id) = *cached {
            return Ok(id);
        }

        let url = format!("{}/{}", target.base_url, target.spreadsheet_id);
        let response = self
            .client
            .get(url)
            .bearer_auth(&target.access_token)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let meta: SpreadsheetMeta = response.json().await?;

        let id = meta
            .sheets
            .iter()
            .find(|s| s.properties.title == target.sheet_name)
            .map(|s| s.properties.sheet_id)
            .unwrap_or(0);
        *cached = Some(id);
        info!("export sink connected (sheet id {id})");
        Ok(id)
    }

    async fn post(
        &self,
        target: &Target,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<(), ExportError> {
        let response = self
            .client
            .post(format!("{}{}", target.base_url, path))
            .bearer_auth(&target.access_token)
            .json(body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ExportError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ExportError::Api { status, message });
        }
        Ok(response)
    }
}
