//! Google Sheets v4 REST store.
//!
//! Endpoints used:
//!   GET  /v4/spreadsheets/{id}/values/{range}                        row count
//!   PUT  /v4/spreadsheets/{id}/values/{range}?valueInputOption=...   value write
//!   GET  /v4/spreadsheets/{id}?fields=sheets.properties              sheet id lookup
//!   POST /v4/spreadsheets/{id}:batchUpdate                           formatting
//!
//! Values go to an explicit A1 range (not `values:append`), so the rows the
//! formulas were rendered for are the rows that get written.

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Url;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::format_plan::{FormatOp, FormatPlan, GridRange};
use crate::row::AppendBatch;
use crate::store::SheetStore;

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

#[derive(Debug, Deserialize)]
struct ValueRangeResponse {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

/// Quote a sheet title for A1 notation.
pub fn quote_sheet(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Body of the `values.update` call for `batch`.
pub fn values_body(batch: &AppendBatch, sheet_name: &str) -> Value {
    json!({
        "range": batch.a1_range(sheet_name),
        "majorDimension": "ROWS",
        "values": batch.values(),
    })
}

fn grid_range(sheet_id: i64, r: GridRange) -> Value {
    json!({
        "sheetId": sheet_id,
        "startRowIndex": r.start_row_index,
        "endRowIndex": r.end_row_index,
        "startColumnIndex": r.start_column_index,
        "endColumnIndex": r.end_column_index,
    })
}

/// Body of the `batchUpdate` call carrying `plan`.
pub fn batch_update_body(sheet_id: i64, plan: &FormatPlan) -> Value {
    let solid = json!({"style": "SOLID", "width": 1});
    let requests: Vec<Value> = plan
        .ops
        .iter()
        .map(|op| match op {
            FormatOp::AlignRight(r) => json!({
                "repeatCell": {
                    "range": grid_range(sheet_id, *r),
                    "cell": {"userEnteredFormat": {"horizontalAlignment": "RIGHT"}},
                    "fields": "userEnteredFormat.horizontalAlignment",
                }
            }),
            FormatOp::SolidBorders(r) => json!({
                "updateBorders": {
                    "range": grid_range(sheet_id, *r),
                    "top": solid,
                    "bottom": solid,
                    "left": solid,
                    "right": solid,
                    "innerHorizontal": solid,
                    "innerVertical": solid,
                }
            }),
        })
        .collect();
    json!({ "requests": requests })
}

pub struct GoogleSheetsStore {
    client: reqwest::Client,
    base_url: Url,
    spreadsheet_id: String,
    sheet_name: String,
    access_token: String,
    sheet_id: OnceCell<i64>,
}

impl GoogleSheetsStore {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        sheet_name: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: Url::parse(DEFAULT_BASE_URL)?,
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
            access_token: access_token.into(),
            sheet_id: OnceCell::new(),
        })
    }

    /// Point at another host, e.g. a local stub.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = Url::parse(base_url).with_context(|| format!("invalid base url {base_url}"))?;
        Ok(self)
    }

    /// `{base}/v4/spreadsheets/{id}` followed by `tail` segments, each percent-encoded.
    fn url(&self, first: &str, tail: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("base url {} cannot take a path", self.base_url))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", first])
            .extend(tail);
        Ok(url)
    }

    async fn send(&self, req: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let resp = req
            .bearer_auth(&self.access_token)
            .send()
            .await
            .with_context(|| format!("{what}: request failed"))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("{what}: Sheets API returned {status}: {body}");
        }
        Ok(resp)
    }

    async fn resolve_sheet_id(&self) -> Result<i64> {
        let mut url = self.url(&self.spreadsheet_id, &[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties(sheetId,title)");
        let resp: SpreadsheetResponse = self
            .send(self.client.get(url), "looking up sheet id")
            .await?
            .json()
            .await
            .context("decoding spreadsheet metadata")?;
        resp.sheets
            .into_iter()
            .find(|s| s.properties.title == self.sheet_name)
            .map(|s| s.properties.sheet_id)
            .ok_or_else(|| anyhow!("worksheet {:?} not found in spreadsheet", self.sheet_name))
    }

    async fn sheet_id(&self) -> Result<i64> {
        self.sheet_id
            .get_or_try_init(|| self.resolve_sheet_id())
            .await
            .copied()
    }
}

impl SheetStore for GoogleSheetsStore {
    async fn row_count(&self) -> Result<usize> {
        let url = self.url(&self.spreadsheet_id, &["values", &quote_sheet(&self.sheet_name)])?;
        let resp: ValueRangeResponse = self
            .send(self.client.get(url), "reading worksheet values")
            .await?
            .json()
            .await
            .context("decoding worksheet values")?;
        debug!(rows = resp.values.len(), sheet = %self.sheet_name, "read worksheet");
        Ok(resp.values.len())
    }

    async fn write_rows(&self, batch: &AppendBatch) -> Result<()> {
        let range = batch.a1_range(&self.sheet_name);
        let mut url = self.url(&self.spreadsheet_id, &["values", &range])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");
        self.send(
            self.client.put(url).json(&values_body(batch, &self.sheet_name)),
            "writing values",
        )
        .await?;
        debug!(%range, rows = batch.len(), "values written");
        Ok(())
    }

    async fn apply_format(&self, plan: &FormatPlan) -> Result<()> {
        if plan.is_empty() {
            return Ok(());
        }
        let sheet_id = self.sheet_id().await?;
        let url = self.url(&format!("{}:batchUpdate", self.spreadsheet_id), &[])?;
        self.send(
            self.client.post(url).json(&batch_update_body(sheet_id, plan)),
            "applying formatting",
        )
        .await?;
        Ok(())
    }
}
