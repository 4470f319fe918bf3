//! Operations endpoint exposed by a bank gateway.
//!
//! `GET <url>?dateStart=YYYY-MM-DD&dateStop=YYYY-MM-DD` returning the same
//! JSON array as a file export. The gateway owns the bank session; this side
//! only sends an optional bearer token.

use anyhow::{Context, Result};
use daybook_core::RawTransaction;
use tracing::debug;

use super::json_export::ExportRecord;
use crate::types::{DateRange, TransactionSource};

#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            url: url.into(),
            token,
            client: reqwest::Client::new(),
        }
    }
}

impl TransactionSource for HttpSource {
    async fn fetch(&self, range: DateRange) -> Result<Vec<RawTransaction>> {
        let start = range.start.format("%Y-%m-%d").to_string();
        let stop = range.stop.format("%Y-%m-%d").to_string();
        debug!(url = %self.url, %start, %stop, "requesting operations");

        let mut req = self
            .client
            .get(&self.url)
            .query(&[("dateStart", start.as_str()), ("dateStop", stop.as_str())]);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let records: Vec<ExportRecord> = req
            .send()
            .await
            .with_context(|| format!("GET {}", self.url))?
            .error_for_status()
            .with_context(|| format!("GET {}", self.url))?
            .json()
            .await
            .context("decoding operations response")?;

        Ok(records.into_iter().map(RawTransaction::from).collect())
    }
}
