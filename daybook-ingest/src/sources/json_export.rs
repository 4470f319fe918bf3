//! JSON exports of bank operations.
//!
//! Two shapes are accepted, mixed freely within one array:
//!
//!   {"dateOperation": "Jan 05, 2024, 10:30:00 AM", "libelleOperation": "CB CARREFOUR", "montant": -23.4}
//!   {"date": "2024-01-05", "label": "CB CARREFOUR", "amount": "-23.4"}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use daybook_core::{DateFormats, RawAmount, RawTransaction};
use serde::Deserialize;

use super::filter_range;
use crate::types::{DateRange, TransactionSource};

/// One operation as the bank's operations feed returns it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankOperation {
    pub date_operation: String,
    pub libelle_operation: String,
    pub montant: RawAmount,
}

impl From<BankOperation> for RawTransaction {
    fn from(op: BankOperation) -> Self {
        RawTransaction {
            date: op.date_operation,
            label: op.libelle_operation,
            amount: op.montant,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ExportRecord {
    Bank(BankOperation),
    Plain(RawTransaction),
}

impl From<ExportRecord> for RawTransaction {
    fn from(rec: ExportRecord) -> Self {
        match rec {
            ExportRecord::Bank(op) => op.into(),
            ExportRecord::Plain(raw) => raw,
        }
    }
}

/// Parse a JSON array of operations into raw records, preserving order.
pub fn parse_json_export(text: &str) -> Result<Vec<RawTransaction>> {
    let records: Vec<ExportRecord> =
        serde_json::from_str(text).context("expected a JSON array of operations")?;
    Ok(records.into_iter().map(RawTransaction::from).collect())
}

#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    date_formats: DateFormats,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>, date_formats: DateFormats) -> Self {
        Self {
            path: path.into(),
            date_formats,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TransactionSource for JsonFileSource {
    async fn fetch(&self, range: DateRange) -> Result<Vec<RawTransaction>> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("read {}", self.path.display()))?;
        let raws = parse_json_export(&text)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(filter_range(raws, range, &self.date_formats))
    }
}
