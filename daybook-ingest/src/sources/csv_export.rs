//! CSV exports of bank operations.
//!
//! Banks prepend a few lines of account metadata before the table, so rows are
//! skipped until a header containing `date`, `label` and `amount` shows up
//! (case-insensitive, any column order). Amounts stay strings here; the
//! normalizer decides whether they are numeric.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use daybook_core::{DateFormats, RawAmount, RawTransaction};

use super::filter_range;
use crate::types::{DateRange, TransactionSource};

struct Columns {
    date: usize,
    label: usize,
    amount: usize,
}

fn find_columns(record: &csv::StringRecord) -> Option<Columns> {
    let position = |name: &str| {
        record
            .iter()
            .position(|field| field.trim().eq_ignore_ascii_case(name))
    };
    Some(Columns {
        date: position("date")?,
        label: position("label")?,
        amount: position("amount")?,
    })
}

/// Parse CSV text from any reader into raw records.
pub fn parse_csv_export(reader: impl Read, delimiter: u8) -> Result<Vec<RawTransaction>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut columns = None;
    let mut out = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("reading CSV row {}", line + 1))?;
        if columns.is_none() {
            columns = find_columns(&record);
            continue;
        }
        let Some(cols) = columns.as_ref() else {
            continue;
        };

        // Blank trailing rows are common in exports.
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let field = |i: usize| record.get(i).unwrap_or("").trim().to_string();
        out.push(RawTransaction {
            date: field(cols.date),
            label: field(cols.label),
            amount: RawAmount::Text(field(cols.amount)),
        });
    }

    if columns.is_none() {
        bail!("no header row with date, label and amount columns");
    }
    Ok(out)
}

#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
    delimiter: u8,
    date_formats: DateFormats,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>, date_formats: DateFormats) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
            date_formats,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TransactionSource for CsvFileSource {
    async fn fetch(&self, range: DateRange) -> Result<Vec<RawTransaction>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("read {}", self.path.display()))?;
        let raws = parse_csv_export(bytes.as_slice(), self.delimiter)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(filter_range(raws, range, &self.date_formats))
    }
}
