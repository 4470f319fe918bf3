pub mod csv_export;
pub mod http;
pub mod json_export;

use std::path::Path;

use anyhow::Result;
use daybook_core::{DateFormats, RawTransaction};

use crate::types::{DateRange, TransactionSource};
use csv_export::CsvFileSource;
use http::HttpSource;
use json_export::JsonFileSource;

/// Keep records dated inside `range`. Records whose date does not parse are
/// kept so normalization can report them instead of losing them silently.
pub(crate) fn filter_range(
    raws: Vec<RawTransaction>,
    range: DateRange,
    formats: &DateFormats,
) -> Vec<RawTransaction> {
    raws.into_iter()
        .filter(|raw| formats.parse(&raw.date).is_none_or(|d| range.contains(d)))
        .collect()
}

/// Source picked at runtime from configuration.
#[derive(Debug, Clone)]
pub enum Source {
    Json(JsonFileSource),
    Csv(CsvFileSource),
    Http(HttpSource),
}

impl Source {
    /// Pick a file source from the extension (`.csv`, anything else is JSON).
    pub fn from_path(path: &Path, date_formats: DateFormats) -> Self {
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if is_csv {
            Source::Csv(CsvFileSource::new(path, date_formats))
        } else {
            Source::Json(JsonFileSource::new(path, date_formats))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Source::Json(s) => format!("json:{}", s.path().display()),
            Source::Csv(s) => format!("csv:{}", s.path().display()),
            Source::Http(_) => "http".to_string(),
        }
    }
}

impl TransactionSource for Source {
    async fn fetch(&self, range: DateRange) -> Result<Vec<RawTransaction>> {
        match self {
            Source::Json(s) => s.fetch(range).await,
            Source::Csv(s) => s.fetch(range).await,
            Source::Http(s) => s.fetch(range).await,
        }
    }
}
