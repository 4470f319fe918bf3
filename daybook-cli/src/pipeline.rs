//! fetch -> normalize -> append, for one date range.

use daybook_core::{Error, EventSink, Normalizer, PipelineEvent, Result};
use daybook_ingest::{DateRange, TransactionSource};
use daybook_sheets::{AppendCoordinator, FormulaSet, SheetStore};
use serde::Serialize;
use tracing::instrument;

/// What the trigger hands back to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

impl Response {
    pub fn success(rows: usize) -> Self {
        Self {
            status: "success",
            message: format!("Added {rows} transactions"),
        }
    }

    /// The whole cause chain, joined with `: `. A cause already spelled out
    /// by the layer above it is not repeated.
    pub fn error(err: &anyhow::Error) -> Self {
        let mut message = String::new();
        for cause in err.chain() {
            let text = cause.to_string();
            if message.ends_with(&text) {
                continue;
            }
            if !message.is_empty() {
                message.push_str(": ");
            }
            message.push_str(&text);
        }
        Self {
            status: "error",
            message,
        }
    }
}

pub struct Pipeline<'a> {
    pub normalizer: &'a Normalizer,
    pub formulas: &'a FormulaSet,
    pub events: &'a dyn EventSink,
}

impl Pipeline<'_> {
    /// Returns the number of rows appended.
    #[instrument(level = "info", skip_all, fields(start = %range.start, stop = %range.stop))]
    pub async fn run(
        &self,
        source: &impl TransactionSource,
        store: &impl SheetStore,
        range: DateRange,
    ) -> Result<usize> {
        let raws = source
            .fetch(range)
            .await
            .map_err(|e| Error::io("fetching transactions", e))?;
        self.events.record(PipelineEvent::Fetched { count: raws.len() });

        let txns = self.normalizer.normalize(&raws, self.events)?;
        AppendCoordinator::new(store, self.formulas, self.events)
            .append(&txns)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use chrono::NaiveDate;
    use daybook_core::{MemorySink, RawTransaction};
    use daybook_sheets::{MemorySheet, StoreCall};

    struct StaticSource(Vec<RawTransaction>);

    impl TransactionSource for StaticSource {
        async fn fetch(&self, _range: DateRange) -> anyhow::Result<Vec<RawTransaction>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenSource;

    impl TransactionSource for BrokenSource {
        async fn fetch(&self, _range: DateRange) -> anyhow::Result<Vec<RawTransaction>> {
            bail!("bank session expired")
        }
    }

    fn today() -> DateRange {
        DateRange::day(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
    }

    #[tokio::test]
    async fn test_run_appends_and_reports_count() {
        let source = StaticSource(vec![
            RawTransaction::new("Jan 05, 2024, 10:30:00 AM", "Carrefour Paris!!", "-23.4"),
            RawTransaction::new("Jan 05, 2024, 02:10:00 PM", "VIR SEPA", "100"),
        ]);
        let sheet = MemorySheet::with_rows(5);
        let sink = MemorySink::default();
        let pipeline = Pipeline {
            normalizer: &Normalizer::default(),
            formulas: &FormulaSet::default(),
            events: &sink,
        };
        let n = pipeline.run(&source, &sheet, today()).await.unwrap();
        assert_eq!(n, 2);
        assert_eq!(Response::success(n).message, "Added 2 transactions");
        assert_eq!(sheet.rows().len(), 7);
        assert_eq!(sink.events()[0], PipelineEvent::Fetched { count: 2 });
    }

    #[tokio::test]
    async fn test_source_failure_is_io_and_sheet_untouched() {
        let sheet = MemorySheet::with_rows(5);
        let pipeline = Pipeline {
            normalizer: &Normalizer::default(),
            formulas: &FormulaSet::default(),
            events: &MemorySink::default(),
        };
        let err = pipeline.run(&BrokenSource, &sheet, today()).await.unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.to_string(), "fetching transactions: bank session expired");
        assert!(sheet.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_record_leaves_sheet_untouched() {
        let source = StaticSource(vec![RawTransaction::new("2024-01-05", "x", "abc")]);
        let sheet = MemorySheet::with_rows(5);
        let pipeline = Pipeline {
            normalizer: &Normalizer::default(),
            formulas: &FormulaSet::default(),
            events: &MemorySink::default(),
        };
        let err = pipeline.run(&source, &sheet, today()).await.unwrap_err();
        assert!(matches!(err, Error::Validation { index: 0, .. }));
        assert!(!sheet.calls().contains(&StoreCall::WriteRows));
        assert!(sheet.calls().is_empty());
    }

    #[test]
    fn test_error_response_carries_chain() {
        let err = anyhow::Error::from(Error::configuration("missing SHEET_NAME")).context("loading config");
        let resp = Response::error(&err);
        assert_eq!(resp.status, "error");
        assert_eq!(resp.message, "loading config: configuration error: missing SHEET_NAME");
    }

    #[test]
    fn test_error_response_does_not_repeat_io_cause() {
        let err = anyhow::Error::from(Error::io("fetching transactions", anyhow::anyhow!("timeout")));
        assert_eq!(Response::error(&err).message, "fetching transactions: timeout");
    }
}
