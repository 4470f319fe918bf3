//! Append coordinator: find the first free row, write the batch, format it.

use daybook_core::{Error, EventSink, NormalizedTransaction, PipelineEvent, Result};
use tracing::{debug, instrument};

use crate::format_plan::FormatPlan;
use crate::formulas::FormulaSet;
use crate::row::format_batch;
use crate::store::SheetStore;

pub struct AppendCoordinator<'a, S> {
    store: &'a S,
    formulas: &'a FormulaSet,
    events: &'a dyn EventSink,
}

impl<'a, S: SheetStore> AppendCoordinator<'a, S> {
    pub fn new(store: &'a S, formulas: &'a FormulaSet, events: &'a dyn EventSink) -> Self {
        Self {
            store,
            formulas,
            events,
        }
    }

    /// Append after the sheet's last occupied row. Returns the number of rows written.
    ///
    /// The row count is read right before writing. Two runs overlapping on the
    /// same sheet can still read the same count; callers that need more must
    /// serialize runs or use [`append_at`](Self::append_at) with a start row
    /// they reserved themselves.
    #[instrument(level = "info", skip_all, fields(transactions = txns.len()))]
    pub async fn append(&self, txns: &[NormalizedTransaction]) -> Result<usize> {
        if txns.is_empty() {
            self.events.record(PipelineEvent::Skipped);
            return Ok(0);
        }

        let existing_rows = self
            .store
            .row_count()
            .await
            .map_err(|e| Error::io("reading sheet row count", e))?;
        let start_row = u32::try_from(existing_rows)
            .ok()
            .and_then(|n| n.checked_add(1))
            .ok_or_else(|| Error::configuration(format!("sheet has too many rows ({existing_rows})")))?;
        self.events.record(PipelineEvent::StartRowResolved {
            existing_rows,
            start_row,
        });

        self.append_at(txns, start_row).await
    }

    /// Write starting at an explicit 1-based `start_row`.
    #[instrument(level = "debug", skip_all, fields(start_row = start_row, transactions = txns.len()))]
    pub async fn append_at(&self, txns: &[NormalizedTransaction], start_row: u32) -> Result<usize> {
        if txns.is_empty() {
            self.events.record(PipelineEvent::Skipped);
            return Ok(0);
        }

        let batch = format_batch(txns, start_row, self.formulas)?;
        let (start_row, end_row) = (batch.start_row(), batch.end_row());
        debug!(start_row, end_row, formulas_version = self.formulas.version, "batch formatted");

        self.store
            .write_rows(&batch)
            .await
            .map_err(|e| Error::io(format!("writing rows {start_row}-{end_row}"), e))?;
        self.events
            .record(PipelineEvent::ValuesWritten { start_row, end_row });

        // Only after the values are in, and only over the rows just written.
        let plan = FormatPlan::for_batch(&batch);
        self.store
            .apply_format(&plan)
            .await
            .map_err(|e| Error::io(format!("formatting rows {start_row}-{end_row}"), e))?;
        self.events.record(PipelineEvent::Formatted {
            start_row,
            end_row,
            operations: plan.ops.len(),
        });

        Ok(batch.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemorySheet, StoreCall};
    use chrono::NaiveDate;
    use daybook_core::{MemorySink, NullSink};
    use rust_decimal::Decimal;

    fn txns(n: usize) -> Vec<NormalizedTransaction> {
        let d = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        (0..n)
            .map(|i| NormalizedTransaction::new(d, &format!("op {i}"), Decimal::new(-1050, 2)))
            .collect()
    }

    #[tokio::test]
    async fn test_empty_input_touches_nothing() {
        let sheet = MemorySheet::with_rows(5);
        let sink = MemorySink::default();
        let formulas = FormulaSet::default();
        let n = AppendCoordinator::new(&sheet, &formulas, &sink)
            .append(&[])
            .await
            .unwrap();
        assert_eq!(n, 0);
        assert!(sheet.calls().is_empty());
        assert_eq!(sink.events(), vec![PipelineEvent::Skipped]);
    }

    #[tokio::test]
    async fn test_calls_in_order() {
        let sheet = MemorySheet::with_rows(2);
        let formulas = FormulaSet::default();
        let n = AppendCoordinator::new(&sheet, &formulas, &NullSink)
            .append(&txns(3))
            .await
            .unwrap();
        assert_eq!(n, 3);
        assert_eq!(
            sheet.calls(),
            vec![StoreCall::RowCount, StoreCall::WriteRows, StoreCall::ApplyFormat]
        );
        assert_eq!(sheet.rows().len(), 5);
        assert_eq!(sheet.rows()[0], vec![serde_json::json!("existing 1")]);
    }

    #[tokio::test]
    async fn test_append_at_explicit_row() {
        let sheet = MemorySheet::with_rows(2);
        let formulas = FormulaSet::default();
        let n = AppendCoordinator::new(&sheet, &formulas, &NullSink)
            .append_at(&txns(2), 10)
            .await
            .unwrap();
        assert_eq!(n, 2);
        assert!(!sheet.calls().contains(&StoreCall::RowCount));
        let rows = sheet.rows();
        assert_eq!(rows.len(), 11);
        assert!(rows[9][5].as_str().unwrap().contains("E10;"));
        assert!(rows[10][6].as_str().unwrap().contains("E11;"));
        let range = sheet.plans()[0].ops[0].range();
        assert_eq!((range.start_row_index, range.end_row_index), (9, 11));
    }

    #[tokio::test]
    async fn test_write_failure_skips_formatting() {
        let sheet = MemorySheet::with_rows(1).failing_on(StoreCall::WriteRows);
        let formulas = FormulaSet::default();
        let err = AppendCoordinator::new(&sheet, &formulas, &NullSink)
            .append(&txns(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().starts_with("writing rows 2-2"));
        assert!(!sheet.calls().contains(&StoreCall::ApplyFormat));
    }

    #[tokio::test]
    async fn test_row_count_failure_is_io() {
        let sheet = MemorySheet::with_rows(1).failing_on(StoreCall::RowCount);
        let formulas = FormulaSet::default();
        let err = AppendCoordinator::new(&sheet, &formulas, &NullSink)
            .append(&txns(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("reading sheet row count"));
        assert_eq!(sheet.calls(), vec![StoreCall::RowCount]);
    }

    #[tokio::test]
    async fn test_format_failure_reports_error() {
        let sheet = MemorySheet::with_rows(0).failing_on(StoreCall::ApplyFormat);
        let sink = MemorySink::default();
        let formulas = FormulaSet::default();
        let err = AppendCoordinator::new(&sheet, &formulas, &sink)
            .append(&txns(2))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("formatting rows 1-2"));
        assert!(!sink
            .events()
            .iter()
            .any(|e| matches!(e, PipelineEvent::Formatted { .. })));
    }
}
