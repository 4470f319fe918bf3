//! Formatting applied to freshly written rows.
//!
//! Ranges use the spreadsheet API convention: zero-based indices, end-exclusive.

use std::ops::Range;

use serde::Serialize;

use crate::row::AppendBatch;

/// Right-aligned column.
pub const ALIGN_RIGHT_COLUMNS: Range<u32> = 3..4;
/// Bordered block holding the literal values (A..D).
pub const VALUE_BORDER_COLUMNS: Range<u32> = 0..4;
/// Bordered block holding the lookup formulas (F..G).
pub const LOOKUP_BORDER_COLUMNS: Range<u32> = 5..7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRange {
    pub start_row_index: u32,
    pub end_row_index: u32,
    pub start_column_index: u32,
    pub end_column_index: u32,
}

impl GridRange {
    /// Rows `start_row..=end_row` (1-based, inclusive) over `columns`.
    pub fn rows(start_row: u32, end_row: u32, columns: Range<u32>) -> Self {
        Self {
            start_row_index: start_row - 1,
            end_row_index: end_row,
            start_column_index: columns.start,
            end_column_index: columns.end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatOp {
    AlignRight(GridRange),
    /// Solid 1px borders on every edge, inner lines included.
    SolidBorders(GridRange),
}

impl FormatOp {
    pub fn range(&self) -> GridRange {
        match self {
            FormatOp::AlignRight(r) | FormatOp::SolidBorders(r) => *r,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatPlan {
    pub ops: Vec<FormatOp>,
}

impl FormatPlan {
    /// Plan covering exactly the rows of `batch`. Empty batches get no ops.
    pub fn for_batch(batch: &AppendBatch) -> Self {
        if batch.is_empty() {
            return Self { ops: Vec::new() };
        }
        let (start, end) = (batch.start_row(), batch.end_row());
        Self {
            ops: vec![
                FormatOp::AlignRight(GridRange::rows(start, end, ALIGN_RIGHT_COLUMNS)),
                FormatOp::SolidBorders(GridRange::rows(start, end, VALUE_BORDER_COLUMNS)),
                FormatOp::SolidBorders(GridRange::rows(start, end, LOOKUP_BORDER_COLUMNS)),
            ],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
