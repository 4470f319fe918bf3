//! daybook-sheets: row formatting, formula templates and the spreadsheet append path.

pub mod coordinator;
pub mod format_plan;
pub mod formulas;
pub mod google;
pub mod row;
pub mod store;

pub use coordinator::AppendCoordinator;
pub use format_plan::{FormatOp, FormatPlan, GridRange};
pub use formulas::FormulaSet;
pub use google::GoogleSheetsStore;
pub use row::{AppendBatch, Cell, SheetRow, format_batch, round_amount};
pub use store::{MemorySheet, SheetStore, StoreCall};
