//! Worksheet access used by the append coordinator.

use std::sync::Mutex;

use anyhow::{Result, anyhow, bail};
use serde_json::Value;

use crate::format_plan::FormatPlan;
use crate::row::AppendBatch;

/// One named worksheet inside one spreadsheet.
#[allow(async_fn_in_trait)]
pub trait SheetStore {
    /// Rows currently occupied, i.e. up to the last non-empty row.
    async fn row_count(&self) -> Result<usize>;

    /// Write `batch` at its own start row, letting the sheet evaluate formulas.
    async fn write_rows(&self, batch: &AppendBatch) -> Result<()>;

    async fn apply_format(&self, plan: &FormatPlan) -> Result<()>;
}

/// Store operation, used for call logs and injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreCall {
    RowCount,
    WriteRows,
    ApplyFormat,
}

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<Vec<Value>>,
    plans: Vec<FormatPlan>,
    calls: Vec<StoreCall>,
}

/// In-process worksheet for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemorySheet {
    state: Mutex<MemoryState>,
    fail_on: Option<StoreCall>,
}

impl MemorySheet {
    /// Sheet holding `n` already-filled rows.
    pub fn with_rows(n: usize) -> Self {
        let rows = (1..=n)
            .map(|i| vec![Value::String(format!("existing {i}"))])
            .collect();
        Self {
            state: Mutex::new(MemoryState {
                rows,
                ..MemoryState::default()
            }),
            fail_on: None,
        }
    }

    /// Make `call` fail every time it is made.
    pub fn failing_on(mut self, call: StoreCall) -> Self {
        self.fail_on = Some(call);
        self
    }

    pub fn rows(&self) -> Vec<Vec<Value>> {
        self.state.lock().map(|s| s.rows.clone()).unwrap_or_default()
    }

    pub fn plans(&self) -> Vec<FormatPlan> {
        self.state.lock().map(|s| s.plans.clone()).unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    fn enter(&self, call: StoreCall) -> Result<std::sync::MutexGuard<'_, MemoryState>> {
        let mut state = self.state.lock().map_err(|_| anyhow!("memory sheet lock poisoned"))?;
        state.calls.push(call);
        if self.fail_on == Some(call) {
            bail!("injected failure on {call:?}");
        }
        Ok(state)
    }
}

impl SheetStore for MemorySheet {
    async fn row_count(&self) -> Result<usize> {
        let state = self.enter(StoreCall::RowCount)?;
        Ok(state.rows.len())
    }

    async fn write_rows(&self, batch: &AppendBatch) -> Result<()> {
        let mut state = self.enter(StoreCall::WriteRows)?;
        let first = batch.start_row() as usize - 1;
        let needed = first + batch.len();
        if state.rows.len() < needed {
            state.rows.resize(needed, Vec::new());
        }
        for (slot, values) in state.rows[first..needed].iter_mut().zip(batch.values()) {
            *slot = values;
        }
        Ok(())
    }

    async fn apply_format(&self, plan: &FormatPlan) -> Result<()> {
        let mut state = self.enter(StoreCall::ApplyFormat)?;
        state.plans.push(plan.clone());
        Ok(())
    }
}
