//! Structured pipeline events, passed explicitly to each stage.

use std::sync::Mutex;

use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    Fetched { count: usize },
    Normalized { count: usize },
    /// Nothing to append; no sheet I/O was performed.
    Skipped,
    StartRowResolved { existing_rows: usize, start_row: u32 },
    ValuesWritten { start_row: u32, end_row: u32 },
    Formatted { start_row: u32, end_row: u32, operations: usize },
}

pub trait EventSink {
    fn record(&self, event: PipelineEvent);
}

/// Forwards events to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::Fetched { count } => info!(count, "fetched raw transactions"),
            PipelineEvent::Normalized { count } => info!(count, "normalized transactions"),
            PipelineEvent::Skipped => info!("nothing to append"),
            PipelineEvent::StartRowResolved {
                existing_rows,
                start_row,
            } => info!(existing_rows, start_row, "resolved start row"),
            PipelineEvent::ValuesWritten { start_row, end_row } => {
                info!(start_row, end_row, "wrote values")
            }
            PipelineEvent::Formatted {
                start_row,
                end_row,
                operations,
            } => info!(start_row, end_row, operations, "applied formatting"),
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: PipelineEvent) {}
}

/// Keeps events in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl MemorySink {
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
