use anyhow::{Result, bail};
use chrono::NaiveDate;
use daybook_core::RawTransaction;
use serde::{Deserialize, Serialize};

/// Inclusive range of calendar days to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub stop: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, stop: NaiveDate) -> Result<Self> {
        if stop < start {
            bail!("date range ends ({stop}) before it starts ({start})");
        }
        Ok(Self { start, stop })
    }

    /// A single day, which is what the scheduled run asks for.
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            stop: date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.stop
    }
}

/// Anything that can hand back the raw bank records for a date range.
///
/// Session handling and authentication with the bank are the implementor's
/// business; callers only see raw records, in source order.
#[allow(async_fn_in_trait)]
pub trait TransactionSource {
    async fn fetch(&self, range: DateRange) -> Result<Vec<RawTransaction>>;
}
