//! Raw records -> canonical transactions.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::events::{EventSink, PipelineEvent};
use crate::record::{NormalizedTransaction, RawAmount, RawTransaction};

/// Timestamp layout used by the bank's operation feed, e.g. `Jan 05, 2024, 10:30:00 AM`.
pub const VENDOR_DATETIME_FORMAT: &str = "%b %d, %Y, %I:%M:%S %p";
/// Plain ISO calendar date.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Explicit, ordered list of `chrono` format strings accepted for dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormats(Vec<String>);

impl Default for DateFormats {
    fn default() -> Self {
        Self(vec![
            VENDOR_DATETIME_FORMAT.to_string(),
            ISO_DATE_FORMAT.to_string(),
        ])
    }
}

impl DateFormats {
    pub fn new(formats: Vec<String>) -> Result<Self> {
        if formats.is_empty() {
            return Err(Error::configuration("at least one date format is required"));
        }
        Ok(Self(formats))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Parse with the first format that matches. Time of day is dropped.
    pub fn parse(&self, s: &str) -> Option<NaiveDate> {
        let s = s.trim();
        self.0.iter().find_map(|fmt| {
            NaiveDateTime::parse_from_str(s, fmt)
                .map(|dt| dt.date())
                .or_else(|_| NaiveDate::parse_from_str(s, fmt))
                .ok()
        })
    }
}

/// Coerce a number or numeric string into a decimal.
pub fn parse_amount(amount: &RawAmount) -> std::result::Result<Decimal, String> {
    match amount {
        RawAmount::Number(n) if n.is_finite() => {
            // f64 Display yields the shortest round-tripping form, never an exponent.
            Decimal::from_str(&n.to_string()).map_err(|e| format!("amount {n} out of range: {e}"))
        }
        RawAmount::Number(n) => Err(format!("amount {n} is not finite")),
        RawAmount::Text(s) => {
            let t = s.trim();
            let t = t.strip_prefix('+').unwrap_or(t);
            if t.is_empty() {
                return Err("amount is empty".to_string());
            }
            Decimal::from_str(t)
                .or_else(|_| Decimal::from_scientific(t))
                .map_err(|_| format!("amount {s:?} is not numeric"))
        }
    }
}

/// Converts raw source records into [`NormalizedTransaction`]s.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    date_formats: DateFormats,
}

impl Normalizer {
    pub fn new(date_formats: DateFormats) -> Self {
        Self { date_formats }
    }

    pub fn date_formats(&self) -> &DateFormats {
        &self.date_formats
    }

    pub fn normalize_one(&self, index: usize, raw: &RawTransaction) -> Result<NormalizedTransaction> {
        let invalid = |reason: String| Error::Validation {
            index,
            reason,
            record: raw.clone(),
        };

        let date = self
            .date_formats
            .parse(&raw.date)
            .ok_or_else(|| invalid(format!("unparseable date {:?}", raw.date)))?;
        let amount = parse_amount(&raw.amount).map_err(invalid)?;

        Ok(NormalizedTransaction::new(date, &raw.label, amount))
    }

    /// Normalize a whole batch. The first bad record fails the batch.
    #[instrument(level = "debug", skip_all, fields(records = raws.len()))]
    pub fn normalize(
        &self,
        raws: &[RawTransaction],
        events: &dyn EventSink,
    ) -> Result<Vec<NormalizedTransaction>> {
        let out = raws
            .iter()
            .enumerate()
            .map(|(i, raw)| self.normalize_one(i, raw))
            .collect::<Result<Vec<_>>>()?;
        debug!(count = out.len(), "normalized transactions");
        events.record(PipelineEvent::Normalized { count: out.len() });
        Ok(out)
    }
}
