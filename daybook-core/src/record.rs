//! Transaction records before and after normalization.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::label::clean_label;

/// Amount as delivered by a source: either a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

impl fmt::Display for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawAmount::Number(n) => write!(f, "{n}"),
            RawAmount::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<f64> for RawAmount {
    fn from(n: f64) -> Self {
        RawAmount::Number(n)
    }
}

impl From<&str> for RawAmount {
    fn from(s: &str) -> Self {
        RawAmount::Text(s.to_string())
    }
}

/// Untyped record exactly as a transaction source returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub date: String,
    pub label: String,
    pub amount: RawAmount,
}

impl RawTransaction {
    pub fn new(date: impl Into<String>, label: impl Into<String>, amount: impl Into<RawAmount>) -> Self {
        Self {
            date: date.into(),
            label: label.into(),
            amount: amount.into(),
        }
    }
}

impl fmt::Display for RawTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{date: {:?}, label: {:?}, amount: {}}}",
            self.date, self.label, self.amount
        )
    }
}

/// Canonical transaction produced by the normalizer.
///
/// The label is always cleaned (see [`clean_label`]) and the amount keeps its
/// full precision; rounding happens when the row is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedTransaction {
    date: NaiveDate,
    label: String,
    amount: Decimal,
}

impl NormalizedTransaction {
    /// Build a transaction, cleaning `label` on the way in.
    pub fn new(date: NaiveDate, label: &str, amount: Decimal) -> Self {
        Self {
            date,
            label: clean_label(label),
            amount,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Positive = credit, negative = debit.
    pub fn amount(&self) -> Decimal {
        self.amount
    }
}
