//! Row formatting: canonical transactions -> the 7-cell rows written to the sheet.
//!
//! Column layout (A..G):
//!   A  date_tri        MM/YY
//!   B  label           cleaned label
//!   C  amount          rounded to 2 dp
//!   D  date_operation  DD/MM/YYYY
//!   E  (empty, filled by hand)
//!   F  lookup formula on E<row>
//!   G  lookup formula on E<row>

use chrono::NaiveDate;
use daybook_core::{Error, NormalizedTransaction, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use crate::formulas::FormulaSet;

pub const ROW_WIDTH: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Number(Decimal),
    /// Evaluated by the sheet because rows are written user-entered.
    Formula(String),
    Empty,
}

impl Cell {
    /// Value as sent to the spreadsheet API.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Text(s) | Cell::Formula(s) => Value::String(s.clone()),
            Cell::Number(d) => d
                .to_f64()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(d.to_string())),
            Cell::Empty => Value::String(String::new()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) | Cell::Formula(s) => Some(s),
            _ => None,
        }
    }
}

/// Round half away from zero to exactly two decimals (`12.345` -> `12.35`).
pub fn round_amount(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// `MM/YY`
pub fn date_tri(date: NaiveDate) -> String {
    date.format("%m/%y").to_string()
}

/// `DD/MM/YYYY`
pub fn date_operation(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    row_number: u32,
    cells: [Cell; ROW_WIDTH],
}

impl SheetRow {
    pub fn new(row_number: u32, txn: &NormalizedTransaction, formulas: &FormulaSet) -> Self {
        let date = txn.date();
        Self {
            row_number,
            cells: [
                Cell::Text(date_tri(date)),
                Cell::Text(txn.label().to_string()),
                Cell::Number(round_amount(txn.amount())),
                Cell::Text(date_operation(date)),
                Cell::Empty,
                Cell::Formula(formulas.column_f(row_number)),
                Cell::Formula(formulas.column_g(row_number)),
            ],
        }
    }

    /// 1-based sheet row this row is written to.
    pub fn row_number(&self) -> u32 {
        self.row_number
    }

    pub fn cells(&self) -> &[Cell; ROW_WIDTH] {
        &self.cells
    }

    pub fn to_json(&self) -> Vec<Value> {
        self.cells.iter().map(Cell::to_json).collect()
    }
}

/// Rows for one run plus the sheet rows they occupy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendBatch {
    start_row: u32,
    rows: Vec<SheetRow>,
}

impl AppendBatch {
    pub fn start_row(&self) -> u32 {
        self.start_row
    }

    /// Last occupied row, inclusive. For an empty batch this is `start_row - 1`.
    pub fn end_row(&self) -> u32 {
        self.start_row + self.rows.len() as u32 - 1
    }

    pub fn rows(&self) -> &[SheetRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A1 range covered by the batch on `sheet`, e.g. `'Transactions'!A6:G8`.
    pub fn a1_range(&self, sheet: &str) -> String {
        format!(
            "'{}'!A{}:G{}",
            sheet.replace('\'', "''"),
            self.start_row,
            self.end_row()
        )
    }

    pub fn values(&self) -> Vec<Vec<Value>> {
        self.rows.iter().map(SheetRow::to_json).collect()
    }
}

/// Lay `txns` out starting at sheet row `start_row` (1-based).
///
/// Row `n` of the batch lands on `start_row + n` and its formulas reference
/// `E{start_row + n}`.
pub fn format_batch(
    txns: &[NormalizedTransaction],
    start_row: u32,
    formulas: &FormulaSet,
) -> Result<AppendBatch> {
    if start_row == 0 {
        return Err(Error::configuration("start row is 1-based, got 0"));
    }
    formulas.validate()?;

    let count = u32::try_from(txns.len())
        .ok()
        .filter(|n| start_row.checked_add(*n).is_some())
        .ok_or_else(|| Error::configuration(format!("{} rows do not fit after row {start_row}", txns.len())))?;

    let rows = txns
        .iter()
        .zip(start_row..start_row + count)
        .map(|(txn, row)| SheetRow::new(row, txn, formulas))
        .collect();

    Ok(AppendBatch { start_row, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn txn(y: i32, m: u32, d: u32, label: &str, amount: &str) -> NormalizedTransaction {
        NormalizedTransaction::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), label, dec(amount))
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_amount(dec("12.345")).to_string(), "12.35");
        assert_eq!(round_amount(dec("12.335")).to_string(), "12.34");
        assert_eq!(round_amount(dec("-12.345")).to_string(), "-12.35");
        assert_eq!(round_amount(dec("-0.005")).to_string(), "-0.01");
        assert_eq!(round_amount(dec("12.3449")).to_string(), "12.34");
        assert_eq!(round_amount(dec("-23.4")).to_string(), "-23.40");
        assert_eq!(round_amount(dec("7")).to_string(), "7.00");
    }

    #[test]
    fn test_date_split() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(date_tri(d), "03/24");
        assert_eq!(date_operation(d), "07/03/2024");
    }

    #[test]
    fn test_row_cells() {
        let row = SheetRow::new(6, &txn(2024, 1, 5, "Carrefour Paris!!", "-23.4"), &FormulaSet::default());
        let cells = row.cells();
        assert_eq!(cells[0], Cell::Text("01/24".to_string()));
        assert_eq!(cells[1], Cell::Text("CARREFOUR PARIS".to_string()));
        assert_eq!(cells[2], Cell::Number(dec("-23.40")));
        assert_eq!(cells[3], Cell::Text("05/01/2024".to_string()));
        assert_eq!(cells[4], Cell::Empty);
        assert!(cells[5].as_text().unwrap().contains("MATCH(E6;"));
        assert!(cells[6].as_text().unwrap().contains("MATCH(E6;"));
        assert!(cells[5].as_text().unwrap().starts_with("=IFERROR("));
    }

    #[test]
    fn test_row_json() {
        let row = SheetRow::new(2, &txn(2024, 1, 5, "x", "12.345"), &FormulaSet::default());
        let json = row.to_json();
        assert_eq!(json.len(), ROW_WIDTH);
        assert_eq!(json[2], serde_json::json!(12.35));
        assert_eq!(json[4], serde_json::json!(""));
    }

    #[test]
    fn test_empty_batch() {
        let batch = format_batch(&[], 6, &FormulaSet::default()).unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.start_row(), 6);
        assert_eq!(batch.end_row(), 5);
    }

    #[test]
    fn test_formula_rows_follow_start_row() {
        let txns: Vec<_> = (1..=4)
            .map(|d| txn(2024, 2, d, &format!("op {d}"), "1.5"))
            .collect();
        let r = 41;
        let batch = format_batch(&txns, r, &FormulaSet::default()).unwrap();
        assert_eq!(batch.len(), txns.len());
        assert_eq!(batch.end_row() - batch.start_row() + 1, txns.len() as u32);
        for (n, row) in batch.rows().iter().enumerate() {
            let expected = format!("E{};", r + n as u32);
            assert_eq!(row.row_number(), r + n as u32);
            assert!(row.cells()[5].as_text().unwrap().contains(&expected));
            assert!(row.cells()[6].as_text().unwrap().contains(&expected));
        }
        assert_eq!(batch.a1_range("Transactions"), "'Transactions'!A41:G44");
    }

    #[test]
    fn test_start_row_zero_rejected() {
        let txns = vec![txn(2024, 2, 1, "x", "1")];
        assert!(format_batch(&txns, 0, &FormulaSet::default()).is_err());
    }

    #[test]
    fn test_invalid_template_rejected() {
        let formulas = FormulaSet {
            column_f: "=1".to_string(),
            ..FormulaSet::default()
        };
        let txns = vec![txn(2024, 2, 1, "x", "1")];
        assert!(format_batch(&txns, 1, &formulas).is_err());
    }
}
