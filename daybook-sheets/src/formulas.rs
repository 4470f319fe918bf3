//! Lookup formula templates for columns F and G.
//!
//! Each appended row carries two formulas that look the row's column E up in
//! the categorization sheet. They are kept as templates so renaming the
//! reference sheet or moving its columns is a config change.
//!
//! Placeholders:
//!   `{row}`        sheet row number the formula lands on (required)
//!   `{reference}`  name of the categorization sheet, quotes escaped

use daybook_core::{Error, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_REFERENCE_SHEET: &str = "Catégorisation";

pub const DEFAULT_COLUMN_F: &str =
    r#"=IFERROR(INDEX('{reference}'!B:B; MATCH(E{row}; '{reference}'!C:C; 0)); "")"#;
pub const DEFAULT_COLUMN_G: &str =
    r#"=IFERROR(INDEX('{reference}'!A:A; MATCH(E{row}; '{reference}'!C:C; 0)); "")"#;

/// Versioned pair of formula templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulaSet {
    /// Bumped whenever the templates change shape; logged with every run.
    pub version: u32,
    pub reference_sheet: String,
    pub column_f: String,
    pub column_g: String,
}

impl Default for FormulaSet {
    fn default() -> Self {
        Self {
            version: 1,
            reference_sheet: DEFAULT_REFERENCE_SHEET.to_string(),
            column_f: DEFAULT_COLUMN_F.to_string(),
            column_g: DEFAULT_COLUMN_G.to_string(),
        }
    }
}

impl FormulaSet {
    pub fn validate(&self) -> Result<()> {
        for (name, template) in [("column_f", &self.column_f), ("column_g", &self.column_g)] {
            if !template.contains("{row}") {
                return Err(Error::configuration(format!(
                    "formula template {name} (version {}) has no {{row}} placeholder",
                    self.version
                )));
            }
            if !template.starts_with('=') {
                return Err(Error::configuration(format!(
                    "formula template {name} (version {}) must start with '='",
                    self.version
                )));
            }
        }
        if self.reference_sheet.trim().is_empty() {
            return Err(Error::configuration("reference sheet name is empty"));
        }
        Ok(())
    }

    pub fn column_f(&self, row: u32) -> String {
        self.render(&self.column_f, row)
    }

    pub fn column_g(&self, row: u32) -> String {
        self.render(&self.column_g, row)
    }

    fn render(&self, template: &str, row: u32) -> String {
        template
            .replace("{reference}", &self.reference_sheet.replace('\'', "''"))
            .replace("{row}", &row.to_string())
    }
}
