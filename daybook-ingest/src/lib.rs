//! daybook-ingest: transaction sources (file exports, gateway endpoint) and date ranges.

pub mod sources;
pub mod types;

pub use sources::Source;
pub use sources::csv_export::{CsvFileSource, parse_csv_export};
pub use sources::http::HttpSource;
pub use sources::json_export::{BankOperation, JsonFileSource, parse_json_export};
pub use types::{DateRange, TransactionSource};
