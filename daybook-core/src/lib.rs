//! daybook-core: transaction data model, label cleaning and normalization.

pub mod error;
pub mod events;
pub mod label;
pub mod normalize;
pub mod record;

pub use error::{BoxError, Error, Result};
pub use events::{EventSink, MemorySink, NullSink, PipelineEvent, TracingSink};
pub use label::clean_label;
pub use normalize::{DateFormats, Normalizer, ISO_DATE_FORMAT, VENDOR_DATETIME_FORMAT};
pub use record::{NormalizedTransaction, RawAmount, RawTransaction};
