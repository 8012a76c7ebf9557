//! Dataset catalog for campusdb
//!
//! Holds ingested datasets in memory and resolves a dataset identifier to
//! its record kind and record collection. Records arrive pre-flattened as
//! JSON arrays (archive parsing and geocoding happen upstream) and are
//! deserialized into the typed record model on the way in.
//!
//! # Design Principles
//!
//! - Records are immutable once ingested; queries only read them
//! - Dataset ids never contain `_` (the qualified-key separator) and are
//!   never blank
//! - Adding an existing id or removing an unknown id fails loudly

mod errors;
mod record;
mod store;

pub use errors::{DatasetError, DatasetResult};
pub use record::{FieldValue, Record, Room, Section};
pub use store::{is_valid_dataset_id, Dataset, DatasetStore, DatasetSummary};
