//! Zone dataset entity definitions.
//!
//! Entities are direct mappings to dataset records.

pub mod zone;

pub use zone::{parse_rows, row_label, LocationRecord, ZoneRecord, ZoneRecordError, ZoneRow};
