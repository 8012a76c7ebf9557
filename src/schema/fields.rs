//! Static field tables per record kind
//!
//! Measure fields are numeric and eligible for LT/GT/EQ comparison and
//! aggregation; string fields are textual and eligible for IS comparison.

use super::kind::RecordKind;

const SECTIONS_MEASURE_FIELDS: &[&str] = &["avg", "pass", "fail", "audit", "year"];
const SECTIONS_STRING_FIELDS: &[&str] = &["dept", "id", "instructor", "title", "uuid"];

const ROOMS_MEASURE_FIELDS: &[&str] = &["lat", "lon", "seats"];
const ROOMS_STRING_FIELDS: &[&str] = &["fullname", "shortname", "number", "name"];

/// Returns the measure field names valid for a kind
pub fn measure_fields(kind: RecordKind) -> &'static [&'static str] {
    match kind {
        RecordKind::Sections => SECTIONS_MEASURE_FIELDS,
        RecordKind::Rooms => ROOMS_MEASURE_FIELDS,
    }
}

/// Returns the string field names valid for a kind
pub fn string_fields(kind: RecordKind) -> &'static [&'static str] {
    match kind {
        RecordKind::Sections => SECTIONS_STRING_FIELDS,
        RecordKind::Rooms => ROOMS_STRING_FIELDS,
    }
}

/// True if `field` is a measure field of `kind`
pub fn is_measure_field(kind: RecordKind, field: &str) -> bool {
    measure_fields(kind).contains(&field)
}

/// True if `field` is a string field of `kind`
pub fn is_string_field(kind: RecordKind, field: &str) -> bool {
    string_fields(kind).contains(&field)
}
