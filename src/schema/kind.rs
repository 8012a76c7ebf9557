//! Record kind definitions
//!
//! A dataset holds exactly one kind of record. The kind decides which
//! field names are valid in queries against that dataset.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two record schemas campusdb serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Academic section records (course offerings)
    Sections,
    /// Room records (physical spaces)
    Rooms,
}

impl RecordKind {
    /// Returns the wire name for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Sections => "sections",
            RecordKind::Rooms => "rooms",
        }
    }

    /// Parses a wire name into a kind
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sections" => Some(RecordKind::Sections),
            "rooms" => Some(RecordKind::Rooms),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
