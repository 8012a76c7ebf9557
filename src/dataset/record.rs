//! Typed record model
//!
//! One struct per record kind, with a tagged `Record` wrapper so the query
//! core can hold mixed-kind collections without runtime string branching.
//! Field access goes through a per-kind dispatch selected once by the
//! variant, keeping the two schemas out of each other's match arms.

use serde::{Deserialize, Serialize};

use crate::schema::RecordKind;

/// An academic section record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub dept: String,
    pub id: String,
    pub instructor: String,
    pub title: String,
    pub uuid: String,
    pub avg: f64,
    pub pass: f64,
    pub fail: f64,
    pub audit: f64,
    pub year: f64,
}

/// A room record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub fullname: String,
    pub shortname: String,
    pub number: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub seats: f64,
}

/// A record of either kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    Section(Section),
    Room(Room),
}

/// A single field value read out of a record
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl Record {
    /// Returns the kind this record belongs to
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Section(_) => RecordKind::Sections,
            Record::Room(_) => RecordKind::Rooms,
        }
    }

    /// Reads a measure field; None if the field is not a measure field of
    /// this record's kind
    pub fn measure(&self, field: &str) -> Option<f64> {
        match self {
            Record::Section(s) => match field {
                "avg" => Some(s.avg),
                "pass" => Some(s.pass),
                "fail" => Some(s.fail),
                "audit" => Some(s.audit),
                "year" => Some(s.year),
                _ => None,
            },
            Record::Room(r) => match field {
                "lat" => Some(r.lat),
                "lon" => Some(r.lon),
                "seats" => Some(r.seats),
                _ => None,
            },
        }
    }

    /// Reads a string field; None if the field is not a string field of
    /// this record's kind
    pub fn string(&self, field: &str) -> Option<&str> {
        match self {
            Record::Section(s) => match field {
                "dept" => Some(&s.dept),
                "id" => Some(&s.id),
                "instructor" => Some(&s.instructor),
                "title" => Some(&s.title),
                "uuid" => Some(&s.uuid),
                _ => None,
            },
            Record::Room(r) => match field {
                "fullname" => Some(&r.fullname),
                "shortname" => Some(&r.shortname),
                "number" => Some(&r.number),
                "name" => Some(&r.name),
                _ => None,
            },
        }
    }

    /// Reads any field as a value, measure fields first
    pub fn field(&self, field: &str) -> Option<FieldValue> {
        if let Some(n) = self.measure(field) {
            return Some(FieldValue::Number(n));
        }
        self.string(field).map(|s| FieldValue::Text(s.to_string()))
    }
}

impl FieldValue {
    /// Canonical string form, used for group-key encoding and distinct
    /// counting. Negative zero folds into zero so that equal numbers
    /// always encode equally.
    pub fn encode(&self) -> String {
        match self {
            FieldValue::Number(n) => {
                let n = if *n == 0.0 { 0.0 } else { *n };
                format!("n:{}", n)
            }
            FieldValue::Text(s) => format!("s:{}", s),
        }
    }
}
