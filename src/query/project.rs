//! Projection and ordering of result rows
//!
//! Raw mode builds one row per matched record with exactly the requested
//! columns; transformed mode restricts the aggregate rows to the declared
//! columns. Ordering sorts ascending with a stable sort; DOWN reverses
//! the fully-sorted sequence afterwards, so ties under DOWN appear in
//! reverse of their ascending relative order.

use std::cmp::Ordering;

use serde_json::Value;

use crate::dataset::{FieldValue, Record};

use super::ast::{Direction, OrderSpec};
use super::errors::{QueryError, QueryResult};

/// One result row: output column name to value, in declaration order
pub type ResultRow = serde_json::Map<String, Value>;

/// Converts a measure value to JSON, collapsing integral floats to
/// integers so the wire shape matches the ingested numbers
pub fn number_value(n: f64) -> Value {
    const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0; // 2^53
    if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INT {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

/// Builds and orders the final rows
pub struct Projector;

impl Projector {
    /// Projects raw records into rows of the requested columns
    pub fn project_records(columns: &[String], records: &[&Record]) -> QueryResult<Vec<ResultRow>> {
        records
            .iter()
            .map(|record| {
                let mut row = ResultRow::new();
                for column in columns {
                    let (_, field) = column.split_once('_').ok_or_else(|| {
                        QueryError::internal(format!("unqualified raw column '{}'", column))
                    })?;
                    let value = record.field(field).ok_or_else(|| {
                        QueryError::internal(format!(
                            "field '{}' unmapped for kind {}",
                            field,
                            record.kind()
                        ))
                    })?;
                    let value = match value {
                        FieldValue::Number(n) => number_value(n),
                        FieldValue::Text(s) => Value::String(s),
                    };
                    row.insert(column.clone(), value);
                }
                Ok(row)
            })
            .collect()
    }

    /// Restricts aggregate rows to the declared columns, in order
    pub fn project_rows(columns: &[String], rows: Vec<ResultRow>) -> QueryResult<Vec<ResultRow>> {
        rows.into_iter()
            .map(|full| {
                let mut row = ResultRow::new();
                for column in columns {
                    let value = full.get(column).ok_or_else(|| {
                        QueryError::internal(format!("aggregate row missing column '{}'", column))
                    })?;
                    row.insert(column.clone(), value.clone());
                }
                Ok(row)
            })
            .collect()
    }

    /// Sorts rows in place per the ORDER specification
    pub fn order(spec: &OrderSpec, rows: &mut [ResultRow]) {
        match spec {
            OrderSpec::Single(key) => {
                rows.sort_by(|a, b| Self::compare_by_key(a, b, key));
            }
            OrderSpec::Keyed { dir, keys } => {
                rows.sort_by(|a, b| {
                    for key in keys {
                        let ordering = Self::compare_by_key(a, b, key);
                        if ordering != Ordering::Equal {
                            return ordering;
                        }
                    }
                    Ordering::Equal
                });
                if *dir == Direction::Down {
                    rows.reverse();
                }
            }
        }
    }

    fn compare_by_key(a: &ResultRow, b: &ResultRow, key: &str) -> Ordering {
        Self::compare_values(a.get(key), b.get(key))
    }

    /// Compares two row values: numbers numerically, strings lexically,
    /// missing values first
    fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => match (a, b) {
                (Value::Number(a_n), Value::Number(b_n)) => {
                    let a_f = a_n.as_f64().unwrap_or(0.0);
                    let b_f = b_n.as_f64().unwrap_or(0.0);
                    a_f.partial_cmp(&b_f).unwrap_or(Ordering::Equal)
                }
                (Value::String(a_s), Value::String(b_s)) => a_s.cmp(b_s),
                // rows never mix types in one column; rank by type for
                // a total order anyway
                _ => Self::type_rank(a).cmp(&Self::type_rank(b)),
            },
        }
    }

    fn type_rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
}
