//! Filter-tree evaluation
//!
//! Walks the parsed WHERE tree once per record. Filtering is stable: the
//! surviving records keep their relative order from the input collection.

use crate::dataset::Record;

use super::ast::{Filter, MeasureOp};
use super::errors::{QueryError, QueryResult};

/// Evaluates filter trees against records
pub struct FilterEvaluator;

impl FilterEvaluator {
    /// Returns the records matching `filter`, in input order.
    ///
    /// `Filter::All` short-circuits: the whole collection is returned
    /// without touching any record.
    pub fn filter<'r>(filter: &Filter, records: &'r [Record]) -> QueryResult<Vec<&'r Record>> {
        if matches!(filter, Filter::All) {
            return Ok(records.iter().collect());
        }

        let mut matched = Vec::new();
        for record in records {
            if Self::matches(filter, record)? {
                matched.push(record);
            }
        }
        Ok(matched)
    }

    /// Checks one record against the tree
    pub fn matches(filter: &Filter, record: &Record) -> QueryResult<bool> {
        match filter {
            Filter::All => Ok(true),
            Filter::And(children) => {
                for child in children {
                    if !Self::matches(child, record)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Filter::Or(children) => {
                for child in children {
                    if Self::matches(child, record)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Filter::Not(child) => Ok(!Self::matches(child, record)?),
            Filter::Measure { op, field, value } => {
                // unreachable after validation: the parser checked the
                // field against this record kind's schema
                let actual = record.measure(field).ok_or_else(|| {
                    QueryError::internal(format!(
                        "measure field '{}' unmapped for kind {}",
                        field,
                        record.kind()
                    ))
                })?;
                Ok(match op {
                    MeasureOp::Lt => actual < *value,
                    MeasureOp::Gt => actual > *value,
                    MeasureOp::Eq => actual == *value,
                })
            }
            Filter::Is { field, pattern } => {
                let actual = record.string(field).ok_or_else(|| {
                    QueryError::internal(format!(
                        "string field '{}' unmapped for kind {}",
                        field,
                        record.kind()
                    ))
                })?;
                Ok(pattern.matches(actual))
            }
        }
    }
}
