//! Query orchestration
//!
//! The engine is the only query entry point collaborators call. It runs
//! the strict evaluation order:
//!
//! 1. Parse and validate against the dataset's record kind
//! 2. Filter records against the WHERE tree
//! 3. Enforce the result bound on the filtered count
//! 4. Group and aggregate when TRANSFORMATIONS is present
//! 5. Project columns and apply ORDER
//!
//! The bound applies before transformation: a grouping query that would
//! collapse below the limit is still rejected when its filtered record
//! count exceeds it.

use serde_json::Value;

use crate::dataset::Record;
use crate::schema::RecordKind;

use super::errors::{QueryError, QueryResult};
use super::filter::FilterEvaluator;
use super::parser::QueryParser;
use super::project::{Projector, ResultRow};
use super::transform::Transformer;

/// Maximum filtered record count a query may produce
pub const RESULT_LIMIT: usize = 5000;

/// Evaluates queries against one dataset's records
pub struct QueryEngine;

impl QueryEngine {
    /// Extracts the dataset id a query is bound to.
    ///
    /// Callers resolve the id to a dataset before evaluation; a query
    /// with no extractable id is invalid before validation even starts.
    pub fn extract_dataset_id(raw: &Value) -> QueryResult<String> {
        QueryParser::extract_dataset_id(raw)
    }

    /// Evaluates a query, returning the full ordered row set or one error
    pub fn evaluate(
        raw: &Value,
        dataset_id: &str,
        kind: RecordKind,
        records: &[Record],
    ) -> QueryResult<Vec<ResultRow>> {
        let query = QueryParser::new(dataset_id, kind).parse(raw)?;

        let matched = FilterEvaluator::filter(&query.filter, records)?;
        if matched.len() > RESULT_LIMIT {
            return Err(QueryError::result_too_large(matched.len(), RESULT_LIMIT));
        }

        let mut rows = match &query.transform {
            Some(transform) => {
                let aggregated = Transformer::transform(transform, &matched)?;
                Projector::project_rows(&query.columns, aggregated)?
            }
            None => Projector::project_records(&query.columns, &matched)?,
        };

        if let Some(order) = &query.order {
            Projector::order(order, &mut rows);
        }
        Ok(rows)
    }
}
