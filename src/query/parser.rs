//! Query validation and AST construction
//!
//! One pass over the submitted JSON builds the typed AST; there is no
//! separate validity flag to keep in sync. Every rule returns a
//! `QueryResult` and the first failure short-circuits, so a query that
//! parses is a query the rest of the pipeline can evaluate without
//! re-checking shape.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::schema::{self, RecordKind};

use super::ast::{
    ApplyRule, ApplyToken, Direction, Filter, GroupKey, MeasureOp, OrderSpec, Pattern, Query,
    Transform,
};
use super::errors::{QueryError, QueryResult};

const QUERY_KEYS: &[&str] = &["WHERE", "OPTIONS", "TRANSFORMATIONS"];
const OPTIONS_KEYS: &[&str] = &["COLUMNS", "ORDER"];

/// Validates queries against the grammar and the field schema of one
/// dataset, producing the typed AST
pub struct QueryParser {
    dataset_id: String,
    kind: RecordKind,
}

impl QueryParser {
    /// Creates a parser bound to a dataset id and record kind
    pub fn new(dataset_id: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            kind,
        }
    }

    /// Extracts the bound dataset id from OPTIONS.COLUMNS.
    ///
    /// This runs before full validation: without an id there is no schema
    /// to validate against. The id is the prefix of the first column entry
    /// containing the qualified-key separator.
    pub fn extract_dataset_id(raw: &Value) -> QueryResult<String> {
        let query = raw
            .as_object()
            .ok_or_else(|| QueryError::invalid("query is not an object"))?;

        let options = query
            .get("OPTIONS")
            .ok_or_else(|| QueryError::invalid("OPTIONS clause is missing"))?
            .as_object()
            .ok_or_else(|| QueryError::invalid("OPTIONS is not an object"))?;

        let columns = options
            .get("COLUMNS")
            .ok_or_else(|| QueryError::invalid("COLUMNS clause is missing"))?
            .as_array()
            .ok_or_else(|| QueryError::invalid("COLUMNS is not an array"))?;

        if columns.is_empty() {
            return Err(QueryError::invalid("COLUMNS is empty"));
        }

        for column in columns {
            if let Some(key) = column.as_str() {
                if let Some((id, _)) = key.split_once('_') {
                    return Ok(id.to_string());
                }
            }
        }
        Err(QueryError::invalid(
            "COLUMNS contains no qualified key to bind a dataset id",
        ))
    }

    /// Validates a query and builds its AST
    pub fn parse(&self, raw: &Value) -> QueryResult<Query> {
        let query = raw
            .as_object()
            .ok_or_else(|| QueryError::invalid("query is not an object"))?;

        if query.len() > 3 {
            return Err(QueryError::invalid("query has more than 3 clauses"));
        }
        for key in query.keys() {
            if !QUERY_KEYS.contains(&key.as_str()) {
                return Err(QueryError::invalid(format!("unknown clause '{}'", key)));
            }
        }

        let where_clause = query
            .get("WHERE")
            .ok_or_else(|| QueryError::invalid("WHERE clause is missing"))?;
        let options = query
            .get("OPTIONS")
            .ok_or_else(|| QueryError::invalid("OPTIONS clause is missing"))?;

        let filter = self.parse_where(where_clause)?;

        let transform = match query.get("TRANSFORMATIONS") {
            Some(t) => Some(self.parse_transformations(t)?),
            None => None,
        };

        let (columns, order) = self.parse_options(options, transform.as_ref())?;

        Ok(Query {
            dataset_id: self.dataset_id.clone(),
            filter,
            columns,
            order,
            transform,
        })
    }

    // ---- WHERE ----

    fn parse_where(&self, clause: &Value) -> QueryResult<Filter> {
        let obj = clause
            .as_object()
            .ok_or_else(|| QueryError::invalid("WHERE is not an object"))?;
        if obj.is_empty() {
            // match-all: filtering is skipped entirely
            return Ok(Filter::All);
        }
        self.parse_filter(obj)
    }

    fn parse_filter(&self, obj: &Map<String, Value>) -> QueryResult<Filter> {
        if obj.len() != 1 {
            return Err(QueryError::invalid(format!(
                "filter must have exactly one operator, found {}",
                obj.len()
            )));
        }
        let (op, body) = obj.iter().next().expect("len checked above");

        match op.as_str() {
            "AND" => Ok(Filter::And(self.parse_logic_children(op, body)?)),
            "OR" => Ok(Filter::Or(self.parse_logic_children(op, body)?)),
            "NOT" => {
                let child = body
                    .as_object()
                    .ok_or_else(|| QueryError::invalid("NOT body is not an object"))?;
                Ok(Filter::Not(Box::new(self.parse_filter(child)?)))
            }
            "LT" => self.parse_measure_comparison(MeasureOp::Lt, body),
            "GT" => self.parse_measure_comparison(MeasureOp::Gt, body),
            "EQ" => self.parse_measure_comparison(MeasureOp::Eq, body),
            "IS" => self.parse_string_comparison(body),
            _ => Err(QueryError::invalid(format!(
                "unknown filter operator '{}'",
                op
            ))),
        }
    }

    fn parse_logic_children(&self, op: &str, body: &Value) -> QueryResult<Vec<Filter>> {
        let children = body
            .as_array()
            .ok_or_else(|| QueryError::invalid(format!("{} body is not an array", op)))?;
        if children.is_empty() {
            return Err(QueryError::invalid(format!("{} has no children", op)));
        }

        children
            .iter()
            .map(|child| {
                let obj = child
                    .as_object()
                    .ok_or_else(|| QueryError::invalid(format!("{} child is not an object", op)))?;
                self.parse_filter(obj)
            })
            .collect()
    }

    fn parse_measure_comparison(&self, op: MeasureOp, body: &Value) -> QueryResult<Filter> {
        let (key, value) = self.single_entry(body, op.as_str())?;
        let field = self.parse_qualified_key(key)?;
        if !schema::is_measure_field(self.kind, &field) {
            return Err(QueryError::invalid(format!(
                "'{}' is not a measure field of {}",
                field, self.kind
            )));
        }

        let value = value
            .as_f64()
            .ok_or_else(|| QueryError::invalid(format!("{} value is not a number", op.as_str())))?;

        Ok(Filter::Measure { op, field, value })
    }

    fn parse_string_comparison(&self, body: &Value) -> QueryResult<Filter> {
        let (key, value) = self.single_entry(body, "IS")?;
        let field = self.parse_qualified_key(key)?;
        if !schema::is_string_field(self.kind, &field) {
            return Err(QueryError::invalid(format!(
                "'{}' is not a string field of {}",
                field, self.kind
            )));
        }

        let input = value
            .as_str()
            .ok_or_else(|| QueryError::invalid("IS value is not a string"))?;

        // Asterisks may only appear as the first and/or last character
        let mut interior = input;
        interior = interior.strip_suffix('*').unwrap_or(interior);
        interior = interior.strip_prefix('*').unwrap_or(interior);
        if interior.contains('*') {
            return Err(QueryError::invalid(format!(
                "wildcard in interior position: '{}'",
                input
            )));
        }

        Ok(Filter::Is {
            field,
            pattern: Pattern::from_input(input),
        })
    }

    // ---- TRANSFORMATIONS ----

    fn parse_transformations(&self, clause: &Value) -> QueryResult<Transform> {
        let obj = clause
            .as_object()
            .ok_or_else(|| QueryError::invalid("TRANSFORMATIONS is not an object"))?;

        for key in obj.keys() {
            if key != "GROUP" && key != "APPLY" {
                return Err(QueryError::invalid(format!(
                    "unknown TRANSFORMATIONS key '{}'",
                    key
                )));
            }
        }

        let group_clause = obj
            .get("GROUP")
            .ok_or_else(|| QueryError::invalid("GROUP is missing from TRANSFORMATIONS"))?;
        let apply_clause = obj
            .get("APPLY")
            .ok_or_else(|| QueryError::invalid("APPLY is missing from TRANSFORMATIONS"))?;

        let group = self.parse_group(group_clause)?;
        let apply = self.parse_apply(apply_clause)?;

        Ok(Transform { group, apply })
    }

    fn parse_group(&self, clause: &Value) -> QueryResult<Vec<GroupKey>> {
        let keys = clause
            .as_array()
            .ok_or_else(|| QueryError::invalid("GROUP is not an array"))?;
        if keys.is_empty() {
            return Err(QueryError::invalid("GROUP is empty"));
        }

        keys.iter()
            .map(|key| {
                let key = key
                    .as_str()
                    .ok_or_else(|| QueryError::invalid("GROUP key is not a string"))?;
                let field = self.parse_qualified_key(key)?;
                if !schema::is_measure_field(self.kind, &field)
                    && !schema::is_string_field(self.kind, &field)
                {
                    return Err(QueryError::invalid(format!(
                        "'{}' is not a field of {}",
                        field, self.kind
                    )));
                }
                Ok(GroupKey {
                    output: key.to_string(),
                    field,
                })
            })
            .collect()
    }

    fn parse_apply(&self, clause: &Value) -> QueryResult<Vec<ApplyRule>> {
        let rules = clause
            .as_array()
            .ok_or_else(|| QueryError::invalid("APPLY is not an array"))?;
        if rules.is_empty() {
            return Err(QueryError::invalid("APPLY is empty"));
        }

        let mut seen = HashSet::new();
        rules
            .iter()
            .map(|rule| {
                let (apply_key, body) = self.single_entry(rule, "APPLY rule")?;
                if apply_key.is_empty() {
                    return Err(QueryError::invalid("apply key is empty"));
                }
                if !seen.insert(apply_key.to_string()) {
                    return Err(QueryError::invalid(format!(
                        "duplicate apply key '{}'",
                        apply_key
                    )));
                }

                let (token, field_ref) = self.single_entry(body, "apply body")?;
                let token = ApplyToken::parse(token).ok_or_else(|| {
                    QueryError::invalid(format!("unknown apply token '{}'", token))
                })?;

                let field_ref = field_ref
                    .as_str()
                    .ok_or_else(|| QueryError::invalid("apply target is not a string"))?;
                let field = self.parse_qualified_key(field_ref)?;

                // COUNT may target any field; the numeric aggregates need
                // a measure field
                let valid = match token {
                    ApplyToken::Count => {
                        schema::is_measure_field(self.kind, &field)
                            || schema::is_string_field(self.kind, &field)
                    }
                    _ => schema::is_measure_field(self.kind, &field),
                };
                if !valid {
                    return Err(QueryError::invalid(format!(
                        "'{}' cannot be aggregated with {}",
                        field,
                        token.as_str()
                    )));
                }

                Ok(ApplyRule {
                    output: apply_key.to_string(),
                    token,
                    field,
                })
            })
            .collect()
    }

    // ---- OPTIONS ----

    fn parse_options(
        &self,
        clause: &Value,
        transform: Option<&Transform>,
    ) -> QueryResult<(Vec<String>, Option<OrderSpec>)> {
        let obj = clause
            .as_object()
            .ok_or_else(|| QueryError::invalid("OPTIONS is not an object"))?;

        for key in obj.keys() {
            if !OPTIONS_KEYS.contains(&key.as_str()) {
                return Err(QueryError::invalid(format!("unknown OPTIONS key '{}'", key)));
            }
        }

        let columns_clause = obj
            .get("COLUMNS")
            .ok_or_else(|| QueryError::invalid("COLUMNS clause is missing"))?;
        let columns = self.parse_columns(columns_clause, transform)?;

        let order = match obj.get("ORDER") {
            Some(o) => Some(self.parse_order(o, &columns)?),
            None => None,
        };

        Ok((columns, order))
    }

    fn parse_columns(
        &self,
        clause: &Value,
        transform: Option<&Transform>,
    ) -> QueryResult<Vec<String>> {
        let entries = clause
            .as_array()
            .ok_or_else(|| QueryError::invalid("COLUMNS is not an array"))?;
        if entries.is_empty() {
            return Err(QueryError::invalid("COLUMNS is empty"));
        }

        entries
            .iter()
            .map(|entry| {
                let column = entry
                    .as_str()
                    .ok_or_else(|| QueryError::invalid("COLUMNS entry is not a string"))?;

                match transform {
                    // With a transform every column must resolve to a
                    // group key or an apply key; raw fields collapsed away
                    Some(t) => {
                        let in_group = t.group.iter().any(|g| g.output == column);
                        let in_apply = t.apply.iter().any(|a| a.output == column);
                        if !in_group && !in_apply {
                            return Err(QueryError::invalid(format!(
                                "column '{}' is neither a GROUP key nor an apply key",
                                column
                            )));
                        }
                    }
                    None => {
                        let field = self.parse_qualified_key(column)?;
                        if !schema::is_measure_field(self.kind, &field)
                            && !schema::is_string_field(self.kind, &field)
                        {
                            return Err(QueryError::invalid(format!(
                                "'{}' is not a field of {}",
                                field, self.kind
                            )));
                        }
                    }
                }
                Ok(column.to_string())
            })
            .collect()
    }

    fn parse_order(&self, clause: &Value, columns: &[String]) -> QueryResult<OrderSpec> {
        match clause {
            Value::String(key) => {
                if !columns.iter().any(|c| c == key) {
                    return Err(QueryError::invalid(format!(
                        "ORDER key '{}' is not in COLUMNS",
                        key
                    )));
                }
                Ok(OrderSpec::Single(key.clone()))
            }
            Value::Object(obj) => self.parse_order_object(obj, columns),
            _ => Err(QueryError::invalid("ORDER is neither a string nor an object")),
        }
    }

    fn parse_order_object(
        &self,
        obj: &Map<String, Value>,
        columns: &[String],
    ) -> QueryResult<OrderSpec> {
        if obj.len() != 2 || !obj.contains_key("dir") || !obj.contains_key("keys") {
            return Err(QueryError::invalid(
                "ORDER object must have exactly the keys 'dir' and 'keys'",
            ));
        }

        let dir = match obj.get("dir").and_then(Value::as_str) {
            Some("UP") => Direction::Up,
            Some("DOWN") => Direction::Down,
            Some(other) => {
                return Err(QueryError::invalid(format!(
                    "ORDER dir must be UP or DOWN, found '{}'",
                    other
                )))
            }
            None => return Err(QueryError::invalid("ORDER dir is not a string")),
        };

        let keys = obj
            .get("keys")
            .and_then(Value::as_array)
            .ok_or_else(|| QueryError::invalid("ORDER keys is not an array"))?;
        if keys.is_empty() {
            return Err(QueryError::invalid("ORDER keys is empty"));
        }

        let keys = keys
            .iter()
            .map(|key| {
                let key = key
                    .as_str()
                    .ok_or_else(|| QueryError::invalid("ORDER key is not a string"))?;
                if !columns.iter().any(|c| c == key) {
                    return Err(QueryError::invalid(format!(
                        "ORDER key '{}' is not in COLUMNS",
                        key
                    )));
                }
                Ok(key.to_string())
            })
            .collect::<QueryResult<Vec<_>>>()?;

        Ok(OrderSpec::Keyed { dir, keys })
    }

    // ---- shared ----

    /// Splits `datasetId_fieldName`, checks the id against the bound id,
    /// and returns the unqualified field name
    fn parse_qualified_key(&self, key: &str) -> QueryResult<String> {
        let (id, field) = key
            .split_once('_')
            .ok_or_else(|| QueryError::invalid(format!("'{}' is not a qualified key", key)))?;

        if id.trim().is_empty() {
            return Err(QueryError::invalid(format!(
                "'{}' has a blank dataset id",
                key
            )));
        }
        if id != self.dataset_id {
            return Err(QueryError::invalid(format!(
                "'{}' references dataset '{}', query is bound to '{}'",
                key, id, self.dataset_id
            )));
        }
        if field.is_empty() {
            return Err(QueryError::invalid(format!("'{}' has no field name", key)));
        }
        Ok(field.to_string())
    }

    /// Requires `value` to be an object with exactly one entry
    fn single_entry<'v>(&self, value: &'v Value, what: &str) -> QueryResult<(&'v str, &'v Value)> {
        let obj = value
            .as_object()
            .ok_or_else(|| QueryError::invalid(format!("{} is not an object", what)))?;
        if obj.len() != 1 {
            return Err(QueryError::invalid(format!(
                "{} must have exactly one entry, found {}",
                what,
                obj.len()
            )));
        }
        let (key, value) = obj.iter().next().expect("len checked above");
        Ok((key.as_str(), value))
    }
}
