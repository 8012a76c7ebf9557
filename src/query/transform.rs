//! Grouping and aggregation
//!
//! Partitions the filtered records by the GROUP key tuple and computes
//! one output row per group. Groups are keyed by an encoding of their
//! value tuple, so membership is a hash lookup rather than a scan over
//! existing groups; group order is first-seen order of the input.
//!
//! SUM and AVG accumulate through `Decimal` so that repeated additions of
//! values like 1.005 cannot drift the way binary floats do; rounding to
//! two fractional digits happens once, at the end (for AVG, after the
//! division).

use std::collections::{HashMap, HashSet};

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use crate::dataset::Record;

use super::ast::{ApplyRule, ApplyToken, GroupKey, Transform};
use super::errors::{QueryError, QueryResult};
use super::project::{number_value, ResultRow};

const GROUP_KEY_SEPARATOR: char = '\u{1f}';

/// Groups records and computes aggregate rows
pub struct Transformer;

impl Transformer {
    /// Produces one row per group: every GROUP key (values taken from the
    /// group's first-seen member) plus every apply-key
    pub fn transform(spec: &Transform, records: &[&Record]) -> QueryResult<Vec<ResultRow>> {
        let groups = Self::group(&spec.group, records)?;
        groups
            .iter()
            .map(|members| Self::build_row(spec, members))
            .collect()
    }

    /// One-pass partition by encoded key tuple, first-seen group order
    fn group<'r>(keys: &[GroupKey], records: &[&'r Record]) -> QueryResult<Vec<Vec<&'r Record>>> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<Vec<&'r Record>> = Vec::new();

        for record in records {
            let encoded = Self::encode_group_key(keys, record)?;
            match index.get(&encoded) {
                Some(&at) => groups[at].push(record),
                None => {
                    index.insert(encoded, groups.len());
                    groups.push(vec![record]);
                }
            }
        }
        Ok(groups)
    }

    fn encode_group_key(keys: &[GroupKey], record: &Record) -> QueryResult<String> {
        let mut encoded = String::new();
        for key in keys {
            let value = record.field(&key.field).ok_or_else(|| {
                QueryError::internal(format!(
                    "group field '{}' unmapped for kind {}",
                    key.field,
                    record.kind()
                ))
            })?;
            encoded.push_str(&value.encode());
            encoded.push(GROUP_KEY_SEPARATOR);
        }
        Ok(encoded)
    }

    fn build_row(spec: &Transform, members: &[&Record]) -> QueryResult<ResultRow> {
        let representative = members
            .first()
            .ok_or_else(|| QueryError::internal("aggregation over an empty group"))?;

        let mut row = ResultRow::new();
        for key in &spec.group {
            let value = representative.field(&key.field).ok_or_else(|| {
                QueryError::internal(format!("group field '{}' unmapped", key.field))
            })?;
            let value = match value {
                crate::dataset::FieldValue::Number(n) => number_value(n),
                crate::dataset::FieldValue::Text(s) => Value::String(s),
            };
            row.insert(key.output.clone(), value);
        }
        for rule in &spec.apply {
            row.insert(rule.output.clone(), Self::aggregate(rule, members)?);
        }
        Ok(row)
    }

    fn aggregate(rule: &ApplyRule, members: &[&Record]) -> QueryResult<Value> {
        match rule.token {
            ApplyToken::Max => {
                let mut values = members.iter();
                let first = values
                    .next()
                    .ok_or_else(|| QueryError::internal("MAX over an empty group"))?;
                let mut max = Self::measure_of(first, &rule.field)?;
                for member in values {
                    let value = Self::measure_of(member, &rule.field)?;
                    if value > max {
                        max = value;
                    }
                }
                Ok(number_value(max))
            }
            ApplyToken::Min => {
                let mut values = members.iter();
                let first = values
                    .next()
                    .ok_or_else(|| QueryError::internal("MIN over an empty group"))?;
                let mut min = Self::measure_of(first, &rule.field)?;
                for member in values {
                    let value = Self::measure_of(member, &rule.field)?;
                    if value < min {
                        min = value;
                    }
                }
                Ok(number_value(min))
            }
            ApplyToken::Sum => {
                let total = Self::decimal_sum(rule, members)?;
                let rounded = total
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
                    .to_f64()
                    .ok_or_else(|| QueryError::internal("SUM out of range"))?;
                Ok(number_value(rounded))
            }
            ApplyToken::Avg => {
                let total = Self::decimal_sum(rule, members)?;
                let total = total
                    .to_f64()
                    .ok_or_else(|| QueryError::internal("AVG total out of range"))?;
                let avg = total / members.len() as f64;
                let rounded = Decimal::from_f64(avg)
                    .ok_or_else(|| QueryError::internal("AVG is not finite"))?
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
                    .to_f64()
                    .ok_or_else(|| QueryError::internal("AVG out of range"))?;
                Ok(number_value(rounded))
            }
            ApplyToken::Count => {
                let mut distinct = HashSet::new();
                for member in members {
                    let value = member.field(&rule.field).ok_or_else(|| {
                        QueryError::internal(format!(
                            "count field '{}' unmapped for kind {}",
                            rule.field,
                            member.kind()
                        ))
                    })?;
                    distinct.insert(value.encode());
                }
                Ok(Value::from(distinct.len() as u64))
            }
        }
    }

    fn decimal_sum(rule: &ApplyRule, members: &[&Record]) -> QueryResult<Decimal> {
        let mut total = Decimal::ZERO;
        for member in members {
            let value = Self::measure_of(member, &rule.field)?;
            let value = Decimal::from_f64(value).ok_or_else(|| {
                QueryError::internal(format!("'{}' value is not finite", rule.field))
            })?;
            total += value;
        }
        Ok(total)
    }

    fn measure_of(record: &Record, field: &str) -> QueryResult<f64> {
        record.measure(field).ok_or_else(|| {
            QueryError::internal(format!(
                "measure field '{}' unmapped for kind {}",
                field,
                record.kind()
            ))
        })
    }
}
