//! Query subsystem for campusdb
//!
//! A query is a declarative JSON object with a WHERE filter tree, an
//! OPTIONS output specification, and an optional TRANSFORMATIONS
//! grouping/aggregation block. The engine evaluates it against one
//! dataset's records in a strict order:
//!
//! 1. Parse and validate the query against the grammar and the field
//!    schema for the dataset's record kind (building the typed AST)
//! 2. Filter records against the WHERE tree (stable, order-preserving)
//! 3. Enforce the result bound on the filtered record count
//! 4. Group and aggregate when TRANSFORMATIONS is present
//! 5. Project the output columns and apply ORDER
//!
//! # Invariants
//!
//! - Invalid queries are rejected before any record is touched
//! - The result bound applies to the pre-transformation count
//! - Either the full row set is returned or one error; never partial rows

mod ast;
mod engine;
mod errors;
mod filter;
mod parser;
mod project;
mod transform;

pub use ast::{
    ApplyRule, ApplyToken, Direction, Filter, GroupKey, MeasureOp, OrderSpec, Pattern, Query,
    Transform,
};
pub use engine::{QueryEngine, RESULT_LIMIT};
pub use errors::{QueryError, QueryErrorCode, QueryResult};
pub use filter::FilterEvaluator;
pub use parser::QueryParser;
pub use project::{Projector, ResultRow};
pub use transform::Transformer;
