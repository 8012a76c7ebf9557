//! Observability for campusdb
//!
//! Structured one-line JSON logs: deterministic key ordering, synchronous
//! writes, one log line per event. Severity decides the stream (errors go
//! to stderr).

mod logger;

pub use logger::{Logger, Severity};
