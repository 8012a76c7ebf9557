//! campusdb - a deterministic in-memory query service for campus section
//! and room datasets

pub mod cli;
pub mod dataset;
pub mod observability;
pub mod query;
pub mod rest_api;
pub mod schema;
