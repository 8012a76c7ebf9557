//! REST transport for campusdb
//!
//! Thin axum layer over the dataset catalog and the query engine. The
//! wire contract is fixed: `{"result": …}` on success, `{"error": …}` on
//! failure, and the query JSON shape is passed through to the engine
//! untouched.
//!
//! Routes:
//! - `PUT /dataset/:id/:kind` — load a dataset from a flat record array
//! - `DELETE /dataset/:id` — unload a dataset
//! - `POST /query` — evaluate a query against its bound dataset
//! - `GET /datasets` — list loaded datasets

mod errors;
mod response;
mod server;

pub use errors::{ApiError, ApiResult};
pub use response::{ErrorResponse, ResultResponse};
pub use server::ApiServer;
