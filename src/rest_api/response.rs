//! Wire envelopes
//!
//! Every response body is either `{"result": …}` or `{"error": …}`.

use serde::Serialize;

/// Success envelope
#[derive(Debug, Clone, Serialize)]
pub struct ResultResponse<T: Serialize> {
    pub result: T,
}

impl<T: Serialize> ResultResponse<T> {
    /// Wraps a payload in the success envelope
    pub fn new(result: T) -> Self {
        Self { result }
    }
}

/// Error envelope
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
