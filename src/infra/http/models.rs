//! Wire models shared by the server handlers and the HTTP client sessions.

use serde::{Deserialize, Serialize};

/// Body returned by `POST /api/save` on acceptance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: i64,
    pub count: usize,
}

/// Body carried by every failure response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}
