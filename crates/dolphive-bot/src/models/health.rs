//! Health check payload

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub version: String,
    pub backend: String,
    /// GitHub API calls since start-up (or the last reset)
    pub api_calls: u64,
}
