use serde::Serialize;
use utoipa::ToSchema;

const STATUS_OK: &str = "ok";
const STATUS_DEGRADED: &str = "degraded";

/// Body of `/healthcheck`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok`, or `degraded` while the storage backend is unreachable.
    pub status: String,
}

impl HealthResponse {
    /// Storage reachable.
    pub fn ok() -> Self {
        Self {
            status: STATUS_OK.to_string(),
        }
    }

    /// Running without storage; storage-backed routes answer 503.
    pub fn degraded() -> Self {
        Self {
            status: STATUS_DEGRADED.to_string(),
        }
    }
}
