use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report `ok` or `degraded`, probing the store when one is installed.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_session_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    if state.is_degraded() {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{config::AppConfig, dao::session_store::MemorySessionStore, state::AppState};

    #[tokio::test]
    async fn reports_degraded_without_store() {
        let state = AppState::new(AppConfig::default());
        assert_eq!(health_status(&state).await.status, "degraded");

        state
            .set_session_store(Arc::new(MemorySessionStore::new()))
            .await;
        assert_eq!(health_status(&state).await.status, "ok");
    }
}
