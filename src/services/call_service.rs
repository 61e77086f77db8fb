use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dto::call::CallResponse,
    error::ServiceError,
    services::{session_service::load_session, sse_events},
    state::{SharedState, game::CallAction},
};

/// Calls of a session in call order.
pub async fn list_calls(
    state: &SharedState,
    session_id: Uuid,
) -> Result<Vec<CallResponse>, ServiceError> {
    let store = state.require_session_store().await?;
    load_session(store.as_ref(), session_id).await?;
    let calls = store.list_calls(session_id).await?;
    Ok(calls.iter().map(CallResponse::from).collect())
}

/// Reveal, score or skip a single call.
pub async fn apply_call_action(
    state: &SharedState,
    session_id: Uuid,
    call_index: u32,
    action: CallAction,
) -> Result<CallResponse, ServiceError> {
    let store = state.require_session_store().await?;

    let call = state
        .run_session_transition(session_id, move || async move {
            let session = load_session(store.as_ref(), session_id).await?;
            if session.status().is_completed() {
                return Err(ServiceError::InvalidState(format!(
                    "session `{session_id}` is completed"
                )));
            }

            let mut call = store
                .find_call(session_id, call_index)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "call {call_index} of session `{session_id}` not found"
                    ))
                })?;

            call.status = call.status.apply(action)?;
            let now = SystemTime::now();
            match action {
                CallAction::Reveal => call.revealed_at = Some(now),
                CallAction::Score => call.scored_at = Some(now),
                CallAction::Skip => {}
            }

            store.save_call(call.clone()).await?;
            Ok(call)
        })
        .await?;

    info!(%session_id, call_index, ?action, status = ?call.status, "call updated");
    sse_events::broadcast_call_updated(state, &call);
    Ok(CallResponse::from(&call))
}
