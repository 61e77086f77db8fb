use uuid::Uuid;

use crate::{
    dto::pull_list::{PullListResponse, PullListRowResponse},
    error::ServiceError,
    services::session_service::load_session,
    state::{
        SharedState,
        pull_list::{PullListRenderer, pull_list_rows},
    },
};

/// Pull-list rows of a session as JSON.
pub async fn pull_list(
    state: &SharedState,
    session_id: Uuid,
) -> Result<PullListResponse, ServiceError> {
    let store = state.require_session_store().await?;
    let session = load_session(store.as_ref(), session_id).await?;
    let calls = store.list_calls(session_id).await?;

    Ok(PullListResponse {
        session_id,
        title: session.title,
        game: session.game,
        rows: pull_list_rows(&calls)
            .into_iter()
            .map(PullListRowResponse::from)
            .collect(),
    })
}

/// Render the pull list with `renderer`, returning its content type and body.
pub async fn render_pull_list<R: PullListRenderer + ?Sized>(
    state: &SharedState,
    session_id: Uuid,
    renderer: &R,
) -> Result<(&'static str, String), ServiceError> {
    let store = state.require_session_store().await?;
    let session = load_session(store.as_ref(), session_id).await?;
    let calls = store.list_calls(session_id).await?;
    let rows = pull_list_rows(&calls);
    Ok((
        renderer.content_type(),
        renderer.render(&session.title, session.game, &rows),
    ))
}
