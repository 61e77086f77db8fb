use axum::{
    Json, Router,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        call::CallResponse,
        card::CardDeckResponse,
        pull_list::PullListResponse,
        scoring::{LeaderboardResponse, ScoreRequest, ScoreResponse, TeamResponse},
        session::{AdvanceResponse, CreateSessionRequest, PatchSessionRequest, SessionResponse},
    },
    error::AppError,
    services::{call_service, card_service, pull_list_service, scoring_service, session_service},
    state::{SharedState, game::CallAction, pull_list::PlainTextRenderer},
};

/// Host console routes: session lifecycle, calls, cards, team scores and pull lists.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions", get(list_sessions).post(create_session))
        .route("/sessions/{id}", get(get_session).patch(patch_session))
        .route("/sessions/{id}/pause", post(pause_session))
        .route("/sessions/{id}/resume", post(resume_session))
        .route("/sessions/{id}/advance", post(advance_session))
        .route("/sessions/{id}/complete", post(complete_session))
        .route("/sessions/{id}/calls", get(list_calls))
        .route(
            "/sessions/{id}/calls/{index}/{action}",
            post(apply_call_action),
        )
        .route("/sessions/{id}/cards", get(list_cards))
        .route("/sessions/{id}/teams", get(list_teams))
        .route("/sessions/{id}/score", post(score_session))
        .route("/sessions/{id}/leaderboard", get(leaderboard))
        .route("/sessions/{id}/pull-list", get(pull_list))
        .route("/sessions/{id}/pull-list.txt", get(pull_list_text))
}

/// Start a new session from a template or inline items.
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session created", body = SessionResponse),
        (status = 400, description = "Invalid payload or too few items"),
        (status = 404, description = "Unknown template")
    )
)]
pub async fn create_session(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateSessionRequest>>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = session_service::create_session(&state, payload).await?;
    Ok(Json(session))
}

/// List every session.
#[utoipa::path(
    get,
    path = "/sessions",
    tag = "sessions",
    responses((status = 200, description = "Known sessions", body = [SessionResponse]))
)]
pub async fn list_sessions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<SessionResponse>>, AppError> {
    Ok(Json(session_service::list_sessions(&state).await?))
}

/// Fetch a session with its remaining countdown.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Session", body = SessionResponse),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(session_service::get_session(&state, id).await?))
}

/// Change the title, countdown length or display toggles.
#[utoipa::path(
    patch,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Identifier of the session")),
    request_body = PatchSessionRequest,
    responses(
        (status = 200, description = "Session updated", body = SessionResponse),
        (status = 409, description = "Session already completed")
    )
)]
pub async fn patch_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<PatchSessionRequest>>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(
        session_service::patch_session(&state, id, payload).await?,
    ))
}

/// Freeze the countdown.
#[utoipa::path(
    post,
    path = "/sessions/{id}/pause",
    tag = "sessions",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Session paused", body = SessionResponse),
        (status = 409, description = "Session already completed")
    )
)]
pub async fn pause_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(session_service::pause_session(&state, id).await?))
}

/// Continue the countdown where it was paused.
#[utoipa::path(
    post,
    path = "/sessions/{id}/resume",
    tag = "sessions",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Session resumed", body = SessionResponse),
        (status = 409, description = "Session is not paused")
    )
)]
pub async fn resume_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(session_service::resume_session(&state, id).await?))
}

/// Make the next call and restart the countdown.
#[utoipa::path(
    post,
    path = "/sessions/{id}/advance",
    tag = "sessions",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Next call made", body = AdvanceResponse),
        (status = 409, description = "No more calls or session completed")
    )
)]
pub async fn advance_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AdvanceResponse>, AppError> {
    Ok(Json(session_service::advance_session(&state, id).await?))
}

/// End the session.
#[utoipa::path(
    post,
    path = "/sessions/{id}/complete",
    tag = "sessions",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Session completed", body = SessionResponse),
        (status = 409, description = "Session already completed")
    )
)]
pub async fn complete_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, AppError> {
    Ok(Json(session_service::complete_session(&state, id).await?))
}

/// Calls of a session in call order.
#[utoipa::path(
    get,
    path = "/sessions/{id}/calls",
    tag = "calls",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses((status = 200, description = "Calls", body = [CallResponse]))
)]
pub async fn list_calls(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CallResponse>>, AppError> {
    Ok(Json(call_service::list_calls(&state, id).await?))
}

/// Reveal, score or skip one call.
#[utoipa::path(
    post,
    path = "/sessions/{id}/calls/{index}/{action}",
    tag = "calls",
    params(
        ("id" = String, Path, description = "Identifier of the session"),
        ("index" = u32, Path, description = "1-based call index"),
        ("action" = CallAction, Path, description = "`reveal`, `score` or `skip`")
    ),
    responses(
        (status = 200, description = "Call updated", body = CallResponse),
        (status = 404, description = "Unknown session or call"),
        (status = 409, description = "Action does not apply to the call's status")
    )
)]
pub async fn apply_call_action(
    State(state): State<SharedState>,
    Path((id, index, action)): Path<(Uuid, u32, CallAction)>,
) -> Result<Json<CallResponse>, AppError> {
    Ok(Json(
        call_service::apply_call_action(&state, id, index, action).await?,
    ))
}

/// Printed cards of a bingo session.
#[utoipa::path(
    get,
    path = "/sessions/{id}/cards",
    tag = "cards",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Card deck", body = CardDeckResponse),
        (status = 409, description = "Session is not a bingo session")
    )
)]
pub async fn list_cards(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CardDeckResponse>, AppError> {
    Ok(Json(card_service::list_cards(&state, id).await?))
}

/// Teams of a scored session.
#[utoipa::path(
    get,
    path = "/sessions/{id}/teams",
    tag = "scoring",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Teams", body = [TeamResponse]),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn list_teams(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TeamResponse>>, AppError> {
    Ok(Json(scoring_service::list_teams(&state, id).await?))
}

/// Score teams on one call or a whole round.
#[utoipa::path(
    post,
    path = "/sessions/{id}/score",
    tag = "scoring",
    params(("id" = String, Path, description = "Identifier of the session")),
    request_body = ScoreRequest,
    responses(
        (status = 200, description = "Scores recorded", body = ScoreResponse),
        (status = 400, description = "Invalid target or unknown team"),
        (status = 404, description = "Unknown session, call or round"),
        (status = 409, description = "Nothing played yet or session not scored per team")
    )
)]
pub async fn score_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<ScoreRequest>>,
) -> Result<Json<ScoreResponse>, AppError> {
    Ok(Json(
        scoring_service::score_session(&state, id, payload).await?,
    ))
}

/// Team standings, best first.
#[utoipa::path(
    get,
    path = "/sessions/{id}/leaderboard",
    tag = "scoring",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Leaderboard", body = LeaderboardResponse),
        (status = 409, description = "Bingo sessions have no team scores")
    )
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    Ok(Json(
        scoring_service::session_leaderboard(&state, id).await?,
    ))
}

/// Pull list rows for the DJ.
#[utoipa::path(
    get,
    path = "/sessions/{id}/pull-list",
    tag = "pull-list",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses((status = 200, description = "Pull list", body = PullListResponse))
)]
pub async fn pull_list(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PullListResponse>, AppError> {
    Ok(Json(pull_list_service::pull_list(&state, id).await?))
}

/// Printable pull list grouped by round.
#[utoipa::path(
    get,
    path = "/sessions/{id}/pull-list.txt",
    tag = "pull-list",
    params(("id" = String, Path, description = "Identifier of the session")),
    responses((status = 200, description = "Pull list", content_type = "text/plain", body = String))
)]
pub async fn pull_list_text(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let (content_type, body) =
        pull_list_service::render_pull_list(&state, id, &PlainTextRenderer).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], body))
}
