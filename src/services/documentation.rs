use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for DJ Games Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::templates::create_template,
        crate::routes::templates::list_templates,
        crate::routes::templates::get_template,
        crate::routes::templates::preview_cards,
        crate::routes::sessions::create_session,
        crate::routes::sessions::list_sessions,
        crate::routes::sessions::get_session,
        crate::routes::sessions::patch_session,
        crate::routes::sessions::pause_session,
        crate::routes::sessions::resume_session,
        crate::routes::sessions::advance_session,
        crate::routes::sessions::complete_session,
        crate::routes::sessions::list_calls,
        crate::routes::sessions::apply_call_action,
        crate::routes::sessions::list_cards,
        crate::routes::sessions::list_teams,
        crate::routes::sessions::score_session,
        crate::routes::sessions::leaderboard,
        crate::routes::sessions::pull_list,
        crate::routes::sessions::pull_list_text,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::SessionUpdatedEvent,
            crate::dto::sse::CallUpdatedEvent,
            crate::dto::sse::LeaderboardUpdatedEvent,
            crate::state::scoring::ScoreTarget,
            crate::state::scoring::ScoringRules,
            crate::state::scoring::LeaderboardRow,
            crate::state::game::GameKind,
            crate::state::game::CallDetails,
            crate::state::game::CallStatus,
            crate::state::game::CallAction,
            crate::state::state_machine::SessionStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "templates", description = "Reusable item lists"),
        (name = "sessions", description = "Session lifecycle and countdown"),
        (name = "calls", description = "Host actions on individual calls"),
        (name = "cards", description = "Bingo card generation"),
        (name = "scoring", description = "Team scores and leaderboards"),
        (name = "pull-list", description = "Printable DJ pull lists"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_session_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/sessions/{id}/advance"));
        assert!(doc.paths.paths.contains_key("/sessions/{id}/pull-list.txt"));
        assert!(doc.paths.paths.contains_key("/cards/preview"));
        assert!(doc.paths.paths.contains_key("/sessions/{id}/score"));
        assert!(doc.paths.paths.contains_key("/sessions/{id}/leaderboard"));
    }
}
