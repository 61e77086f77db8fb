/// Host actions on individual calls.
pub mod call_service;
/// Bingo card previews and stored decks.
pub mod card_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Pull-list shaping and rendering for a session.
pub mod pull_list_service;
/// Team scoring and leaderboards.
pub mod scoring_service;
/// Session creation, countdown control and call progression.
pub mod session_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage connection supervisor with health polling and degraded mode.
pub mod storage_supervisor;
/// Template storage.
pub mod template_service;
