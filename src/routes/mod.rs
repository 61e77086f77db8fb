use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

pub mod health;
pub mod sessions;
pub mod sse;
pub mod templates;

/// Compose all route trees, wiring in shared state and the Swagger UI.
pub fn router(state: SharedState) -> Router<()> {
    let docs_router: Router<SharedState> = SwaggerUi::new("/docs")
        .url("/api-doc/openapi.json", ApiDoc::openapi())
        .into();

    health::router()
        .merge(sse::router())
        .merge(templates::router())
        .merge(sessions::router())
        .merge(docs_router)
        .with_state(state)
}
