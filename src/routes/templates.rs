use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        card::{CardDeckResponse, CardPreviewRequest},
        template::{CreateTemplateRequest, TemplateResponse, TemplateSummary},
    },
    error::AppError,
    services::{card_service, template_service},
    state::SharedState,
};

/// Reusable item lists and card previews.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/templates", get(list_templates).post(create_template))
        .route("/templates/{id}", get(get_template))
        .route("/cards/preview", post(preview_cards))
}

/// Store a new template.
#[utoipa::path(
    post,
    path = "/templates",
    tag = "templates",
    request_body = CreateTemplateRequest,
    responses(
        (status = 200, description = "Template created", body = TemplateResponse),
        (status = 400, description = "Invalid payload")
    )
)]
pub async fn create_template(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateTemplateRequest>>,
) -> Result<Json<TemplateResponse>, AppError> {
    Ok(Json(
        template_service::create_template(&state, payload).await?,
    ))
}

/// List stored templates.
#[utoipa::path(
    get,
    path = "/templates",
    tag = "templates",
    responses((status = 200, description = "Templates", body = [TemplateSummary]))
)]
pub async fn list_templates(
    State(state): State<SharedState>,
) -> Result<Json<Vec<TemplateSummary>>, AppError> {
    Ok(Json(template_service::list_templates(&state).await?))
}

/// Fetch one template with its items.
#[utoipa::path(
    get,
    path = "/templates/{id}",
    tag = "templates",
    params(("id" = String, Path, description = "Identifier of the template")),
    responses(
        (status = 200, description = "Template", body = TemplateResponse),
        (status = 404, description = "Unknown template")
    )
)]
pub async fn get_template(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TemplateResponse>, AppError> {
    Ok(Json(template_service::get_template(&state, id).await?))
}

/// Generate cards from inline items without creating a session.
#[utoipa::path(
    post,
    path = "/cards/preview",
    tag = "cards",
    request_body = CardPreviewRequest,
    responses(
        (status = 200, description = "Card deck", body = CardDeckResponse),
        (status = 400, description = "Too few items for the variant")
    )
)]
pub async fn preview_cards(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CardPreviewRequest>>,
) -> Result<Json<CardDeckResponse>, AppError> {
    Ok(Json(card_service::preview_cards(&state, payload)?))
}
