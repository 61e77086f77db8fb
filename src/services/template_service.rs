use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dto::template::{CreateTemplateRequest, TemplateResponse, TemplateSummary},
    error::ServiceError,
    state::SharedState,
};

/// Store a reusable item list.
pub async fn create_template(
    state: &SharedState,
    request: CreateTemplateRequest,
) -> Result<TemplateResponse, ServiceError> {
    let store = state.require_session_store().await?;
    let template = request.into_entity(SystemTime::now());
    store.save_template(template.clone()).await?;
    info!(template_id = %template.id, items = template.items.len(), "template created");
    Ok(template.into())
}

/// Summaries of every stored template, oldest first.
pub async fn list_templates(state: &SharedState) -> Result<Vec<TemplateSummary>, ServiceError> {
    let store = state.require_session_store().await?;
    let templates = store.list_templates().await?;
    Ok(templates.iter().map(TemplateSummary::from).collect())
}

/// One template with its items.
pub async fn get_template(
    state: &SharedState,
    template_id: Uuid,
) -> Result<TemplateResponse, ServiceError> {
    let store = state.require_session_store().await?;
    store
        .find_template(template_id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ServiceError::NotFound(format!("template `{template_id}` not found")))
}
