use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{TemplateEntity, TemplateItemEntity},
    dto::{
        format_system_time,
        validation::{validate_call_details, validate_not_blank},
    },
    state::game::{CallDetails, GameKind},
};

/// Track supplied inline, either for a template or directly when creating a session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemInput {
    /// Optional stable identifier; generated when omitted.
    #[serde(default)]
    pub id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub source_label: Option<String>,
    #[serde(default)]
    pub host_notes: Option<String>,
    /// Answer data for the game the item is meant for.
    #[serde(default)]
    pub details: Option<CallDetails>,
}

impl Validate for ItemInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_not_blank(&self.title) {
            errors.add("title", e);
        }

        if let Some(ref details) = self.details {
            if let Err(e) = validate_call_details(details) {
                errors.add("details", e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<ItemInput> for TemplateItemEntity {
    fn from(input: ItemInput) -> Self {
        Self {
            id: input.id.unwrap_or_else(Uuid::new_v4),
            title: input.title.trim().to_string(),
            artist: input.artist.trim().to_string(),
            album: trimmed(input.album),
            source_label: trimmed(input.source_label),
            host_notes: trimmed(input.host_notes),
            details: input.details,
        }
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Payload used to store a reusable item list.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateTemplateRequest {
    #[validate(custom(function = "validate_not_blank"), length(max = 120))]
    pub name: String,
    #[serde(default)]
    pub game: Option<GameKind>,
    #[validate(length(min = 1), nested)]
    pub items: Vec<ItemInput>,
}

/// Template item as exposed over HTTP.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateItemResponse {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub source_label: Option<String>,
    pub host_notes: Option<String>,
    pub details: Option<CallDetails>,
}

impl From<TemplateItemEntity> for TemplateItemResponse {
    fn from(item: TemplateItemEntity) -> Self {
        Self {
            id: item.id,
            title: item.title,
            artist: item.artist,
            album: item.album,
            source_label: item.source_label,
            host_notes: item.host_notes,
            details: item.details,
        }
    }
}

/// Full template with its items.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateResponse {
    pub id: Uuid,
    pub name: String,
    pub game: Option<GameKind>,
    pub created_at: String,
    pub items: Vec<TemplateItemResponse>,
}

impl From<TemplateEntity> for TemplateResponse {
    fn from(template: TemplateEntity) -> Self {
        Self {
            id: template.id,
            name: template.name,
            game: template.game,
            created_at: format_system_time(template.created_at),
            items: template.items.into_iter().map(Into::into).collect(),
        }
    }
}

/// Lightweight listing entry.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateSummary {
    pub id: Uuid,
    pub name: String,
    pub game: Option<GameKind>,
    pub item_count: usize,
    pub created_at: String,
}

impl From<&TemplateEntity> for TemplateSummary {
    fn from(template: &TemplateEntity) -> Self {
        Self {
            id: template.id,
            name: template.name.clone(),
            game: template.game,
            item_count: template.items.len(),
            created_at: format_system_time(template.created_at),
        }
    }
}

impl CreateTemplateRequest {
    /// Turn the request into a storable template.
    pub fn into_entity(self, created_at: SystemTime) -> TemplateEntity {
        TemplateEntity {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            game: self.game,
            items: self.items.into_iter().map(Into::into).collect(),
            created_at,
        }
    }
}
