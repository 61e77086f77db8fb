use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::template::ItemInput,
    state::{
        cards::{BingoCard, BingoCell, CardVariant, LabelMode},
        game::BingoColumn,
    },
};

/// Build a deck of cards from inline items without creating a session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CardPreviewRequest {
    #[validate(length(min = 1), nested)]
    pub items: Vec<ItemInput>,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub card_count: Option<u32>,
    #[serde(default)]
    pub card_variant: Option<CardVariant>,
    #[serde(default)]
    pub label_mode: Option<LabelMode>,
}

/// One printed cell.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
pub struct CardCellResponse {
    pub row: u8,
    pub col: u8,
    pub column: BingoColumn,
    pub free: bool,
    pub item_id: Option<Uuid>,
    pub label: String,
}

impl From<&BingoCell> for CardCellResponse {
    fn from(cell: &BingoCell) -> Self {
        Self {
            row: cell.row,
            col: cell.col,
            column: cell.column,
            free: cell.free,
            item_id: cell.item_id,
            label: cell.label.clone(),
        }
    }
}

/// One 5x5 card, cells in row-major order.
#[derive(Debug, Serialize, ToSchema)]
pub struct CardResponse {
    pub card_number: u32,
    pub cells: Vec<CardCellResponse>,
}

impl From<&BingoCard> for CardResponse {
    fn from(card: &BingoCard) -> Self {
        Self {
            card_number: card.card_number,
            cells: card.cells.iter().map(Into::into).collect(),
        }
    }
}

/// A full deck with the layout settings it was generated with.
#[derive(Debug, Serialize, ToSchema)]
pub struct CardDeckResponse {
    pub card_variant: CardVariant,
    pub label_mode: LabelMode,
    pub cards: Vec<CardResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_needs_at_least_one_item() {
        let request: CardPreviewRequest = serde_json::from_str(r#"{"items": []}"#).unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("items"));

        let request: CardPreviewRequest = serde_json::from_str(
            r#"{"items": [{"title": "Superstition", "artist": "Stevie Wonder"}], "card_count": 2}"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());
    }
}
