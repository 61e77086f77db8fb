use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::models::TemplateItemEntity,
    dto::card::{CardDeckResponse, CardPreviewRequest, CardResponse},
    error::ServiceError,
    services::session_service::load_session,
    state::{SharedState, cards::build_cards, game::GameKind},
};

/// Apply the configured default and upper bound to a requested deck size.
pub(crate) fn resolve_card_count(
    config: &AppConfig,
    requested: Option<u32>,
) -> Result<u32, ServiceError> {
    let count = requested.unwrap_or(config.default_card_count);
    if count == 0 || count > config.max_card_count {
        return Err(ServiceError::InvalidInput(format!(
            "card_count must be between 1 and {} (got {count})",
            config.max_card_count
        )));
    }
    Ok(count)
}

/// Build a throwaway deck from inline items; nothing is persisted.
pub fn preview_cards(
    state: &SharedState,
    request: CardPreviewRequest,
) -> Result<CardDeckResponse, ServiceError> {
    let card_count = resolve_card_count(state.config(), request.card_count)?;
    let card_variant = request.card_variant.unwrap_or_default();
    let label_mode = request.label_mode.unwrap_or_default();
    let items: Vec<TemplateItemEntity> = request.items.into_iter().map(Into::into).collect();

    let cards = build_cards(
        &items,
        card_count,
        card_variant,
        label_mode,
        &mut rand::rng(),
    )?;

    Ok(CardDeckResponse {
        card_variant,
        label_mode,
        cards: cards.iter().map(CardResponse::from).collect(),
    })
}

/// Cards printed for a bingo session, by card number.
pub async fn list_cards(
    state: &SharedState,
    session_id: Uuid,
) -> Result<CardDeckResponse, ServiceError> {
    let store = state.require_session_store().await?;
    let session = load_session(store.as_ref(), session_id).await?;
    if session.game != GameKind::Bingo {
        return Err(ServiceError::InvalidState(format!(
            "session `{session_id}` is not a bingo session"
        )));
    }

    let cards = store.list_cards(session_id).await?;
    Ok(CardDeckResponse {
        card_variant: session.card_variant,
        label_mode: session.label_mode,
        cards: cards.iter().map(|entity| CardResponse::from(&entity.card)).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dto::template::ItemInput, state::AppState, state::cards::CardVariant};

    fn items(count: usize) -> Vec<ItemInput> {
        (0..count)
            .map(|i| ItemInput {
                id: None,
                title: format!("Track {i}"),
                artist: format!("Artist {i}"),
                album: None,
                source_label: None,
                host_notes: None,
                details: None,
            })
            .collect()
    }

    #[test]
    fn card_count_is_bounded_by_config() {
        let config = AppConfig::default();
        assert_eq!(resolve_card_count(&config, None).unwrap(), 40);
        assert_eq!(resolve_card_count(&config, Some(500)).unwrap(), 500);
        assert!(resolve_card_count(&config, Some(501)).is_err());
        assert!(resolve_card_count(&config, Some(0)).is_err());
    }

    #[test]
    fn preview_works_without_storage() {
        let state = AppState::new(AppConfig::default());
        let deck = preview_cards(
            &state,
            CardPreviewRequest {
                items: items(30),
                card_count: Some(3),
                card_variant: Some(CardVariant::Blackout),
                label_mode: None,
            },
        )
        .unwrap();
        assert_eq!(deck.cards.len(), 3);
        assert!(deck.cards.iter().all(|card| card.cells.iter().all(|cell| !cell.free)));
    }

    #[test]
    fn preview_rejects_small_pool() {
        let state = AppState::new(AppConfig::default());
        let result = preview_cards(
            &state,
            CardPreviewRequest {
                items: items(23),
                card_count: Some(1),
                card_variant: None,
                label_mode: None,
            },
        );
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }
}
