//! Process-local store used for tests, demos and `STORAGE_BACKEND=memory`.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::{
    dao::{
        models::{CallEntity, CardEntity, ScoreEntity, SessionEntity, TeamEntity, TemplateEntity},
        session_store::SessionStore,
        storage::StorageResult,
    },
    state::scoring::ScoreTarget,
};

/// In-memory [`SessionStore`] backed by concurrent hash maps.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    templates: DashMap<Uuid, TemplateEntity>,
    sessions: DashMap<Uuid, SessionEntity>,
    calls: DashMap<(Uuid, u32), CallEntity>,
    cards: DashMap<(Uuid, u32), CardEntity>,
    teams: DashMap<(Uuid, u32), TeamEntity>,
    scores: DashMap<(Uuid, u32, ScoreTarget), ScoreEntity>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn save_template(&self, template: TemplateEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.templates.insert(template.id, template);
            Ok(())
        })
    }

    fn find_template(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TemplateEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.templates.get(&id).map(|entry| entry.clone())) })
    }

    fn list_templates(&self) -> BoxFuture<'static, StorageResult<Vec<TemplateEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut templates: Vec<TemplateEntity> = store
                .inner
                .templates
                .iter()
                .map(|entry| entry.value().clone())
                .collect();
            templates.sort_by_key(|template| template.created_at);
            Ok(templates)
        })
    }

    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.sessions.insert(session.id, session);
            Ok(())
        })
    }

    fn find_session(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.sessions.get(&id).map(|entry| entry.clone())) })
    }

    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut sessions: Vec<SessionEntity> = store
                .inner
                .sessions
                .iter()
                .map(|entry| entry.value().clone())
                .collect();
            sessions.sort_by_key(|session| session.created_at);
            Ok(sessions)
        })
    }

    fn save_calls(&self, calls: Vec<CallEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for call in calls {
                store
                    .inner
                    .calls
                    .insert((call.session_id, call.call_index), call);
            }
            Ok(())
        })
    }

    fn save_call(&self, call: CallEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.save_calls(vec![call])
    }

    fn find_call(
        &self,
        session_id: Uuid,
        call_index: u32,
    ) -> BoxFuture<'static, StorageResult<Option<CallEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .calls
                .get(&(session_id, call_index))
                .map(|entry| entry.clone()))
        })
    }

    fn list_calls(&self, session_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<CallEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut calls: Vec<CallEntity> = store
                .inner
                .calls
                .iter()
                .filter(|entry| entry.key().0 == session_id)
                .map(|entry| entry.value().clone())
                .collect();
            calls.sort_by_key(|call| call.call_index);
            Ok(calls)
        })
    }

    fn save_cards(&self, cards: Vec<CardEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for card in cards {
                store
                    .inner
                    .cards
                    .insert((card.session_id, card.card.card_number), card);
            }
            Ok(())
        })
    }

    fn list_cards(&self, session_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<CardEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut cards: Vec<CardEntity> = store
                .inner
                .cards
                .iter()
                .filter(|entry| entry.key().0 == session_id)
                .map(|entry| entry.value().clone())
                .collect();
            cards.sort_by_key(|card| card.card.card_number);
            Ok(cards)
        })
    }

    fn save_teams(&self, teams: Vec<TeamEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for team in teams {
                store
                    .inner
                    .teams
                    .insert((team.session_id, team.team_id), team);
            }
            Ok(())
        })
    }

    fn list_teams(&self, session_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut teams: Vec<TeamEntity> = store
                .inner
                .teams
                .iter()
                .filter(|entry| entry.key().0 == session_id)
                .map(|entry| entry.value().clone())
                .collect();
            teams.sort_by_key(|team| team.team_id);
            Ok(teams)
        })
    }

    fn save_scores(&self, scores: Vec<ScoreEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for score in scores {
                store
                    .inner
                    .scores
                    .insert((score.session_id, score.team_id, score.target), score);
            }
            Ok(())
        })
    }

    fn list_scores(&self, session_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut scores: Vec<ScoreEntity> = store
                .inner
                .scores
                .iter()
                .filter(|entry| entry.key().0 == session_id)
                .map(|entry| entry.value().clone())
                .collect();
            scores.sort_by_key(|score| (score.team_id, score.target.storage_key()));
            Ok(scores)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
