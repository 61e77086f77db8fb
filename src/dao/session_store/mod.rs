#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    CallEntity, CardEntity, ScoreEntity, SessionEntity, TeamEntity, TemplateEntity,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

pub use memory::MemorySessionStore;

/// Abstraction over the persistence layer for templates, sessions, calls, cards, teams and
/// scores.
///
/// Rows are read and replaced by primary key; everything owned by a session is listed per session.
pub trait SessionStore: Send + Sync {
    /// Insert or replace a template.
    fn save_template(&self, template: TemplateEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Load a template by id.
    fn find_template(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TemplateEntity>>>;
    /// Every stored template.
    fn list_templates(&self) -> BoxFuture<'static, StorageResult<Vec<TemplateEntity>>>;
    /// Insert or replace a session row.
    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Load a session row by id.
    fn find_session(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>>;
    /// Every stored session.
    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>>;
    /// Insert or replace a batch of calls.
    fn save_calls(&self, calls: Vec<CallEntity>) -> BoxFuture<'static, StorageResult<()>>;
    /// Insert or replace a single call.
    fn save_call(&self, call: CallEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Load the call at `call_index` within a session.
    fn find_call(
        &self,
        session_id: Uuid,
        call_index: u32,
    ) -> BoxFuture<'static, StorageResult<Option<CallEntity>>>;
    /// Calls of a session ordered by call index.
    fn list_calls(&self, session_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<CallEntity>>>;
    /// Insert a session's bingo cards.
    fn save_cards(&self, cards: Vec<CardEntity>) -> BoxFuture<'static, StorageResult<()>>;
    /// Cards of a session ordered by card number.
    fn list_cards(&self, session_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<CardEntity>>>;
    /// Insert a session's teams.
    fn save_teams(&self, teams: Vec<TeamEntity>) -> BoxFuture<'static, StorageResult<()>>;
    /// Teams of a session ordered by team number.
    fn list_teams(&self, session_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;
    /// Insert or replace scores keyed by session, team and target.
    fn save_scores(&self, scores: Vec<ScoreEntity>) -> BoxFuture<'static, StorageResult<()>>;
    /// Scores of a session.
    fn list_scores(&self, session_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>>;
    /// Cheap round-trip proving the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
