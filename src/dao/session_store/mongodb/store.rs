use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::doc,
    options::IndexOptions,
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        CALL_COLLECTION_NAME, CARD_COLLECTION_NAME, MongoCallDocument, MongoCardDocument,
        MongoScoreDocument, MongoSessionDocument, MongoTeamDocument, MongoTemplateDocument,
        SCORE_COLLECTION_NAME, SESSION_COLLECTION_NAME, TEAM_COLLECTION_NAME,
        TEMPLATE_COLLECTION_NAME, doc_id, owned_key, score_key, session_filter,
    },
};
use crate::dao::{
    models::{CallEntity, CardEntity, ScoreEntity, SessionEntity, TeamEntity, TemplateEntity},
    session_store::SessionStore,
    storage::{StorageError, StorageResult},
};

/// [`SessionStore`] persisting rows into MongoDB collections.
#[derive(Clone)]
pub struct MongoSessionStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoSessionStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        for (collection, index, keys) in [
            (
                CALL_COLLECTION_NAME,
                "session_call_idx",
                doc! {"session_id": 1, "call_index": 1},
            ),
            (
                CARD_COLLECTION_NAME,
                "session_card_idx",
                doc! {"session_id": 1, "card_number": 1},
            ),
            (
                TEAM_COLLECTION_NAME,
                "session_team_idx",
                doc! {"session_id": 1, "team_id": 1},
            ),
        ] {
            let model = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(index.to_owned()))
                        .unique(Some(true))
                        .build(),
                )
                .build();

            self.collection::<mongodb::bson::Document>(collection)
                .await
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index,
                    source,
                })?;
        }

        Ok(())
    }

    async fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        let guard = self.inner.state.read().await;
        guard.database.collection::<T>(name)
    }

    async fn replace<D>(&self, collection: &'static str, id: String, document: D) -> MongoResult<()>
    where
        D: Serialize + Send + Sync,
    {
        self.collection::<D>(collection)
            .await
            .replace_one(doc_id(&id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection,
                id,
                source,
            })?;
        Ok(())
    }

    async fn find_one<D>(&self, collection: &'static str, id: String) -> MongoResult<Option<D>>
    where
        D: DeserializeOwned + Send + Sync,
    {
        self.collection::<D>(collection)
            .await
            .find_one(doc_id(&id))
            .await
            .map_err(|source| MongoDaoError::Read {
                collection,
                id,
                source,
            })
    }

    async fn find_many<D>(
        &self,
        collection: &'static str,
        filter: mongodb::bson::Document,
        sort: mongodb::bson::Document,
    ) -> MongoResult<Vec<D>>
    where
        D: DeserializeOwned + Send + Sync,
    {
        let label = filter.to_string();
        self.collection::<D>(collection)
            .await
            .find(filter)
            .sort(sort)
            .await
            .map_err(|source| MongoDaoError::Read {
                collection,
                id: label.clone(),
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Read {
                collection,
                id: label,
                source,
            })
    }

    async fn list_sessions(&self) -> MongoResult<Vec<SessionEntity>> {
        let documents: Vec<MongoSessionDocument> = self
            .find_many(SESSION_COLLECTION_NAME, doc! {}, doc! {"created_at": 1})
            .await?;
        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_templates(&self) -> MongoResult<Vec<TemplateEntity>> {
        let documents: Vec<MongoTemplateDocument> = self
            .find_many(TEMPLATE_COLLECTION_NAME, doc! {}, doc! {"created_at": 1})
            .await?;
        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_calls(&self, session_id: Uuid) -> MongoResult<Vec<CallEntity>> {
        let documents: Vec<MongoCallDocument> = self
            .find_many(
                CALL_COLLECTION_NAME,
                session_filter(session_id),
                doc! {"call_index": 1},
            )
            .await?;
        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_cards(&self, session_id: Uuid) -> MongoResult<Vec<CardEntity>> {
        let documents: Vec<MongoCardDocument> = self
            .find_many(
                CARD_COLLECTION_NAME,
                session_filter(session_id),
                doc! {"card_number": 1},
            )
            .await?;
        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_teams(&self, session_id: Uuid) -> MongoResult<Vec<TeamEntity>> {
        let documents: Vec<MongoTeamDocument> = self
            .find_many(
                TEAM_COLLECTION_NAME,
                session_filter(session_id),
                doc! {"team_id": 1},
            )
            .await?;
        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_scores(&self, session_id: Uuid) -> MongoResult<Vec<ScoreEntity>> {
        let documents: Vec<MongoScoreDocument> = self
            .find_many(
                SCORE_COLLECTION_NAME,
                session_filter(session_id),
                doc! {"_id": 1},
            )
            .await?;
        documents.into_iter().map(TryInto::try_into).collect()
    }
}

impl SessionStore for MongoSessionStore {
    fn save_template(&self, template: TemplateEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = template.id.to_string();
            let document = MongoTemplateDocument::from(template);
            store
                .replace(TEMPLATE_COLLECTION_NAME, id, document)
                .await
                .map_err(Into::into)
        })
    }

    fn find_template(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TemplateEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let document: Option<MongoTemplateDocument> = store
                .find_one(TEMPLATE_COLLECTION_NAME, id.to_string())
                .await?;
            document
                .map(TemplateEntity::try_from)
                .transpose()
                .map_err(StorageError::from)
        })
    }

    fn list_templates(&self) -> BoxFuture<'static, StorageResult<Vec<TemplateEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_templates().await.map_err(Into::into) })
    }

    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = session.id.to_string();
            let document = MongoSessionDocument::from(session);
            store
                .replace(SESSION_COLLECTION_NAME, id, document)
                .await
                .map_err(Into::into)
        })
    }

    fn find_session(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let document: Option<MongoSessionDocument> = store
                .find_one(SESSION_COLLECTION_NAME, id.to_string())
                .await?;
            document
                .map(SessionEntity::try_from)
                .transpose()
                .map_err(StorageError::from)
        })
    }

    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_sessions().await.map_err(Into::into) })
    }

    fn save_calls(&self, calls: Vec<CallEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for call in calls {
                let id = owned_key(call.session_id, call.call_index);
                store
                    .replace(CALL_COLLECTION_NAME, id, MongoCallDocument::from(call))
                    .await?;
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
            let document: Option<MongoCallDocument> = store
                .find_one(CALL_COLLECTION_NAME, owned_key(session_id, call_index))
                .await?;
            document
                .map(CallEntity::try_from)
                .transpose()
                .map_err(StorageError::from)
        })
    }

    fn list_calls(&self, session_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<CallEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_calls(session_id).await.map_err(Into::into) })
    }

    fn save_cards(&self, cards: Vec<CardEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for card in cards {
                let id = owned_key(card.session_id, card.card.card_number);
                store
                    .replace(CARD_COLLECTION_NAME, id, MongoCardDocument::from(card))
                    .await?;
            }
            Ok(())
        })
    }

    fn list_cards(&self, session_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<CardEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_cards(session_id).await.map_err(Into::into) })
    }

    fn save_teams(&self, teams: Vec<TeamEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for team in teams {
                let id = owned_key(team.session_id, team.team_id);
                store
                    .replace(TEAM_COLLECTION_NAME, id, MongoTeamDocument::from(team))
                    .await?;
            }
            Ok(())
        })
    }

    fn list_teams(&self, session_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_teams(session_id).await.map_err(Into::into) })
    }

    fn save_scores(&self, scores: Vec<ScoreEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            for score in scores {
                let id = score_key(score.session_id, score.team_id, &score.target);
                store
                    .replace(SCORE_COLLECTION_NAME, id, MongoScoreDocument::from(score))
                    .await?;
            }
            Ok(())
        })
    }

    fn list_scores(&self, session_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_scores(session_id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
