use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::from_value;
use uuid::Uuid;

use crate::dao::{
    models::{CallEntity, CardEntity, ScoreEntity, SessionEntity, TeamEntity, TemplateEntity},
    session_store::SessionStore,
    storage::{StorageError, StorageResult},
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult, DatabaseAction},
    models::{
        AllDocsResponse, CallBody, CardBody, CouchDocument, DocKind, END_SUFFIX, ScoreBody,
        SessionBody, TeamBody, TemplateBody, entity_doc_id, owned_doc_id, owned_prefix,
    },
};

/// [`SessionStore`] persisting rows as CouchDB documents in a single database.
#[derive(Clone)]
pub struct CouchSessionStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchSessionStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url);
        let database = Arc::<str>::from(config.database);
        let auth = config
            .credentials
            .map(|(user, pass)| (Arc::<str>::from(user), Arc::<str>::from(pass)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some((ref user, ref pass)) = self.auth {
            builder.basic_auth(user.as_ref(), Some(pass.as_ref()))
        } else {
            builder
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.database, path);
        self.authorized(self.client.request(method, url))
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url();

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::Database {
                database: database.clone(),
                action: DatabaseAction::Probe,
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorized(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::Database {
                        database: database.clone(),
                        action: DatabaseAction::Create,
                        source,
                    })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        action: DatabaseAction::Create,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                action: DatabaseAction::Probe,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<()>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: response.status(),
            })
        }
    }

    /// Write a document, carrying over the current revision so CouchDB accepts the update.
    async fn upsert<B>(&self, mut document: CouchDocument<B>) -> CouchResult<()>
    where
        B: Serialize + DeserializeOwned,
    {
        if let Some(existing) = self
            .get_document::<CouchDocument<serde_json::Value>>(&document.id)
            .await?
        {
            document.rev = existing.rev;
        }
        self.put_document(&document.id, &document).await
    }

    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        const ALL_DOCS: &str = "_all_docs";
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        let mut documents = Vec::new();
        for row in payload.rows {
            if let Some(doc) = row.doc {
                let parsed = from_value(doc).map_err(|source| CouchDaoError::DeserializeValue {
                    path: row.id.clone(),
                    source,
                })?;
                documents.push(parsed);
            }
        }

        Ok(documents)
    }

    /// Upsert a batch one document at a time; CouchDB has no multi-document transaction anyway.
    async fn upsert_all<E, B>(&self, entities: Vec<E>) -> CouchResult<()>
    where
        E: Into<CouchDocument<B>>,
        B: Serialize + DeserializeOwned,
    {
        for entity in entities {
            self.upsert(entity.into()).await?;
        }
        Ok(())
    }

    /// Every document of `kind` owned by a session, in id order.
    async fn list_owned<B, E>(&self, kind: DocKind, session_id: Uuid) -> CouchResult<Vec<E>>
    where
        B: DeserializeOwned,
        E: TryFrom<CouchDocument<B>, Error = CouchDaoError>,
    {
        self.list_documents::<CouchDocument<B>>(&owned_prefix(kind, session_id))
            .await?
            .into_iter()
            .map(E::try_from)
            .collect()
    }
}

impl SessionStore for CouchSessionStore {
    fn save_template(&self, template: TemplateEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let doc: CouchDocument<TemplateBody> = template.into();
            store.upsert(doc).await.map_err(Into::into)
        })
    }

    fn find_template(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TemplateEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc = store
                .get_document::<CouchDocument<TemplateBody>>(&entity_doc_id(DocKind::Template, id))
                .await?;
            doc.map(TemplateEntity::try_from)
                .transpose()
                .map_err(StorageError::from)
        })
    }

    fn list_templates(&self) -> BoxFuture<'static, StorageResult<Vec<TemplateEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store
                .list_documents::<CouchDocument<TemplateBody>>(DocKind::Template.prefix())
                .await?;
            let mut templates = docs
                .into_iter()
                .map(TemplateEntity::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            templates.sort_by_key(|template| template.created_at);
            Ok(templates)
        })
    }

    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let doc: CouchDocument<SessionBody> = session.into();
            store.upsert(doc).await.map_err(Into::into)
        })
    }

    fn find_session(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let doc = store
                .get_document::<CouchDocument<SessionBody>>(&entity_doc_id(DocKind::Session, id))
                .await?;
            doc.map(SessionEntity::try_from)
                .transpose()
                .map_err(StorageError::from)
        })
    }

    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let docs = store
                .list_documents::<CouchDocument<SessionBody>>(DocKind::Session.prefix())
                .await?;
            let mut sessions = docs
                .into_iter()
                .map(SessionEntity::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            sessions.sort_by_key(|session| session.created_at);
            Ok(sessions)
        })
    }

    fn save_calls(&self, calls: Vec<CallEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .upsert_all::<_, CallBody>(calls)
                .await
                .map_err(Into::into)
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
            let doc_id = owned_doc_id(DocKind::Call, session_id, call_index);
            let doc = store
                .get_document::<CouchDocument<CallBody>>(&doc_id)
                .await?;
            doc.map(CallEntity::try_from)
                .transpose()
                .map_err(StorageError::from)
        })
    }

    fn list_calls(&self, session_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<CallEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_owned::<CallBody, CallEntity>(DocKind::Call, session_id)
                .await
                .map_err(Into::into)
        })
    }

    fn save_cards(&self, cards: Vec<CardEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .upsert_all::<_, CardBody>(cards)
                .await
                .map_err(Into::into)
        })
    }

    fn list_cards(&self, session_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<CardEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_owned::<CardBody, CardEntity>(DocKind::Card, session_id)
                .await
                .map_err(Into::into)
        })
    }

    fn save_teams(&self, teams: Vec<TeamEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .upsert_all::<_, TeamBody>(teams)
                .await
                .map_err(Into::into)
        })
    }

    fn list_teams(&self, session_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_owned::<TeamBody, TeamEntity>(DocKind::Team, session_id)
                .await
                .map_err(Into::into)
        })
    }

    fn save_scores(&self, scores: Vec<ScoreEntity>) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .upsert_all::<_, ScoreBody>(scores)
                .await
                .map_err(Into::into)
        })
    }

    fn list_scores(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_owned::<ScoreBody, ScoreEntity>(DocKind::Score, session_id)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = store.database_url();
            let response = store
                .authorized(store.client.get(&url))
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
