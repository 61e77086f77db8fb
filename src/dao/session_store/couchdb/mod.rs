mod config;
mod error;
mod models;
mod store;

pub use config::CouchConfig;
pub use error::CouchDaoError;
pub use store::CouchSessionStore;

use crate::dao::storage::StorageError;

impl From<CouchDaoError> for StorageError {
    fn from(err: CouchDaoError) -> Self {
        match err {
            CouchDaoError::InvalidDocId {
                doc_id,
                kind,
                problem,
            } => StorageError::corrupted(doc_id, format!("{kind} document: {problem}")),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
