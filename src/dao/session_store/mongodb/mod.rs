mod config;
mod connection;
mod error;
mod models;
mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoSessionStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::Corrupted { collection, id, reason } => {
                StorageError::corrupted(format!("{collection}/{id}"), reason)
            }
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
