//! Failures of the CouchDB backend.

use reqwest::StatusCode;
use thiserror::Error;

use super::models::DocKind;

/// Result alias for CouchDB operations.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// What went wrong while talking to CouchDB or reading its documents.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// A required connection setting is absent from the environment.
    #[error("missing CouchDB setting `{var}`")]
    MissingEnvVar { var: &'static str },
    /// The HTTP client could not be built.
    #[error("failed to build CouchDB client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// Probing or creating the database could not be sent.
    #[error("failed to {action} CouchDB database `{database}`")]
    Database {
        database: String,
        action: DatabaseAction,
        #[source]
        source: reqwest::Error,
    },
    /// Probing or creating the database was answered with an unexpected status.
    #[error("CouchDB answered {status} when asked to {action} database `{database}`")]
    DatabaseStatus {
        database: String,
        action: DatabaseAction,
        status: StatusCode,
    },
    /// A document request could not be sent.
    #[error("failed to send CouchDB request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// A document request was answered with an unexpected status.
    #[error("CouchDB answered {status} for `{path}`")]
    RequestStatus { path: String, status: StatusCode },
    /// The response body was not valid JSON.
    #[error("failed to decode CouchDB response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// A document did not match the expected shape.
    #[error("document `{path}` does not match its model")]
    DeserializeValue {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// A document id does not follow the `<kind>::<session>[:<number>]` layout or disagrees
    /// with the document body.
    #[error("invalid {kind} document id `{doc_id}`: {problem}")]
    InvalidDocId {
        doc_id: String,
        kind: DocKind,
        problem: DocIdProblem,
    },
}

/// Database-level operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseAction {
    /// `GET /{db}`.
    Probe,
    /// `PUT /{db}`.
    Create,
}

impl std::fmt::Display for DatabaseAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DatabaseAction::Probe => "probe",
            DatabaseAction::Create => "create",
        })
    }
}

/// Part of a document id that could not be read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DocIdProblem {
    /// The id does not start with the prefix of its document kind.
    #[error("unexpected prefix")]
    WrongPrefix,
    /// The session segment is not a UUID.
    #[error("session segment is not a UUID")]
    InvalidSession,
    /// The call, card or team number segment is missing or not numeric.
    #[error("number segment is missing or not numeric")]
    InvalidNumber,
    /// The id names another session or number than the body it wraps.
    #[error("id disagrees with the document body")]
    BodyMismatch,
}
