use super::error::{CouchDaoError, CouchResult};

const BASE_URL_VAR: &str = "COUCH_BASE_URL";
const DATABASE_VAR: &str = "COUCH_DB";
const USERNAME_VAR: &str = "COUCH_USERNAME";
const PASSWORD_VAR: &str = "COUCH_PASSWORD";

/// Where the session documents live and how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouchConfig {
    /// Server root without trailing slash, e.g. `http://localhost:5984`.
    pub base_url: String,
    /// Database holding templates, sessions, calls, cards, teams and scores.
    pub database: String,
    /// Basic-auth credentials, only set when both halves are provided.
    pub credentials: Option<(String, String)>,
}

impl CouchConfig {
    /// Read `COUCH_BASE_URL`, `COUCH_DB` and the optional `COUCH_USERNAME` / `COUCH_PASSWORD`.
    pub fn from_env() -> CouchResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CouchResult<Self> {
        let setting = |var: &'static str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required =
            |var: &'static str| setting(var).ok_or(CouchDaoError::MissingEnvVar { var });

        Ok(Self {
            base_url: required(BASE_URL_VAR)?.trim_end_matches('/').to_string(),
            database: required(DATABASE_VAR)?,
            credentials: setting(USERNAME_VAR).zip(setting(PASSWORD_VAR)),
        })
    }
}
