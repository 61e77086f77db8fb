//! DJ Games Back binary entrypoint wiring REST, SSE and the storage supervisor.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dj_games_back::{
    config::AppConfig,
    dao::{
        session_store::{MemorySessionStore, SessionStore},
        storage::StorageError,
    },
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};

/// Storage implementation selected with `STORAGE_BACKEND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StorageBackend {
    #[cfg(feature = "mongo-store")]
    Mongo,
    #[cfg(feature = "couch-store")]
    Couch,
    Memory,
}

impl StorageBackend {
    fn from_env() -> Self {
        let requested = env::var("STORAGE_BACKEND").ok();
        match requested.as_deref().map(str::trim) {
            #[cfg(feature = "mongo-store")]
            Some("mongo") | Some("mongodb") => Self::Mongo,
            #[cfg(feature = "couch-store")]
            Some("couch") | Some("couchdb") => Self::Couch,
            Some("memory") => Self::Memory,
            None => Self::default_backend(),
            Some(other) => {
                let fallback = Self::default_backend();
                warn!(requested = other, ?fallback, "unknown or disabled storage backend");
                fallback
            }
        }
    }

    #[allow(unreachable_code)]
    fn default_backend() -> Self {
        #[cfg(feature = "mongo-store")]
        return Self::Mongo;
        #[cfg(feature = "couch-store")]
        return Self::Couch;
        Self::Memory
    }
}

async fn connect_backend(
    backend: StorageBackend,
) -> Result<Arc<dyn SessionStore>, StorageError> {
    match backend {
        #[cfg(feature = "mongo-store")]
        StorageBackend::Mongo => {
            use dj_games_back::dao::session_store::mongodb::{MongoConfig, MongoSessionStore};

            let config = MongoConfig::from_env().await?;
            let store = MongoSessionStore::connect(config).await?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "couch-store")]
        StorageBackend::Couch => {
            use dj_games_back::dao::session_store::couchdb::{CouchConfig, CouchSessionStore};

            let config = CouchConfig::from_env()?;
            let store = CouchSessionStore::connect(config).await?;
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => Ok(Arc::new(MemorySessionStore::new())),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_state = AppState::new(AppConfig::load());

    let backend = StorageBackend::from_env();
    info!(?backend, "starting storage supervisor");
    tokio::spawn(storage_supervisor::run(app_state.clone(), move || {
        connect_backend(backend)
    }));

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
