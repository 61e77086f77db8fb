pub mod cards;
pub mod clock;
pub mod game;
pub mod pull_list;
pub mod scoring;
mod sse;
pub mod state_machine;

use std::{future::Future, sync::Arc};

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::session_store::SessionStore,
    dto::sse::{ServerEvent, SystemStatus},
    error::ServiceError,
};

pub use self::sse::SseHub;

/// Shared handle passed to every handler and service.
pub type SharedState = Arc<AppState>;

const EVENT_SYSTEM_STATUS: &str = "system.status";
const PUBLIC_SSE_CAPACITY: usize = 64;

/// Central application state storing the storage handle, SSE hub and mutation gates.
pub struct AppState {
    session_store: RwLock<Option<Arc<dyn SessionStore>>>,
    sse: SseHub,
    config: Arc<AppConfig>,
    degraded: watch::Sender<bool>,
    session_gates: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            session_store: RwLock::new(None),
            sse: SseHub::new(PUBLIC_SSE_CAPACITY),
            config: Arc::new(config),
            degraded: degraded_tx,
            session_gates: DashMap::new(),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn session_store(&self) -> Option<Arc<dyn SessionStore>> {
        let guard = self.session_store.read().await;
        guard.as_ref().cloned()
    }

    /// Store handle for storage-backed operations; fails while degraded.
    pub async fn require_session_store(&self) -> Result<Arc<dyn SessionStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.session_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn set_session_store(&self, store: Arc<dyn SessionStore>) {
        {
            let mut guard = self.session_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag, notifying watchers and SSE clients when it changes.
    pub fn update_degraded(&self, value: bool) {
        let changed = self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
        if !changed {
            return;
        }

        match ServerEvent::json(
            Some(EVENT_SYSTEM_STATUS.to_string()),
            &SystemStatus { degraded: value },
        ) {
            Ok(event) => self.sse.broadcast(event),
            Err(err) => warn!(error = %err, "failed to serialize system status event"),
        }
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    fn session_gate(&self, session_id: Uuid) -> Arc<Mutex<()>> {
        self.session_gates
            .entry(session_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Forget the gate of a session once no transition holds or waits on it.
    fn release_session_gate(&self, session_id: Uuid) {
        self.session_gates
            .remove_if(&session_id, |_, gate| Arc::strong_count(gate) == 1);
    }

    #[cfg(test)]
    pub(crate) fn tracked_session_gates(&self) -> usize {
        self.session_gates.len()
    }

    /// Run a read-modify-write on one session, serialized with every other mutation of
    /// that session in this process and bounded by the configured timeout.
    pub async fn run_session_transition<F, Fut, T>(
        &self,
        session_id: Uuid,
        work: F,
    ) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let gate = self.session_gate(session_id);
        let limit = self.config.transition_timeout;

        let outcome = timeout(limit, async {
            let _guard = gate.lock().await;
            work().await
        })
        .await;

        drop(gate);
        self.release_session_gate(session_id);

        match outcome {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                warn!(%session_id, timeout_ms, "session transition timed out");
                Err(ServiceError::Timeout)
            }
        }
    }
}
