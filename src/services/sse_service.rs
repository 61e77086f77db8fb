use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::{
    dto::sse::{Handshake, ServerEvent},
    state::SharedState,
};

const EVENT_HANDSHAKE: &str = "handshake";
const PUBLIC_STREAM: &str = "public";

/// Subscribe to the shared public SSE stream.
pub fn subscribe_public(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.public_sse().subscribe()
}

/// Handshake sent only to the connecting client, before any broadcast event.
pub fn public_handshake(state: &SharedState) -> Option<ServerEvent> {
    let payload = Handshake {
        stream: PUBLIC_STREAM.to_string(),
        message: "public stream connected".to_string(),
        degraded: state.is_degraded(),
    };
    match ServerEvent::json(Some(EVENT_HANDSHAKE.to_string()), &payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(error = %err, "failed to serialize SSE handshake");
            None
        }
    }
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

/// Convert a broadcast receiver into an SSE response, forwarding events until
/// the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    first: Option<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if let Some(first) = first {
            if tx.send(Ok(to_event(first))).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "public SSE subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }

        info!("Public SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::AppState};

    #[test]
    fn handshake_reports_degraded_flag() {
        let state = AppState::new(AppConfig::default());
        let event = public_handshake(&state).unwrap();
        assert_eq!(event.event.as_deref(), Some("handshake"));
        let payload: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(payload["stream"], "public");
        assert_eq!(payload["degraded"], true);
    }
}
