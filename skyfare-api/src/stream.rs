//! Push transports: WebSocket and SSE.
//!
//! Both subscribe directly to the result channel and replay the same
//! progress state machine; only the delivery mechanics differ. The
//! subscription handle is owned by the connection task, so it is dropped —
//! and the bus listener torn down — on every exit path.

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::{
        sse::{Event, KeepAlive, Sse},
        Response,
    },
};
use futures_util::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use skyfare_core::progress::{self, StreamTracker};
use skyfare_search::keys;
use skyfare_shared::{FrameKind, ProgressFrame, ResultEvent};
use skyfare_store::app_config::SearchRules;
use skyfare_store::Subscription;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct StreamParams {
    #[serde(default)]
    pub query_id: String,
}

fn event_name(kind: FrameKind) -> &'static str {
    match kind {
        FrameKind::Result => "flight",
        FrameKind::Progress => "progress",
        FrameKind::Completed => "completed",
        FrameKind::Cancelled => "cancelled",
        FrameKind::Timeout => "timeout",
    }
}

// ============================================================================
// WebSocket
// ============================================================================

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<StreamParams>,
) -> Result<Response, AppError> {
    if params.query_id.is_empty() {
        return Err(AppError::BadRequest("query_id is required".to_string()));
    }

    // Subscribe before upgrading; a failed handshake still drops the
    // subscription.
    let subscription = state
        .store
        .subscribe(&keys::result_channel(&params.query_id))
        .await?;
    let rules = state.rules.clone();

    Ok(ws.on_upgrade(move |socket| run_socket(socket, subscription, rules)))
}

async fn run_socket(mut socket: WebSocket, mut subscription: Subscription, rules: SearchRules) {
    let mut tracker = StreamTracker::new(rules.expected_flights);
    let deadline = Instant::now() + rules.stream_ceiling();

    if send_frame(&mut socket, &progress::initial_frame())
        .await
        .is_err()
    {
        return;
    }

    loop {
        match timeout_at(deadline, subscription.recv()).await {
            // Connection lifetime ceiling, independent of the search.
            Err(_) => {
                let frame =
                    progress::stream_timeout_frame(tracker.received(), tracker.expected());
                let _ = send_frame(&mut socket, &frame).await;
                break;
            }
            Ok(None) => break,
            Ok(Some(payload)) => {
                let event = match serde_json::from_str::<ResultEvent>(&payload) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("Failed to parse flight data: {}", e);
                        continue;
                    }
                };

                let frame = tracker.observe(&event);
                if send_frame(&mut socket, &frame).await.is_err() {
                    debug!("WebSocket write failed, closing");
                    break;
                }
                if frame.status.is_terminal() {
                    break;
                }
            }
        }
    }
    // Dropping the subscription here unsubscribes from the bus.
}

async fn send_frame(socket: &mut WebSocket, frame: &ProgressFrame) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(frame).map_err(axum::Error::new)?;
    socket.send(Message::Text(payload.into())).await
}

// ============================================================================
// Server-Sent Events
// ============================================================================

enum SseState {
    Live {
        subscription: Subscription,
        tracker: StreamTracker,
        deadline: Instant,
    },
    Closed,
}

pub async fn sse_handler(
    State(state): State<AppState>,
    Query(params): Query<StreamParams>,
) -> Result<Sse<impl Stream<Item = Result<Event, anyhow::Error>>>, AppError> {
    if params.query_id.is_empty() {
        return Err(AppError::BadRequest("query_id is required".to_string()));
    }

    let subscription = state
        .store
        .subscribe(&keys::result_channel(&params.query_id))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Failed to subscribe: {}", e)))?;

    let tracker = StreamTracker::new(state.rules.expected_flights);
    let deadline = Instant::now() + state.rules.stream_ceiling();

    let initial = stream::once(async {
        Event::default()
            .event("progress")
            .json_data(progress::initial_frame())
            .map_err(Into::into)
    });

    let frames = stream::unfold(
        SseState::Live {
            subscription,
            tracker,
            deadline,
        },
        |sse_state| async move {
            match sse_state {
                SseState::Closed => None,
                SseState::Live {
                    mut subscription,
                    mut tracker,
                    deadline,
                } => loop {
                    match timeout_at(deadline, subscription.recv()).await {
                        Err(_) => {
                            let frame = progress::stream_timeout_frame(
                                tracker.received(),
                                tracker.expected(),
                            );
                            let event = Event::default()
                                .event("timeout")
                                .json_data(&frame)
                                .map_err(Into::into);
                            return Some((event, SseState::Closed));
                        }
                        Ok(None) => return None,
                        Ok(Some(payload)) => {
                            let event = match serde_json::from_str::<ResultEvent>(&payload) {
                                Ok(event) => event,
                                Err(e) => {
                                    warn!("Failed to parse flight data: {}", e);
                                    continue;
                                }
                            };

                            let frame = tracker.observe(&event);
                            let terminal = frame.status.is_terminal();
                            let sse_event = Event::default()
                                .event(event_name(frame.kind))
                                .json_data(&frame)
                                .map_err(Into::into);
                            let next = if terminal {
                                SseState::Closed
                            } else {
                                SseState::Live {
                                    subscription,
                                    tracker,
                                    deadline,
                                }
                            };
                            return Some((sse_event, next));
                        }
                    }
                },
            }
        },
    );

    // Keepalive comments stop intermediaries from timing the stream out.
    Ok(Sse::new(initial.chain(frames)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("keepalive"),
    ))
}
