use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State as AxumState;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::controller::{ControllerError, ControllerHandle};
use crate::messages::{InboundMessage, OutboundEvent, OutboundResponse};

#[derive(Clone)]
pub struct AppState {
    pub controller: ControllerHandle,
    pub broadcaster: broadcast::Sender<OutboundEvent>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    AxumState(state): AxumState<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let mut broadcast_rx = state.broadcaster.subscribe();

    let write_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    // New clients start from the current snapshot.
    if let Ok(payload) = state.controller.snapshot().await {
        send_json(&tx, &OutboundEvent::State { payload });
    }

    let broadcast_task = {
        let tx = tx.clone();
        tokio::spawn(async move {
            loop {
                match broadcast_rx.recv().await {
                    Ok(event) => send_json(&tx, &event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "client lagging, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    };

    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<InboundMessage>(&text) {
                Ok(inbound) => handle_inbound(inbound, &state, &tx).await,
                Err(err) => {
                    warn!(?err, "invalid inbound message");
                    send_json(
                        &tx,
                        &OutboundResponse::Error {
                            request_id: None,
                            code: "INVALID_MESSAGE".to_string(),
                            message: err.to_string(),
                        },
                    );
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    debug!("client disconnected");
    write_task.abort();
    broadcast_task.abort();
}

async fn handle_inbound(
    inbound: InboundMessage,
    state: &AppState,
    tx: &mpsc::UnboundedSender<Message>,
) {
    let (request_id, action) = inbound.into_parts();
    let response = match state.controller.apply(action).await {
        Ok(_) => OutboundResponse::Ack { request_id },
        Err(err) => error_response(request_id, err),
    };
    send_json(tx, &response);
}

fn error_response(request_id: Option<String>, err: ControllerError) -> OutboundResponse {
    OutboundResponse::Error {
        request_id,
        code: err.code().to_string(),
        message: err.to_string(),
    }
}

fn send_json<T: serde::Serialize>(tx: &mpsc::UnboundedSender<Message>, value: &T) {
    if let Ok(payload) = serde_json::to_string(value) {
        let _ = tx.send(Message::Text(payload));
    }
}
