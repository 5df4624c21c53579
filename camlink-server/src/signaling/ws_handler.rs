use crate::app::AppState;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use camlink_core::Role;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Catch-all handler: WebSocket upgrades pick their role from the path,
/// anything else is a 404.
pub async fn relay_socket(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(_) => return StatusCode::NOT_FOUND.into_response(),
    };

    match Role::from_path(uri.path()) {
        Some(role) => ws.on_upgrade(move |socket| handle_socket(socket, role, state)),
        None => {
            warn!("Rejecting WebSocket on unknown path {}", uri.path());
            ws.on_upgrade(reject_socket)
        }
    }
}

async fn reject_socket(mut socket: WebSocket) {
    let _ = socket.send(Message::Close(None)).await;
}

async fn handle_socket(socket: WebSocket, role: Role, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (id, mut rx) = state.registry.register(role);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let mut recv_task = tokio::spawn({
        let router = state.router.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                let payload = match msg {
                    Message::Text(text) => Bytes::copy_from_slice(text.as_str().as_bytes()),
                    Message::Binary(data) => data,
                    Message::Close(frame) => {
                        debug!("{} {} sent close: {:?}", role, id, frame);
                        break;
                    }
                    _ => continue,
                };
                router.route(id, role, payload);
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    state.registry.unregister(id, role);
    info!(
        "Connections: {} cameras, {} viewers",
        state.registry.count(Role::Camera),
        state.registry.count(Role::Viewer)
    );
}
