use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use tokio::task::JoinHandle;

#[derive(Clone)]
struct RestartState {
    close_codes: Arc<Vec<u16>>,
    connections: Arc<AtomicUsize>,
}

/// Camera endpoint that closes the n-th connection with `close_codes[n]`
/// right after the camera announces itself, then keeps later ones open.
pub struct RestartingRelay {
    pub addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl RestartingRelay {
    pub async fn start(close_codes: Vec<u16>) -> anyhow::Result<Self> {
        let connections = Arc::new(AtomicUsize::new(0));
        let state = RestartState {
            close_codes: Arc::new(close_codes),
            connections: connections.clone(),
        };

        let app = Router::new()
            .route("/camera", get(handle_camera))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            connections,
            handle,
        })
    }

    pub fn camera_url(&self) -> String {
        format!("ws://{}/camera", self.addr)
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

impl Drop for RestartingRelay {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_camera(ws: WebSocketUpgrade, State(state): State<RestartState>) -> Response {
    ws.on_upgrade(move |socket| serve_camera(socket, state))
}

async fn serve_camera(mut socket: WebSocket, state: RestartState) {
    let index = state.connections.fetch_add(1, Ordering::SeqCst);

    // The camera's `waiting` status.
    if !matches!(socket.recv().await, Some(Ok(Message::Text(_)))) {
        return;
    }

    if let Some(&code) = state.close_codes.get(index) {
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code,
                reason: Utf8Bytes::from_static("restarting"),
            })))
            .await;
        return;
    }

    while let Some(Ok(_)) = socket.recv().await {}
}
