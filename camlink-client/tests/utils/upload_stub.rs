use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use tokio::task::JoinHandle;

#[derive(Clone)]
struct StubState {
    fail_first: usize,
    calls: Arc<AtomicUsize>,
}

/// Upload endpoint answering 500 for the first `fail_first` requests.
pub struct UploadStub {
    pub addr: SocketAddr,
    pub calls: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl UploadStub {
    pub async fn start(fail_first: usize) -> anyhow::Result<Self> {
        let calls = Arc::new(AtomicUsize::new(0));
        let state = StubState {
            fail_first,
            calls: calls.clone(),
        };

        let app = Router::new()
            .route("/upload", post(handle_upload))
            .route("/upload/plain", post(handle_plain_upload))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            calls,
            handle,
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}/upload", self.addr)
    }

    /// Same counting, but a 200 with a plain-text body.
    pub fn plain_url(&self) -> String {
        format!("http://{}/upload/plain", self.addr)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Drop for UploadStub {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_upload(State(state): State<StubState>, body: Bytes) -> Response {
    let call = state.calls.fetch_add(1, Ordering::SeqCst) + 1;

    if call <= state.fail_first {
        return (StatusCode::INTERNAL_SERVER_ERROR, "try again").into_response();
    }

    axum::Json(serde_json::json!({
        "success": true,
        "filename": format!("stub_{call}.mov"),
        "size": body.len(),
    }))
    .into_response()
}

async fn handle_plain_upload(State(state): State<StubState>, _body: Bytes) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);
    (StatusCode::OK, "stored").into_response()
}
