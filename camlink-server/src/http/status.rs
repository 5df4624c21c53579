use crate::app::AppState;
use axum::Json;
use axum::extract::State;
use camlink_core::Role;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub(crate) struct RelayStatus {
    cameras: usize,
    viewers: usize,
    timestamp: i64,
}

pub(crate) async fn relay_status(State(state): State<Arc<AppState>>) -> Json<RelayStatus> {
    Json(RelayStatus {
        cameras: state.registry.count(Role::Camera),
        viewers: state.registry.count(Role::Viewer),
        timestamp: Utc::now().timestamp_millis(),
    })
}
