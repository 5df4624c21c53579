use crate::app::AppState;
use axum::Json;
use axum::extract::State;
use camlink_core::ControlCommand;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn control_start(State(state): State<Arc<AppState>>) -> Json<Value> {
    send_command(&state, ControlCommand::Start, "Start command sent")
}

pub(crate) async fn control_stop(State(state): State<Arc<AppState>>) -> Json<Value> {
    send_command(&state, ControlCommand::Stop, "Stop command sent")
}

fn send_command(state: &AppState, command: ControlCommand, message: &str) -> Json<Value> {
    let cameras = state.router.broadcast_command(&command);
    info!("HTTP {} command delivered to {} camera(s)", command, cameras);

    Json(json!({
        "success": true,
        "message": message,
    }))
}
