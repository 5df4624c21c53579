use crate::app::AppState;
use crate::error::ApiError;
use crate::storage::StoredVideo;
use axum::Json;
use axum::extract::{Multipart, State};
use serde::Serialize;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

const VIDEO_FIELD: &str = "video";

#[derive(Debug, Serialize)]
pub(crate) struct UploadResponse {
    success: bool,
    filename: String,
    size: u64,
    path: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct VideoList {
    success: bool,
    videos: Vec<StoredVideo>,
}

pub(crate) async fn upload_video(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        let (filename, mut file) = state.store.create(field.file_name()).await?;
        let mut size = 0u64;

        let written = async {
            while let Some(chunk) = field.chunk().await? {
                file.write_all(&chunk).await?;
                size += chunk.len() as u64;
            }
            file.flush().await?;
            Ok::<(), ApiError>(())
        }
        .await;

        if let Err(e) = written {
            warn!("Upload of {} failed: {}", filename, e);
            drop(file);
            let _ = state.store.remove(&filename).await;
            return Err(e);
        }

        info!("Stored upload {} ({} bytes)", filename, size);
        return Ok(Json(UploadResponse {
            success: true,
            path: format!("/uploads/{filename}"),
            filename,
            size,
        }));
    }

    Err(ApiError::BadRequest("No file uploaded".to_owned()))
}

pub(crate) async fn list_videos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<VideoList>, ApiError> {
    let videos = state.store.list().await?;
    Ok(Json(VideoList {
        success: true,
        videos,
    }))
}
