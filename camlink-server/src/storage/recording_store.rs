use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};

/// A finished recording on disk.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StoredVideo {
    pub filename: String,
    pub size: u64,
    pub created: DateTime<Utc>,
}

/// Directory of uploaded recordings.
#[derive(Debug, Clone)]
pub struct RecordingStore {
    dir: PathBuf,
    extensions: Vec<String>,
}

impl RecordingStore {
    pub fn new(dir: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            dir: dir.into(),
            extensions: extensions.into_iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Creates a fresh `video_<epoch ms><ext>` file, keeping the client's
    /// extension when it is a plain alphanumeric one.
    pub async fn create(&self, original_name: Option<&str>) -> io::Result<(String, File)> {
        self.ensure_dir().await?;

        let ext = original_name.and_then(safe_extension);
        let stamp = Utc::now().timestamp_millis();

        for attempt in 0u32..100 {
            let filename = match (&ext, attempt) {
                (Some(ext), 0) => format!("video_{stamp}.{ext}"),
                (None, 0) => format!("video_{stamp}"),
                (Some(ext), n) => format!("video_{stamp}_{n}.{ext}"),
                (None, n) => format!("video_{stamp}_{n}"),
            };

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.dir.join(&filename))
                .await
            {
                Ok(file) => return Ok((filename, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "could not allocate a recording name",
        ))
    }

    pub async fn remove(&self, filename: &str) -> io::Result<()> {
        fs::remove_file(self.dir.join(filename)).await
    }

    /// Stored recordings, newest first.
    pub async fn list(&self) -> io::Result<Vec<StoredVideo>> {
        let mut videos = Vec::new();

        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(videos),
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            let filename = entry.file_name().to_string_lossy().into_owned();
            if !self.is_recording(&filename) {
                continue;
            }

            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }

            let created = meta.created().or_else(|_| meta.modified())?;
            videos.push(StoredVideo {
                filename,
                size: meta.len(),
                created: created.into(),
            });
        }

        videos.sort_by(|a, b| {
            b.created
                .cmp(&a.created)
                .then_with(|| b.filename.cmp(&a.filename))
        });
        Ok(videos)
    }

    fn is_recording(&self, filename: &str) -> bool {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}

fn safe_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_owned())
}
