//! Request and response bodies of the backend API that are not part of the
//! shared data model.

use super::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use shared::ChatTurn;
use std::path::{Path, PathBuf};
use tokio::fs::File;

#[derive(Debug, Clone, Serialize)]
pub struct CreateProjectRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagsUpdate<'a> {
    pub tags: &'a [String],
}

/// Acknowledgement returned when a background generation job is accepted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationAck {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub question: &'a str,
    pub chat_history: &'a [ChatTurn],
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

/// Bytes handed to the transport so far during an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub loaded: u64,
    pub total: u64,
}

impl UploadProgress {
    /// Rounded percentage, 0 when the total is unknown
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = (self.loaded as f64 / self.total as f64 * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }
}

/// A video file on disk, selected for upload
///
/// Only the metadata is kept; the contents are streamed from disk when the
/// upload runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFile {
    pub filename: String,
    pub mime: String,
    pub path: PathBuf,
    pub size: u64,
}

impl VideoFile {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let mime = mime_for(&filename).to_string();
        Self {
            filename,
            mime,
            path,
            size,
        }
    }

    /// Describe a file on disk
    pub async fn from_path(path: impl AsRef<Path>) -> ApiResult<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| file_error(path, e.to_string()))?;
        if !metadata.is_file() || path.file_name().is_none() {
            return Err(file_error(path, "not a file".to_string()));
        }
        Ok(Self::new(path, metadata.len()))
    }

    /// Open the file for streaming
    pub async fn open(&self) -> ApiResult<File> {
        File::open(&self.path)
            .await
            .map_err(|e| file_error(&self.path, e.to_string()))
    }

    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

fn file_error(path: &Path, reason: String) -> ApiError {
    ApiError::File {
        path: path.display().to_string(),
        reason,
    }
}

fn mime_for(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}
