//! Video-processing backend client.
//!
//! [`VideoApi`] is the seam between the console and the backend: the
//! controller and views receive it as an explicit `Arc<dyn VideoApi>`
//! dependency, and [`VideoServiceClient`] implements it over HTTP.

pub mod client;
pub mod error;
pub mod types;

pub use client::VideoServiceClient;
pub use error::{ApiError, ApiResult};
pub use types::*;

use async_trait::async_trait;
use shared::{ChatTurn, Project, PublicVideoData, Video, VideoListing};
use tokio::sync::mpsc::UnboundedSender;

/// Operations offered by the video-processing backend.
///
/// Each operation issues one request and resolves to a single result or a
/// normalized [`ApiError`]. Retry policy belongs to callers.
#[async_trait]
pub trait VideoApi: Send + Sync {
    async fn create_project(&self, name: &str) -> ApiResult<Project>;

    async fn list_projects(&self) -> ApiResult<Vec<Project>>;

    async fn get_project(&self, project_id: i64) -> ApiResult<Project>;

    /// Upload a video; progress is reported on `progress` while the body is
    /// streamed, and the created video is returned once the server answers.
    async fn upload_video(
        &self,
        project_id: i64,
        file: VideoFile,
        progress: Option<UnboundedSender<UploadProgress>>,
    ) -> ApiResult<Video>;

    async fn get_video_status(&self, video_id: i64) -> ApiResult<Video>;

    async fn list_videos(&self) -> ApiResult<Vec<VideoListing>>;

    async fn generate_mindmap(&self, video_id: i64) -> ApiResult<GenerationAck>;

    async fn generate_quiz(&self, video_id: i64) -> ApiResult<GenerationAck>;

    async fn delete_video(&self, project_id: i64, video_id: i64) -> ApiResult<()>;

    /// Replace the tag set of a video
    async fn update_tags(&self, video_id: i64, tags: &[String]) -> ApiResult<Video>;

    async fn publish_video(&self, video_id: i64) -> ApiResult<Video>;

    async fn unpublish_video(&self, video_id: i64) -> ApiResult<Video>;

    async fn get_public_video(&self, slug: &str) -> ApiResult<PublicVideoData>;

    /// Ask a question about a public video; `history` is sent as-is
    async fn chat(&self, slug: &str, question: &str, history: &[ChatTurn]) -> ApiResult<String>;
}
