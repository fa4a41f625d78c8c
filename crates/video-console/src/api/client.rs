//! Video-processing backend client over HTTP.

use super::error::{ApiError, ApiResult};
use super::types::*;
use super::VideoApi;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::config::ApiConfig;
use shared::{ChatTurn, Project, PublicVideoData, Video, VideoListing};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::codec::{BytesCodec, FramedRead};
use tracing::{debug, info, warn};

/// Backend client
///
/// Each call issues exactly one request; there are no retries. Requests are
/// bounded by the configured timeout, after which they fail as connection
/// errors.
#[derive(Debug, Clone)]
pub struct VideoServiceClient {
    /// HTTP client
    client: Client,
    /// Base URL of the backend, without trailing slash
    base_url: String,
}

impl VideoServiceClient {
    /// Create a new backend client
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from the `[api]` config section
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.request_timeout_seconds),
            &config.user_agent,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Send a request and map transport and status failures
    async fn execute(&self, request: RequestBuilder, endpoint: &str) -> ApiResult<Response> {
        debug!(endpoint = %endpoint, "Making API request");

        let response = request.send().await.map_err(|e| {
            warn!(endpoint = %endpoint, error = %e, "Request error");
            ApiError::from_transport(&e)
        })?;

        let status = response.status();
        if status.is_success() {
            debug!(endpoint = %endpoint, status = %status, "Request successful");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(
            endpoint = %endpoint,
            status = %status,
            body = %body,
            "Request failed"
        );
        Err(ApiError::from_response(status, &body))
    }

    /// Send a request and decode its JSON body
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, endpoint: &str) -> ApiResult<T> {
        let response = self.execute(request, endpoint).await?;
        response.json::<T>().await.map_err(|e| {
            warn!(endpoint = %endpoint, error = %e, "Failed to parse response");
            ApiError::Decode(e.to_string())
        })
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        self.send(self.client.get(self.url(endpoint)), endpoint).await
    }

    async fn post_empty<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        let request = self
            .client
            .post(self.url(endpoint))
            .json(&serde_json::json!({}));
        self.send(request, endpoint).await
    }
}

#[async_trait]
impl VideoApi for VideoServiceClient {
    async fn create_project(&self, name: &str) -> ApiResult<Project> {
        info!(name = %name, "Creating project");
        let endpoint = "/projects/";
        let request = self
            .client
            .post(self.url(endpoint))
            .json(&CreateProjectRequest { name });
        self.send(request, endpoint).await
    }

    async fn list_projects(&self) -> ApiResult<Vec<Project>> {
        self.get("/projects/").await
    }

    async fn get_project(&self, project_id: i64) -> ApiResult<Project> {
        self.get(&format!("/projects/{}", project_id)).await
    }

    async fn upload_video(
        &self,
        project_id: i64,
        file: VideoFile,
        progress: Option<UnboundedSender<UploadProgress>>,
    ) -> ApiResult<Video> {
        let endpoint = format!("/projects/{}/upload_video/", project_id);
        let total = file.len();
        info!(
            project_id = project_id,
            filename = %file.filename,
            size_bytes = total,
            "Uploading video"
        );

        let source = file.open().await?;
        let mut loaded = 0u64;
        let body = FramedRead::new(source, BytesCodec::new()).inspect_ok(move |chunk| {
            loaded += chunk.len() as u64;
            if let Some(tx) = &progress {
                // The receiver may have gone away; progress is best effort.
                let _ = tx.send(UploadProgress { loaded, total });
            }
        });

        let part = Part::stream_with_length(Body::wrap_stream(body), total)
            .file_name(file.filename.clone())
            .mime_str(&file.mime)
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let form = Form::new().part("file", part);

        let request = self.client.post(self.url(&endpoint)).multipart(form);
        self.send(request, &endpoint).await
    }

    async fn get_video_status(&self, video_id: i64) -> ApiResult<Video> {
        self.get(&format!("/videos/{}/status", video_id)).await
    }

    async fn list_videos(&self) -> ApiResult<Vec<VideoListing>> {
        self.get("/videos/").await
    }

    async fn generate_mindmap(&self, video_id: i64) -> ApiResult<GenerationAck> {
        info!(video_id = video_id, "Requesting mind-map generation");
        self.post_empty(&format!("/videos/{}/generate-mindmap", video_id))
            .await
    }

    async fn generate_quiz(&self, video_id: i64) -> ApiResult<GenerationAck> {
        info!(video_id = video_id, "Requesting quiz generation");
        self.post_empty(&format!("/videos/{}/generate-quiz", video_id))
            .await
    }

    async fn delete_video(&self, project_id: i64, video_id: i64) -> ApiResult<()> {
        info!(project_id = project_id, video_id = video_id, "Deleting video");
        let endpoint = format!("/projects/{}/videos/{}", project_id, video_id);
        self.execute(self.client.delete(self.url(&endpoint)), &endpoint)
            .await?;
        Ok(())
    }

    async fn update_tags(&self, video_id: i64, tags: &[String]) -> ApiResult<Video> {
        let endpoint = format!("/videos/{}/tags", video_id);
        let request = self
            .client
            .put(self.url(&endpoint))
            .json(&TagsUpdate { tags });
        self.send(request, &endpoint).await
    }

    async fn publish_video(&self, video_id: i64) -> ApiResult<Video> {
        self.post_empty(&format!("/videos/{}/publish", video_id)).await
    }

    async fn unpublish_video(&self, video_id: i64) -> ApiResult<Video> {
        self.post_empty(&format!("/videos/{}/unpublish", video_id))
            .await
    }

    async fn get_public_video(&self, slug: &str) -> ApiResult<PublicVideoData> {
        self.get(&format!("/public/videos/{}", slug)).await
    }

    async fn chat(&self, slug: &str, question: &str, history: &[ChatTurn]) -> ApiResult<String> {
        let endpoint = format!("/public/videos/{}/chat", slug);
        let request = self.client.post(self.url(&endpoint)).json(&ChatRequest {
            question,
            chat_history: history,
        });
        let response: ChatResponse = self.send(request, &endpoint).await?;
        Ok(response.answer)
    }
}
