//! In-memory backend used by the unit tests.

use crate::api::{ApiError, ApiResult, GenerationAck, UploadProgress, VideoApi, VideoFile};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use shared::{ChatTurn, Project, PublicVideoData, Video, VideoListing, VideoStatus};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

pub fn video(id: i64, status: VideoStatus, uploaded_minute: u32) -> Video {
    Video {
        id,
        project_id: Some(1),
        filename: format!("video-{}.mp4", id),
        filepath: Some(format!("uploads/video-{}.mp4", id)),
        status,
        transcript: None,
        summary: None,
        mindmap_data: None,
        quiz_data: None,
        tags: Vec::new(),
        is_public: false,
        public_slug: None,
        uploaded_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, uploaded_minute, 0).single(),
    }
}

pub fn project(id: i64, videos: Vec<Video>) -> Project {
    Project {
        id,
        name: format!("Project {}", id),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).single(),
        videos,
    }
}

pub fn server_error(status: u16, message: &str) -> ApiError {
    ApiError::Server {
        status,
        message: message.to_string(),
    }
}

#[derive(Default)]
pub struct FakeApi {
    pub projects: Mutex<HashMap<i64, Project>>,
    /// Scripted status responses per video, consumed front to back
    pub status_script: Mutex<HashMap<i64, VecDeque<ApiResult<Video>>>>,
    /// Artificial latency of status responses per video
    pub status_delay: Mutex<HashMap<i64, Duration>>,
    pub status_calls: Mutex<Vec<i64>>,
    pub generation_error: Mutex<Option<ApiError>>,
    pub tags_error: Mutex<Option<ApiError>>,
    pub get_project_error: Mutex<Option<ApiError>>,
    pub delete_calls: Mutex<Vec<(i64, i64)>>,
    pub public_videos: Mutex<HashMap<String, PublicVideoData>>,
    pub chat_answers: Mutex<VecDeque<ApiResult<String>>>,
    pub chat_requests: Mutex<Vec<(String, Vec<ChatTurn>)>>,
}

impl FakeApi {
    pub fn with_project(project: Project) -> Self {
        let api = Self::default();
        api.projects.lock().unwrap().insert(project.id, project);
        api
    }

    pub fn script_status(&self, video_id: i64, responses: Vec<ApiResult<Video>>) {
        self.status_script
            .lock()
            .unwrap()
            .entry(video_id)
            .or_default()
            .extend(responses);
    }

    pub fn delay_status(&self, video_id: i64, delay: Duration) {
        self.status_delay.lock().unwrap().insert(video_id, delay);
    }

    pub fn status_calls_for(&self, video_id: i64) -> usize {
        self.status_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|id| **id == video_id)
            .count()
    }

    fn stored_video(&self, video_id: i64) -> Option<Video> {
        self.projects
            .lock()
            .unwrap()
            .values()
            .flat_map(|p| p.videos.iter())
            .find(|v| v.id == video_id)
            .cloned()
    }

    fn update_stored<F: FnOnce(&mut Video)>(&self, video_id: i64, f: F) -> ApiResult<Video> {
        let mut projects = self.projects.lock().unwrap();
        let video = projects
            .values_mut()
            .flat_map(|p| p.videos.iter_mut())
            .find(|v| v.id == video_id)
            .ok_or_else(|| server_error(404, "Video not found"))?;
        f(video);
        Ok(video.clone())
    }
}

#[async_trait]
impl VideoApi for FakeApi {
    async fn create_project(&self, name: &str) -> ApiResult<Project> {
        let mut projects = self.projects.lock().unwrap();
        let id = projects.keys().max().copied().unwrap_or(0) + 1;
        let mut created = project(id, Vec::new());
        created.name = name.to_string();
        projects.insert(id, created.clone());
        Ok(created)
    }

    async fn list_projects(&self) -> ApiResult<Vec<Project>> {
        let mut list: Vec<Project> = self.projects.lock().unwrap().values().cloned().collect();
        list.sort_by_key(|p| p.id);
        Ok(list)
    }

    async fn get_project(&self, project_id: i64) -> ApiResult<Project> {
        if let Some(err) = self.get_project_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.projects
            .lock()
            .unwrap()
            .get(&project_id)
            .cloned()
            .ok_or_else(|| server_error(404, "Project not found"))
    }

    async fn upload_video(
        &self,
        project_id: i64,
        file: VideoFile,
        progress: Option<UnboundedSender<UploadProgress>>,
    ) -> ApiResult<Video> {
        let total = file.len();
        if let Some(tx) = progress {
            let _ = tx.send(UploadProgress { loaded: total / 2, total });
            let _ = tx.send(UploadProgress { loaded: total, total });
        }
        let mut projects = self.projects.lock().unwrap();
        let project = projects
            .get_mut(&project_id)
            .ok_or_else(|| server_error(404, "Project not found"))?;
        let next_id = project.videos.iter().map(|v| v.id).max().unwrap_or(0) + 1;
        let mut created = video(next_id, VideoStatus::Uploaded, 59);
        created.project_id = Some(project_id);
        created.filename = file.filename;
        project.videos.push(created.clone());
        Ok(created)
    }

    async fn get_video_status(&self, video_id: i64) -> ApiResult<Video> {
        self.status_calls.lock().unwrap().push(video_id);
        let delay = self.status_delay.lock().unwrap().get(&video_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .status_script
            .lock()
            .unwrap()
            .get_mut(&video_id)
            .and_then(|queue| queue.pop_front());
        match scripted {
            Some(response) => response,
            None => self
                .stored_video(video_id)
                .ok_or_else(|| server_error(404, "Video not found")),
        }
    }

    async fn list_videos(&self) -> ApiResult<Vec<VideoListing>> {
        let projects = self.projects.lock().unwrap();
        Ok(projects
            .values()
            .flat_map(|p| {
                p.videos.iter().map(|v| VideoListing {
                    video: v.clone(),
                    project_name: Some(p.name.clone()),
                })
            })
            .collect())
    }

    async fn generate_mindmap(&self, _video_id: i64) -> ApiResult<GenerationAck> {
        match self.generation_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(GenerationAck {
                message: "Mind map generation started.".to_string(),
            }),
        }
    }

    async fn generate_quiz(&self, _video_id: i64) -> ApiResult<GenerationAck> {
        match self.generation_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(GenerationAck {
                message: "Quiz generation started.".to_string(),
            }),
        }
    }

    async fn delete_video(&self, project_id: i64, video_id: i64) -> ApiResult<()> {
        self.delete_calls.lock().unwrap().push((project_id, video_id));
        let mut projects = self.projects.lock().unwrap();
        let project = projects
            .get_mut(&project_id)
            .ok_or_else(|| server_error(404, "Project not found"))?;
        project.videos.retain(|v| v.id != video_id);
        Ok(())
    }

    async fn update_tags(&self, video_id: i64, tags: &[String]) -> ApiResult<Video> {
        if let Some(err) = self.tags_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.update_stored(video_id, |v| v.tags = tags.to_vec())
    }

    async fn publish_video(&self, video_id: i64) -> ApiResult<Video> {
        self.update_stored(video_id, |v| {
            v.is_public = true;
            v.public_slug = Some(format!("slug-{}", v.id));
        })
    }

    async fn unpublish_video(&self, video_id: i64) -> ApiResult<Video> {
        self.update_stored(video_id, |v| {
            v.is_public = false;
            v.public_slug = None;
        })
    }

    async fn get_public_video(&self, slug: &str) -> ApiResult<PublicVideoData> {
        self.public_videos
            .lock()
            .unwrap()
            .get(slug)
            .cloned()
            .ok_or_else(|| server_error(404, "Public video not found or not available"))
    }

    async fn chat(&self, slug: &str, _question: &str, history: &[ChatTurn]) -> ApiResult<String> {
        self.chat_requests
            .lock()
            .unwrap()
            .push((slug.to_string(), history.to_vec()));
        self.chat_answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("I don't know.".to_string()))
    }
}
