//! Project/video view controller.
//!
//! Owns the displayed project, the selected video and the status poller,
//! and reconciles every polled, optimistic or server-returned video into a
//! single copy: the selected video is an id into the project's video list,
//! so the "current video" and "video list" views cannot diverge.

use crate::api::{ApiResult, GenerationAck, VideoApi};
use crate::notify::{Confirmer, Notification, NotificationAction, Notifier};
use crate::poller::{PollEvent, PollEventKind, StatusPoller};
use crate::routes::Route;
use crate::tags::TagEditor;
use shared::{Project, QuizData, Video, VideoStatus, VideoTranscript};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

/// Artifact generated on demand from a transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Mindmap,
    Quiz,
}

impl Artifact {
    pub fn generating_status(self) -> VideoStatus {
        match self {
            Artifact::Mindmap => VideoStatus::GeneratingMindmap,
            Artifact::Quiz => VideoStatus::GeneratingQuiz,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Artifact::Mindmap => "mind map",
            Artifact::Quiz => "quiz",
        }
    }
}

/// Generation requests in flight for the selected video
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationFlags {
    pub mindmap: bool,
    pub quiz: bool,
}

impl GenerationFlags {
    fn from_status(status: VideoStatus) -> Self {
        Self {
            mindmap: status == VideoStatus::GeneratingMindmap,
            quiz: status == VideoStatus::GeneratingQuiz,
        }
    }

    pub fn any(&self) -> bool {
        self.mindmap || self.quiz
    }

    fn set(&mut self, artifact: Artifact, value: bool) {
        match artifact {
            Artifact::Mindmap => self.mindmap = value,
            Artifact::Quiz => self.quiz = value,
        }
    }
}

/// Local status written ahead of the server while a generation request is
/// in flight. It is superseded by the next authoritative copy of the video
/// and rolled back if the request fails.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOverride {
    pub video_id: i64,
    pub artifact: Artifact,
    /// The video as it was before the override
    pub previous: Video,
}

/// A generation request whose optimistic state has been applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationRequest {
    pub video_id: i64,
    pub artifact: Artifact,
}

pub struct ProjectViewController {
    api: Arc<dyn VideoApi>,
    notifier: Arc<dyn Notifier>,
    poller: StatusPoller,
    poll_events: UnboundedReceiver<PollEvent>,
    share_base_url: String,

    project: Option<Project>,
    current_video_id: Option<i64>,
    is_loading: bool,
    error_message: Option<String>,
    generating: GenerationFlags,
    pending: Option<PendingOverride>,
    tag_editor: Option<TagEditor>,
}

impl ProjectViewController {
    pub fn new(
        api: Arc<dyn VideoApi>,
        notifier: Arc<dyn Notifier>,
        poll_interval: Duration,
        share_base_url: impl Into<String>,
    ) -> Self {
        let (poller, poll_events) = StatusPoller::new(Arc::clone(&api), poll_interval);
        Self {
            api,
            notifier,
            poller,
            poll_events,
            share_base_url: share_base_url.into(),
            project: None,
            current_video_id: None,
            is_loading: false,
            error_message: None,
            generating: GenerationFlags::default(),
            pending: None,
            tag_editor: None,
        }
    }

    // ========== State accessors ==========

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn videos(&self) -> &[Video] {
        self.project
            .as_ref()
            .map(|p| p.videos.as_slice())
            .unwrap_or_default()
    }

    pub fn video(&self, video_id: i64) -> Option<&Video> {
        self.videos().iter().find(|v| v.id == video_id)
    }

    fn video_mut(&mut self, video_id: i64) -> Option<&mut Video> {
        self.project
            .as_mut()
            .and_then(|p| p.videos.iter_mut().find(|v| v.id == video_id))
    }

    pub fn current_video(&self) -> Option<&Video> {
        self.current_video_id.and_then(|id| self.video(id))
    }

    pub fn current_transcript(&self) -> Option<VideoTranscript> {
        self.current_video().and_then(Video::parsed_transcript)
    }

    pub fn current_quiz(&self) -> Option<QuizData> {
        self.current_video().and_then(Video::parsed_quiz)
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn generation_flags(&self) -> GenerationFlags {
        self.generating
    }

    pub fn pending_override(&self) -> Option<&PendingOverride> {
        self.pending.as_ref()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_polling()
    }

    pub fn active_poll_generation(&self) -> Option<u64> {
        self.poller.active().map(|h| h.generation())
    }

    pub fn tag_editor(&self) -> Option<&TagEditor> {
        self.tag_editor.as_ref()
    }

    /// Public link for a published video
    pub fn share_link(&self, slug: &str) -> String {
        Route::PublicVideo {
            slug: slug.to_string(),
        }
        .url(&self.share_base_url)
    }

    // ========== Loading and selection ==========

    /// Load a project and choose the video to display.
    ///
    /// On failure the previously loaded project stays in place.
    pub async fn load_project(&mut self, project_id: i64, requested_video: Option<i64>) -> ApiResult<()> {
        self.is_loading = true;
        self.error_message = None;

        match self.api.get_project(project_id).await {
            Ok(mut project) => {
                sort_newest_first(&mut project.videos);
                info!(
                    project_id = project.id,
                    videos = project.videos.len(),
                    "Project loaded"
                );
                self.project = Some(project);
                self.pending = None;
                self.select_initial_video(requested_video);
                self.is_loading = false;
                Ok(())
            }
            Err(err) => {
                self.error_message = Some(err.to_string());
                self.notifier
                    .notify(Notification::error(format!("Error loading project: {}", err)));
                self.is_loading = false;
                Err(err)
            }
        }
    }

    fn select_initial_video(&mut self, requested_video: Option<i64>) {
        match initial_video_id(self.videos(), requested_video) {
            Some(video_id) => {
                self.select_video(video_id);
            }
            None => {
                self.poller.cancel();
                self.current_video_id = None;
                self.generating = GenerationFlags::default();
                self.tag_editor = None;
            }
        }
    }

    /// Display a video, polling it while the backend is still working on it
    pub fn select_video(&mut self, video_id: i64) -> bool {
        let Some(status) = self.video(video_id).map(|v| v.status) else {
            warn!(video_id = video_id, "Cannot select unknown video");
            return false;
        };

        debug!(video_id = video_id, status = %status, "Selecting video");
        self.current_video_id = Some(video_id);
        self.generating = GenerationFlags::from_status(status);
        self.tag_editor = None;

        if status.is_active() {
            self.poller.start(video_id);
        } else {
            self.poller.cancel();
        }
        true
    }

    /// Make `video_id` the current video.
    ///
    /// Ids outside the loaded project are reported and leave the selection
    /// untouched.
    pub fn focus_video(&mut self, video_id: i64) -> bool {
        if self.current_video_id == Some(video_id) || self.select_video(video_id) {
            return true;
        }
        let project_id = self.project.as_ref().map(|p| p.id).unwrap_or_default();
        self.notifier.notify(Notification::error(format!(
            "Video {} is not part of project {}.",
            video_id, project_id
        )));
        false
    }

    /// Take a freshly uploaded video into the list and follow its processing
    pub fn on_video_uploaded(&mut self, video: Video) {
        let Some(project) = self.project.as_mut() else {
            return;
        };
        let video_id = video.id;
        let message = format!(
            "Video \"{}\" upload started and is now processing.",
            video.filename
        );
        project.videos.retain(|v| v.id != video_id);
        project.videos.insert(0, video);
        self.select_video(video_id);
        self.notifier.notify(Notification::info(message));
    }

    // ========== Reconciliation ==========

    /// Merge an authoritative copy of a video into local state.
    ///
    /// This is the only place a server-provided video replaces the local
    /// one; it also retires any pending override for that video.
    pub fn merge_video(&mut self, mut update: Video) {
        if self.pending.as_ref().is_some_and(|p| p.video_id == update.id) {
            debug!(video_id = update.id, "Pending override superseded");
            self.pending = None;
        }

        match self.video_mut(update.id) {
            Some(entry) => {
                if update.project_id.is_none() {
                    update.project_id = entry.project_id;
                }
                *entry = update;
            }
            None => debug!(video_id = update.id, "Ignoring update for video not in project"),
        }
    }

    /// Apply one poll observation
    pub fn handle_poll_event(&mut self, event: PollEvent) {
        if !self.poller.accept(&event) {
            return;
        }

        match event.kind {
            PollEventKind::Update(video) => {
                let status = video.status;
                let video_id = video.id;
                self.merge_video(video);
                if status.is_terminal() && self.current_video_id == Some(video_id) {
                    self.on_terminal_status(video_id);
                }
            }
            PollEventKind::Failed(err) => {
                self.notifier.notify(Notification::error(format!(
                    "Error polling video status: {}",
                    err
                )));
                self.generating = GenerationFlags::default();
            }
        }
    }

    fn on_terminal_status(&mut self, video_id: i64) {
        let Some(video) = self.video(video_id).cloned() else {
            return;
        };

        match video.status {
            VideoStatus::Completed if self.generating.mindmap => {
                self.generating.mindmap = false;
                let notification = if video.has_mindmap() {
                    Notification::success(format!(
                        "Mind map for \"{}\" generated successfully!",
                        video.filename
                    ))
                } else {
                    Notification::error(format!(
                        "Mind map for \"{}\" finished without a result.",
                        video.filename
                    ))
                };
                self.notifier.notify(notification);
            }
            VideoStatus::Completed if self.generating.quiz => {
                self.generating.quiz = false;
                let notification = if video.parsed_quiz().is_some() {
                    Notification::success(format!(
                        "Quiz for \"{}\" generated successfully!",
                        video.filename
                    ))
                    .with_action(NotificationAction::ViewQuiz)
                } else {
                    Notification::error(format!(
                        "Quiz for \"{}\" finished without a result.",
                        video.filename
                    ))
                };
                self.notifier.notify(notification);
            }
            VideoStatus::Completed => {
                self.notifier.notify(Notification::success(format!(
                    "Video \"{}\" processing completed.",
                    video.filename
                )));
            }
            VideoStatus::Failed => {
                self.generating = GenerationFlags::default();
                self.notifier.notify(Notification::error(format!(
                    "Processing failed for video \"{}\".",
                    video.filename
                )));
            }
            _ => {}
        }
    }

    /// Wait for the next poll event and apply it.
    ///
    /// Returns `false` once no poller is running.
    pub async fn process_next_poll_event(&mut self) -> bool {
        if !self.poller.is_polling() {
            return false;
        }
        match self.poll_events.recv().await {
            Some(event) => {
                self.handle_poll_event(event);
                true
            }
            None => false,
        }
    }

    /// Apply poll events until polling stops
    pub async fn wait_until_idle(&mut self) {
        while self.process_next_poll_event().await {}
    }

    pub fn stop_polling(&mut self) {
        self.poller.cancel();
    }

    // ========== Generation ==========

    /// Apply the optimistic state of a generation request.
    ///
    /// Returns `None` when nothing is selected or a generation is already
    /// in flight.
    pub fn begin_generation(&mut self, artifact: Artifact) -> Option<GenerationRequest> {
        let video_id = self.current_video_id?;
        if self.generating.any() {
            debug!(video_id = video_id, "Generation already in flight");
            return None;
        }

        let previous = self.video(video_id)?.clone();
        if let Some(entry) = self.video_mut(video_id) {
            entry.status = artifact.generating_status();
            match artifact {
                Artifact::Mindmap => entry.mindmap_data = None,
                Artifact::Quiz => entry.quiz_data = None,
            }
        }

        self.generating.set(artifact, true);
        self.pending = Some(PendingOverride {
            video_id,
            artifact,
            previous,
        });
        Some(GenerationRequest { video_id, artifact })
    }

    /// Settle a generation request with the server's answer
    pub fn finish_generation(
        &mut self,
        request: GenerationRequest,
        result: ApiResult<GenerationAck>,
    ) -> ApiResult<()> {
        match result {
            Ok(ack) => {
                self.notifier.notify(Notification::info(ack.message));
                if self.current_video_id == Some(request.video_id) {
                    self.poller.start(request.video_id);
                }
                Ok(())
            }
            Err(err) => {
                warn!(
                    video_id = request.video_id,
                    artifact = request.artifact.label(),
                    error = %err,
                    "Generation request failed, rolling back"
                );
                self.notifier.notify(Notification::error(format!(
                    "Error starting {} generation: {}",
                    request.artifact.label(),
                    err
                )));
                self.rollback_override(request);
                self.generating.set(request.artifact, false);
                Err(err)
            }
        }
    }

    fn rollback_override(&mut self, request: GenerationRequest) {
        let pending = match self.pending.take() {
            Some(p) if p.video_id == request.video_id => p,
            other => {
                self.pending = other;
                return;
            }
        };

        if let Some(entry) = self.video_mut(request.video_id) {
            entry.status = VideoStatus::Completed;
            match request.artifact {
                Artifact::Mindmap => entry.mindmap_data = pending.previous.mindmap_data,
                Artifact::Quiz => entry.quiz_data = pending.previous.quiz_data,
            }
        }
    }

    /// Request generation of an artifact for the selected video.
    ///
    /// Returns `Ok(false)` when the request was refused locally.
    pub async fn generate(&mut self, artifact: Artifact) -> ApiResult<bool> {
        let Some(request) = self.begin_generation(artifact) else {
            return Ok(false);
        };

        let result = match artifact {
            Artifact::Mindmap => self.api.generate_mindmap(request.video_id).await,
            Artifact::Quiz => self.api.generate_quiz(request.video_id).await,
        };
        self.finish_generation(request, result).map(|_| true)
    }

    // ========== Destructive and publishing operations ==========

    /// Delete a video after the user confirms.
    ///
    /// Returns `Ok(false)` when there was nothing to delete or the user
    /// declined.
    pub async fn delete_video(&mut self, video_id: i64, confirmer: &dyn Confirmer) -> ApiResult<bool> {
        let Some(project_id) = self.project.as_ref().map(|p| p.id) else {
            return Ok(false);
        };
        let Some(filename) = self.video(video_id).map(|v| v.filename.clone()) else {
            return Ok(false);
        };

        let name = if filename.is_empty() {
            "this video".to_string()
        } else {
            filename
        };
        let message = format!(
            "Are you sure you want to delete the video \"{}\"? This action cannot be undone.",
            name
        );
        if !confirmer.confirm("Confirm Deletion", &message) {
            debug!(video_id = video_id, "Deletion declined");
            return Ok(false);
        }

        match self.api.delete_video(project_id, video_id).await {
            Ok(()) => {
                self.notifier
                    .notify(Notification::success("Video deleted successfully."));
                if let Some(project) = self.project.as_mut() {
                    project.videos.retain(|v| v.id != video_id);
                }
                if self.pending.as_ref().is_some_and(|p| p.video_id == video_id) {
                    self.pending = None;
                }
                if self.tag_editor.as_ref().is_some_and(|t| t.video_id() == video_id) {
                    self.tag_editor = None;
                }
                if self.current_video_id == Some(video_id) {
                    self.select_initial_video(None);
                }
                Ok(true)
            }
            Err(err) => {
                self.notifier
                    .notify(Notification::error(format!("Error deleting video: {}", err)));
                Err(err)
            }
        }
    }

    pub async fn publish_video(&mut self, video_id: i64) -> ApiResult<Video> {
        match self.api.publish_video(video_id).await {
            Ok(updated) => {
                self.notifier.notify(Notification::success(format!(
                    "Video \"{}\" published!",
                    updated.filename
                )));
                self.merge_video(updated.clone());
                Ok(updated)
            }
            Err(err) => {
                self.notifier.notify(Notification::error(format!(
                    "Error publishing video: {}",
                    err
                )));
                Err(err)
            }
        }
    }

    pub async fn unpublish_video(&mut self, video_id: i64) -> ApiResult<Video> {
        match self.api.unpublish_video(video_id).await {
            Ok(updated) => {
                self.notifier.notify(Notification::info(format!(
                    "Video \"{}\" unpublished.",
                    updated.filename
                )));
                self.merge_video(updated.clone());
                Ok(updated)
            }
            Err(err) => {
                self.notifier.notify(Notification::error(format!(
                    "Error unpublishing video: {}",
                    err
                )));
                Err(err)
            }
        }
    }

    // ========== Tag editing ==========

    /// Enter tag edit mode for a video, snapshotting its tags
    pub fn start_edit_tags(&mut self, video_id: i64) -> bool {
        match self.video(video_id).map(TagEditor::start) {
            Some(editor) => {
                self.tag_editor = Some(editor);
                true
            }
            None => false,
        }
    }

    pub fn add_tag(&mut self, tag: &str) -> bool {
        self.tag_editor
            .as_mut()
            .is_some_and(|editor| editor.add(tag))
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tag_editor
            .as_mut()
            .is_some_and(|editor| editor.remove(tag))
    }

    pub fn cancel_tag_edit(&mut self) {
        self.tag_editor = None;
    }

    /// Persist the edit buffer; edit mode is kept when saving fails
    pub async fn save_tags(&mut self) -> ApiResult<bool> {
        let Some((video_id, tags)) = self
            .tag_editor
            .as_ref()
            .map(|editor| (editor.video_id(), editor.tags().to_vec()))
        else {
            return Ok(false);
        };

        match self.api.update_tags(video_id, &tags).await {
            Ok(updated) => {
                self.notifier
                    .notify(Notification::success("Tags updated successfully!"));
                self.merge_video(updated);
                self.tag_editor = None;
                Ok(true)
            }
            Err(err) => {
                self.notifier
                    .notify(Notification::error(format!("Error updating tags: {}", err)));
                Err(err)
            }
        }
    }
}

/// Newest upload first; videos without a timestamp go last
pub fn sort_newest_first(videos: &mut [Video]) {
    videos.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
}

/// Pick the video to display when a project opens.
///
/// Precedence: the explicitly requested video, then the first video the
/// backend is still working on, then the most recent upload. `videos` must
/// already be sorted newest first.
pub fn initial_video_id(videos: &[Video], requested_video: Option<i64>) -> Option<i64> {
    if let Some(requested) = requested_video {
        if videos.iter().any(|v| v.id == requested) {
            return Some(requested);
        }
        debug!(video_id = requested, "Requested video not in project");
    }

    videos
        .iter()
        .find(|v| v.status.is_active())
        .or_else(|| videos.first())
        .map(|v| v.id)
}
