//! Upload control: one selected file, its progress and the upload call.

use crate::api::{ApiError, ApiResult, VideoApi, VideoFile};
use crate::notify::{Notification, Notifier};
use shared::Video;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct UploadControl {
    selected: Option<VideoFile>,
    progress: u8,
    uploading: bool,
}

impl UploadControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_file(&mut self, file: VideoFile) {
        self.selected = Some(file);
        self.progress = 0;
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.progress = 0;
    }

    pub fn selected(&self) -> Option<&VideoFile> {
        self.selected.as_ref()
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    /// Upload the selected file into `project_id`.
    ///
    /// `on_progress` sees every percentage change. Returns `Ok(None)` when
    /// no file was selected. The created video should be handed to the
    /// project view so its processing is followed.
    pub async fn upload(
        &mut self,
        api: &dyn VideoApi,
        notifier: &dyn Notifier,
        project_id: i64,
        mut on_progress: impl FnMut(u8),
    ) -> ApiResult<Option<Video>> {
        let Some(file) = self.selected.clone() else {
            notifier.notify(Notification::error("Please select a video file to upload."));
            return Ok(None);
        };

        info!(project_id = project_id, filename = %file.filename, bytes = file.len(), "Uploading video");
        self.uploading = true;
        self.progress = 0;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let request = api.upload_video(project_id, file, Some(tx));
        tokio::pin!(request);

        let result = loop {
            tokio::select! {
                result = &mut request => break result,
                Some(progress) = rx.recv() => {
                    let percent = progress.percent();
                    if percent != self.progress {
                        self.progress = percent;
                        on_progress(percent);
                    }
                }
            }
        };
        // Progress sent just before the response completed.
        while let Ok(progress) = rx.try_recv() {
            let percent = progress.percent();
            if percent != self.progress {
                self.progress = percent;
                on_progress(percent);
            }
        }
        self.uploading = false;

        match result {
            Ok(video) => {
                notifier.notify(Notification::success(format!(
                    "Video \"{}\" uploaded. Processing started.",
                    video.filename
                )));
                self.clear();
                Ok(Some(video))
            }
            Err(err) => {
                warn!(project_id = project_id, error = %err, "Upload failed");
                notifier.notify(Notification::error(upload_failure_message(&err)));
                self.progress = 0;
                Err(err)
            }
        }
    }
}

fn upload_failure_message(err: &ApiError) -> String {
    match err {
        ApiError::Connection(_) => {
            "Upload failed: Could not connect to server. Check network.".to_string()
        }
        ApiError::Server { message, .. } => format!("Upload failed: {}", message),
        other => format!("Upload failed: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MemoryNotifier;
    use crate::testing::{project, FakeApi};
    use shared::VideoStatus;

    #[tokio::test]
    async fn test_upload_reports_progress_and_returns_video() {
        let api = FakeApi::with_project(project(1, Vec::new()));
        let notifier = MemoryNotifier::new();
        let mut control = UploadControl::new();
        control.select_file(VideoFile::new("/videos/lecture.mp4", 1000));

        let mut seen = Vec::new();
        let video = control
            .upload(&api, &notifier, 1, |pct| seen.push(pct))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(video.filename, "lecture.mp4");
        assert_eq!(video.status, VideoStatus::Uploaded);
        assert!(!control.is_uploading());
        assert!(control.selected().is_none());
        assert_eq!(control.progress(), 0);
        assert_eq!(seen, vec![50, 100]);
        assert_eq!(
            notifier.messages(),
            vec!["Video \"lecture.mp4\" uploaded. Processing started."]
        );
    }

    #[tokio::test]
    async fn test_upload_without_file() {
        let api = FakeApi::with_project(project(1, Vec::new()));
        let notifier = MemoryNotifier::new();
        let mut control = UploadControl::new();

        assert!(control.upload(&api, &notifier, 1, |_| {}).await.unwrap().is_none());
        assert_eq!(notifier.messages(), vec!["Please select a video file to upload."]);
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_selection() {
        let api = FakeApi::default();
        let notifier = MemoryNotifier::new();
        let mut control = UploadControl::new();
        control.select_file(VideoFile::new("/videos/clip.webm", 3));

        assert!(control.upload(&api, &notifier, 42, |_| {}).await.is_err());
        assert!(control.selected().is_some());
        assert_eq!(notifier.messages(), vec!["Upload failed: Project not found"]);
    }

    #[test]
    fn test_connection_failure_message() {
        assert_eq!(
            upload_failure_message(&ApiError::Connection("refused".to_string())),
            "Upload failed: Could not connect to server. Check network."
        );
    }
}
