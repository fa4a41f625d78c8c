//! Console for the video-processing backend.
//!
//! This library wraps the backend's REST API and provides the console's
//! view logic: project and video management, status polling while the
//! backend works, tag editing, publishing, and the public viewer with its
//! chat assistant.

pub mod api;
pub mod controller;
pub mod markdown;
pub mod mindmap;
pub mod notify;
pub mod poller;
pub mod projects;
pub mod public_view;
pub mod quiz;
pub mod routes;
pub mod tags;
pub mod transcript;
pub mod upload;

#[cfg(test)]
mod testing;

pub use api::{ApiError, ApiResult, VideoApi, VideoFile, VideoServiceClient};
pub use controller::{Artifact, ProjectViewController};
pub use notify::{Confirmer, ConsoleNotifier, Notification, Notifier};
pub use poller::{PollEvent, StatusPoller};
pub use public_view::PublicVideoSession;
pub use quiz::QuizSession;
pub use routes::Route;
pub use upload::UploadControl;
