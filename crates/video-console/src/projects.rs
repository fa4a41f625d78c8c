//! Project list, project creation and the cross-project video listing.

use crate::api::{ApiResult, VideoApi};
use crate::notify::{Notification, Notifier};
use crate::routes::Route;
use shared::{Project, VideoListing};
use thiserror::Error;
use tracing::info;

pub const MIN_PROJECT_NAME_LEN: usize = 3;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Project name is required.")]
    NameRequired,

    #[error("Project name must be at least {min} characters long.")]
    NameTooShort { min: usize },
}

/// Validate a project name, returning it trimmed
pub fn validate_project_name(raw: &str) -> Result<String, FormError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(FormError::NameRequired);
    }
    if name.chars().count() < MIN_PROJECT_NAME_LEN {
        return Err(FormError::NameTooShort {
            min: MIN_PROJECT_NAME_LEN,
        });
    }
    Ok(name.to_string())
}

/// Outcome of submitting the project creation form
#[derive(Debug)]
pub enum CreateOutcome {
    /// Created; the console should navigate to the new project
    Created { project: Project, next: Route },
    Invalid(FormError),
}

pub async fn list_projects(api: &dyn VideoApi, notifier: &dyn Notifier) -> ApiResult<Vec<Project>> {
    api.list_projects().await.map_err(|err| {
        notifier.notify(Notification::error(format!("Error loading projects: {}", err)));
        err
    })
}

pub async fn create_project(
    api: &dyn VideoApi,
    notifier: &dyn Notifier,
    raw_name: &str,
) -> ApiResult<CreateOutcome> {
    let name = match validate_project_name(raw_name) {
        Ok(name) => name,
        Err(err) => {
            notifier.notify(Notification::error(
                "Please correct the errors before submitting.",
            ));
            return Ok(CreateOutcome::Invalid(err));
        }
    };

    match api.create_project(&name).await {
        Ok(project) => {
            info!(project_id = project.id, name = %project.name, "Project created");
            notifier.notify(Notification::success(format!(
                "Project \"{}\" created successfully!",
                project.name
            )));
            let next = Route::ProjectDetail {
                project_id: project.id,
                video_id: None,
            };
            Ok(CreateOutcome::Created { project, next })
        }
        Err(err) => {
            notifier.notify(Notification::error(format!("Error creating project: {}", err)));
            Err(err)
        }
    }
}

/// Every video across projects, newest upload first
pub async fn list_all_videos(api: &dyn VideoApi, notifier: &dyn Notifier) -> ApiResult<Vec<VideoListing>> {
    match api.list_videos().await {
        Ok(mut videos) => {
            videos.sort_by(|a, b| b.video.uploaded_at.cmp(&a.video.uploaded_at));
            Ok(videos)
        }
        Err(err) => {
            notifier.notify(Notification::error(format!("Error loading videos: {}", err)));
            Err(err)
        }
    }
}

/// Where a listed video opens in the console
pub fn listing_route(listing: &VideoListing) -> Option<Route> {
    listing.video.project_id.map(|project_id| Route::ProjectDetail {
        project_id,
        video_id: Some(listing.video.id),
    })
}
