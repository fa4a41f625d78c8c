//! Navigation surface of the console.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    ProjectList,
    NewProject,
    /// Project detail, optionally preselecting a video
    ProjectDetail {
        project_id: i64,
        video_id: Option<i64>,
    },
    AllVideos,
    PublicVideo {
        slug: String,
    },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("unknown route: {0}")]
    Unknown(String),

    #[error("invalid project id: {0:?}")]
    InvalidProjectId(String),

    #[error("invalid videoId query parameter: {0:?}")]
    InvalidVideoId(String),
}

impl Route {
    /// Parse a path such as `/projects/3?videoId=12`.
    ///
    /// The empty path redirects to the project list.
    pub fn parse(path: &str) -> Result<Self, RouteError> {
        let (path_part, query) = match path.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path, None),
        };
        let segments: Vec<&str> = path_part.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] | ["projects"] => Ok(Route::ProjectList),
            ["projects", "new"] => Ok(Route::NewProject),
            ["projects", id] => {
                let project_id = id
                    .parse()
                    .map_err(|_| RouteError::InvalidProjectId(id.to_string()))?;
                let video_id = query
                    .and_then(|q| query_param(q, "videoId"))
                    .map(|raw| {
                        raw.parse()
                            .map_err(|_| RouteError::InvalidVideoId(raw.to_string()))
                    })
                    .transpose()?;
                Ok(Route::ProjectDetail {
                    project_id,
                    video_id,
                })
            }
            ["videos"] => Ok(Route::AllVideos),
            ["public", "video", slug] => Ok(Route::PublicVideo {
                slug: slug.to_string(),
            }),
            _ => Err(RouteError::Unknown(path.to_string())),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::ProjectList => "/projects".to_string(),
            Route::NewProject => "/projects/new".to_string(),
            Route::ProjectDetail {
                project_id,
                video_id: Some(video_id),
            } => format!("/projects/{}?videoId={}", project_id, video_id),
            Route::ProjectDetail { project_id, .. } => format!("/projects/{}", project_id),
            Route::AllVideos => "/videos".to_string(),
            Route::PublicVideo { slug } => format!("/public/video/{}", slug),
        }
    }

    /// Absolute link under the given origin
    pub fn url(&self, origin: &str) -> String {
        format!("{}{}", origin.trim_end_matches('/'), self.path())
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::ProjectList => "Projects - Video Processor",
            Route::NewProject => "New Project - Video Processor",
            Route::ProjectDetail { .. } => "View Project - Video Processor",
            Route::AllVideos => "All Videos - Video Processor",
            Route::PublicVideo { .. } => "Shared Video - Video Processor",
        }
    }
}

fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
        .filter(|v| !v.is_empty())
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::parse(s)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
