//! Data models for the video console.
//!
//! This module defines the records exchanged with the video-processing
//! backend: projects, videos and their derived artifacts (transcripts,
//! mind-maps, quizzes), plus the public viewer and chat payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A named collection of videos
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default, with = "flexible_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub videos: Vec<Video>,
}

/// Processing status of a video, owned by the backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    #[default]
    Uploaded,
    Processing,
    Completed,
    Failed,
    GeneratingMindmap,
    GeneratingQuiz,
    /// Any status string this client does not know about
    #[serde(other)]
    Unknown,
}

impl VideoStatus {
    /// Statuses that keep the status poller running
    pub const ACTIVE: [VideoStatus; 4] = [
        VideoStatus::Uploaded,
        VideoStatus::Processing,
        VideoStatus::GeneratingMindmap,
        VideoStatus::GeneratingQuiz,
    ];

    /// Whether the backend still has work in flight for this video
    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }

    /// Polling stops on anything that is not active
    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }
}

impl std::fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoStatus::Uploaded => write!(f, "uploaded"),
            VideoStatus::Processing => write!(f, "processing"),
            VideoStatus::Completed => write!(f, "completed"),
            VideoStatus::Failed => write!(f, "failed"),
            VideoStatus::GeneratingMindmap => write!(f, "generating_mindmap"),
            VideoStatus::GeneratingQuiz => write!(f, "generating_quiz"),
            VideoStatus::Unknown => write!(f, "unknown"),
        }
    }
}

impl std::str::FromStr for VideoStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploaded" => Ok(VideoStatus::Uploaded),
            "processing" => Ok(VideoStatus::Processing),
            "completed" => Ok(VideoStatus::Completed),
            "failed" => Ok(VideoStatus::Failed),
            "generating_mindmap" => Ok(VideoStatus::GeneratingMindmap),
            "generating_quiz" => Ok(VideoStatus::GeneratingQuiz),
            _ => Err(anyhow::anyhow!("Invalid video status: {}", s)),
        }
    }
}

/// One uploaded media asset with its processing status and derived artifacts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Video {
    pub id: i64,
    #[serde(default)]
    pub project_id: Option<i64>,
    pub filename: String,
    #[serde(default)]
    pub filepath: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: VideoStatus,

    // Stored server-side as JSON text; older records return the raw string,
    // newer ones the decoded object.
    #[serde(default)]
    pub transcript: Option<Value>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub mindmap_data: Option<String>,
    #[serde(default)]
    pub quiz_data: Option<Value>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_public: bool,
    #[serde(default)]
    pub public_slug: Option<String>,
    #[serde(default, with = "flexible_timestamp")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl Video {
    /// Decoded transcript, or `None` when the video has none yet.
    ///
    /// A malformed payload yields an empty transcript instead of an error.
    pub fn parsed_transcript(&self) -> Option<VideoTranscript> {
        self.transcript.as_ref().and_then(parse_transcript)
    }

    /// Decoded quiz, or `None` when missing or malformed
    pub fn parsed_quiz(&self) -> Option<QuizData> {
        self.quiz_data.as_ref().and_then(parse_quiz)
    }

    /// Whether a mind-map has been generated for this video
    pub fn has_mindmap(&self) -> bool {
        self.mindmap_data.as_deref().is_some_and(|md| !md.is_empty())
    }
}

/// A video from the all-videos listing, annotated with its project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoListing {
    #[serde(flatten)]
    pub video: Video,
    #[serde(default)]
    pub project_name: Option<String>,
}

/// Transcript segment with `HH:MM:SS.mmm` timestamps
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TranscriptSegment {
    #[serde(default)]
    pub timestamp_start: String,
    #[serde(default)]
    pub timestamp_end: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct KeyMoment {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub timestamp_start: String,
}

/// Structured transcript produced by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VideoTranscript {
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
    #[serde(default)]
    pub key_moments: Vec<KeyMoment>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum QuestionType {
    #[serde(rename = "single-choice")]
    SingleChoice,
    #[serde(rename = "multiple-choice")]
    MultipleChoice,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizQuestionOption {
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizQuestion {
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Vec<QuizQuestionOption>,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    /// Texts of the options flagged correct, in option order
    pub fn correct_options(&self) -> Vec<&str> {
        self.options
            .iter()
            .filter(|opt| opt.is_correct)
            .map(|opt| opt.text.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizData {
    pub title: String,
    pub questions: Vec<QuizQuestion>,
}

/// Read-only view of a published video
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicVideoData {
    pub filename: String,
    #[serde(default)]
    pub filepath: Option<String>,
    #[serde(default)]
    pub transcript: Option<VideoTranscript>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub mindmap_data: Option<String>,
    #[serde(default)]
    pub quiz_data: Option<QuizData>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub project_name: String,
    #[serde(default, with = "flexible_timestamp")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message of a public-viewer chat conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Decode a transcript payload stored either as JSON text or as an object.
///
/// Returns `None` only when there is nothing to decode; any payload that is
/// present but does not carry both `segments` and `key_moments` arrays
/// becomes an empty transcript.
pub fn parse_transcript(raw: &Value) -> Option<VideoTranscript> {
    match raw {
        Value::Null => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(
            serde_json::from_str::<Value>(text)
                .ok()
                .and_then(|value| transcript_from_value(&value))
                .unwrap_or_default(),
        ),
        other => Some(transcript_from_value(other).unwrap_or_default()),
    }
}

fn transcript_from_value(value: &Value) -> Option<VideoTranscript> {
    let obj = value.as_object()?;
    if !obj.get("segments")?.is_array() || !obj.get("key_moments")?.is_array() {
        return None;
    }
    serde_json::from_value(value.clone()).ok()
}

/// Decode a quiz payload stored either as JSON text or as an object
pub fn parse_quiz(raw: &Value) -> Option<QuizData> {
    let value = match raw {
        Value::String(text) => serde_json::from_str::<Value>(text).ok()?,
        Value::Null => return None,
        other => other.clone(),
    };

    let obj = value.as_object()?;
    let has_title = obj
        .get("title")
        .and_then(Value::as_str)
        .is_some_and(|title| !title.is_empty());
    if !has_title || !obj.get("questions")?.is_array() {
        return None;
    }
    serde_json::from_value(value).ok()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Timestamps as emitted by the backend: RFC 3339 with an offset, or a
/// naive ISO-8601 datetime that is taken to be UTC.
mod flexible_timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_some(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };

        if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(Some(ts.with_timezone(&Utc)));
        }

        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
            .map(|naive| Some(naive.and_utc()))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn video_json(status: &str) -> Value {
        json!({
            "id": 10,
            "project_id": 1,
            "filename": "lecture.mp4",
            "filepath": "uploads/lecture.mp4",
            "status": status,
            "transcript": null,
            "tags": null,
            "is_public": null,
            "uploaded_at": "2024-05-01T10:00:00.123456"
        })
    }

    #[test]
    fn test_status_terminal_set() {
        assert!(VideoStatus::Completed.is_terminal());
        assert!(VideoStatus::Failed.is_terminal());
        for status in VideoStatus::ACTIVE {
            assert!(status.is_active(), "{status} should be active");
        }
    }

    #[test]
    fn test_status_round_trips_through_strings() {
        for status in [
            VideoStatus::Uploaded,
            VideoStatus::GeneratingMindmap,
            VideoStatus::GeneratingQuiz,
            VideoStatus::Failed,
        ] {
            let parsed: VideoStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("bogus".parse::<VideoStatus>().is_err());
    }

    #[test]
    fn test_unknown_status_is_terminal() {
        let video: Video = serde_json::from_value(video_json("archived")).unwrap();
        assert_eq!(video.status, VideoStatus::Unknown);
        assert!(video.status.is_terminal());
    }

    #[test]
    fn test_video_tolerates_nulls_and_naive_timestamps() {
        let video: Video = serde_json::from_value(video_json("generating_quiz")).unwrap();
        assert_eq!(video.status, VideoStatus::GeneratingQuiz);
        assert!(video.tags.is_empty());
        assert!(!video.is_public);
        assert!(video.parsed_transcript().is_none());
        let uploaded = video.uploaded_at.unwrap();
        assert_eq!(uploaded.to_rfc3339(), "2024-05-01T10:00:00.123456+00:00");
    }

    #[test]
    fn test_offset_timestamps_are_normalised_to_utc() {
        let mut raw = video_json("completed");
        raw["uploaded_at"] = json!("2024-05-01T12:00:00+02:00");
        let video: Video = serde_json::from_value(raw).unwrap();
        assert_eq!(video.uploaded_at.unwrap().to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn test_malformed_transcript_string_yields_empty_transcript() {
        let mut raw = video_json("completed");
        raw["transcript"] = json!("{not json");
        let video: Video = serde_json::from_value(raw).unwrap();
        assert_eq!(video.parsed_transcript(), Some(VideoTranscript::default()));
    }

    #[test]
    fn test_transcript_missing_key_moments_yields_empty_transcript() {
        let raw = json!(r#"{"segments": [{"timestamp_start": "00:00:01.000", "timestamp_end": "00:00:02.000", "text": "hi"}]}"#);
        assert_eq!(parse_transcript(&raw), Some(VideoTranscript::default()));
    }

    #[test]
    fn test_transcript_from_string_and_object() {
        let object = json!({
            "segments": [{"timestamp_start": "00:00:01.000", "timestamp_end": "00:00:04.500", "text": "Welcome"}],
            "key_moments": [{"label": "Intro", "timestamp_start": "00:00:01.000"}]
        });
        let from_object = parse_transcript(&object).unwrap();
        let from_string = parse_transcript(&Value::String(object.to_string())).unwrap();
        assert_eq!(from_object, from_string);
        assert_eq!(from_object.segments[0].text, "Welcome");
        assert_eq!(from_object.key_moments[0].label, "Intro");
    }

    #[test]
    fn test_quiz_parsing() {
        let quiz = json!({
            "title": "Checkpoint",
            "questions": [{
                "question_text": "Pick the primes",
                "question_type": "multiple-choice",
                "options": [
                    {"text": "2", "is_correct": true},
                    {"text": "4", "is_correct": false},
                    {"text": "5", "is_correct": true}
                ]
            }]
        });
        let parsed = parse_quiz(&Value::String(quiz.to_string())).unwrap();
        assert_eq!(parsed.questions[0].question_type, QuestionType::MultipleChoice);
        assert_eq!(parsed.questions[0].correct_options(), vec!["2", "5"]);

        assert!(parse_quiz(&json!("garbage")).is_none());
        assert!(parse_quiz(&json!({"title": "", "questions": []})).is_none());
        assert!(parse_quiz(&json!({"title": "No questions"})).is_none());
    }

    #[test]
    fn test_listing_flattens_video_fields() {
        let mut raw = video_json("completed");
        raw["project_name"] = json!("Physics");
        let listing: VideoListing = serde_json::from_value(raw).unwrap();
        assert_eq!(listing.video.id, 10);
        assert_eq!(listing.project_name.as_deref(), Some("Physics"));
    }

    #[test]
    fn test_chat_turn_serialization() {
        let turn = ChatTurn::user("What is entropy?");
        assert_eq!(
            serde_json::to_value(&turn).unwrap(),
            json!({"role": "user", "content": "What is entropy?"})
        );
    }
}
