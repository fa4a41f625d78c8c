//! Local edit buffer for a video's tag set.

use shared::Video;

/// Snapshot of a video's tags being edited; nothing is persisted until the
/// controller saves the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEditor {
    video_id: i64,
    buffer: Vec<String>,
}

impl TagEditor {
    pub fn start(video: &Video) -> Self {
        Self {
            video_id: video.id,
            buffer: video.tags.clone(),
        }
    }

    pub fn video_id(&self) -> i64 {
        self.video_id
    }

    pub fn tags(&self) -> &[String] {
        &self.buffer
    }

    /// Add a trimmed tag; blanks and duplicates are ignored
    pub fn add(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.buffer.iter().any(|t| t == tag) {
            return false;
        }
        self.buffer.push(tag.to_string());
        true
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        match self.buffer.iter().position(|t| t == tag) {
            Some(index) => {
                self.buffer.remove(index);
                true
            }
            None => false,
        }
    }
}
