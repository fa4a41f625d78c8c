//! Transcript timeline: segment and key-moment lookup by playback time.

use shared::{KeyMoment, TranscriptSegment, VideoTranscript};

/// Convert an `HH:MM:SS.mmm` timestamp to seconds.
///
/// Fewer than three components yields 0; an unparsable component counts as 0.
pub fn timestamp_to_seconds(timestamp: &str) -> f64 {
    let parts: Vec<&str> = timestamp.split([':', '.']).collect();
    if parts.len() < 3 {
        return 0.0;
    }

    let field = |index: usize| -> f64 {
        parts
            .get(index)
            .and_then(|part| part.trim().parse::<u64>().ok())
            .unwrap_or(0) as f64
    };

    field(0) * 3600.0 + field(1) * 60.0 + field(2) + field(3) / 1000.0
}

/// Format seconds as `MM:SS`, or `H:MM:SS` past the hour
pub fn format_seconds(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimedSegment {
    pub start: f64,
    pub end: f64,
    pub segment: TranscriptSegment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimedKeyMoment {
    pub start: f64,
    pub moment: KeyMoment,
}

/// A transcript with its timestamps resolved to seconds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptTimeline {
    segments: Vec<TimedSegment>,
    key_moments: Vec<TimedKeyMoment>,
}

impl TranscriptTimeline {
    pub fn new(transcript: &VideoTranscript) -> Self {
        let segments = transcript
            .segments
            .iter()
            .map(|segment| TimedSegment {
                start: timestamp_to_seconds(&segment.timestamp_start),
                end: timestamp_to_seconds(&segment.timestamp_end),
                segment: segment.clone(),
            })
            .collect();
        let key_moments = transcript
            .key_moments
            .iter()
            .map(|moment| TimedKeyMoment {
                start: timestamp_to_seconds(&moment.timestamp_start),
                moment: moment.clone(),
            })
            .collect();

        Self {
            segments,
            key_moments,
        }
    }

    pub fn segments(&self) -> &[TimedSegment] {
        &self.segments
    }

    pub fn key_moments(&self) -> &[TimedKeyMoment] {
        &self.key_moments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.key_moments.is_empty()
    }

    /// Index of the first segment with `start <= t < end`
    pub fn active_segment(&self, t: f64) -> Option<usize> {
        self.segments
            .iter()
            .position(|s| t >= s.start && t < s.end)
    }

    /// Index of the key moment playing at `t`.
    ///
    /// A moment lasts until the next one starts; the last one lasts until
    /// `duration` when known.
    pub fn active_key_moment(&self, t: f64, duration: Option<f64>) -> Option<usize> {
        self.key_moments.iter().enumerate().position(|(i, moment)| {
            let end = self
                .key_moments
                .get(i + 1)
                .map(|next| next.start)
                .or(duration.filter(|d| d.is_finite()))
                .unwrap_or(f64::INFINITY);
            t >= moment.start && t < end
        })
    }
}

/// Playback URL of a stored video: the file name of `filepath` under the
/// static video base URL
pub fn video_source_url(static_base: &str, filepath: &str) -> Option<String> {
    let filename = filepath.rsplit(['/', '\\']).next()?;
    if filename.is_empty() {
        return None;
    }
    Some(format!("{}/{}", static_base.trim_end_matches('/'), filename))
}
