use crate::herald::lifecycle::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the channels table. Loaded once per run; only the cached icon
/// URL is ever mutated, and rows are never deleted by this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub display_name: String,
    pub channel_id: String,
    #[serde(default)]
    pub icon_url: Option<String>,
    /// Names the webhook this channel posts to; `None` means the default.
    #[serde(default)]
    pub discord_target: Option<String>,
}

/// One row of the videos table: the last persisted observation of a video.
/// Created on first observation with an actionable stage, updated in place on
/// every later change, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSnapshot {
    pub video_id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    /// Feed-supplied freshness timestamp; the cheap change pre-filter.
    pub last_updated_at: DateTime<Utc>,
    pub channel_name: String,
    pub stage: Stage,
    #[serde(default)]
    pub scheduled_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_start: Option<DateTime<Utc>>,
    pub duration_text: String,
}

/// One item from a channel's syndication feed. Ephemeral; at most the five
/// most recent entries are considered per channel per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub video_id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle-relevant fields from one metadata API lookup. Ephemeral; used to
/// resolve a feed entry into a snapshot or to diff against a prior snapshot.
#[derive(Debug, Clone)]
pub struct VideoApiInfo {
    pub stage: Stage,
    pub title: String,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub actual_start: Option<DateTime<Utc>>,
    /// Already rendered to `HH:MM:SS`.
    pub duration_text: String,
}

impl VideoApiInfo {
    /// The timestamp shown in notifications: actual start when the stream has
    /// begun, otherwise the scheduled start.
    pub fn display_time(&self) -> Option<DateTime<Utc>> {
        self.actual_start.or(self.scheduled_start)
    }
}
