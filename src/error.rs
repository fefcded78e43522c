use thiserror::Error;

/// Typed failure reasons for the I/O collaborators. Callers decide per call
/// site whether a variant aborts the channel, skips the entry, or only logs.
#[derive(Debug, Error)]
pub enum HeraldError {
    #[error("feed unavailable for channel {channel_id}: {reason}")]
    FeedUnavailable { channel_id: String, reason: String },
    #[error("video lookup failed for {video_id}: {reason}")]
    LookupFailed { video_id: String, reason: String },
    #[error("webhook rejected notification: {0}")]
    WebhookRejected(String),
    #[error("no webhook configured for target {0}")]
    WebhookMissing(String),
}
