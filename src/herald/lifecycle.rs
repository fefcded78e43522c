use serde::{Deserialize, Deserializer, Serialize};

/// Lifecycle stage of a video at observation time.
///
/// `None` is a terminal sentinel: live-streaming metadata exists but is in a
/// transitional shape that matches no actionable state, so nothing is notified
/// for it now or later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Upcoming,
    Live,
    Archive,
    Video,
    None,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Upcoming => "upcoming",
            Stage::Live => "live",
            Stage::Archive => "archive",
            Stage::Video => "video",
            Stage::None => "none",
        }
    }

    /// Settled stages are never re-checked against the API in later runs.
    pub fn is_settled(self) -> bool {
        matches!(self, Stage::Archive | Stage::Video | Stage::None)
    }

    /// Stored rows may carry stage strings written by older runs or by hand;
    /// anything unrecognized is treated as the non-actionable sentinel.
    pub fn parse_lenient(raw: &str) -> Stage {
        match raw.trim() {
            "upcoming" => Stage::Upcoming,
            "live" => Stage::Live,
            "archive" => Stage::Archive,
            "video" => Stage::Video,
            _ => Stage::None,
        }
    }
}

impl<'de> Deserialize<'de> for Stage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Stage::parse_lenient(&raw))
    }
}

/// The live-streaming timestamps the metadata lookup may or may not return.
/// YouTube populates these asynchronously around stream start and end, so any
/// subset can be present on a given call.
#[derive(Debug, Clone, Default)]
pub struct LiveStreamingDetails {
    pub scheduled_start: Option<chrono::DateTime<chrono::Utc>>,
    pub actual_start: Option<chrono::DateTime<chrono::Utc>>,
    pub actual_end: Option<chrono::DateTime<chrono::Utc>>,
}

/// Map the presence/absence of live-streaming timestamps to one stage.
/// First match wins; the final arm absorbs the transitional window where a
/// stream is between states and none of the other rules hold.
pub fn classify(details: Option<&LiveStreamingDetails>) -> Stage {
    let Some(details) = details else {
        return Stage::Video;
    };
    if details.actual_start.is_some() && details.actual_end.is_none() {
        return Stage::Live;
    }
    if details.actual_start.is_none() && details.scheduled_start.is_some() {
        return Stage::Upcoming;
    }
    if details.actual_end.is_some() {
        return Stage::Archive;
    }
    Stage::None
}

#[cfg(test)]
mod tests {
    use super::{LiveStreamingDetails, Stage, classify};
    use chrono::{TimeZone, Utc};

    fn ts(secs: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("timestamp")
    }

    #[test]
    fn no_metadata_is_plain_video() {
        assert_eq!(classify(None), Stage::Video);
    }

    #[test]
    fn started_but_not_ended_is_live() {
        let details = LiveStreamingDetails {
            scheduled_start: Some(ts(100)),
            actual_start: Some(ts(110)),
            actual_end: None,
        };
        assert_eq!(classify(Some(&details)), Stage::Live);
    }

    #[test]
    fn scheduled_but_not_started_is_upcoming() {
        let details = LiveStreamingDetails {
            scheduled_start: Some(ts(100)),
            actual_start: None,
            actual_end: None,
        };
        assert_eq!(classify(Some(&details)), Stage::Upcoming);
    }

    #[test]
    fn ended_is_archive() {
        let details = LiveStreamingDetails {
            scheduled_start: Some(ts(100)),
            actual_start: Some(ts(110)),
            actual_end: Some(ts(200)),
        };
        assert_eq!(classify(Some(&details)), Stage::Archive);
    }

    #[test]
    fn empty_metadata_is_the_none_sentinel() {
        let details = LiveStreamingDetails::default();
        assert_eq!(classify(Some(&details)), Stage::None);
    }

    #[test]
    fn settled_stages() {
        assert!(Stage::Archive.is_settled());
        assert!(Stage::Video.is_settled());
        assert!(Stage::None.is_settled());
        assert!(!Stage::Upcoming.is_settled());
        assert!(!Stage::Live.is_settled());
    }

    #[test]
    fn lenient_parse_maps_unknown_to_none() {
        assert_eq!(Stage::parse_lenient("live"), Stage::Live);
        assert_eq!(Stage::parse_lenient("completed"), Stage::None);
    }

    #[test]
    fn stage_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Stage::Upcoming).expect("serialize");
        assert_eq!(json, "\"upcoming\"");
        let parsed: Stage = serde_json::from_str("\"archive\"").expect("deserialize");
        assert_eq!(parsed, Stage::Archive);
    }

    #[test]
    fn unknown_stored_stage_deserializes_to_none() {
        let parsed: Stage = serde_json::from_str("\"completed\"").expect("deserialize");
        assert_eq!(parsed, Stage::None);
    }
}
