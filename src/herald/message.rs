use crate::herald::lifecycle::Stage;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Render a timestamp in the display timezone, e.g. `01/01 19:00`.
pub fn format_day_time(time: DateTime<Utc>, tz: Tz) -> String {
    time.with_timezone(&tz).format("%m/%d %H:%M").to_string()
}

fn format_time(time: DateTime<Utc>, tz: Tz) -> String {
    time.with_timezone(&tz).format("%H:%M").to_string()
}

/// Compose the end-user notification text for a stage.
///
/// An override (schedule-shift or title-change wording) always wins over the
/// stage-based template. Upcoming/live need a timestamp; when it is missing
/// the generic fallback is used instead of rendering a hole.
pub fn description_text(
    stage: Stage,
    time: Option<DateTime<Utc>>,
    duration: &str,
    tz: Tz,
    override_text: Option<&str>,
) -> String {
    if let Some(text) = override_text {
        return text.to_string();
    }

    match stage {
        Stage::Upcoming => match time {
            Some(t) => format!("{}から配信予定！", format_day_time(t, tz)),
            None => "new content!".to_string(),
        },
        Stage::Live => match time {
            Some(t) => format!("{}から配信中！", format_time(t, tz)),
            None => "new content!".to_string(),
        },
        Stage::Archive | Stage::None => {
            format!("アーカイブはこちら\n配信時間 {duration}")
        }
        Stage::Video => format!("動画が投稿されました\n動画時間 {duration}"),
    }
}

pub fn schedule_shift_text(new_time: DateTime<Utc>, tz: Tz) -> String {
    format!(
        "配信予定が {} に変更されました。",
        format_day_time(new_time, tz)
    )
}

pub fn title_change_text(new_title: &str) -> String {
    format!("配信タイトルが {new_title} に更新されました。")
}
