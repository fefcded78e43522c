use crate::herald::lifecycle::Stage;
use crate::herald::model::{VideoApiInfo, VideoSnapshot};
use chrono::{DateTime, Utc};

/// Outcome of diffing a fresh API observation against the stored snapshot.
/// Variants are checked in declaration order: a stage change masks a schedule
/// shift, which masks a title change, within the same cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeResult {
    Unchanged,
    StageChanged(Stage),
    ScheduleShifted(DateTime<Utc>),
    TitleChanged(String),
}

/// Pure decision: is the difference between `prev` and `cur` worth a
/// notification? Persistence is the engine's job, not ours.
///
/// A current stage of `None` means the metadata is mid-transition; report
/// nothing rather than a spurious change.
pub fn detect_change(prev: &VideoSnapshot, cur: &VideoApiInfo) -> ChangeResult {
    if cur.stage == Stage::None {
        return ChangeResult::Unchanged;
    }
    if cur.stage != prev.stage {
        return ChangeResult::StageChanged(cur.stage);
    }
    if cur.stage == Stage::Upcoming
        && cur.scheduled_start != prev.scheduled_start
        && let Some(shifted) = cur.scheduled_start
    {
        return ChangeResult::ScheduleShifted(shifted);
    }
    if cur.title != prev.title {
        return ChangeResult::TitleChanged(cur.title.clone());
    }
    ChangeResult::Unchanged
}

#[cfg(test)]
mod tests {
    use super::{ChangeResult, detect_change};
    use crate::herald::lifecycle::Stage;
    use crate::herald::model::{VideoApiInfo, VideoSnapshot};
    use chrono::{TimeZone, Utc};

    fn ts(secs: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("timestamp")
    }

    fn snapshot(stage: Stage) -> VideoSnapshot {
        VideoSnapshot {
            video_id: "vid-1".to_string(),
            title: "Stream A".to_string(),
            published_at: ts(1_000),
            last_updated_at: ts(2_000),
            channel_name: "Chan".to_string(),
            stage,
            scheduled_start: Some(ts(10_000)),
            actual_start: None,
            duration_text: "00:00:00".to_string(),
        }
    }

    fn info(stage: Stage) -> VideoApiInfo {
        VideoApiInfo {
            stage,
            title: "Stream A".to_string(),
            scheduled_start: Some(ts(10_000)),
            actual_start: None,
            duration_text: "00:00:00".to_string(),
        }
    }

    #[test]
    fn identical_observation_is_unchanged() {
        let prev = snapshot(Stage::Upcoming);
        let cur = info(Stage::Upcoming);
        assert_eq!(detect_change(&prev, &cur), ChangeResult::Unchanged);
    }

    #[test]
    fn stage_change_is_reported() {
        let prev = snapshot(Stage::Upcoming);
        let mut cur = info(Stage::Live);
        cur.actual_start = Some(ts(10_050));
        assert_eq!(
            detect_change(&prev, &cur),
            ChangeResult::StageChanged(Stage::Live)
        );
    }

    #[test]
    fn stage_change_masks_title_change() {
        let prev = snapshot(Stage::Upcoming);
        let mut cur = info(Stage::Live);
        cur.title = "Renamed".to_string();
        assert_eq!(
            detect_change(&prev, &cur),
            ChangeResult::StageChanged(Stage::Live)
        );
    }

    #[test]
    fn schedule_shift_on_upcoming() {
        let prev = snapshot(Stage::Upcoming);
        let mut cur = info(Stage::Upcoming);
        cur.scheduled_start = Some(ts(20_000));
        assert_eq!(
            detect_change(&prev, &cur),
            ChangeResult::ScheduleShifted(ts(20_000))
        );
    }

    #[test]
    fn schedule_shift_masks_title_change() {
        let prev = snapshot(Stage::Upcoming);
        let mut cur = info(Stage::Upcoming);
        cur.scheduled_start = Some(ts(20_000));
        cur.title = "Renamed".to_string();
        assert_eq!(
            detect_change(&prev, &cur),
            ChangeResult::ScheduleShifted(ts(20_000))
        );
    }

    #[test]
    fn title_change_alone_is_reported() {
        let prev = snapshot(Stage::Live);
        let mut cur = info(Stage::Live);
        cur.title = "Renamed".to_string();
        assert_eq!(
            detect_change(&prev, &cur),
            ChangeResult::TitleChanged("Renamed".to_string())
        );
    }

    #[test]
    fn none_stage_short_circuits_to_unchanged() {
        let prev = snapshot(Stage::Upcoming);
        let mut cur = info(Stage::None);
        cur.title = "Renamed".to_string();
        assert_eq!(detect_change(&prev, &cur), ChangeResult::Unchanged);
    }

    #[test]
    fn schedule_comparison_ignored_outside_upcoming() {
        let prev = snapshot(Stage::Live);
        let mut cur = info(Stage::Live);
        cur.scheduled_start = Some(ts(20_000));
        assert_eq!(detect_change(&prev, &cur), ChangeResult::Unchanged);
    }
}
