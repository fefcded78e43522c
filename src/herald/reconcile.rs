use crate::error::HeraldError;
use crate::herald::detect::{ChangeResult, detect_change};
use crate::herald::discord::{Notification, NotificationSink};
use crate::herald::feed::FeedSource;
use crate::herald::lifecycle::Stage;
use crate::herald::message;
use crate::herald::model::{ChannelRecord, FeedEntry, VideoApiInfo, VideoSnapshot};
use crate::herald::store::StateFile;
use crate::herald::warn::{self, WarnEvent};
use crate::herald::youtube::VideoApi;
use anyhow::Result;
use chrono_tz::Tz;

/// Where one (channel, feed entry) pair landed after a fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// First observation with an actionable stage: row appended, notified.
    Recorded { notified: bool },
    /// No actionable information (unknown id, lookup failure, or the `none`
    /// sentinel): nothing persisted, nothing notified.
    Ignored,
    /// Known video whose feed freshness timestamp did not move: no-op.
    Stable,
    /// Known video already in a settled stage: terminal, never re-checked.
    Settled,
    /// Fresh lookup ran and the row was rewritten, but nothing was
    /// notification-worthy.
    Refreshed,
    /// A meaningful change was detected and announced.
    Changed { notified: bool, description: String },
}

#[derive(Debug, Default)]
pub struct ChannelOutcome {
    pub entries: usize,
    pub recorded: usize,
    pub ignored: usize,
    pub stable: usize,
    pub settled: usize,
    pub refreshed: usize,
    pub changed: usize,
    pub notified: usize,
    pub notes: Vec<String>,
}

impl ChannelOutcome {
    fn tally(&mut self, entry: &FeedEntry, outcome: &EntryOutcome) {
        self.entries += 1;
        let label = match outcome {
            EntryOutcome::Recorded { notified } => {
                self.recorded += 1;
                if *notified {
                    self.notified += 1;
                }
                "recorded"
            }
            EntryOutcome::Ignored => {
                self.ignored += 1;
                "ignored"
            }
            EntryOutcome::Stable => {
                self.stable += 1;
                "stable"
            }
            EntryOutcome::Settled => {
                self.settled += 1;
                "settled"
            }
            EntryOutcome::Refreshed => {
                self.refreshed += 1;
                "refreshed"
            }
            EntryOutcome::Changed {
                notified,
                description,
            } => {
                self.changed += 1;
                if *notified {
                    self.notified += 1;
                }
                self.notes
                    .push(format!("video={} change {description}", entry.video_id));
                "changed"
            }
        };
        self.notes
            .push(format!("video={} outcome={label}", entry.video_id));
    }

    pub fn any_update(&self) -> bool {
        self.recorded > 0 || self.changed > 0
    }
}

/// Drives the per-entry state machine for one channel per run: decides
/// new-vs-known, triggers the metadata lookup only when the feed says
/// something moved, persists snapshots, and hands composed text to the sink.
pub struct Reconciler<'a> {
    pub feed: &'a dyn FeedSource,
    pub api: &'a dyn VideoApi,
    pub sink: &'a dyn NotificationSink,
    pub display_tz: Tz,
    pub dry_run: bool,
}

impl Reconciler<'_> {
    /// Process every recent feed entry for one channel. A feed fetch failure
    /// propagates and aborts this channel only; everything below the feed is
    /// fail-soft per entry.
    pub fn process_channel(
        &self,
        store: &mut StateFile,
        channel: &ChannelRecord,
        icon_url: Option<&str>,
    ) -> Result<ChannelOutcome, HeraldError> {
        let entries = self.feed.recent_entries(&channel.channel_id)?;

        let mut outcome = ChannelOutcome::default();
        for entry in &entries {
            match self.process_entry(store, channel, icon_url, entry) {
                Ok(entry_outcome) => outcome.tally(entry, &entry_outcome),
                Err(err) => {
                    warn::emit(WarnEvent {
                        code: "ENTRY_PERSIST_FAILED",
                        stage: "reconcile",
                        channel: &channel.channel_id,
                        video: &entry.video_id,
                        reason: "state-write-failed",
                        err: &format!("{err:#}"),
                    });
                    outcome
                        .notes
                        .push(format!("video={} outcome=error", entry.video_id));
                }
            }
        }
        Ok(outcome)
    }

    fn process_entry(
        &self,
        store: &mut StateFile,
        channel: &ChannelRecord,
        icon_url: Option<&str>,
        entry: &FeedEntry,
    ) -> Result<EntryOutcome> {
        match store.find_video(&entry.video_id).cloned() {
            None => self.process_unseen(store, channel, icon_url, entry),
            Some(snapshot) => self.process_known(store, channel, icon_url, entry, snapshot),
        }
    }

    fn process_unseen(
        &self,
        store: &mut StateFile,
        channel: &ChannelRecord,
        icon_url: Option<&str>,
        entry: &FeedEntry,
    ) -> Result<EntryOutcome> {
        let Some(info) = self.lookup(channel, &entry.video_id) else {
            return Ok(EntryOutcome::Ignored);
        };
        if info.stage == Stage::None {
            return Ok(EntryOutcome::Ignored);
        }

        let snapshot = VideoSnapshot {
            video_id: entry.video_id.clone(),
            title: entry.title.clone(),
            published_at: entry.published_at,
            last_updated_at: entry.updated_at,
            channel_name: channel.display_name.clone(),
            stage: info.stage,
            scheduled_start: info.scheduled_start,
            actual_start: info.actual_start,
            duration_text: info.duration_text.clone(),
        };
        if !self.dry_run {
            store.append_video(snapshot)?;
        }

        let text = message::description_text(
            info.stage,
            info.display_time(),
            &info.duration_text,
            self.display_tz,
            None,
        );
        let notified = self.notify(channel, icon_url, &entry.video_id, &text);
        Ok(EntryOutcome::Recorded { notified })
    }

    fn process_known(
        &self,
        store: &mut StateFile,
        channel: &ChannelRecord,
        icon_url: Option<&str>,
        entry: &FeedEntry,
        snapshot: VideoSnapshot,
    ) -> Result<EntryOutcome> {
        if snapshot.stage.is_settled() {
            return Ok(EntryOutcome::Settled);
        }
        if entry.updated_at == snapshot.last_updated_at {
            return Ok(EntryOutcome::Stable);
        }

        let Some(info) = self.lookup(channel, &entry.video_id) else {
            return Ok(EntryOutcome::Ignored);
        };
        if info.stage == Stage::None {
            // Likely the eventual-consistency window around a transition;
            // keep the last good snapshot untouched.
            return Ok(EntryOutcome::Ignored);
        }

        let change = detect_change(&snapshot, &info);

        let updated = VideoSnapshot {
            video_id: snapshot.video_id.clone(),
            title: info.title.clone(),
            published_at: entry.published_at,
            last_updated_at: entry.updated_at,
            channel_name: snapshot.channel_name.clone(),
            stage: info.stage,
            scheduled_start: info.scheduled_start,
            actual_start: info.actual_start,
            duration_text: info.duration_text.clone(),
        };
        if !self.dry_run {
            store.update_video(updated)?;
        }

        let (text, description) = match &change {
            ChangeResult::Unchanged => return Ok(EntryOutcome::Refreshed),
            ChangeResult::StageChanged(stage) => (
                message::description_text(
                    *stage,
                    info.display_time(),
                    &info.duration_text,
                    self.display_tz,
                    None,
                ),
                format!("stage {}->{}", snapshot.stage.label(), stage.label()),
            ),
            ChangeResult::ScheduleShifted(new_time) => (
                message::description_text(
                    info.stage,
                    info.display_time(),
                    &info.duration_text,
                    self.display_tz,
                    Some(&message::schedule_shift_text(*new_time, self.display_tz)),
                ),
                "schedule shifted".to_string(),
            ),
            ChangeResult::TitleChanged(new_title) => (
                message::description_text(
                    info.stage,
                    info.display_time(),
                    &info.duration_text,
                    self.display_tz,
                    Some(&message::title_change_text(new_title)),
                ),
                "title changed".to_string(),
            ),
        };

        let notified = self.notify(channel, icon_url, &entry.video_id, &text);
        Ok(EntryOutcome::Changed {
            notified,
            description,
        })
    }

    /// Fail-soft metadata lookup: an API failure or empty result degrades to
    /// "no information" for this one video instead of aborting the iteration.
    fn lookup(&self, channel: &ChannelRecord, video_id: &str) -> Option<VideoApiInfo> {
        match self.api.video_info(video_id) {
            Ok(Some(info)) => Some(info),
            Ok(None) => {
                warn::emit(WarnEvent {
                    code: "VIDEO_INFO_EMPTY",
                    stage: "lookup",
                    channel: &channel.channel_id,
                    video: video_id,
                    reason: "no-items-in-response",
                    err: "na",
                });
                None
            }
            Err(err) => {
                warn::emit(WarnEvent {
                    code: "VIDEO_INFO_FAILED",
                    stage: "lookup",
                    channel: &channel.channel_id,
                    video: video_id,
                    reason: "api-lookup-failed",
                    err: &format!("{err}"),
                });
                None
            }
        }
    }

    fn notify(
        &self,
        channel: &ChannelRecord,
        icon_url: Option<&str>,
        video_id: &str,
        text: &str,
    ) -> bool {
        if self.dry_run {
            return false;
        }
        let note = Notification {
            channel_name: channel.display_name.clone(),
            avatar_url: icon_url.map(str::to_string),
            video_id: video_id.to_string(),
            text: text.to_string(),
            target: channel.discord_target.clone(),
        };
        match self.sink.send(&note) {
            Ok(()) => true,
            Err(err) => {
                warn::emit(WarnEvent {
                    code: "WEBHOOK_SEND_FAILED",
                    stage: "notify",
                    channel: &channel.channel_id,
                    video: video_id,
                    reason: "delivery-failed",
                    err: &format!("{err}"),
                });
                false
            }
        }
    }
}
