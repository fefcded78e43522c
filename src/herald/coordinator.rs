use crate::herald::discord::UrlProbe;
use crate::herald::model::ChannelRecord;
use crate::herald::reconcile::Reconciler;
use crate::herald::store::StateFile;
use crate::herald::warn::{self, WarnEvent};

#[derive(Debug, Default)]
pub struct RunSummary {
    pub channels: usize,
    pub failed_channels: usize,
    pub recorded: usize,
    pub changed: usize,
    pub notified: usize,
    pub any_update: bool,
    pub notes: Vec<String>,
}

/// Walks every configured channel in order. A channel failure is logged and
/// never gates the channels after it; `any_update` exists for the report only.
pub struct Coordinator<'a> {
    pub reconciler: Reconciler<'a>,
    pub probe: &'a dyn UrlProbe,
}

impl Coordinator<'_> {
    pub fn run_all(&self, store: &mut StateFile) -> RunSummary {
        let channels: Vec<ChannelRecord> = store.channels().to_vec();
        let mut summary = RunSummary {
            channels: channels.len(),
            ..RunSummary::default()
        };

        for channel in &channels {
            let icon_url = self.resolve_icon(store, channel);
            match self
                .reconciler
                .process_channel(store, channel, icon_url.as_deref())
            {
                Ok(outcome) => {
                    summary.recorded += outcome.recorded;
                    summary.changed += outcome.changed;
                    summary.notified += outcome.notified;
                    summary.any_update |= outcome.any_update();
                    summary.notes.push(format!(
                        "channel={} entries={} recorded={} changed={} stable={} settled={} ignored={}",
                        channel.channel_id,
                        outcome.entries,
                        outcome.recorded,
                        outcome.changed,
                        outcome.stable,
                        outcome.settled,
                        outcome.ignored,
                    ));
                    for note in outcome.notes {
                        summary.notes.push(format!("channel={} {note}", channel.channel_id));
                    }
                }
                Err(err) => {
                    summary.failed_channels += 1;
                    warn::emit(WarnEvent {
                        code: "CHANNEL_ABORTED",
                        stage: "coordinator",
                        channel: &channel.channel_id,
                        video: "na",
                        reason: "feed-fetch-failed",
                        err: &format!("{err}"),
                    });
                    summary
                        .notes
                        .push(format!("channel={} aborted", channel.channel_id));
                }
            }
        }

        summary
    }

    /// Cached icon when it still answers; otherwise fetch a fresh one from the
    /// channel metadata lookup and persist it. `None` lets the sink fall back
    /// to its default avatar.
    fn resolve_icon(&self, store: &mut StateFile, channel: &ChannelRecord) -> Option<String> {
        if let Some(cached) = &channel.icon_url
            && !cached.trim().is_empty()
            && self.probe.is_reachable(cached)
        {
            return Some(cached.clone());
        }

        match self.reconciler.api.channel_icon_url(&channel.channel_id) {
            Ok(Some(fresh)) => {
                if !self.reconciler.dry_run
                    && let Err(err) = store.set_channel_icon(&channel.channel_id, &fresh)
                {
                    warn::emit(WarnEvent {
                        code: "ICON_PERSIST_FAILED",
                        stage: "coordinator",
                        channel: &channel.channel_id,
                        video: "na",
                        reason: "state-write-failed",
                        err: &format!("{err:#}"),
                    });
                }
                Some(fresh)
            }
            Ok(None) => {
                warn::emit(WarnEvent {
                    code: "CHANNEL_INFO_EMPTY",
                    stage: "coordinator",
                    channel: &channel.channel_id,
                    video: "na",
                    reason: "no-items-in-response",
                    err: "na",
                });
                None
            }
            Err(err) => {
                warn::emit(WarnEvent {
                    code: "CHANNEL_INFO_FAILED",
                    stage: "coordinator",
                    channel: &channel.channel_id,
                    video: "na",
                    reason: "icon-lookup-failed",
                    err: &format!("{err}"),
                });
                None
            }
        }
    }
}
