use anyhow::Result;

use crate::commands::CommandReport;
use crate::herald::config;
use crate::herald::coordinator::Coordinator;
use crate::herald::discord::{DiscordWebhook, HttpProbe};
use crate::herald::feed::HttpFeedSource;
use crate::herald::lock;
use crate::herald::reconcile::Reconciler;
use crate::herald::store::StateFile;
use crate::herald::youtube::DataApi;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dry_run: bool,
}

pub fn run(opts: &RunOptions) -> Result<CommandReport> {
    let cfg = config::load()?;
    let mut report = CommandReport::new("run");

    report.detail(format!("state_file={}", cfg.state_file.display()));
    report.detail(format!("dry_run={}", opts.dry_run));

    let lock_path = lock::lock_path_for_state(&cfg.state_file);
    let Some(_lock) = lock::acquire(&lock_path, cfg.lock_wait)? else {
        // Another run is still in flight; skipping is the intended behavior
        // for overlapping schedules, not a failure.
        report.detail("another run holds the lock; skipped");
        return Ok(report);
    };

    let mut store = StateFile::load(&cfg.state_file)?;
    report.detail(format!("channels={}", store.channels().len()));
    report.detail(format!("known_videos={}", store.videos().len()));

    if store.channels().is_empty() {
        report.detail("no channels configured; nothing to do");
        return Ok(report);
    }

    let Some(api_key) = cfg.api_key.clone() else {
        report.issue("HERALD_YOUTUBE_API_KEY is not set");
        return Ok(report);
    };
    if cfg.default_webhook_url.is_none() {
        report.detail("HERALD_WEBHOOK_URL unset; only per-channel targets can deliver");
    }

    let feed = HttpFeedSource::new(&cfg)?;
    let api = DataApi::new(&cfg, api_key)?;
    let sink = DiscordWebhook::new(&cfg)?;
    let probe = HttpProbe::new(cfg.http_timeout)?;

    let coordinator = Coordinator {
        reconciler: Reconciler {
            feed: &feed,
            api: &api,
            sink: &sink,
            display_tz: cfg.display_tz,
            dry_run: opts.dry_run,
        },
        probe: &probe,
    };
    let summary = coordinator.run_all(&mut store);

    report.detail(format!("recorded={}", summary.recorded));
    report.detail(format!("changed={}", summary.changed));
    report.detail(format!("notified={}", summary.notified));
    report.detail(format!("any_update={}", summary.any_update));
    for note in &summary.notes {
        report.detail(note.clone());
    }
    if summary.failed_channels > 0 {
        report.issue(format!(
            "{} of {} channels aborted on feed fetch",
            summary.failed_channels, summary.channels
        ));
    }

    Ok(report)
}
