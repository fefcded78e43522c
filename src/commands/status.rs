use anyhow::Result;

use crate::commands::CommandReport;
use crate::herald::config;
use crate::herald::lifecycle::Stage;
use crate::herald::store::StateFile;

const STAGES: [Stage; 5] = [
    Stage::Upcoming,
    Stage::Live,
    Stage::Archive,
    Stage::Video,
    Stage::None,
];

pub fn run() -> Result<CommandReport> {
    let cfg = config::load()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("state_file={}", cfg.state_file.display()));
    report.detail(format!("state_file_exists={}", cfg.state_file.exists()));
    report.detail(format!("api_key_set={}", cfg.api_key.is_some()));
    report.detail(format!(
        "default_webhook_set={}",
        cfg.default_webhook_url.is_some()
    ));
    report.detail(format!("display_tz={}", cfg.display_tz));

    let store = StateFile::load(&cfg.state_file)?;
    report.detail(format!("channels={}", store.channels().len()));
    report.detail(format!("videos={}", store.videos().len()));

    for stage in STAGES {
        let count = store.videos().iter().filter(|v| v.stage == stage).count();
        report.detail(format!("videos_{}={count}", stage.label()));
    }

    for channel in store.channels() {
        report.detail(format!(
            "channel={} name={} icon_cached={} target={}",
            channel.channel_id,
            channel.display_name,
            channel.icon_url.is_some(),
            channel.discord_target.as_deref().unwrap_or("default"),
        ));
    }

    Ok(report)
}
