use anyhow::Result;

use crate::commands::CommandReport;
use crate::herald::config;
use crate::herald::store::StateFile;

pub fn run() -> Result<CommandReport> {
    let cfg = config::load()?;
    let mut report = CommandReport::new("init");

    report.detail(format!("state_file={}", cfg.state_file.display()));
    if StateFile::init(&cfg.state_file)? {
        report.detail("created empty state file");
    } else {
        report.detail("state file already exists; left untouched");
    }

    Ok(report)
}
