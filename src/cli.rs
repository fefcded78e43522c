use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::commands;
use crate::env_loader;

#[derive(Debug, Parser)]
#[command(name = "yt-herald")]
#[command(about = "YouTube upload/livestream watcher that posts Discord notifications")]
pub struct Cli {
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch feeds, reconcile state, and send due notifications.
    Run(RunArgs),
    /// Report configuration and the persisted channel/video tables.
    Status,
    /// Create an empty state file at the configured path.
    Init,
}

#[derive(Debug, Args, Default)]
pub struct RunArgs {
    /// Go through the full decision cycle without persisting or sending.
    #[arg(long)]
    pub dry_run: bool,
}

fn print_report(report: &commands::CommandReport, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("command: {}", report.command);
    println!("ok: {}", report.ok);
    if !report.details.is_empty() {
        println!("details:");
        for detail in &report.details {
            println!("- {detail}");
        }
    }
    if !report.issues.is_empty() {
        println!("issues:");
        for issue in &report.issues {
            println!("- {issue}");
        }
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    env_loader::load_dotenv();

    let report = match &cli.command {
        Command::Run(args) => commands::run::run(&commands::run::RunOptions {
            dry_run: args.dry_run,
        })?,
        Command::Status => commands::status::run()?,
        Command::Init => commands::init::run()?,
    };

    print_report(&report, cli.json)?;

    if report.ok {
        Ok(())
    } else {
        std::process::exit(2);
    }
}
