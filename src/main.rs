mod cli;
mod commands;
mod env_loader;
mod error;
mod herald;

fn main() {
    if let Err(err) = cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
