use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
mod prefs;
mod tui;

#[derive(Parser)]
#[command(name = "highcard")]
#[command(about = "Ten rounds of high-card against the computer", long_about = None)]
struct Cli {
    /// Device longitude (the location provider). Omit to play without a
    /// location; session start stays disabled until one is given.
    #[arg(short, long)]
    longitude: Option<f64>,

    /// Base URL of the deck-of-cards service
    #[arg(long, default_value = highcard_core::deck::DEFAULT_BASE_URL)]
    api: String,

    /// Preference file holding the saved player name
    #[arg(long, default_value = "highcard-prefs.json")]
    prefs: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Log to a file so tracing output never lands on the alternate screen.
    // Enabled only when RUST_LOG is set.
    if std::env::var("RUST_LOG").is_ok()
        && let Ok(log_file) = std::fs::File::create("highcard.log")
    {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::sync::Mutex::new(log_file))
            .with_ansi(false)
            .init();
    }

    let app = app::App::new(cli.prefs, cli.longitude, cli.api);
    if let Err(e) = app.run().await {
        eprintln!("Error: {}", e);
    }
}
