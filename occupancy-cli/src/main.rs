use std::{env, io};

use anyhow::{Context, Result};
use log::info;
use occupancy::{source_from_location, EventSource, OccupancyStore};

mod cli;
mod report;

fn setup_logging() {
    if env::var("LOG").is_err() {
        env::set_var("LOG", "occupancy=info,occupancy_cli=info");
    }

    pretty_env_logger::init_custom_env("LOG");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::parse(env::args().skip(1).collect());
    setup_logging();

    let source = source_from_location(&args.events);
    let store = OccupancyStore::new(args.policy);
    let snapshot = store
        .refresh(&source)
        .await
        .with_context(|| format!("Failed to load events from {}", source.describe()))?;

    info!(
        "Loaded {} events occupying {} days from {}",
        snapshot.events.len(),
        snapshot.index.len(),
        source.describe()
    );

    let stdout = io::stdout();
    report::write(&mut stdout.lock(), &args, &snapshot).context("Failed to write report")
}
