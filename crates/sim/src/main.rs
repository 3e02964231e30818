//! Scenario runner for the effects engine.
//!
//! Loads a content directory, plays one scenario against it and prints a
//! JSON report on stdout. Logs go to stderr, and to a file when
//! `--log-dir` (or `EFFECTS_LOG_DIR`) is set.
//!
//! ```bash
//! cargo run -p effects-sim -- duel --seed 7
//! RUST_LOG=effects_core=debug cargo run -p effects-sim
//! ```

mod config;
mod logging;
mod report;
mod runner;

use anyhow::{Context, Result};
use clap::Parser;
use effects_content::ContentFactory;

use crate::config::{Cli, SimConfig};
use crate::runner::{Simulation, resolve_seed};

fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = SimConfig::from(Cli::parse());
    let _guard = logging::setup_logging(config.log_dir.as_deref())?;

    tracing::info!("Content: {}", config.content_dir.display());
    let factory = ContentFactory::new(&config.content_dir);
    let content = factory.load_all()?;
    let scenario = factory
        .load_scenario(&config.scenario)
        .with_context(|| format!("loading scenario '{}'", config.scenario))?;

    let seed = resolve_seed(config.seed, &scenario);
    let report = Simulation::new(content, &scenario, seed).run(&scenario)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
