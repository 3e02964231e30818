//! Simulator configuration from the command line and the environment.
use std::path::PathBuf;

use clap::Parser;

/// Play one effects scenario and print its report as JSON
#[derive(Parser, Debug)]
#[command(name = "effects-sim", version, about, long_about = None)]
pub struct Cli {
    /// Scenario name under `scenarios/`, without extension
    #[arg(value_name = "SCENARIO", env = "EFFECTS_SCENARIO", default_value = "duel")]
    pub scenario: String,

    /// Directory holding config.toml, curves.ron, effects.ron and scenarios/
    #[arg(short, long, value_name = "DIR", env = "EFFECTS_CONTENT_DIR")]
    pub content_dir: Option<PathBuf>,

    /// Seed for chance rolls, overriding the scenario's own
    #[arg(short, long, env = "EFFECTS_SEED")]
    pub seed: Option<u64>,

    /// Also write logs to effects-sim.log in this directory
    #[arg(long, value_name = "DIR", env = "EFFECTS_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Directory holding `config.toml`, `curves.ron`, `effects.ron` and
    /// `scenarios/`.
    pub content_dir: PathBuf,
    /// Scenario name under `scenarios/`, without extension.
    pub scenario: String,
    pub log_dir: Option<PathBuf>,
    /// Overrides the scenario's own seed.
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            scenario: "duel".to_string(),
            log_dir: None,
            seed: None,
        }
    }
}

impl From<Cli> for SimConfig {
    fn from(cli: Cli) -> Self {
        Self {
            content_dir: cli.content_dir.unwrap_or_else(default_content_dir),
            scenario: cli.scenario,
            log_dir: cli.log_dir,
            seed: cli.seed,
        }
    }
}

fn default_content_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}
