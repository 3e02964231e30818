//! Content loaders for reading effect data from files.
//!
//! RON carries definitions, curves and scenarios; TOML carries the engine
//! configuration. Every loader validates what it reads and reports problems
//! with the file they came from.

pub mod config;
pub mod curves;
pub mod definition;
pub mod factory;
pub mod scenario;

pub use config::ConfigLoader;
pub use curves::CurveLoader;
pub use definition::DefinitionLoader;
pub use factory::{Content, ContentFactory};
pub use scenario::{Scenario, ScenarioLoader, ScenarioStep, TargetSpec};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
