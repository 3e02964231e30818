//! Engine configuration loader.

use std::path::Path;

use effects_core::EffectsConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for engine configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> LoadResult<EffectsConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<EffectsConfig> {
        let config: EffectsConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        if config.max_period_executions_per_tick == 0 {
            anyhow::bail!("max_period_executions_per_tick must be at least 1");
        }
        if config.period_epsilon.is_nan() || config.period_epsilon < 0.0 {
            anyhow::bail!("period_epsilon must be non-negative, got {}", config.period_epsilon);
        }
        Ok(config)
    }
}
