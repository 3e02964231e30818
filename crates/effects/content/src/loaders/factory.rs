//! Content factory for loading a whole data directory.

use std::path::{Path, PathBuf};

use effects_core::{CurveRegistry, CurveSource, EffectsConfig};
use tracing::info;

use crate::catalog::DefinitionCatalog;
use crate::loaders::{ConfigLoader, CurveLoader, DefinitionLoader, LoadResult, Scenario, ScenarioLoader};

/// Everything the engine needs from a data directory.
#[derive(Debug, Clone)]
pub struct Content {
    pub config: EffectsConfig,
    pub curves: CurveRegistry,
    pub definitions: DefinitionCatalog,
}

/// Content factory that loads effect content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── curves.ron
/// ├── effects.ron
/// └── scenarios/
///     └── duel.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load engine configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<EffectsConfig> {
        ConfigLoader::load(&self.data_dir.join("config.toml"))
    }

    /// Load curve tables from `curves.ron`.
    pub fn load_curves(&self) -> LoadResult<CurveRegistry> {
        CurveLoader::load(&self.data_dir.join("curves.ron"))
    }

    /// Load effect definitions from `effects.ron`.
    pub fn load_definitions(&self) -> LoadResult<DefinitionCatalog> {
        DefinitionLoader::load_catalog(&self.data_dir.join("effects.ron"))
    }

    /// Load a scenario from `scenarios/{name}.ron`.
    pub fn load_scenario(&self, name: &str) -> LoadResult<Scenario> {
        let path = self.data_dir.join("scenarios").join(format!("{}.ron", name));
        ScenarioLoader::load(&path)
    }

    /// Loads config, curves and definitions, and checks that every curve a
    /// definition samples exists.
    pub fn load_all(&self) -> LoadResult<Content> {
        let config = self.load_config()?;
        let curves = self.load_curves()?;
        let definitions = self.load_definitions()?;

        for definition in definitions.iter() {
            for handle in definition.curve_handles() {
                if let Err(e) = curves.sample(handle, 1.0) {
                    anyhow::bail!("Effect '{}' samples a missing curve: {}", definition.name, e);
                }
            }
        }

        info!(
            dir = %self.data_dir.display(),
            definitions = definitions.len(),
            curve_tables = curves.len(),
            "content loaded"
        );
        Ok(Content {
            config,
            curves,
            definitions,
        })
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
    }
}
