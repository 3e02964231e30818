//! Effect definition catalog loader.

use std::collections::HashSet;
use std::path::Path;

use effects_core::{EffectDefinition, EffectsConfig, ModOp, Name};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::DefinitionCatalog;
use crate::loaders::{LoadResult, read_file};

/// Definition catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionFile {
    pub effects: Vec<EffectDefinition>,
}

/// Loader for effect definitions from RON files.
pub struct DefinitionLoader;

impl DefinitionLoader {
    /// Load definitions from a RON file, in file order.
    pub fn load(path: &Path) -> LoadResult<Vec<EffectDefinition>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn load_catalog(path: &Path) -> LoadResult<DefinitionCatalog> {
        Ok(Self::load(path)?.into_iter().collect())
    }

    pub fn parse(content: &str) -> LoadResult<Vec<EffectDefinition>> {
        let file: DefinitionFile = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse effect catalog RON: {}", e))?;

        let mut seen: HashSet<Name> = HashSet::new();
        for definition in &file.effects {
            if !seen.insert(definition.name) {
                anyhow::bail!("Effect '{}' is defined more than once", definition.name);
            }
            validate(definition)?;
        }
        Ok(file.effects)
    }
}

/// Checks the constant parts of a definition. Curve-driven values are
/// checked when they are sampled.
fn validate(definition: &EffectDefinition) -> LoadResult<()> {
    let name = definition.name;

    if definition.duration.is_static() {
        let duration = definition.duration.value;
        if duration < 0.0 && !EffectsConfig::is_infinite(duration) {
            anyhow::bail!("Effect '{}' has invalid duration {}", name, duration);
        }
    }
    if definition.period.is_static() {
        let period = definition.period.value;
        if period < 0.0 {
            anyhow::bail!("Effect '{}' has negative period {}", name, period);
        }
        if period > EffectsConfig::NO_PERIOD
            && definition.duration.is_static()
            && EffectsConfig::is_instant(definition.duration.value)
        {
            warn!(effect = %name, period, "instant effect has a period, it executes once");
        }
    }

    for (what, chance) in [
        ("chance_to_apply_to_target", definition.chance_to_apply_to_target),
        ("chance_to_apply_to_effect", definition.chance_to_apply_to_effect),
    ] {
        if chance.is_static() && !(0.0..=1.0).contains(&chance.value) {
            anyhow::bail!("Effect '{}' has {} {} outside [0, 1]", name, what, chance.value);
        }
    }

    for (index, record) in definition.modifiers.iter().enumerate() {
        if record.op == ModOp::Custom && record.callbacks.is_empty() {
            anyhow::bail!(
                "Effect '{}' modifier {} on '{}' is custom but names no extension",
                name,
                index,
                record.attribute
            );
        }
    }
    Ok(())
}
