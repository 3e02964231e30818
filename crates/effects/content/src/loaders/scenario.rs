//! Scenario loader.
//!
//! A scenario names a set of targets with their starting attributes and a
//! list of steps the simulator runs in order.

use std::collections::HashSet;
use std::path::Path;

use effects_core::{AttributeSet, TagSet};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    /// Seed for chance rolls. The simulator's own seed wins when set.
    #[serde(default)]
    pub seed: Option<u64>,
    pub targets: Vec<TargetSpec>,
    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub name: String,
    #[serde(default)]
    pub tags: TagSet,
    pub attributes: AttributeSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScenarioStep {
    /// `source` builds a spec of `effect` and applies it to `target`. A
    /// label names the resulting active effect for later steps.
    Apply {
        source: String,
        target: String,
        effect: String,
        #[serde(default = "default_level")]
        level: f64,
        #[serde(default)]
        label: Option<String>,
    },
    /// Advances every target's clock `repeat` times by `seconds`.
    Tick {
        seconds: f64,
        #[serde(default = "single")]
        repeat: u32,
    },
    /// Removes the active effect applied under `label`.
    Remove { label: String },
    /// Records every target's attributes in the report.
    Snapshot { note: String },
}

fn default_level() -> f64 {
    1.0
}

fn single() -> u32 {
    1
}

/// Loader for scenarios from RON files.
pub struct ScenarioLoader;

impl ScenarioLoader {
    pub fn load(path: &Path) -> LoadResult<Scenario> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parses a scenario and checks that every step refers to known targets
    /// and labels. Effect names are resolved against the catalog later.
    pub fn parse(content: &str) -> LoadResult<Scenario> {
        let scenario: Scenario = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse scenario RON: {}", e))?;

        let mut targets = HashSet::new();
        for target in &scenario.targets {
            if !targets.insert(target.name.as_str()) {
                anyhow::bail!("Target '{}' is declared more than once", target.name);
            }
        }

        let mut labels = HashSet::new();
        for (index, step) in scenario.steps.iter().enumerate() {
            match step {
                ScenarioStep::Apply {
                    source,
                    target,
                    label,
                    ..
                } => {
                    for name in [source, target] {
                        if !targets.contains(name.as_str()) {
                            anyhow::bail!("Step {} refers to unknown target '{}'", index, name);
                        }
                    }
                    if let Some(label) = label
                        && !labels.insert(label.as_str())
                    {
                        anyhow::bail!("Step {} reuses label '{}'", index, label);
                    }
                }
                ScenarioStep::Tick { seconds, .. } => {
                    if seconds.is_nan() || *seconds < 0.0 {
                        anyhow::bail!("Step {} ticks by invalid time {}", index, seconds);
                    }
                }
                ScenarioStep::Remove { label } => {
                    if !labels.contains(label.as_str()) {
                        anyhow::bail!("Step {} removes unknown label '{}'", index, label);
                    }
                }
                ScenarioStep::Snapshot { .. } => {}
            }
        }
        Ok(scenario)
    }
}
