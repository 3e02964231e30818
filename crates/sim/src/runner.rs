//! Runs a scenario step by step against live targets.
use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use effects_content::{Content, Scenario, ScenarioStep};
use effects_core::{ActiveEffectHandle, ActiveEffectsContainer, AggregatorArena, AttributeSet, EffectTarget};
use tracing::{debug, info, warn};

use crate::report::{ActiveState, Event, Report, Snapshot, TargetState};

pub struct Simulation {
    arena: AggregatorArena,
    content: Content,
    targets: Vec<EffectTarget<AttributeSet>>,
    by_name: HashMap<String, usize>,
    labels: HashMap<String, (usize, ActiveEffectHandle)>,
    seed: u64,
    log: Vec<Event>,
    snapshots: Vec<Snapshot>,
}

impl Simulation {
    pub fn new(content: Content, scenario: &Scenario, seed: u64) -> Self {
        let mut arena = AggregatorArena::with_curves(content.curves.clone());
        let mut targets = Vec::with_capacity(scenario.targets.len());
        let mut by_name = HashMap::new();
        for (index, spec) in scenario.targets.iter().enumerate() {
            let container = ActiveEffectsContainer::with_config(&mut arena, content.config.clone());
            let target = EffectTarget::with_container(&spec.name, spec.attributes.clone(), container)
                .with_tags(spec.tags.clone());
            targets.push(target);
            by_name.insert(spec.name.clone(), index);
        }

        Self {
            arena,
            content,
            targets,
            by_name,
            labels: HashMap::new(),
            seed,
            log: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    pub fn run(mut self, scenario: &Scenario) -> Result<Report> {
        info!(scenario = %scenario.name, seed = self.seed, steps = scenario.steps.len(), "running scenario");
        for (step, action) in scenario.steps.iter().enumerate() {
            self.step(step, action)
                .with_context(|| format!("step {} of scenario '{}'", step, scenario.name))?;
            self.sync();
        }
        self.snapshot("final");
        Ok(self.finish(scenario))
    }

    fn step(&mut self, step: usize, action: &ScenarioStep) -> Result<()> {
        match action {
            ScenarioStep::Apply {
                source,
                target,
                effect,
                level,
                label,
            } => self.apply(step, source, target, effect, *level, label.as_deref()),
            ScenarioStep::Tick { seconds, repeat } => {
                for _ in 0..*repeat {
                    self.tick(step, *seconds);
                }
                Ok(())
            }
            ScenarioStep::Remove { label } => {
                self.remove(step, label);
                Ok(())
            }
            ScenarioStep::Snapshot { note } => {
                self.snapshot(note);
                Ok(())
            }
        }
    }

    /// Live links cross targets, so a step on one target can change
    /// another's totals.
    fn sync(&mut self) {
        for target in &mut self.targets {
            let written = target.sync(&mut self.arena);
            if written > 0 {
                debug!(target = %target.name(), written, "attributes synced");
            }
        }
    }

    fn target_index(&self, name: &str) -> Result<usize> {
        self.by_name
            .get(name)
            .copied()
            .with_context(|| format!("unknown target '{}'", name))
    }

    fn apply(
        &mut self,
        step: usize,
        source: &str,
        target: &str,
        effect: &str,
        level: f64,
        label: Option<&str>,
    ) -> Result<()> {
        let source = self.target_index(source)?;
        let target = self.target_index(target)?;
        let definition = self
            .content
            .definitions
            .get(effect)
            .with_context(|| format!("unknown effect '{}'", effect))?;

        let spec = self.targets[source].make_outgoing_spec(&mut self.arena, definition, level);
        let seed = self.seed.wrapping_add(step as u64);
        let applied = self.targets[target].apply_spec_to_self(&mut self.arena, &spec, seed);
        spec.release(&mut self.arena);
        let handle = applied?;

        let target_name = self.targets[target].name().to_string();
        if handle.is_valid() {
            info!(%handle, effect, target = %target_name, "effect applied");
            if let Some(label) = label {
                self.labels.insert(label.to_string(), (target, handle));
            }
        } else {
            info!(effect, target = %target_name, "effect executed or not applied");
            if let Some(label) = label {
                warn!(label, effect, "labelled effect left no active effect");
            }
        }
        self.log.push(Event::Applied {
            step,
            target: target_name,
            effect: effect.to_string(),
            handle: handle.is_valid().then_some(handle.id()),
        });
        Ok(())
    }

    fn tick(&mut self, step: usize, seconds: f64) {
        let mut executions = 0;
        let mut expired = Vec::new();
        let mut time = 0.0;
        for target in &mut self.targets {
            let report = target.tick(&mut self.arena, seconds);
            executions += report.executions;
            for handle in &report.expired {
                info!(%handle, target = %target.name(), "effect expired");
            }
            expired.extend(report.expired.iter().map(|handle| handle.id()));
            time = target.container().world_time();
        }
        debug!(time, executions, "tick");
        self.log.push(Event::Ticked {
            step,
            time,
            executions,
            expired,
        });
    }

    fn remove(&mut self, step: usize, label: &str) {
        let was_active = match self.labels.remove(label) {
            Some((target, handle)) => self.targets[target].remove_effect(&mut self.arena, handle),
            None => false,
        };
        if was_active {
            info!(label, "effect removed");
        } else {
            info!(label, "effect already gone");
        }
        self.log.push(Event::Removed {
            step,
            label: label.to_string(),
            was_active,
        });
    }

    fn snapshot(&mut self, note: &str) {
        let mut time = 0.0;
        let mut targets = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            time = target.container().world_time();
            let attributes: BTreeMap<String, f64> = target
                .holder()
                .sorted()
                .into_iter()
                .map(|(attribute, value)| (attribute.to_string(), value))
                .collect();
            let mut active_effects = Vec::new();
            for effect in target.container().effects() {
                active_effects.push(ActiveState {
                    handle: effect.handle().id(),
                    effect: effect.spec().name().to_string(),
                    expires_at: effect.expires_at(&mut self.arena),
                });
            }
            info!(note, target = %target.name(), ?attributes, "snapshot");
            targets.push(TargetState {
                name: target.name().to_string(),
                attributes,
                active_effects,
            });
        }
        self.snapshots.push(Snapshot {
            note: note.to_string(),
            time,
            targets,
        });
    }

    fn finish(mut self, scenario: &Scenario) -> Report {
        for target in self.targets.drain(..) {
            target.release(&mut self.arena);
        }
        let leaked = self.arena.live_count();
        if leaked > 0 {
            warn!(leaked, "aggregators still allocated after release");
        }
        Report {
            scenario: scenario.name.clone(),
            seed: self.seed,
            snapshots: self.snapshots,
            log: self.log,
            stats: self.arena.stats(),
            leaked,
        }
    }
}

/// The configured seed wins over the scenario's.
pub fn resolve_seed(configured: Option<u64>, scenario: &Scenario) -> u64 {
    configured.or(scenario.seed).unwrap_or(0)
}
