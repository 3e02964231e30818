use super::{ActiveEffectHandle, EffectOwner};
use crate::aggregator::AggregatorArena;
use crate::config::EffectsConfig;
use crate::spec::EffectSpec;

/// Lifecycle of one active effect. `Removed` is terminal.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum EffectPhase {
    /// Created, not yet wired into the target.
    Applied,
    /// Wired and ticking.
    Active,
    /// A periodic or instant execution is in progress.
    Executing,
    Removed,
}

/// An effect spec applied to a target, plus its timing state.
#[derive(Debug)]
pub struct ActiveEffect {
    pub(super) handle: ActiveEffectHandle,
    pub(super) spec: EffectSpec,
    pub(super) start_time: f64,
    /// Only meaningful for periodic effects.
    pub(super) next_execute_time: f64,
    pub(super) phase: EffectPhase,
}

impl ActiveEffect {
    pub(super) fn new(arena: &mut AggregatorArena, owner: EffectOwner, spec: EffectSpec, start_time: f64) -> Self {
        let handle = owner.handle();
        let period = spec.period(arena);
        let next_execute_time = if period > EffectsConfig::NO_PERIOD {
            start_time + period
        } else {
            start_time
        };
        spec.stamp_owner(arena, owner);
        Self {
            handle,
            spec,
            start_time,
            next_execute_time,
            phase: EffectPhase::Applied,
        }
    }

    pub fn handle(&self) -> ActiveEffectHandle {
        self.handle
    }

    pub fn spec(&self) -> &EffectSpec {
        &self.spec
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn next_execute_time(&self) -> f64 {
        self.next_execute_time
    }

    pub fn phase(&self) -> EffectPhase {
        self.phase
    }

    pub fn duration(&self, arena: &mut AggregatorArena) -> f64 {
        self.spec.duration(arena)
    }

    pub fn period(&self, arena: &mut AggregatorArena) -> f64 {
        self.spec.period(arena)
    }

    pub fn is_periodic(&self, arena: &mut AggregatorArena) -> bool {
        self.period(arena) > EffectsConfig::NO_PERIOD
    }

    /// World time the effect runs out, `None` for effects that only end when
    /// removed.
    pub fn expires_at(&self, arena: &mut AggregatorArena) -> Option<f64> {
        let duration = self.duration(arena);
        (duration > EffectsConfig::INSTANT_APPLICATION).then_some(self.start_time + duration)
    }

    pub(super) fn advance_next_execute_time(&mut self, period: f64) {
        self.next_execute_time += period;
    }

    /// Moves the next execution to the first period boundary after `now`.
    pub(super) fn skip_missed_periods(&mut self, now: f64, period: f64) {
        if self.next_execute_time <= now {
            let missed = ((now - self.next_execute_time) / period).floor() + 1.0;
            self.next_execute_time += missed * period;
        }
    }
}
