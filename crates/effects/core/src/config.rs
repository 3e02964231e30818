/// Engine constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EffectsConfig {
    /// Upper bound on catch-up executions a single periodic effect may fire
    /// during one tick. Protects against huge time steps.
    pub max_period_executions_per_tick: u32,

    /// Tolerance used when comparing the clock against execution and
    /// expiration times.
    pub period_epsilon: f64,
}

impl EffectsConfig {
    // ===== sentinel values shared with authored content =====
    /// Duration of an effect that never expires on its own.
    pub const INFINITE_DURATION: f64 = -1.0;
    /// Duration of an effect that executes once and is never stored.
    pub const INSTANT_APPLICATION: f64 = 0.0;
    /// Period of an effect that does not recur.
    pub const NO_PERIOD: f64 = 0.0;
    /// Level of a spec that has no level.
    pub const INVALID_LEVEL: f64 = -1.0;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_PERIOD_EXECUTIONS_PER_TICK: u32 = 64;
    pub const DEFAULT_PERIOD_EPSILON: f64 = 1.0e-4;

    pub fn new() -> Self {
        Self {
            max_period_executions_per_tick: Self::DEFAULT_MAX_PERIOD_EXECUTIONS_PER_TICK,
            period_epsilon: Self::DEFAULT_PERIOD_EPSILON,
        }
    }

    pub fn with_max_period_executions(max_period_executions_per_tick: u32) -> Self {
        Self {
            max_period_executions_per_tick,
            ..Self::new()
        }
    }

    pub fn with_period_epsilon(mut self, period_epsilon: f64) -> Self {
        self.period_epsilon = period_epsilon;
        self
    }

    /// True when `duration` means the effect runs until removed.
    pub fn is_infinite(duration: f64) -> bool {
        duration == Self::INFINITE_DURATION
    }

    /// True when `duration` means execute once and discard.
    pub fn is_instant(duration: f64) -> bool {
        duration == Self::INSTANT_APPLICATION
    }
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self::new()
    }
}
