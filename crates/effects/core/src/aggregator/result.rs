use crate::active::ActiveEffectHandle;
use crate::name::ExtensionId;
use crate::tags::TagSet;

/// Flattened output of one aggregator evaluation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EvaluatedResult {
    pub magnitude: f64,
    pub tags: TagSet,
    pub callbacks: Vec<ExtensionId>,
    /// Active effect that owns the evaluated aggregator, if any.
    pub source_handle: ActiveEffectHandle,
    pub valid: bool,
}

impl EvaluatedResult {
    pub fn new(magnitude: f64) -> Self {
        Self {
            magnitude,
            valid: true,
            ..Self::default()
        }
    }

    /// Result of evaluating something that no longer exists.
    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn with_tags(mut self, tags: TagSet) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_source(mut self, handle: ActiveEffectHandle) -> Self {
        self.source_handle = handle;
        self
    }
}
