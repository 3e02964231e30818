//! Custom modifier behaviour.
//!
//! `Custom` modifiers and the pre/post execution hooks dispatch through
//! [`ModifierExtension`] objects registered under an [`ExtensionId`]. Records
//! name the extensions they want; the registry resolves them at evaluation
//! and execution time.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::warn;

use crate::active::ActiveEffectHandle;
use crate::aggregator::EvaluatedResult;
use crate::modifier::ModOp;
use crate::name::{AttributeId, ExtensionId, Name};
use crate::tags::TagSet;

/// Payload handed to execution hooks for one attribute write.
#[derive(Clone, Debug, PartialEq)]
pub struct ModCallbackData {
    /// Definition that is executing.
    pub effect: Name,
    /// Active effect that owns the modifier, invalid for instant effects.
    pub source: ActiveEffectHandle,
    pub attribute: AttributeId,
    pub op: ModOp,
    /// Value about to be written. Pre-execute hooks may rewrite it.
    pub evaluated: EvaluatedResult,
}

/// Behaviour attached to modifiers by id.
pub trait ModifierExtension {
    /// Transforms the running magnitude of an aggregator that holds this
    /// extension as a `Custom` modifier.
    fn transform(&self, magnitude: f64, _tags: &TagSet) -> f64 {
        magnitude
    }

    /// Runs before an instant write. `modifier` is the evaluated result of the
    /// modifier that carries this extension.
    fn pre_execute(&self, _modifier: &EvaluatedResult, _data: &mut ModCallbackData) {}

    /// Runs after an instant write.
    fn post_execute(&self, _modifier: &EvaluatedResult, _data: &ModCallbackData) {}
}

#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    extensions: HashMap<ExtensionId, Rc<dyn ModifierExtension>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `extension`, replacing any previous one with the same id.
    pub fn register(&mut self, id: ExtensionId, extension: impl ModifierExtension + 'static) {
        self.extensions.insert(id, Rc::new(extension));
    }

    pub fn get(&self, id: ExtensionId) -> Option<&Rc<dyn ModifierExtension>> {
        self.extensions.get(&id)
    }

    pub fn contains(&self, id: ExtensionId) -> bool {
        self.extensions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    fn resolve(&self, ids: &[ExtensionId]) -> impl Iterator<Item = &Rc<dyn ModifierExtension>> {
        ids.iter().filter_map(|id| {
            let found = self.extensions.get(id);
            if found.is_none() {
                warn!(extension = %id, "modifier references an unregistered extension");
            }
            found
        })
    }

    pub fn transform(&self, ids: &[ExtensionId], magnitude: f64, tags: &TagSet) -> f64 {
        self.resolve(ids)
            .fold(magnitude, |value, extension| extension.transform(value, tags))
    }

    pub fn pre_execute(&self, modifier: &EvaluatedResult, data: &mut ModCallbackData) {
        for extension in self.resolve(&modifier.callbacks) {
            extension.pre_execute(modifier, data);
        }
    }

    pub fn post_execute(&self, modifier: &EvaluatedResult, data: &ModCallbackData) {
        for extension in self.resolve(&modifier.callbacks) {
            extension.post_execute(modifier, data);
        }
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.extensions.keys()).finish()
    }
}

/// Clamps the running magnitude into `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Clamp {
    pub min: f64,
    pub max: f64,
}

impl ModifierExtension for Clamp {
    fn transform(&self, magnitude: f64, _tags: &TagSet) -> f64 {
        magnitude.clamp(self.min, self.max)
    }
}

/// Scales the running magnitude, and scales instant writes before they land.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scale(pub f64);

impl ModifierExtension for Scale {
    fn transform(&self, magnitude: f64, _tags: &TagSet) -> f64 {
        magnitude * self.0
    }

    fn pre_execute(&self, _modifier: &EvaluatedResult, data: &mut ModCallbackData) {
        data.evaluated.magnitude *= self.0;
    }
}
