//! Modifier dependency graph.
//!
//! Every aggregator lives in an [`AggregatorArena`] and is addressed by a
//! generation-checked [`AggregatorId`]. An aggregator combines its base
//! magnitude with four ordered modifier lists (one per [`crate::ModOp`]) and
//! caches the result until something it depends on changes.
//!
//! Ownership is counted per node: every [`RefMode::Hard`] ref holds one
//! strong count, [`RefMode::Soft`] refs hold none. When the count reaches
//! zero the node is freed, its dependents are marked dirty, and the hard refs
//! in its own modifier lists are released in turn. Soft refs to a freed node
//! stop resolving and are skipped during evaluation.
//!
//! Dirty propagation and evaluation both tolerate cycles: marking uses an
//! epoch stamp per traversal, evaluation tracks the nodes currently on the
//! evaluation stack and skips (or reports) the back-edge.

mod arena;
mod evaluate;
mod refs;
mod result;

use std::fmt;

pub use arena::{AggregatorArena, AggregatorStats};
pub use evaluate::EvaluateError;
pub use refs::{AggregatorRef, RefError, RefMode};
pub use result::EvaluatedResult;

pub(crate) use arena::WatchKey;

use crate::modifier::ModifierRecord;
use crate::name::ExtensionId;
use crate::scalable::ScalableValue;
use crate::tags::TagSet;

/// Slot index plus generation. A freed slot bumps its generation, so ids
/// held across a free stop resolving instead of aliasing the next tenant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AggregatorId {
    index: u32,
    generation: u32,
}

impl AggregatorId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub const fn index(self) -> u32 {
        self.index
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for AggregatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agg#{}.{}", self.index, self.generation)
    }
}

/// Base data of one aggregator: the value modifiers are layered on.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregatorBase {
    pub magnitude: ScalableValue,
    /// Tags reported by this aggregator's own result.
    pub tags: TagSet,
    /// Tags granted to whatever this aggregator modifies.
    pub passed_tags: TagSet,
    /// Extensions run by custom evaluation and execution hooks.
    pub callbacks: Vec<ExtensionId>,
    /// Debug label.
    pub label: String,
}

impl AggregatorBase {
    pub fn new(magnitude: impl Into<ScalableValue>) -> Self {
        Self {
            magnitude: magnitude.into(),
            ..Self::default()
        }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(ScalableValue::constant(value))
    }

    pub fn from_record(record: &ModifierRecord) -> Self {
        Self {
            magnitude: record.magnitude,
            tags: record.owned_tags.clone(),
            passed_tags: record.passed_tags.clone(),
            callbacks: record.callbacks.clone(),
            label: format!("{} {} {}", record.target, record.op, record.attribute),
        }
    }

    /// Leaf frozen at an already evaluated value.
    pub fn from_evaluated(evaluated: &EvaluatedResult) -> Self {
        Self {
            magnitude: ScalableValue::constant(evaluated.magnitude),
            tags: evaluated.tags.clone(),
            passed_tags: TagSet::new(),
            callbacks: evaluated.callbacks.clone(),
            label: String::from("evaluated"),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_tags(mut self, tags: TagSet) -> Self {
        self.tags = tags;
        self
    }
}
