//! Authored modifier records and the enums that classify them.

use bitflags::bitflags;

use crate::name::{AttributeId, ExtensionId};
use crate::scalable::ScalableValue;
use crate::tags::TagSet;

/// How a modifier combines with the value it modifies.
///
/// Evaluation applies the kinds in declaration order: Override, Additive,
/// Multiplicative, Custom.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ModOp {
    /// Replaces the running magnitude; the last inserted wins.
    Override,
    /// Summed onto the (possibly overridden) base.
    Additive,
    /// Multiplied onto base plus additive total.
    Multiplicative,
    /// Transformed by registered extensions.
    Custom,
}

impl ModOp {
    pub const COUNT: usize = 4;
    pub const ALL: [ModOp; Self::COUNT] = [
        ModOp::Override,
        ModOp::Additive,
        ModOp::Multiplicative,
        ModOp::Custom,
    ];

    pub const fn index(self) -> usize {
        match self {
            Self::Override => 0,
            Self::Additive => 1,
            Self::Multiplicative => 2,
            Self::Custom => 3,
        }
    }

    /// Folds `magnitude` into `current` as a one-shot write. `Custom` leaves
    /// the value untouched; custom writes go through extensions.
    pub fn fold(self, current: f64, magnitude: f64) -> f64 {
        match self {
            Self::Override => magnitude,
            Self::Additive => current + magnitude,
            Self::Multiplicative => current * magnitude,
            Self::Custom => current,
        }
    }
}

/// What a modifier modifies.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ModTarget {
    /// An attribute on the target.
    Attribute,
    /// Specs this target creates and sends out.
    OutgoingEffect,
    /// Specs applied to this target.
    IncomingEffect,
    /// Effects already active on this target.
    ActiveEffect,
}

/// Which part of a modified spec a meta-modifier feeds into.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EffectAspect {
    #[default]
    Magnitude,
    Duration,
    ChanceApplyToTarget,
    ChanceApplyToEffect,
}

bitflags! {
    /// Set of aspects a modification pass is allowed to touch.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EffectAspects: u8 {
        const MAGNITUDE              = 1 << 0;
        const DURATION               = 1 << 1;
        const CHANCE_APPLY_TO_TARGET = 1 << 2;
        const CHANCE_APPLY_TO_EFFECT = 1 << 3;
    }
}

impl Default for EffectAspects {
    fn default() -> Self {
        Self::all()
    }
}

impl From<EffectAspect> for EffectAspects {
    fn from(aspect: EffectAspect) -> Self {
        match aspect {
            EffectAspect::Magnitude => Self::MAGNITUDE,
            EffectAspect::Duration => Self::DURATION,
            EffectAspect::ChanceApplyToTarget => Self::CHANCE_APPLY_TO_TARGET,
            EffectAspect::ChanceApplyToEffect => Self::CHANCE_APPLY_TO_EFFECT,
        }
    }
}

/// Whether a spec's modifiers are snapshotted or linked when they modify
/// another spec.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CopyPolicy {
    /// Snapshot outgoing modifications, link everything else.
    #[default]
    Default,
    AlwaysSnapshot,
    AlwaysLink,
}

/// One authored modification. Immutable after load.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierRecord {
    pub target: ModTarget,
    pub attribute: AttributeId,
    pub op: ModOp,
    pub magnitude: ScalableValue,

    /// Tags the modified spec must own for this record to apply.
    #[cfg_attr(feature = "serde", serde(default))]
    pub required_tags: TagSet,
    /// Tags that block this record when the modified spec owns any of them.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ignore_tags: TagSet,
    /// Tags granted to whatever this record modifies.
    #[cfg_attr(feature = "serde", serde(default))]
    pub passed_tags: TagSet,
    /// Tags describing the record itself.
    #[cfg_attr(feature = "serde", serde(default))]
    pub owned_tags: TagSet,

    #[cfg_attr(feature = "serde", serde(default))]
    pub aspect: EffectAspect,
    #[cfg_attr(feature = "serde", serde(default))]
    pub callbacks: Vec<ExtensionId>,
}

impl ModifierRecord {
    pub fn new(
        target: ModTarget,
        attribute: AttributeId,
        op: ModOp,
        magnitude: impl Into<ScalableValue>,
    ) -> Self {
        Self {
            target,
            attribute,
            op,
            magnitude: magnitude.into(),
            required_tags: TagSet::new(),
            ignore_tags: TagSet::new(),
            passed_tags: TagSet::new(),
            owned_tags: TagSet::new(),
            aspect: EffectAspect::Magnitude,
            callbacks: Vec::new(),
        }
    }

    /// Attribute modifier, the common case.
    pub fn attribute(attribute: &str, op: ModOp, magnitude: impl Into<ScalableValue>) -> Self {
        Self::new(ModTarget::Attribute, AttributeId::new(attribute), op, magnitude)
    }

    pub fn with_required_tags(mut self, tags: TagSet) -> Self {
        self.required_tags = tags;
        self
    }

    pub fn with_ignore_tags(mut self, tags: TagSet) -> Self {
        self.ignore_tags = tags;
        self
    }

    pub fn with_passed_tags(mut self, tags: TagSet) -> Self {
        self.passed_tags = tags;
        self
    }

    pub fn with_owned_tags(mut self, tags: TagSet) -> Self {
        self.owned_tags = tags;
        self
    }

    pub fn with_aspect(mut self, aspect: EffectAspect) -> Self {
        self.aspect = aspect;
        self
    }

    pub fn with_callback(mut self, extension: ExtensionId) -> Self {
        self.callbacks.push(extension);
        self
    }
}
