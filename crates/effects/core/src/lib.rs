//! Modifier aggregation engine for gameplay effects.
//!
//! `effects-core` turns authored [`EffectDefinition`]s into level-instantiated
//! [`EffectSpec`]s whose values live in an [`AggregatorArena`]: a cached
//! dependency graph combining base values with Override, Additive,
//! Multiplicative and Custom modifiers. Effects modify each other's specs,
//! attributes, and active effects through live links or frozen snapshots, and
//! an [`ActiveEffectsContainer`] per target runs them over time.
//! Everything is single-threaded and deterministic for a given seed.
pub mod active;
pub mod aggregator;
pub mod attribute;
pub mod config;
pub mod definition;
pub mod error;
pub mod extension;
pub mod level;
pub mod modifier;
pub mod name;
pub mod rng;
pub mod scalable;
pub mod spec;
pub mod system;
pub mod tags;

pub use active::{
    ActiveEffect, ActiveEffectHandle, ActiveEffectsContainer, AttributeCallback, ContainerError,
    EffectOwner, EffectPhase, TickReport,
};
pub use aggregator::{
    AggregatorArena, AggregatorBase, AggregatorId, AggregatorRef, AggregatorStats, EvaluateError,
    EvaluatedResult, RefError, RefMode,
};
pub use attribute::{AttributeBounds, AttributeHolder, AttributeSet};
pub use config::EffectsConfig;
pub use definition::EffectDefinition;
pub use error::{EffectsError, ErrorSeverity};
pub use extension::{Clamp, ExtensionRegistry, ModCallbackData, ModifierExtension, Scale};
pub use level::{LevelSpec, SharedLevel};
pub use modifier::{CopyPolicy, EffectAspect, EffectAspects, ModOp, ModTarget, ModifierRecord};
pub use name::{AttributeId, ExtensionId, Name, Tag};
pub use rng::{PcgRng, RngOracle};
pub use scalable::{Curve, CurveError, CurveHandle, CurveKey, CurveRegistry, CurveSource, CurveTable, ScalableValue};
pub use spec::{EffectSpec, InstigatorContext, ModifierQualifier, ModifierSpec};
pub use system::EffectTarget;
pub use tags::TagSet;
