//! Runtime bucket of applied effects.
//!
//! An [`ActiveEffectsContainer`] belongs to one target. It owns the target's
//! [`ActiveEffect`]s and the ongoing per-attribute aggregators their
//! modifiers feed, runs periodic executions and expiry, and writes attribute
//! totals back to the target's [`crate::AttributeHolder`].

mod container;
mod effect;
mod error;
mod handle;
mod replication;

pub use container::{ActiveEffectsContainer, AttributeCallback, TickReport};
pub use effect::{ActiveEffect, EffectPhase};
pub use error::ContainerError;
pub use handle::{ActiveEffectHandle, EffectOwner};
