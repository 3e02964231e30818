use crate::config::EffectsConfig;
use crate::modifier::{CopyPolicy, ModifierRecord};
use crate::name::Name;
use crate::scalable::{CurveHandle, ScalableValue};
use crate::tags::TagSet;

/// Immutable authored description of an effect.
///
/// Specs hold definitions through `Rc`; nothing in the engine mutates them.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectDefinition {
    pub name: Name,

    /// `INSTANT_APPLICATION`, `INFINITE_DURATION`, or seconds.
    #[cfg_attr(feature = "serde", serde(default = "instant"))]
    pub duration: ScalableValue,
    /// `NO_PERIOD` or seconds between executions.
    #[cfg_attr(feature = "serde", serde(default = "no_period"))]
    pub period: ScalableValue,

    #[cfg_attr(feature = "serde", serde(default))]
    pub modifiers: Vec<ModifierRecord>,

    #[cfg_attr(feature = "serde", serde(default = "certain"))]
    pub chance_to_apply_to_target: ScalableValue,
    #[cfg_attr(feature = "serde", serde(default = "certain"))]
    pub chance_to_apply_to_effect: ScalableValue,

    /// Tags this effect owns; other effects' requirements test against these.
    #[cfg_attr(feature = "serde", serde(default))]
    pub owned_tags: TagSet,
    /// Another effect may only modify this one when it owns all of these.
    #[cfg_attr(feature = "serde", serde(default))]
    pub required_tags: TagSet,
    /// Another effect may not modify this one when it owns any of these.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ignore_tags: TagSet,

    #[cfg_attr(feature = "serde", serde(default))]
    pub application_required_target_tags: TagSet,
    #[cfg_attr(feature = "serde", serde(default))]
    pub application_required_instigator_tags: TagSet,

    #[cfg_attr(feature = "serde", serde(default))]
    pub copy_policy: CopyPolicy,
}

#[cfg(feature = "serde")]
fn instant() -> ScalableValue {
    ScalableValue::constant(EffectsConfig::INSTANT_APPLICATION)
}

#[cfg(feature = "serde")]
fn no_period() -> ScalableValue {
    ScalableValue::constant(EffectsConfig::NO_PERIOD)
}

#[cfg(feature = "serde")]
fn certain() -> ScalableValue {
    ScalableValue::constant(1.0)
}

impl EffectDefinition {
    /// Instant, non-periodic definition with no modifiers.
    pub fn new(name: &str) -> Self {
        Self {
            name: Name::new(name),
            duration: ScalableValue::constant(EffectsConfig::INSTANT_APPLICATION),
            period: ScalableValue::constant(EffectsConfig::NO_PERIOD),
            modifiers: Vec::new(),
            chance_to_apply_to_target: ScalableValue::constant(1.0),
            chance_to_apply_to_effect: ScalableValue::constant(1.0),
            owned_tags: TagSet::new(),
            required_tags: TagSet::new(),
            ignore_tags: TagSet::new(),
            application_required_target_tags: TagSet::new(),
            application_required_instigator_tags: TagSet::new(),
            copy_policy: CopyPolicy::Default,
        }
    }

    pub fn with_duration(mut self, duration: impl Into<ScalableValue>) -> Self {
        self.duration = duration.into();
        self
    }

    pub fn with_period(mut self, period: impl Into<ScalableValue>) -> Self {
        self.period = period.into();
        self
    }

    pub fn with_modifier(mut self, modifier: ModifierRecord) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn with_chance_to_apply_to_target(mut self, chance: impl Into<ScalableValue>) -> Self {
        self.chance_to_apply_to_target = chance.into();
        self
    }

    pub fn with_chance_to_apply_to_effect(mut self, chance: impl Into<ScalableValue>) -> Self {
        self.chance_to_apply_to_effect = chance.into();
        self
    }

    pub fn with_owned_tags(mut self, tags: TagSet) -> Self {
        self.owned_tags = tags;
        self
    }

    pub fn with_required_tags(mut self, tags: TagSet) -> Self {
        self.required_tags = tags;
        self
    }

    pub fn with_ignore_tags(mut self, tags: TagSet) -> Self {
        self.ignore_tags = tags;
        self
    }

    pub fn with_application_requirements(mut self, target: TagSet, instigator: TagSet) -> Self {
        self.application_required_target_tags = target;
        self.application_required_instigator_tags = instigator;
        self
    }

    pub fn with_copy_policy(mut self, policy: CopyPolicy) -> Self {
        self.copy_policy = policy;
        self
    }

    /// Whether this effect may modify `other`, judged by `other`'s owned tags.
    pub fn can_modify_effect(&self, other: &EffectDefinition) -> bool {
        other.owned_tags.has_all(&self.required_tags) && !other.owned_tags.has_any(&self.ignore_tags)
    }

    /// Whether this effect may be applied given both parties' tags.
    pub fn can_apply(&self, instigator_tags: &TagSet, target_tags: &TagSet) -> bool {
        instigator_tags.has_all(&self.application_required_instigator_tags)
            && target_tags.has_all(&self.application_required_target_tags)
    }

    /// Every curve this definition samples, in declaration order.
    pub fn curve_handles(&self) -> Vec<CurveHandle> {
        [
            self.duration,
            self.period,
            self.chance_to_apply_to_target,
            self.chance_to_apply_to_effect,
        ]
        .into_iter()
        .chain(self.modifiers.iter().map(|modifier| modifier.magnitude))
        .filter_map(|value| value.curve)
        .collect()
    }
}
