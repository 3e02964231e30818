//! Application flow for one target.
//!
//! [`EffectTarget`] bundles an attribute holder with its container and base
//! tags. A source builds an outgoing spec, its own outgoing modifiers shape
//! it, and the target then gates, copies and finishes the spec with its
//! incoming and active-effect modifiers before executing or storing it.

use std::rc::Rc;

use tracing::{debug, info};

use crate::active::{ActiveEffectHandle, ActiveEffectsContainer, ContainerError, TickReport};
use crate::aggregator::AggregatorArena;
use crate::attribute::AttributeHolder;
use crate::config::EffectsConfig;
use crate::definition::EffectDefinition;
use crate::modifier::ModTarget;
use crate::name::{AttributeId, Name};
use crate::rng::{TARGET_CHANCE_STREAM, chance_seed};
use crate::spec::{EffectSpec, InstigatorContext, ModifierQualifier};
use crate::tags::TagSet;

#[derive(Debug)]
pub struct EffectTarget<H> {
    name: Name,
    holder: H,
    container: ActiveEffectsContainer,
    tags: TagSet,
}

impl<H: AttributeHolder> EffectTarget<H> {
    pub fn new(arena: &mut AggregatorArena, name: &str, holder: H) -> Self {
        Self::with_container(name, holder, ActiveEffectsContainer::new(arena))
    }

    pub fn with_container(name: &str, holder: H, container: ActiveEffectsContainer) -> Self {
        Self {
            name: Name::new(name),
            holder,
            container,
            tags: TagSet::new(),
        }
    }

    pub fn with_tags(mut self, tags: TagSet) -> Self {
        self.tags = tags;
        self
    }

    pub fn name(&self) -> Name {
        self.name
    }

    pub fn holder(&self) -> &H {
        &self.holder
    }

    pub fn holder_mut(&mut self) -> &mut H {
        &mut self.holder
    }

    pub fn container(&self) -> &ActiveEffectsContainer {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut ActiveEffectsContainer {
        &mut self.container
    }

    /// Base tags plus the tags owned by active effects.
    pub fn tags(&self) -> TagSet {
        self.tags.union(&self.container.owned_tags())
    }

    pub fn attribute_value(&self, attribute: AttributeId) -> f64 {
        self.holder.attribute_value(attribute)
    }

    /// Builds a spec instigated by this target and lets its outgoing
    /// modifiers modify it.
    pub fn make_outgoing_spec(
        &self,
        arena: &mut AggregatorArena,
        definition: Rc<EffectDefinition>,
        level: f64,
    ) -> EffectSpec {
        let instigator = InstigatorContext::new().with_instigator(self.name, &self.tags());
        let mut spec = EffectSpec::at_level(arena, definition, level).with_instigator(instigator);
        let qualifier = ModifierQualifier::of_kind(ModTarget::OutgoingEffect);
        let wired = self.container.apply_active_effects_to(arena, &mut spec, &qualifier);
        debug!(source = %self.name, effect = %spec.name(), wired, "outgoing spec built");
        spec
    }

    pub fn apply_spec_to_target<T: AttributeHolder>(
        &self,
        arena: &mut AggregatorArena,
        spec: &EffectSpec,
        target: &mut EffectTarget<T>,
        seed: u64,
    ) -> Result<ActiveEffectHandle, ContainerError> {
        target.apply_spec_to_self(arena, spec, seed)
    }

    /// Applies a copy of `spec` to this target.
    ///
    /// Returns the new handle for duration effects and
    /// [`ActiveEffectHandle::INVALID`] when the effect was instant, did not
    /// meet its tag requirements or failed its chance roll. `spec` itself is
    /// left untouched and still has to be released by the caller.
    pub fn apply_spec_to_self(
        &mut self,
        arena: &mut AggregatorArena,
        spec: &EffectSpec,
        seed: u64,
    ) -> Result<ActiveEffectHandle, ContainerError> {
        let target_tags = self.tags();
        if !spec.definition().can_apply(spec.instigator().tags(), &target_tags) {
            debug!(target = %self.name, effect = %spec.name(), "application tag requirements not met");
            return Ok(ActiveEffectHandle::INVALID);
        }

        let chance = spec.chance_to_apply_to_target(arena);
        let roll = chance_seed(seed, self.container.last_handle().id(), TARGET_CHANCE_STREAM);
        if !self.container.rng().passes(roll, chance) {
            info!(target = %self.name, effect = %spec.name(), chance, "chance to apply failed");
            return Ok(ActiveEffectHandle::INVALID);
        }

        let mut owned = spec.duplicate(arena);
        owned.make_unique(arena);
        for kind in [ModTarget::IncomingEffect, ModTarget::ActiveEffect] {
            let qualifier = ModifierQualifier::of_kind(kind).with_chance_seed(seed);
            self.container
                .apply_spec_to_active_effects_and_attributes(arena, &mut self.holder, &mut owned, &qualifier);
        }

        let duration = owned.duration(arena);
        if EffectsConfig::is_instant(duration) {
            let qualifier = ModifierQualifier::new().with_chance_seed(seed);
            let executed = self
                .container
                .execute_active_effects_from(arena, &mut self.holder, &owned, &qualifier);
            info!(target = %self.name, effect = %owned.name(), executed, "instant effect executed");
            owned.release(arena);
            return Ok(ActiveEffectHandle::INVALID);
        }

        let start = self.container.world_time();
        let handle = self.container.create_new_active_effect(arena, owned, start)?;
        let qualifier = ModifierQualifier::new().with_chance_seed(seed);
        self.container
            .activate_effect(arena, &mut self.holder, handle, qualifier);
        Ok(handle)
    }

    pub fn remove_effect(&mut self, arena: &mut AggregatorArena, handle: ActiveEffectHandle) -> bool {
        self.container
            .remove_active_effect(arena, &mut self.holder, handle)
    }

    /// Writes back totals that changed through other targets, such as a
    /// live link to a caster's buff the caster has since removed.
    pub fn sync(&mut self, arena: &mut AggregatorArena) -> usize {
        self.container.sync_attributes(arena, &mut self.holder)
    }

    pub fn tick(&mut self, arena: &mut AggregatorArena, delta_seconds: f64) -> TickReport {
        self.container
            .tick_active_effects(arena, &mut self.holder, delta_seconds)
    }

    /// Releases the container's aggregators and hands back the holder.
    pub fn release(self, arena: &mut AggregatorArena) -> H {
        self.container.release(arena);
        self.holder
    }
}
