use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, info, warn};

use super::effect::{ActiveEffect, EffectPhase};
use super::{ActiveEffectHandle, ContainerError, EffectOwner};
use crate::aggregator::{
    AggregatorArena, AggregatorBase, AggregatorId, AggregatorRef, EvaluatedResult, RefMode, WatchKey,
};
use crate::attribute::AttributeHolder;
use crate::config::EffectsConfig;
use crate::definition::EffectDefinition;
use crate::extension::ModCallbackData;
use crate::level::LevelSpec;
use crate::modifier::{ModOp, ModTarget};
use crate::name::{AttributeId, Tag};
use crate::rng::{EFFECT_CHANCE_STREAM, PcgRng, RngOracle, chance_seed};
use crate::spec::{EffectSpec, InstigatorContext, ModifierQualifier};
use crate::tags::TagSet;

/// Observer of an attribute's value, called after every change the
/// container makes to it.
pub type AttributeCallback = Box<dyn FnMut(AttributeId, &EvaluatedResult)>;

/// What one call to [`ActiveEffectsContainer::tick_active_effects`] did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub executions: u32,
    /// Effects removed because their duration ran out, in handle order.
    pub expired: Vec<ActiveEffectHandle>,
}

/// Effects currently applied to one target.
///
/// Effects are kept in ascending handle order. Every attribute touched by a
/// duration effect gets an ongoing aggregator whose base is the attribute's
/// base value; whenever one of them is dirtied the container writes its new
/// total to the holder and notifies the attribute's callbacks.
pub struct ActiveEffectsContainer {
    pub(super) effects: Vec<ActiveEffect>,
    pub(super) last_handle: ActiveEffectHandle,
    pub(super) ongoing: BTreeMap<AttributeId, AggregatorRef>,
    pub(super) callbacks: BTreeMap<AttributeId, Vec<AttributeCallback>>,
    pub(super) id: u32,
    pub(super) world_time: f64,
    pub(super) config: EffectsConfig,
    pub(super) rng: Box<dyn RngOracle>,
}

impl ActiveEffectsContainer {
    pub fn new(arena: &mut AggregatorArena) -> Self {
        Self::with_config(arena, EffectsConfig::default())
    }

    pub fn with_config(arena: &mut AggregatorArena, config: EffectsConfig) -> Self {
        Self {
            effects: Vec::new(),
            last_handle: ActiveEffectHandle::INVALID,
            ongoing: BTreeMap::new(),
            callbacks: BTreeMap::new(),
            id: arena.allocate_container_id(),
            world_time: 0.0,
            config,
            rng: Box::new(PcgRng),
        }
    }

    pub fn with_rng(mut self, rng: impl RngOracle + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Arena-wide id of this container. Qualifies its handles in
    /// [`EffectOwner`]s and keys its pending write-backs.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub(super) fn owner_of(&self, handle: ActiveEffectHandle) -> EffectOwner {
        EffectOwner::new(self.id, handle)
    }

    pub fn config(&self) -> &EffectsConfig {
        &self.config
    }

    pub fn rng(&self) -> &dyn RngOracle {
        self.rng.as_ref()
    }

    pub fn world_time(&self) -> f64 {
        self.world_time
    }

    pub fn last_handle(&self) -> ActiveEffectHandle {
        self.last_handle
    }

    pub fn num_effects(&self) -> usize {
        self.effects.len()
    }

    pub fn handles(&self) -> Vec<ActiveEffectHandle> {
        self.effects.iter().map(|effect| effect.handle).collect()
    }

    pub fn effects(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.effects.iter()
    }

    pub fn effect(&self, handle: ActiveEffectHandle) -> Option<&ActiveEffect> {
        self.index_of(handle).map(|index| &self.effects[index])
    }

    /// Union of the owned tags of every active effect.
    pub fn owned_tags(&self) -> TagSet {
        let mut tags = TagSet::new();
        for effect in &self.effects {
            tags.append(effect.spec.owned_tags());
        }
        tags
    }

    pub(super) fn index_of(&self, handle: ActiveEffectHandle) -> Option<usize> {
        self.effects
            .binary_search_by_key(&handle, |effect| effect.handle)
            .ok()
    }

    // ===== application =====

    /// Takes ownership of `spec` as a new active effect under the next
    /// handle. The effect is not wired yet; see
    /// [`ActiveEffectsContainer::activate_effect`].
    pub fn create_new_active_effect(
        &mut self,
        arena: &mut AggregatorArena,
        spec: EffectSpec,
        game_time: f64,
    ) -> Result<ActiveEffectHandle, ContainerError> {
        let Some(handle) = self.last_handle.next() else {
            spec.release(arena);
            return Err(ContainerError::HandleExhausted {
                last: self.last_handle,
            });
        };
        self.last_handle = handle;

        let effect = ActiveEffect::new(arena, self.owner_of(handle), spec, game_time);
        info!(
            %handle,
            effect = %effect.spec.name(),
            start = game_time,
            next_execute = effect.next_execute_time,
            "active effect created"
        );
        self.effects.push(effect);
        Ok(handle)
    }

    /// Wires a freshly created effect into the target. Periodic effects are
    /// not wired; they execute on their period instead.
    pub fn activate_effect(
        &mut self,
        arena: &mut AggregatorArena,
        holder: &mut dyn AttributeHolder,
        handle: ActiveEffectHandle,
        qualifier: ModifierQualifier,
    ) -> usize {
        let Some(index) = self.index_of(handle) else {
            warn!(%handle, "activate on an unknown handle");
            return 0;
        };
        let mut effect = self.effects.remove(index);
        let wired = if effect.is_periodic(arena) {
            0
        } else {
            let qualifier = qualifier
                .with_kind(ModTarget::Attribute)
                .with_ignore_handle(handle);
            self.apply_spec_to_active_effects_and_attributes(arena, holder, &mut effect.spec, &qualifier)
        };
        effect.phase = EffectPhase::Active;
        self.effects.insert(index, effect);
        wired
    }

    /// For effect-kind qualifiers, lets the active effects modify `spec`.
    /// Otherwise wires `spec` into the target: its attribute modifiers join
    /// the ongoing aggregators and its active-effect modifiers link into the
    /// effects `qualifier` admits. Returns the number of links made.
    pub fn apply_spec_to_active_effects_and_attributes(
        &mut self,
        arena: &mut AggregatorArena,
        holder: &mut dyn AttributeHolder,
        spec: &mut EffectSpec,
        qualifier: &ModifierQualifier,
    ) -> usize {
        let wired = match qualifier.kind() {
            Some(ModTarget::OutgoingEffect | ModTarget::IncomingEffect | ModTarget::ActiveEffect) => {
                self.apply_active_effects_to(arena, spec, qualifier)
            }
            Some(ModTarget::Attribute) | None => {
                let attributes = self.wire_attributes(arena, &*holder, spec);
                attributes + self.wire_into_active_effects(arena, spec, qualifier)
            }
        };
        self.flush(arena, holder);
        wired
    }

    /// Lets every admitted active effect modify `spec`. The container itself
    /// is not changed.
    pub fn apply_active_effects_to(
        &self,
        arena: &mut AggregatorArena,
        spec: &mut EffectSpec,
        qualifier: &ModifierQualifier,
    ) -> usize {
        let mut wired = 0;
        for effect in &self.effects {
            if !qualifier.test_target(effect.handle) {
                continue;
            }
            if !rolls_effect_chance(self.rng.as_ref(), arena, &effect.spec, effect.handle, qualifier) {
                continue;
            }
            wired += spec.apply_modifiers_from(arena, &effect.spec, qualifier);
        }
        wired
    }

    /// Number of links [`ActiveEffectsContainer::apply_active_effects_to`]
    /// would make for the same arguments. Nothing is wired.
    pub fn preview_active_effects_to(
        &self,
        arena: &mut AggregatorArena,
        spec: &EffectSpec,
        qualifier: &ModifierQualifier,
    ) -> usize {
        self.effects
            .iter()
            .filter(|effect| qualifier.test_target(effect.handle))
            .filter(|effect| {
                rolls_effect_chance(self.rng.as_ref(), arena, &effect.spec, effect.handle, qualifier)
            })
            .map(|effect| spec.count_modifiers_from(&effect.spec, qualifier))
            .sum()
    }

    /// Instant application: writes each attribute modifier of `spec` once
    /// and executes its active-effect modifiers into the admitted effects.
    /// No active effect is created.
    pub fn execute_active_effects_from(
        &mut self,
        arena: &mut AggregatorArena,
        holder: &mut dyn AttributeHolder,
        spec: &EffectSpec,
        qualifier: &ModifierQualifier,
    ) -> usize {
        let mut executed = 0;
        for modifier in spec.modifiers() {
            let record = modifier.record();
            if record.target != ModTarget::Attribute {
                continue;
            }
            if !holder.has_attribute(record.attribute) {
                debug!(attribute = %record.attribute, effect = %spec.name(), "target lacks attribute, skipped");
                continue;
            }
            let Some(id) = arena.get(modifier.aggregator()) else {
                continue;
            };
            let evaluated = arena.evaluate(id);
            let mut data = ModCallbackData {
                effect: spec.name(),
                source: evaluated.source_handle,
                attribute: record.attribute,
                op: record.op,
                evaluated,
            };
            arena.pre_execute(id, &mut data);
            holder.on_attribute_pre_modify(&mut data);
            self.write_attribute(arena, holder, &data);
            arena.post_execute(id, &data);
            holder.on_attribute_post_modify(&data);
            executed += 1;
        }

        let meta = ModifierQualifier::of_kind(ModTarget::ActiveEffect).with_aspects(qualifier.aspects());
        let rng = self.rng.as_ref();
        for effect in &mut self.effects {
            if !qualifier.test_target(effect.handle) {
                continue;
            }
            if !rolls_effect_chance(rng, arena, spec, effect.handle, qualifier) {
                continue;
            }
            executed += effect.spec.execute_modifiers_from(arena, spec, &meta);
        }
        self.flush(arena, holder);
        executed
    }

    /// Runs one periodic execution of `handle`.
    pub(crate) fn execute_gameplay_effect(
        &mut self,
        arena: &mut AggregatorArena,
        holder: &mut dyn AttributeHolder,
        handle: ActiveEffectHandle,
    ) -> bool {
        let Some(index) = self.index_of(handle) else {
            warn!(%handle, "execute on an unknown handle");
            return false;
        };
        let mut effect = self.effects.remove(index);
        effect.phase = EffectPhase::Executing;
        let qualifier = ModifierQualifier::new().with_ignore_handle(handle);
        let executed = self.execute_active_effects_from(arena, holder, &effect.spec, &qualifier);
        effect.phase = EffectPhase::Active;
        debug!(%handle, executed, at = effect.next_execute_time, "periodic execution");
        self.effects.insert(index, effect);
        true
    }

    /// Unwires and drops the effect. `false` when the handle does not
    /// resolve, in which case nothing changes.
    pub fn remove_active_effect(
        &mut self,
        arena: &mut AggregatorArena,
        holder: &mut dyn AttributeHolder,
        handle: ActiveEffectHandle,
    ) -> bool {
        let Some(index) = self.index_of(handle) else {
            debug!(%handle, "remove of an unknown handle");
            return false;
        };
        let mut effect = self.effects.remove(index);
        self.unwire(arena, handle);
        effect.phase = EffectPhase::Removed;
        info!(%handle, effect = %effect.spec.name(), "active effect removed");
        effect.spec.release(arena);
        self.flush(arena, holder);
        true
    }

    /// Detaches every modifier owned by `handle` from the ongoing
    /// aggregators and from the remaining effects.
    fn unwire(&mut self, arena: &mut AggregatorArena, handle: ActiveEffectHandle) {
        let owner = self.owner_of(handle);
        let mut targets: Vec<AggregatorId> = self.ongoing.values().filter_map(|r| arena.get(r)).collect();
        for effect in &self.effects {
            targets.extend(effect.spec.aggregator_ids(arena));
        }
        let removed: usize = targets
            .into_iter()
            .map(|id| arena.remove_mods_owned_by(id, owner))
            .sum();
        debug!(%handle, removed, "modifiers unwired");
    }

    // ===== lookups =====

    /// `0.0` when `handle` does not resolve.
    pub fn effect_duration(&self, arena: &mut AggregatorArena, handle: ActiveEffectHandle) -> f64 {
        match self.effect(handle) {
            Some(effect) => effect.duration(arena),
            None => {
                warn!(%handle, "duration of an unknown handle");
                0.0
            }
        }
    }

    /// Combined magnitude of the effect's modifiers on `attribute`, `0.0`
    /// when `handle` does not resolve.
    pub fn effect_magnitude(
        &self,
        arena: &mut AggregatorArena,
        handle: ActiveEffectHandle,
        attribute: AttributeId,
    ) -> f64 {
        match self.effect(handle) {
            Some(effect) => effect.spec.magnitude(arena, attribute),
            None => {
                warn!(%handle, %attribute, "magnitude of an unknown handle");
                0.0
            }
        }
    }

    /// Magnitude of the effect's first modifier owning `tag`.
    pub fn effect_magnitude_by_tag(&self, arena: &mut AggregatorArena, handle: ActiveEffectHandle, tag: Tag) -> f64 {
        let Some(effect) = self.effect(handle) else {
            warn!(%handle, %tag, "magnitude of an unknown handle");
            return 0.0;
        };
        effect
            .spec
            .modifiers()
            .iter()
            .find(|modifier| modifier.record().owned_tags.has_tag(tag))
            .and_then(|modifier| arena.get(modifier.aggregator()))
            .map_or(0.0, |id| arena.magnitude(id))
    }

    /// Seconds left on each active effect owning any tag of `query`, or on
    /// every effect without a query, in handle order. Effects that only end
    /// when removed report [`f64::INFINITY`].
    pub fn active_effects_time_remaining(&self, arena: &mut AggregatorArena, query: Option<&TagSet>) -> Vec<f64> {
        let now = self.world_time;
        self.effects
            .iter()
            .filter(|effect| query.is_none_or(|tags| effect.spec.owned_tags().has_any(tags)))
            .map(|effect| {
                effect
                    .expires_at(arena)
                    .map_or(f64::INFINITY, |end| end - now)
            })
            .collect()
    }

    /// Whether applying `definition` at `level` leaves every attribute it
    /// adds to non-negative, after this target's incoming modifiers. Only
    /// additive attribute modifiers are checked, as costs are.
    pub fn can_apply_attribute_modifiers(
        &self,
        arena: &mut AggregatorArena,
        holder: &dyn AttributeHolder,
        definition: Rc<EffectDefinition>,
        level: f64,
        instigator: InstigatorContext,
    ) -> bool {
        let mut spec = EffectSpec::at_level(arena, definition, level).with_instigator(instigator);
        self.apply_active_effects_to(arena, &mut spec, &ModifierQualifier::of_kind(ModTarget::IncomingEffect));

        let mut affordable = true;
        for modifier in spec.modifiers() {
            let record = modifier.record();
            if record.target != ModTarget::Attribute || record.op != ModOp::Additive {
                continue;
            }
            if !holder.has_attribute(record.attribute) {
                continue;
            }
            let Some(id) = arena.get(modifier.aggregator()) else {
                continue;
            };
            let cost = arena.magnitude(id);
            if holder.attribute_value(record.attribute) + cost < 0.0 {
                debug!(attribute = %record.attribute, effect = %spec.name(), cost, "attribute cannot cover modifier");
                affordable = false;
                break;
            }
        }
        spec.release(arena);
        affordable
    }

    pub fn is_effect_active(&self, handle: ActiveEffectHandle) -> bool {
        self.index_of(handle).is_some()
    }

    // ===== attributes =====

    /// Callbacks for one attribute fire in registration order.
    pub fn register_attribute_modify_callback(
        &mut self,
        attribute: AttributeId,
        callback: impl FnMut(AttributeId, &EvaluatedResult) + 'static,
    ) {
        self.callbacks
            .entry(attribute)
            .or_default()
            .push(Box::new(callback));
    }

    /// Soft link to the attribute's ongoing total, created on first use.
    pub fn attribute_aggregator(
        &mut self,
        arena: &mut AggregatorArena,
        holder: &dyn AttributeHolder,
        attribute: AttributeId,
    ) -> AggregatorRef {
        let id = self.ongoing_aggregator(arena, holder, attribute);
        AggregatorRef::new(id, RefMode::Soft)
    }

    /// Dirties `dependent` whenever the attribute's ongoing total changes.
    pub fn add_dependency_to_attribute(
        &mut self,
        arena: &mut AggregatorArena,
        holder: &dyn AttributeHolder,
        attribute: AttributeId,
        dependent: AggregatorId,
    ) {
        let id = self.ongoing_aggregator(arena, holder, attribute);
        arena.add_dependent(id, dependent);
    }

    fn ongoing_aggregator(
        &mut self,
        arena: &mut AggregatorArena,
        holder: &dyn AttributeHolder,
        attribute: AttributeId,
    ) -> AggregatorId {
        if let Some(id) = self.ongoing.get(&attribute).and_then(|owned| arena.get(owned)) {
            return id;
        }
        let base = AggregatorBase::constant(holder.attribute_value(attribute))
            .with_label(format!("ongoing {attribute}"));
        let owned = arena.create(base, LevelSpec::invalid());
        let id = owned.id();
        arena.watch(
            id,
            WatchKey {
                container: self.id,
                attribute,
            },
        );
        if let Some(previous) = self.ongoing.insert(attribute, owned) {
            arena.release(previous);
        }
        debug!(%attribute, aggregator = %id, "ongoing aggregator created");
        id
    }

    fn wire_attributes(
        &mut self,
        arena: &mut AggregatorArena,
        holder: &dyn AttributeHolder,
        spec: &EffectSpec,
    ) -> usize {
        let snapshot = spec.should_apply_as_snapshot(&ModifierQualifier::of_kind(ModTarget::Attribute));
        let mut wired = 0;
        for modifier in spec.modifiers() {
            let record = modifier.record();
            if record.target != ModTarget::Attribute {
                continue;
            }
            if !holder.has_attribute(record.attribute) {
                debug!(attribute = %record.attribute, effect = %spec.name(), "target lacks attribute, not wired");
                continue;
            }
            let ongoing = self.ongoing_aggregator(arena, holder, record.attribute);
            let link = if snapshot {
                let owner = arena
                    .get(modifier.aggregator())
                    .and_then(|id| arena.effect_owner(id))
                    .unwrap_or(EffectOwner::NONE);
                arena.snapshot(modifier.aggregator(), owner)
            } else {
                arena.share(modifier.aggregator())
            };
            arena.apply_mod(ongoing, record.op, link, false);
            wired += 1;
        }
        wired
    }

    fn wire_into_active_effects(
        &mut self,
        arena: &mut AggregatorArena,
        spec: &EffectSpec,
        qualifier: &ModifierQualifier,
    ) -> usize {
        let meta = ModifierQualifier::of_kind(ModTarget::ActiveEffect).with_aspects(qualifier.aspects());
        let rng = self.rng.as_ref();
        let mut wired = 0;
        for effect in &mut self.effects {
            if !qualifier.test_target(effect.handle) {
                continue;
            }
            if !rolls_effect_chance(rng, arena, spec, effect.handle, qualifier) {
                continue;
            }
            wired += effect.spec.apply_modifiers_from(arena, spec, &meta);
        }
        wired
    }

    /// One instant write. Attributes with an ongoing total take the write
    /// into its base so active modifiers stay layered on top.
    fn write_attribute(
        &mut self,
        arena: &mut AggregatorArena,
        holder: &mut dyn AttributeHolder,
        data: &ModCallbackData,
    ) {
        let attribute = data.attribute;
        if let Some(ongoing) = self.ongoing.get(&attribute).and_then(|owned| arena.get(owned)) {
            arena.execute_mod(ongoing, data.op, &data.evaluated);
            self.flush(arena, holder);
            return;
        }

        let current = holder.attribute_value(attribute);
        let value = match data.op {
            ModOp::Custom => {
                arena
                    .extensions()
                    .transform(&data.evaluated.callbacks, current, &data.evaluated.tags)
            }
            op => op.fold(current, data.evaluated.magnitude),
        };
        holder.set_attribute_value(attribute, value);
        let written = EvaluatedResult::new(holder.attribute_value(attribute))
            .with_tags(data.evaluated.tags.clone())
            .with_source(data.source);
        debug!(%attribute, op = %data.op, value = written.magnitude, "attribute executed");
        self.fire_callbacks(attribute, &written);
    }

    /// Writes back ongoing totals dirtied from outside this container, such
    /// as a live link to another target's effect that was removed. Returns
    /// the number of attributes written.
    pub fn sync_attributes(&mut self, arena: &mut AggregatorArena, holder: &mut dyn AttributeHolder) -> usize {
        let written = self.flush(arena, holder);
        if written > 0 {
            debug!(container = self.id, written, "attributes synced");
        }
        written
    }

    /// Writes back every watched total dirtied since the last flush.
    pub(super) fn flush(&mut self, arena: &mut AggregatorArena, holder: &mut dyn AttributeHolder) -> usize {
        let mut seen: Vec<AttributeId> = Vec::new();
        for (id, attribute) in arena.take_dirty_watched(self.id) {
            if seen.contains(&attribute) || !arena.contains(id) {
                continue;
            }
            seen.push(attribute);
            let total = arena.evaluate(id);
            holder.set_attribute_value(attribute, total.magnitude);
            let written = EvaluatedResult {
                magnitude: holder.attribute_value(attribute),
                ..total
            };
            debug!(%attribute, value = written.magnitude, "attribute total written");
            self.fire_callbacks(attribute, &written);
        }
        seen.len()
    }

    fn fire_callbacks(&mut self, attribute: AttributeId, result: &EvaluatedResult) {
        if let Some(callbacks) = self.callbacks.get_mut(&attribute) {
            for callback in callbacks.iter_mut() {
                callback(attribute, result);
            }
        }
    }

    // ===== time =====

    /// Advances the clock by `delta_seconds`, runs due periodic executions
    /// and removes expired effects, in ascending handle order.
    ///
    /// A periodic effect never executes past its expiry, and at most
    /// `max_period_executions_per_tick` times per call; further missed
    /// periods are skipped. Totals dirtied from outside since the last call
    /// are written back first.
    pub fn tick_active_effects(
        &mut self,
        arena: &mut AggregatorArena,
        holder: &mut dyn AttributeHolder,
        delta_seconds: f64,
    ) -> TickReport {
        self.flush(arena, holder);
        self.world_time += delta_seconds.max(0.0);
        let now = self.world_time;
        let epsilon = self.config.period_epsilon;
        let max_executions = self.config.max_period_executions_per_tick;
        let mut report = TickReport::default();

        for handle in self.handles() {
            let Some(index) = self.index_of(handle) else {
                continue;
            };
            let expires_at = self.effects[index].expires_at(arena);
            let period = self.effects[index].period(arena);

            if period > EffectsConfig::NO_PERIOD {
                let mut executions = 0;
                while let Some(index) = self.index_of(handle) {
                    let next = self.effects[index].next_execute_time;
                    let due = now >= next - epsilon && expires_at.is_none_or(|end| next <= end + epsilon);
                    if !due {
                        break;
                    }
                    if executions >= max_executions {
                        warn!(%handle, executions, "periodic executions capped, skipping missed periods");
                        self.effects[index].skip_missed_periods(now, period);
                        break;
                    }
                    self.execute_gameplay_effect(arena, holder, handle);
                    if let Some(index) = self.index_of(handle) {
                        self.effects[index].advance_next_execute_time(period);
                    }
                    executions += 1;
                }
                report.executions += executions;
            }

            let expired = expires_at.is_some_and(|end| now >= end - epsilon);
            if expired && self.remove_active_effect(arena, holder, handle) {
                report.expired.push(handle);
            }
        }
        report
    }

    /// Releases every effect and ongoing aggregator back to the arena and
    /// drops the container's pending write-backs.
    pub fn release(self, arena: &mut AggregatorArena) {
        for effect in self.effects {
            effect.spec.release(arena);
        }
        for (_, owned) in self.ongoing {
            if let Some(id) = arena.get(&owned) {
                arena.unwatch(id);
            }
            arena.release(owned);
        }
        arena.forget_container(self.id);
    }
}

/// Chance gate of `source` modifying the effect `target`. Passes when the
/// qualifier carries no seed.
fn rolls_effect_chance(
    rng: &dyn RngOracle,
    arena: &mut AggregatorArena,
    source: &EffectSpec,
    target: ActiveEffectHandle,
    qualifier: &ModifierQualifier,
) -> bool {
    let Some(seed) = qualifier.chance_seed() else {
        return true;
    };
    let chance = source.chance_to_apply_to_effect(arena);
    let passed = rng.passes(chance_seed(seed, target.id(), EFFECT_CHANCE_STREAM), chance);
    if !passed {
        debug!(effect = %source.name(), %target, chance, "chance to apply to effect failed");
    }
    passed
}

impl fmt::Debug for ActiveEffectsContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveEffectsContainer")
            .field("effects", &self.effects)
            .field("last_handle", &self.last_handle)
            .field("ongoing", &self.ongoing)
            .field("callbacks", &self.callbacks.keys().collect::<Vec<_>>())
            .field("world_time", &self.world_time)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
