//! Level-instantiated effects and their modifiers.
//!
//! An [`EffectSpec`] is built from an immutable [`EffectDefinition`] at a
//! level: one aggregator per modifier record plus the duration, period and
//! chance aggregators. Other specs modify it by wiring their own aggregators
//! into these (meta-modification), either as live links or as frozen
//! snapshots.
//!
//! Specs hold hard refs into the shared [`AggregatorArena`]; they must be
//! handed back with [`EffectSpec::release`] once no longer needed.

use std::rc::Rc;

use tracing::debug;

use crate::active::{ActiveEffectHandle, EffectOwner};
use crate::aggregator::{AggregatorArena, AggregatorBase, AggregatorId, AggregatorRef};
use crate::definition::EffectDefinition;
use crate::level::{LevelSpec, SharedLevel};
use crate::modifier::{CopyPolicy, EffectAspect, EffectAspects, ModTarget, ModifierRecord};
use crate::name::{AttributeId, Name, Tag};
use crate::scalable::ScalableValue;
use crate::tags::TagSet;

/// Who caused an effect, outermost first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InstigatorContext {
    chain: Vec<Name>,
    tags: TagSet,
}

impl InstigatorContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an instigator and merges its tags.
    pub fn with_instigator(mut self, name: Name, tags: &TagSet) -> Self {
        self.chain.push(name);
        self.tags.append(tags);
        self
    }

    pub fn original_instigator(&self) -> Option<Name> {
        self.chain.first().copied()
    }

    pub fn instigator(&self) -> Option<Name> {
        self.chain.last().copied()
    }

    /// Union of every instigator's tags.
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

/// Context of a modification pass: which kind of modifiers take part and
/// which active effects are eligible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModifierQualifier {
    kind: Option<ModTarget>,
    ignore_handle: ActiveEffectHandle,
    exclusive_target: ActiveEffectHandle,
    aspects: EffectAspects,
    chance_seed: Option<u64>,
}

impl ModifierQualifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of_kind(kind: ModTarget) -> Self {
        Self::new().with_kind(kind)
    }

    pub fn with_kind(mut self, kind: ModTarget) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Skips the active effect with this handle.
    pub fn with_ignore_handle(mut self, handle: ActiveEffectHandle) -> Self {
        self.ignore_handle = handle;
        self
    }

    /// Restricts the pass to the active effect with this handle.
    pub fn with_exclusive_target(mut self, handle: ActiveEffectHandle) -> Self {
        self.exclusive_target = handle;
        self
    }

    pub fn with_aspects(mut self, aspects: EffectAspects) -> Self {
        self.aspects = aspects;
        self
    }

    /// Enables chance-to-apply-to-effect rolls seeded from `seed`.
    pub fn with_chance_seed(mut self, seed: u64) -> Self {
        self.chance_seed = Some(seed);
        self
    }

    pub fn kind(&self) -> Option<ModTarget> {
        self.kind
    }

    pub fn ignore_handle(&self) -> ActiveEffectHandle {
        self.ignore_handle
    }

    pub fn exclusive_target(&self) -> ActiveEffectHandle {
        self.exclusive_target
    }

    pub fn aspects(&self) -> EffectAspects {
        self.aspects
    }

    pub fn chance_seed(&self) -> Option<u64> {
        self.chance_seed
    }

    /// Whether the active effect `handle` takes part in this pass.
    pub fn test_target(&self, handle: ActiveEffectHandle) -> bool {
        if self.ignore_handle.is_valid() && handle == self.ignore_handle {
            return false;
        }
        if self.exclusive_target.is_valid() && handle != self.exclusive_target {
            return false;
        }
        true
    }

    fn allows(&self, record: &ModifierRecord) -> bool {
        self.kind == Some(record.target) && self.aspects.contains(record.aspect.into())
    }
}

/// One modifier record instantiated for a spec.
#[derive(Debug)]
pub struct ModifierSpec {
    definition: Rc<EffectDefinition>,
    index: usize,
    aggregator: AggregatorRef,
}

impl ModifierSpec {
    pub fn record(&self) -> &ModifierRecord {
        &self.definition.modifiers[self.index]
    }

    pub fn aggregator(&self) -> &AggregatorRef {
        &self.aggregator
    }

    pub fn can_modify_in_context(&self, qualifier: &ModifierQualifier) -> bool {
        qualifier.kind() == Some(self.record().target)
    }

    pub fn can_modify_modifier(&self, other: &ModifierSpec) -> bool {
        self.record().attribute == other.record().attribute
    }

    /// Links this modifier into `other`'s aggregator.
    pub fn apply_mod_to(&self, arena: &mut AggregatorArena, other: &ModifierSpec, take_snapshot: bool) -> bool {
        let Some(target) = arena.get(&other.aggregator) else {
            return false;
        };
        let link = arena.share(&self.aggregator);
        arena.apply_mod(target, self.record().op, link, take_snapshot);
        true
    }

    /// Folds this modifier's current value into `other`'s aggregator.
    pub fn execute_mod_on(&self, arena: &mut AggregatorArena, other: &ModifierSpec) -> bool {
        let Some(target) = arena.get(&other.aggregator) else {
            return false;
        };
        arena.execute_mod_from(target, self.record().op, &self.aggregator);
        true
    }
}

/// Local aggregator a matching incoming modifier is wired into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WireTarget {
    Modifier(usize),
    Duration,
    ChanceToTarget,
    ChanceToEffect,
}

/// An effect definition instantiated at a level.
#[derive(Debug)]
pub struct EffectSpec {
    definition: Rc<EffectDefinition>,
    level: SharedLevel,
    instigator: InstigatorContext,
    duration: AggregatorRef,
    period: AggregatorRef,
    chance_to_apply_to_target: AggregatorRef,
    chance_to_apply_to_effect: AggregatorRef,
    modifiers: Vec<ModifierSpec>,
}

impl EffectSpec {
    pub fn new(arena: &mut AggregatorArena, definition: Rc<EffectDefinition>, level: SharedLevel) -> Self {
        let name = definition.name;
        let mut scalar = |value: ScalableValue, what: &str| {
            arena.create(
                AggregatorBase::new(value).with_label(format!("{name} {what}")),
                Rc::clone(&level),
            )
        };
        let duration = scalar(definition.duration, "duration");
        let period = scalar(definition.period, "period");
        let chance_to_apply_to_target = scalar(definition.chance_to_apply_to_target, "chance to apply");
        let chance_to_apply_to_effect = scalar(definition.chance_to_apply_to_effect, "chance to modify");

        let mut spec = Self {
            definition,
            level,
            instigator: InstigatorContext::new(),
            duration,
            period,
            chance_to_apply_to_target,
            chance_to_apply_to_effect,
            modifiers: Vec::new(),
        };
        spec.init_modifiers(arena);
        spec
    }

    pub fn at_level(arena: &mut AggregatorArena, definition: Rc<EffectDefinition>, level: f64) -> Self {
        Self::new(arena, definition, LevelSpec::new(level))
    }

    fn init_modifiers(&mut self, arena: &mut AggregatorArena) {
        self.modifiers = self
            .definition
            .modifiers
            .iter()
            .enumerate()
            .map(|(index, record)| ModifierSpec {
                definition: Rc::clone(&self.definition),
                index,
                aggregator: arena.create(AggregatorBase::from_record(record), Rc::clone(&self.level)),
            })
            .collect();
    }

    pub fn with_instigator(mut self, instigator: InstigatorContext) -> Self {
        self.instigator = instigator;
        self
    }

    pub fn definition(&self) -> &Rc<EffectDefinition> {
        &self.definition
    }

    pub fn name(&self) -> Name {
        self.definition.name
    }

    pub fn level(&self) -> &SharedLevel {
        &self.level
    }

    /// Changes the level of this spec and of every aggregator sharing it.
    pub fn set_level(&self, arena: &mut AggregatorArena, level: f64) {
        arena.set_level(&self.level, level);
    }

    pub fn instigator(&self) -> &InstigatorContext {
        &self.instigator
    }

    pub fn owned_tags(&self) -> &TagSet {
        &self.definition.owned_tags
    }

    pub fn has_owned_tag(&self, tag: Tag) -> bool {
        self.definition.owned_tags.has_tag(tag)
    }

    pub fn modifiers(&self) -> &[ModifierSpec] {
        &self.modifiers
    }

    pub fn duration_aggregator(&self) -> &AggregatorRef {
        &self.duration
    }

    pub fn period_aggregator(&self) -> &AggregatorRef {
        &self.period
    }

    pub fn duration(&self, arena: &mut AggregatorArena) -> f64 {
        value_of(arena, &self.duration)
    }

    pub fn period(&self, arena: &mut AggregatorArena) -> f64 {
        value_of(arena, &self.period)
    }

    pub fn chance_to_apply_to_target(&self, arena: &mut AggregatorArena) -> f64 {
        value_of(arena, &self.chance_to_apply_to_target)
    }

    pub fn chance_to_apply_to_effect(&self, arena: &mut AggregatorArena) -> f64 {
        value_of(arena, &self.chance_to_apply_to_effect)
    }

    /// Combined one-shot value of every attribute modifier for `attribute`,
    /// folded in modifier order starting from zero.
    pub fn magnitude(&self, arena: &mut AggregatorArena, attribute: AttributeId) -> f64 {
        self.modifiers
            .iter()
            .filter(|m| m.record().target == ModTarget::Attribute && m.record().attribute == attribute)
            .fold(0.0, |current, m| {
                let value = value_of(arena, &m.aggregator);
                m.record().op.fold(current, value)
            })
    }

    /// Whether this spec's modifiers are snapshotted when they modify
    /// another spec in the given pass.
    pub fn should_apply_as_snapshot(&self, qualifier: &ModifierQualifier) -> bool {
        match self.definition.copy_policy {
            CopyPolicy::AlwaysSnapshot => true,
            CopyPolicy::AlwaysLink => false,
            CopyPolicy::Default => qualifier.kind() == Some(ModTarget::OutgoingEffect),
        }
    }

    /// Every aggregator this spec owns.
    pub fn aggregator_ids(&self, arena: &AggregatorArena) -> Vec<AggregatorId> {
        self.owned_refs().filter_map(|r| arena.get(r)).collect()
    }

    pub(crate) fn stamp_owner(&self, arena: &mut AggregatorArena, owner: EffectOwner) {
        for id in self.aggregator_ids(arena) {
            arena.set_owner(id, owner);
        }
    }

    fn owned_refs(&self) -> impl Iterator<Item = &AggregatorRef> {
        [
            &self.duration,
            &self.period,
            &self.chance_to_apply_to_target,
            &self.chance_to_apply_to_effect,
        ]
        .into_iter()
        .chain(self.modifiers.iter().map(|m| &m.aggregator))
    }

    fn wire_target(&self, target: WireTarget) -> &AggregatorRef {
        match target {
            WireTarget::Modifier(index) => &self.modifiers[index].aggregator,
            WireTarget::Duration => &self.duration,
            WireTarget::ChanceToTarget => &self.chance_to_apply_to_target,
            WireTarget::ChanceToEffect => &self.chance_to_apply_to_effect,
        }
    }

    /// Pairs of (modifier of `other`, local aggregator) that `other` may
    /// modify in this pass.
    fn matching_targets(&self, other: &EffectSpec, qualifier: &ModifierQualifier) -> Vec<(usize, WireTarget)> {
        if !other.definition.can_modify_effect(&self.definition) {
            return Vec::new();
        }
        let owned = &self.definition.owned_tags;
        let mut targets = Vec::new();

        for (index, incoming) in other.modifiers.iter().enumerate() {
            let record = incoming.record();
            if !qualifier.allows(record) {
                continue;
            }
            if !owned.has_all(&record.required_tags) || owned.has_any(&record.ignore_tags) {
                continue;
            }
            match record.aspect {
                EffectAspect::Magnitude => {
                    targets.extend(
                        self.modifiers
                            .iter()
                            .enumerate()
                            .filter(|(_, local)| incoming.can_modify_modifier(local))
                            .map(|(local, _)| (index, WireTarget::Modifier(local))),
                    );
                }
                EffectAspect::Duration => targets.push((index, WireTarget::Duration)),
                EffectAspect::ChanceApplyToTarget => targets.push((index, WireTarget::ChanceToTarget)),
                EffectAspect::ChanceApplyToEffect => targets.push((index, WireTarget::ChanceToEffect)),
            }
        }
        targets
    }

    /// Number of links [`EffectSpec::apply_modifiers_from`] would create.
    pub fn count_modifiers_from(&self, other: &EffectSpec, qualifier: &ModifierQualifier) -> usize {
        self.matching_targets(other, qualifier).len()
    }

    /// Lets `other`'s qualifying modifiers modify this spec as ongoing links
    /// (or snapshots, per `other`'s copy policy). Returns the number wired.
    ///
    /// Snapshots taken in an active-effect pass stay owned by `other`, so
    /// removing it still detaches them. Any other snapshot is frozen into
    /// this spec for good.
    pub fn apply_modifiers_from(
        &mut self,
        arena: &mut AggregatorArena,
        other: &EffectSpec,
        qualifier: &ModifierQualifier,
    ) -> usize {
        let snapshot = other.should_apply_as_snapshot(qualifier);
        let mut wired = 0;
        for (index, target) in self.matching_targets(other, qualifier) {
            let incoming = &other.modifiers[index];
            let Some(target) = arena.get(self.wire_target(target)) else {
                continue;
            };
            let link = if snapshot {
                let owner = match qualifier.kind() {
                    Some(ModTarget::ActiveEffect) => arena
                        .get(&incoming.aggregator)
                        .and_then(|id| arena.effect_owner(id))
                        .unwrap_or(EffectOwner::NONE),
                    _ => EffectOwner::NONE,
                };
                arena.snapshot(&incoming.aggregator, owner)
            } else {
                arena.share(&incoming.aggregator)
            };
            arena.apply_mod(target, incoming.record().op, link, false);
            wired += 1;
        }
        if wired > 0 {
            debug!(spec = %self.name(), from = %other.name(), wired, snapshot, "modifiers applied");
        }
        wired
    }

    /// Like [`EffectSpec::apply_modifiers_from`], but folds the current
    /// values in once instead of linking them.
    pub fn execute_modifiers_from(
        &mut self,
        arena: &mut AggregatorArena,
        other: &EffectSpec,
        qualifier: &ModifierQualifier,
    ) -> usize {
        let mut executed = 0;
        for (index, target) in self.matching_targets(other, qualifier) {
            let incoming = &other.modifiers[index];
            let Some(target) = arena.get(self.wire_target(target)) else {
                continue;
            };
            arena.execute_mod_from(target, incoming.record().op, &incoming.aggregator);
            executed += 1;
        }
        if executed > 0 {
            debug!(spec = %self.name(), from = %other.name(), executed, "modifiers executed");
        }
        executed
    }

    /// Gives this spec private copies of its aggregators so later changes
    /// to it do not reach whatever it was duplicated from.
    pub fn make_unique(&mut self, arena: &mut AggregatorArena) {
        let refs = [
            &mut self.duration,
            &mut self.period,
            &mut self.chance_to_apply_to_target,
            &mut self.chance_to_apply_to_effect,
        ];
        for aggregator in refs {
            replace_with_copy(arena, aggregator);
        }
        for modifier in &mut self.modifiers {
            replace_with_copy(arena, &mut modifier.aggregator);
        }
    }

    /// Value copy sharing every aggregator with this spec.
    pub fn duplicate(&self, arena: &mut AggregatorArena) -> EffectSpec {
        EffectSpec {
            definition: Rc::clone(&self.definition),
            level: Rc::clone(&self.level),
            instigator: self.instigator.clone(),
            duration: arena.clone_ref(&self.duration),
            period: arena.clone_ref(&self.period),
            chance_to_apply_to_target: arena.clone_ref(&self.chance_to_apply_to_target),
            chance_to_apply_to_effect: arena.clone_ref(&self.chance_to_apply_to_effect),
            modifiers: self
                .modifiers
                .iter()
                .map(|m| ModifierSpec {
                    definition: Rc::clone(&m.definition),
                    index: m.index,
                    aggregator: arena.clone_ref(&m.aggregator),
                })
                .collect(),
        }
    }

    /// Gives every aggregator ref back to the arena.
    pub fn release(self, arena: &mut AggregatorArena) {
        arena.release(self.duration);
        arena.release(self.period);
        arena.release(self.chance_to_apply_to_target);
        arena.release(self.chance_to_apply_to_effect);
        for modifier in self.modifiers {
            arena.release(modifier.aggregator);
        }
    }
}

fn value_of(arena: &mut AggregatorArena, aggregator: &AggregatorRef) -> f64 {
    arena.get(aggregator).map_or(0.0, |id| arena.magnitude(id))
}

fn replace_with_copy(arena: &mut AggregatorArena, aggregator: &mut AggregatorRef) {
    let copy = arena.duplicate(aggregator);
    let previous = std::mem::replace(aggregator, copy);
    arena.release(previous);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::ModOp;

    fn tags(names: &[&str]) -> TagSet {
        names.iter().copied().collect()
    }

    fn fireball() -> Rc<EffectDefinition> {
        Rc::new(
            EffectDefinition::new("Fireball")
                .with_duration(10.0)
                .with_modifier(ModifierRecord::attribute("Health", ModOp::Additive, -30.0))
                .with_owned_tags(tags(&["Fire"])),
        )
    }

    fn outgoing_buff(op: ModOp, value: f64) -> Rc<EffectDefinition> {
        Rc::new(EffectDefinition::new("Empower").with_modifier(ModifierRecord::new(
            ModTarget::OutgoingEffect,
            AttributeId::new("Health"),
            op,
            value,
        )))
    }

    #[test]
    fn spec_owns_one_aggregator_per_modifier() {
        let mut arena = AggregatorArena::new();
        let spec = EffectSpec::at_level(&mut arena, fireball(), 1.0);
        assert_eq!(arena.live_count(), 5);
        assert_eq!(spec.duration(&mut arena), 10.0);
        assert_eq!(spec.period(&mut arena), 0.0);
        assert_eq!(spec.chance_to_apply_to_target(&mut arena), 1.0);
        assert_eq!(spec.magnitude(&mut arena, AttributeId::new("Health")), -30.0);

        spec.release(&mut arena);
        assert_eq!(arena.live_count(), 0);
    }

    #[test]
    fn snapshot_policy() {
        let mut arena = AggregatorArena::new();
        let outgoing = ModifierQualifier::of_kind(ModTarget::OutgoingEffect);
        let incoming = ModifierQualifier::of_kind(ModTarget::IncomingEffect);

        let default = EffectSpec::at_level(&mut arena, fireball(), 1.0);
        assert!(default.should_apply_as_snapshot(&outgoing));
        assert!(!default.should_apply_as_snapshot(&incoming));

        let always = EffectSpec::at_level(
            &mut arena,
            Rc::new(EffectDefinition::new("Frozen").with_copy_policy(CopyPolicy::AlwaysSnapshot)),
            1.0,
        );
        assert!(always.should_apply_as_snapshot(&incoming));

        let linked = EffectSpec::at_level(
            &mut arena,
            Rc::new(EffectDefinition::new("Linked").with_copy_policy(CopyPolicy::AlwaysLink)),
            1.0,
        );
        assert!(!linked.should_apply_as_snapshot(&outgoing));

        for spec in [default, always, linked] {
            spec.release(&mut arena);
        }
    }

    #[test]
    fn outgoing_modifiers_are_snapshotted() {
        let mut arena = AggregatorArena::new();
        let qualifier = ModifierQualifier::of_kind(ModTarget::OutgoingEffect);
        let buff = EffectSpec::at_level(&mut arena, outgoing_buff(ModOp::Multiplicative, 1.5), 1.0);
        let mut spell = EffectSpec::at_level(&mut arena, fireball(), 1.0);

        assert_eq!(spell.count_modifiers_from(&buff, &qualifier), 1);
        assert_eq!(spell.apply_modifiers_from(&mut arena, &buff, &qualifier), 1);
        let health = AttributeId::new("Health");
        assert_eq!(spell.magnitude(&mut arena, health), -45.0);

        // Changing the buff after the cast does not reach the snapshot.
        let buff_id = arena.get(buff.modifiers()[0].aggregator()).unwrap();
        arena.execute_mod(buff_id, ModOp::Override, &crate::EvaluatedResult::new(3.0));
        assert_eq!(spell.magnitude(&mut arena, health), -45.0);

        spell.release(&mut arena);
        buff.release(&mut arena);
        assert_eq!(arena.live_count(), 0);
    }

    #[test]
    fn linked_modifiers_stay_live_until_the_source_goes_away() {
        let mut arena = AggregatorArena::new();
        let qualifier = ModifierQualifier::of_kind(ModTarget::IncomingEffect);
        let ward = EffectSpec::at_level(
            &mut arena,
            Rc::new(EffectDefinition::new("Ward").with_modifier(ModifierRecord::new(
                ModTarget::IncomingEffect,
                AttributeId::new("Health"),
                ModOp::Additive,
                10.0,
            ))),
            1.0,
        );
        let mut spell = EffectSpec::at_level(&mut arena, fireball(), 1.0);
        let health = AttributeId::new("Health");

        assert_eq!(spell.apply_modifiers_from(&mut arena, &ward, &qualifier), 1);
        assert_eq!(spell.magnitude(&mut arena, health), -20.0);

        let ward_id = arena.get(ward.modifiers()[0].aggregator()).unwrap();
        arena.execute_mod(ward_id, ModOp::Additive, &crate::EvaluatedResult::new(5.0));
        assert_eq!(spell.magnitude(&mut arena, health), -15.0);

        ward.release(&mut arena);
        assert_eq!(spell.magnitude(&mut arena, health), -30.0);
        spell.release(&mut arena);
    }

    #[test]
    fn tag_requirements_gate_modification() {
        let mut arena = AggregatorArena::new();
        let qualifier = ModifierQualifier::of_kind(ModTarget::OutgoingEffect);
        let ice_only = EffectSpec::at_level(
            &mut arena,
            Rc::new(EffectDefinition::new("IceMastery").with_modifier(
                ModifierRecord::new(ModTarget::OutgoingEffect, AttributeId::new("Health"), ModOp::Additive, -5.0)
                    .with_required_tags(tags(&["Ice"])),
            )),
            1.0,
        );
        let not_fire = EffectSpec::at_level(
            &mut arena,
            Rc::new(
                EffectDefinition::new("Dampen")
                    .with_ignore_tags(tags(&["Fire"]))
                    .with_modifier(ModifierRecord::new(
                        ModTarget::OutgoingEffect,
                        AttributeId::new("Health"),
                        ModOp::Additive,
                        5.0,
                    )),
            ),
            1.0,
        );
        let mut spell = EffectSpec::at_level(&mut arena, fireball(), 1.0);

        assert_eq!(spell.apply_modifiers_from(&mut arena, &ice_only, &qualifier), 0);
        assert_eq!(spell.apply_modifiers_from(&mut arena, &not_fire, &qualifier), 0);
        assert_eq!(
            spell.apply_modifiers_from(&mut arena, &ice_only, &ModifierQualifier::of_kind(ModTarget::IncomingEffect)),
            0
        );

        for spec in [ice_only, not_fire, spell] {
            spec.release(&mut arena);
        }
    }

    #[test]
    fn duration_aspect_targets_duration() {
        let mut arena = AggregatorArena::new();
        let qualifier = ModifierQualifier::of_kind(ModTarget::IncomingEffect);
        let lingering = EffectSpec::at_level(
            &mut arena,
            Rc::new(EffectDefinition::new("Lingering").with_modifier(
                ModifierRecord::new(ModTarget::IncomingEffect, AttributeId::new("Any"), ModOp::Additive, 5.0)
                    .with_aspect(EffectAspect::Duration),
            )),
            1.0,
        );
        let mut spell = EffectSpec::at_level(&mut arena, fireball(), 1.0);

        let magnitude_only = qualifier.with_aspects(EffectAspects::MAGNITUDE);
        assert_eq!(spell.count_modifiers_from(&lingering, &magnitude_only), 0);

        assert_eq!(spell.apply_modifiers_from(&mut arena, &lingering, &qualifier), 1);
        assert_eq!(spell.duration(&mut arena), 15.0);

        lingering.release(&mut arena);
        spell.release(&mut arena);
    }

    #[test]
    fn make_unique_isolates_a_duplicate() {
        let mut arena = AggregatorArena::new();
        let qualifier = ModifierQualifier::of_kind(ModTarget::OutgoingEffect);
        let health = AttributeId::new("Health");
        let original = EffectSpec::at_level(&mut arena, fireball(), 1.0);

        let mut copy = original.duplicate(&mut arena);
        copy.make_unique(&mut arena);

        let buff = EffectSpec::at_level(&mut arena, outgoing_buff(ModOp::Additive, -10.0), 1.0);
        copy.apply_modifiers_from(&mut arena, &buff, &qualifier);

        assert_eq!(copy.magnitude(&mut arena, health), -40.0);
        assert_eq!(original.magnitude(&mut arena, health), -30.0);

        for spec in [original, copy, buff] {
            spec.release(&mut arena);
        }
        assert_eq!(arena.live_count(), 0);
    }

    #[test]
    fn execute_modifiers_folds_once() {
        let mut arena = AggregatorArena::new();
        let qualifier = ModifierQualifier::of_kind(ModTarget::ActiveEffect);
        let health = AttributeId::new("Health");
        let amplify = EffectSpec::at_level(
            &mut arena,
            Rc::new(EffectDefinition::new("Amplify").with_modifier(ModifierRecord::new(
                ModTarget::ActiveEffect,
                health,
                ModOp::Multiplicative,
                2.0,
            ))),
            1.0,
        );
        let mut spell = EffectSpec::at_level(&mut arena, fireball(), 1.0);

        assert_eq!(spell.execute_modifiers_from(&mut arena, &amplify, &qualifier), 1);
        amplify.release(&mut arena);
        assert_eq!(spell.magnitude(&mut arena, health), -60.0);

        spell.release(&mut arena);
        assert_eq!(arena.live_count(), 0);
    }

    #[test]
    fn qualifier_targets() {
        let a = ActiveEffectHandle::new(1);
        let b = ActiveEffectHandle::new(2);
        assert!(ModifierQualifier::new().test_target(a));
        assert!(!ModifierQualifier::new().with_ignore_handle(a).test_target(a));
        assert!(ModifierQualifier::new().with_ignore_handle(a).test_target(b));
        assert!(!ModifierQualifier::new().with_exclusive_target(a).test_target(b));
    }
}
