//! End-to-end application flows through `EffectTarget`.

use std::cell::RefCell;
use std::rc::Rc;

use effects_core::{
    ActiveEffectHandle, AggregatorArena, AttributeId, AttributeSet, CopyPolicy, EffectDefinition, EffectSpec,
    EffectTarget, EffectsConfig, ModOp, ModTarget, ModifierRecord,
};

fn health() -> AttributeId {
    AttributeId::new("Health")
}

fn unit(arena: &mut AggregatorArena, name: &str) -> EffectTarget<AttributeSet> {
    EffectTarget::new(arena, name, AttributeSet::new().with_attribute("Health", 100.0))
}

fn strike(damage: f64) -> Rc<EffectDefinition> {
    Rc::new(
        EffectDefinition::new("Strike")
            .with_duration(EffectsConfig::INSTANT_APPLICATION)
            .with_modifier(ModifierRecord::attribute("Health", ModOp::Additive, -damage)),
    )
}

fn aura(name: &str, target: ModTarget, op: ModOp, value: f64) -> Rc<EffectDefinition> {
    Rc::new(
        EffectDefinition::new(name)
            .with_duration(EffectsConfig::INFINITE_DURATION)
            .with_modifier(ModifierRecord::new(target, health(), op, value)),
    )
}

#[test]
fn instant_effect_changes_health_without_storing_an_effect() {
    let mut arena = AggregatorArena::new();
    let mut target = unit(&mut arena, "target");
    let spec = EffectSpec::at_level(&mut arena, strike(10.0), 1.0);

    let handle = target.apply_spec_to_self(&mut arena, &spec, 0).unwrap();

    assert!(!handle.is_valid());
    assert_eq!(target.attribute_value(health()), 90.0);
    assert_eq!(target.container().num_effects(), 0);

    spec.release(&mut arena);
    target.release(&mut arena);
    assert_eq!(arena.live_count(), 0);
}

#[test]
fn periodic_effect_executes_on_each_boundary_then_expires() {
    let mut arena = AggregatorArena::new();
    let mut target = unit(&mut arena, "target");
    let poison = Rc::new(
        EffectDefinition::new("Poison")
            .with_duration(30.0)
            .with_period(10.0)
            .with_modifier(ModifierRecord::attribute("Health", ModOp::Additive, -5.0)),
    );
    let spec = EffectSpec::at_level(&mut arena, poison, 1.0);

    let handle = target.apply_spec_to_self(&mut arena, &spec, 0).unwrap();
    assert!(handle.is_valid());
    let effect = target.container().effect(handle).unwrap();
    assert_eq!(effect.next_execute_time(), effect.start_time() + 10.0);

    let mut executions = 0;
    for step in 1..=3 {
        let report = target.tick(&mut arena, 10.0);
        executions += report.executions;
        assert_eq!(target.attribute_value(health()), 100.0 - 5.0 * f64::from(step));
        if step < 3 {
            assert!(target.container().is_effect_active(handle));
        } else {
            assert_eq!(report.expired, vec![handle]);
        }
    }

    assert_eq!(executions, 3);
    assert!(!target.container().is_effect_active(handle));
    assert_eq!(target.tick(&mut arena, 10.0).executions, 0);
    assert_eq!(target.attribute_value(health()), 85.0);

    spec.release(&mut arena);
    target.release(&mut arena);
    assert_eq!(arena.live_count(), 0);
}

#[test]
fn small_ticks_reach_the_same_periodic_outcome() {
    let mut arena = AggregatorArena::new();
    let mut target = unit(&mut arena, "target");
    let poison = Rc::new(
        EffectDefinition::new("Poison")
            .with_duration(30.0)
            .with_period(10.0)
            .with_modifier(ModifierRecord::attribute("Health", ModOp::Additive, -5.0)),
    );
    let spec = EffectSpec::at_level(&mut arena, poison, 1.0);
    let handle = target.apply_spec_to_self(&mut arena, &spec, 0).unwrap();

    let mut executions = 0;
    for _ in 0..35 {
        executions += target.tick(&mut arena, 1.0).executions;
    }
    assert_eq!(executions, 3);
    assert!(!target.container().is_effect_active(handle));
    assert_eq!(target.attribute_value(health()), 85.0);

    spec.release(&mut arena);
    target.release(&mut arena);
}

#[test]
fn one_large_tick_catches_up_without_passing_expiry() {
    let mut arena = AggregatorArena::new();
    let mut target = unit(&mut arena, "target");
    let poison = Rc::new(
        EffectDefinition::new("Poison")
            .with_duration(30.0)
            .with_period(10.0)
            .with_modifier(ModifierRecord::attribute("Health", ModOp::Additive, -5.0)),
    );
    let spec = EffectSpec::at_level(&mut arena, poison, 1.0);
    let handle = target.apply_spec_to_self(&mut arena, &spec, 0).unwrap();

    let report = target.tick(&mut arena, 100.0);
    assert_eq!(report.executions, 3);
    assert_eq!(report.expired, vec![handle]);
    assert_eq!(target.attribute_value(health()), 85.0);

    spec.release(&mut arena);
    target.release(&mut arena);
}

#[test]
fn outgoing_buffs_are_captured_at_cast_time() {
    let mut arena = AggregatorArena::new();
    let mut caster = unit(&mut arena, "caster");
    let mut victim = unit(&mut arena, "victim");

    let empower = EffectSpec::at_level(
        &mut arena,
        aura("Empower", ModTarget::OutgoingEffect, ModOp::Multiplicative, 2.0),
        1.0,
    );
    let buff = caster.apply_spec_to_self(&mut arena, &empower, 0).unwrap();
    empower.release(&mut arena);

    let spell = caster.make_outgoing_spec(&mut arena, strike(10.0), 1.0);
    assert_eq!(spell.magnitude(&mut arena, health()), -20.0);

    // The buff ends before the spell lands; the snapshot keeps its effect.
    assert!(caster.remove_effect(&mut arena, buff));
    caster
        .apply_spec_to_target(&mut arena, &spell, &mut victim, 0)
        .unwrap();
    assert_eq!(victim.attribute_value(health()), 80.0);
    assert_eq!(caster.attribute_value(health()), 100.0);

    spell.release(&mut arena);
    victim.release(&mut arena);
    caster.release(&mut arena);
    assert_eq!(arena.live_count(), 0);
}

fn curse(damage: f64) -> Rc<EffectDefinition> {
    aura("Curse", ModTarget::Attribute, ModOp::Additive, -damage)
}

/// Applies an outgoing x2 buff to `caster` and returns its handle.
fn empower(
    arena: &mut AggregatorArena,
    caster: &mut EffectTarget<AttributeSet>,
    policy: CopyPolicy,
) -> ActiveEffectHandle {
    let definition = Rc::new(
        EffectDefinition::new("Empower")
            .with_duration(EffectsConfig::INFINITE_DURATION)
            .with_copy_policy(policy)
            .with_modifier(ModifierRecord::new(
                ModTarget::OutgoingEffect,
                health(),
                ModOp::Multiplicative,
                2.0,
            )),
    );
    let spec = EffectSpec::at_level(arena, definition, 1.0);
    let handle = caster.apply_spec_to_self(arena, &spec, 0).unwrap();
    spec.release(arena);
    handle
}

#[test]
fn snapshots_survive_removals_in_other_containers() {
    let mut arena = AggregatorArena::new();
    let mut caster = unit(&mut arena, "caster");
    let mut victim = unit(&mut arena, "victim");

    let buff = empower(&mut arena, &mut caster, CopyPolicy::Default);
    let fort = EffectSpec::at_level(&mut arena, aura("Fort", ModTarget::Attribute, ModOp::Additive, 5.0), 1.0);
    let unrelated = victim.apply_spec_to_self(&mut arena, &fort, 0).unwrap();
    fort.release(&mut arena);
    // Same handle number, different containers.
    assert_eq!(buff, unrelated);

    let spell = caster.make_outgoing_spec(&mut arena, curse(10.0), 1.0);
    let cursed = caster
        .apply_spec_to_target(&mut arena, &spell, &mut victim, 0)
        .unwrap();
    spell.release(&mut arena);
    assert_eq!(victim.attribute_value(health()), 85.0);

    assert!(victim.remove_effect(&mut arena, unrelated));
    assert_eq!(victim.attribute_value(health()), 80.0);
    assert_eq!(
        victim.container().effect_magnitude(&mut arena, cursed, health()),
        -20.0
    );

    victim.release(&mut arena);
    caster.release(&mut arena);
    assert_eq!(arena.live_count(), 0);
}

#[test]
fn snapshots_outlive_the_buff_they_captured() {
    let mut arena = AggregatorArena::new();
    let mut caster = unit(&mut arena, "caster");

    let buff = empower(&mut arena, &mut caster, CopyPolicy::Default);
    let spell = caster.make_outgoing_spec(&mut arena, curse(10.0), 1.0);
    let cursed = caster.apply_spec_to_self(&mut arena, &spell, 0).unwrap();
    spell.release(&mut arena);
    assert_eq!(caster.attribute_value(health()), 80.0);

    assert!(caster.remove_effect(&mut arena, buff));
    assert_eq!(caster.attribute_value(health()), 80.0);
    assert_eq!(
        caster.container().effect_magnitude(&mut arena, cursed, health()),
        -20.0
    );

    assert!(caster.remove_effect(&mut arena, cursed));
    assert_eq!(caster.attribute_value(health()), 100.0);
    caster.release(&mut arena);
    assert_eq!(arena.live_count(), 0);
}

#[test]
fn linked_buffs_reach_other_targets_on_sync() {
    let mut arena = AggregatorArena::new();
    let mut caster = unit(&mut arena, "caster");
    let mut victim = unit(&mut arena, "victim");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    victim
        .container_mut()
        .register_attribute_modify_callback(health(), move |_, result| log.borrow_mut().push(result.magnitude));

    let buff = empower(&mut arena, &mut caster, CopyPolicy::AlwaysLink);
    let spell = caster.make_outgoing_spec(&mut arena, curse(10.0), 1.0);
    let cursed = caster
        .apply_spec_to_target(&mut arena, &spell, &mut victim, 0)
        .unwrap();
    spell.release(&mut arena);
    assert_eq!(victim.attribute_value(health()), 80.0);

    assert!(caster.remove_effect(&mut arena, buff));
    assert!(arena.has_pending_writes(victim.container().id()));
    assert_eq!(victim.sync(&mut arena), 1);
    assert_eq!(victim.attribute_value(health()), 90.0);
    assert_eq!(
        victim.container().effect_magnitude(&mut arena, cursed, health()),
        -10.0
    );
    assert_eq!(*seen.borrow(), vec![80.0, 90.0]);
    assert_eq!(victim.sync(&mut arena), 0);

    victim.release(&mut arena);
    caster.release(&mut arena);
    assert_eq!(arena.live_count(), 0);
}

#[test]
fn ticking_picks_up_changes_from_other_targets() {
    let mut arena = AggregatorArena::new();
    let mut caster = unit(&mut arena, "caster");
    let mut victim = unit(&mut arena, "victim");

    let buff = empower(&mut arena, &mut caster, CopyPolicy::AlwaysLink);
    let spell = caster.make_outgoing_spec(&mut arena, curse(10.0), 1.0);
    caster
        .apply_spec_to_target(&mut arena, &spell, &mut victim, 0)
        .unwrap();
    spell.release(&mut arena);

    caster.remove_effect(&mut arena, buff);
    victim.tick(&mut arena, 1.0);
    assert_eq!(victim.attribute_value(health()), 90.0);
    assert!(!arena.has_pending_writes(victim.container().id()));

    victim.release(&mut arena);
    caster.release(&mut arena);
}

#[test]
fn incoming_modifiers_stay_linked_to_their_source() {
    let mut arena = AggregatorArena::new();
    let mut victim = unit(&mut arena, "victim");

    let ward = EffectSpec::at_level(
        &mut arena,
        aura("Ward", ModTarget::IncomingEffect, ModOp::Additive, 4.0),
        1.0,
    );
    let ward_handle = victim.apply_spec_to_self(&mut arena, &ward, 0).unwrap();
    ward.release(&mut arena);

    let burn = EffectSpec::at_level(
        &mut arena,
        aura("Burn", ModTarget::Attribute, ModOp::Additive, -10.0),
        1.0,
    );
    let burn_handle = victim.apply_spec_to_self(&mut arena, &burn, 0).unwrap();
    burn.release(&mut arena);
    assert_eq!(victim.attribute_value(health()), 94.0);
    assert_eq!(
        victim
            .container()
            .effect_magnitude(&mut arena, burn_handle, health()),
        -6.0
    );

    assert!(victim.remove_effect(&mut arena, ward_handle));
    assert_eq!(victim.attribute_value(health()), 90.0);

    assert!(victim.remove_effect(&mut arena, burn_handle));
    assert_eq!(victim.attribute_value(health()), 100.0);

    victim.release(&mut arena);
    assert_eq!(arena.live_count(), 0);
}

#[test]
fn incoming_modifiers_reduce_instant_damage() {
    let mut arena = AggregatorArena::new();
    let mut victim = unit(&mut arena, "victim");
    let ward = EffectSpec::at_level(
        &mut arena,
        aura("Ward", ModTarget::IncomingEffect, ModOp::Additive, 4.0),
        1.0,
    );
    victim.apply_spec_to_self(&mut arena, &ward, 0).unwrap();
    ward.release(&mut arena);

    let hit = EffectSpec::at_level(&mut arena, strike(10.0), 1.0);
    victim.apply_spec_to_self(&mut arena, &hit, 0).unwrap();
    assert_eq!(victim.attribute_value(health()), 94.0);

    // The caller's spec is untouched by the target's modifiers.
    assert_eq!(hit.magnitude(&mut arena, health()), -10.0);

    hit.release(&mut arena);
    victim.release(&mut arena);
}

#[test]
fn active_effect_modifiers_reach_existing_and_later_effects() {
    let mut arena = AggregatorArena::new();
    let mut victim = unit(&mut arena, "victim");

    let burn = EffectSpec::at_level(
        &mut arena,
        aura("Burn", ModTarget::Attribute, ModOp::Additive, -10.0),
        1.0,
    );
    victim.apply_spec_to_self(&mut arena, &burn, 0).unwrap();
    assert_eq!(victim.attribute_value(health()), 90.0);

    let intensify = EffectSpec::at_level(
        &mut arena,
        aura("Intensify", ModTarget::ActiveEffect, ModOp::Multiplicative, 2.0),
        1.0,
    );
    let intensify_handle = victim.apply_spec_to_self(&mut arena, &intensify, 0).unwrap();
    assert_eq!(victim.attribute_value(health()), 80.0);

    let scorch = EffectSpec::at_level(
        &mut arena,
        aura("Scorch", ModTarget::Attribute, ModOp::Additive, -5.0),
        1.0,
    );
    victim.apply_spec_to_self(&mut arena, &scorch, 0).unwrap();
    assert_eq!(victim.attribute_value(health()), 70.0);

    victim.remove_effect(&mut arena, intensify_handle);
    assert_eq!(victim.attribute_value(health()), 85.0);

    for spec in [burn, intensify, scorch] {
        spec.release(&mut arena);
    }
    victim.release(&mut arena);
    assert_eq!(arena.live_count(), 0);
}

#[test]
fn failed_effect_chance_leaves_active_effects_alone() {
    let mut arena = AggregatorArena::new();
    let mut victim = unit(&mut arena, "victim");

    let burn = EffectSpec::at_level(
        &mut arena,
        aura("Burn", ModTarget::Attribute, ModOp::Additive, -10.0),
        1.0,
    );
    victim.apply_spec_to_self(&mut arena, &burn, 0).unwrap();

    let unreliable = Rc::new(
        EffectDefinition::new("Unreliable")
            .with_duration(EffectsConfig::INFINITE_DURATION)
            .with_chance_to_apply_to_effect(0.0)
            .with_modifier(ModifierRecord::new(
                ModTarget::ActiveEffect,
                health(),
                ModOp::Multiplicative,
                2.0,
            )),
    );
    let spec = EffectSpec::at_level(&mut arena, unreliable, 1.0);
    let handle = victim.apply_spec_to_self(&mut arena, &spec, 7).unwrap();

    assert!(victim.container().is_effect_active(handle));
    assert_eq!(victim.attribute_value(health()), 90.0);

    burn.release(&mut arena);
    spec.release(&mut arena);
    victim.release(&mut arena);
}

#[test]
fn instant_active_effect_modifiers_are_permanent() {
    let mut arena = AggregatorArena::new();
    let mut victim = unit(&mut arena, "victim");
    let burn = EffectSpec::at_level(
        &mut arena,
        aura("Burn", ModTarget::Attribute, ModOp::Additive, -10.0),
        1.0,
    );
    let burn_handle = victim.apply_spec_to_self(&mut arena, &burn, 0).unwrap();

    let deepen = Rc::new(EffectDefinition::new("Deepen").with_modifier(ModifierRecord::new(
        ModTarget::ActiveEffect,
        health(),
        ModOp::Additive,
        -5.0,
    )));
    let spec = EffectSpec::at_level(&mut arena, deepen, 1.0);
    victim.apply_spec_to_self(&mut arena, &spec, 0).unwrap();

    assert_eq!(victim.attribute_value(health()), 85.0);
    assert_eq!(
        victim
            .container()
            .effect_magnitude(&mut arena, burn_handle, health()),
        -15.0
    );

    burn.release(&mut arena);
    spec.release(&mut arena);
    victim.release(&mut arena);
}
