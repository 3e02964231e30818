use std::rc::Rc;

use effects_core::{
    AggregatorArena, AggregatorBase, AttributeId, Curve, CurveRegistry, CurveTable, EffectDefinition,
    EffectSpec, LevelSpec, ModOp, ModifierRecord, ScalableValue,
};

#[test]
fn edits_reach_every_dependent() {
    let mut arena = AggregatorArena::new();
    let leaf = arena.create_constant(5.0);
    let middle = arena.create_constant(10.0);
    let top = arena.create_constant(1.0);
    let (leaf_id, middle_id, top_id) = (leaf.id(), middle.id(), top.id());

    let link = arena.share(&leaf);
    arena.apply_mod(middle_id, ModOp::Additive, link, false);
    let link = arena.share(&middle);
    arena.apply_mod(top_id, ModOp::Multiplicative, link, false);
    assert_eq!(arena.magnitude(top_id), 15.0);
    assert!(arena.is_cached(top_id));

    arena.execute_mod(leaf_id, ModOp::Additive, &effects_core::EvaluatedResult::new(5.0));
    assert!(!arena.is_cached(middle_id));
    assert!(!arena.is_cached(top_id));
    assert_eq!(arena.magnitude(top_id), 20.0);

    for owned in [top, middle, leaf] {
        arena.release(owned);
    }
    assert_eq!(arena.live_count(), 0);
}

#[test]
fn links_follow_and_snapshots_freeze() {
    let mut arena = AggregatorArena::new();
    let source = arena.create_constant(5.0);
    let linked = arena.create_constant(10.0);
    let frozen = arena.create_constant(10.0);

    let link = arena.share(&source);
    arena.apply_mod(linked.id(), ModOp::Additive, link, false);
    let snapshot = arena.share(&source);
    arena.apply_mod(frozen.id(), ModOp::Additive, snapshot, true);
    assert_eq!(arena.magnitude(linked.id()), 15.0);
    assert_eq!(arena.magnitude(frozen.id()), 15.0);

    arena.execute_mod(source.id(), ModOp::Override, &effects_core::EvaluatedResult::new(20.0));
    assert_eq!(arena.magnitude(linked.id()), 30.0);
    assert_eq!(arena.magnitude(frozen.id()), 15.0);

    // A freed source drops out of live links; the snapshot keeps its copy.
    arena.release(source);
    assert_eq!(arena.magnitude(linked.id()), 10.0);
    assert_eq!(arena.magnitude(frozen.id()), 15.0);

    arena.release(linked);
    arena.release(frozen);
    assert_eq!(arena.live_count(), 0);
}

#[test]
fn operation_order_is_fixed() {
    let mut arena = AggregatorArena::new();
    let total = arena.create_constant(10.0);
    let id = total.id();

    let half = arena.create_constant(0.5);
    arena.apply_mod(id, ModOp::Multiplicative, half, false);
    let bonus = arena.create_constant(4.0);
    arena.apply_mod(id, ModOp::Additive, bonus, false);
    assert_eq!(arena.magnitude(id), 7.0);

    let pinned = arena.create_constant(2.0);
    arena.apply_mod(id, ModOp::Override, pinned, false);
    assert_eq!(arena.magnitude(id), 3.0);

    arena.release(total);
    assert_eq!(arena.live_count(), 0);
}

fn fireball() -> Rc<EffectDefinition> {
    Rc::new(EffectDefinition::new("Fireball").with_modifier(ModifierRecord::attribute(
        "Health",
        ModOp::Additive,
        ScalableValue::curve(-1.0, "Damage", "Fireball"),
    )))
}

fn curves() -> CurveRegistry {
    CurveRegistry::new().with_table(
        "Damage",
        CurveTable::new().with_row("Fireball", Curve::from_points(&[(1.0, 10.0), (10.0, 100.0)])),
    )
}

#[test]
fn magnitudes_follow_the_level() {
    let mut arena = AggregatorArena::with_curves(curves());
    let health = AttributeId::new("Health");
    let spec = EffectSpec::at_level(&mut arena, fireball(), 5.0);
    assert_eq!(spec.magnitude(&mut arena, health), -50.0);

    spec.set_level(&mut arena, 10.0);
    assert_eq!(spec.magnitude(&mut arena, health), -100.0);

    // Levels above the last key hold the last value.
    spec.set_level(&mut arena, 30.0);
    assert_eq!(spec.magnitude(&mut arena, health), -100.0);
    spec.release(&mut arena);
}

#[test]
fn copies_share_the_level_and_snapshots_do_not() {
    let mut arena = AggregatorArena::with_curves(curves());
    let health = AttributeId::new("Health");
    let level = LevelSpec::new(1.0);
    let spec = EffectSpec::new(&mut arena, fireball(), level.clone());
    let copy = spec.duplicate(&mut arena);

    let frozen = AggregatorBase::new(ScalableValue::curve(1.0, "Damage", "Fireball"));
    let frozen = arena.create(frozen, level.snapshot());

    spec.set_level(&mut arena, 10.0);
    assert_eq!(copy.magnitude(&mut arena, health), -100.0);
    assert_eq!(arena.magnitude(frozen.id()), 10.0);

    arena.release(frozen);
    copy.release(&mut arena);
    spec.release(&mut arena);
    assert_eq!(arena.live_count(), 0);
}

#[test]
fn missing_curves_degrade_to_zero() {
    let mut arena = AggregatorArena::new();
    let spec = EffectSpec::at_level(&mut arena, fireball(), 5.0);
    let modifier = spec.modifiers()[0].aggregator();
    let id = arena.get(modifier).unwrap();

    assert!(arena.try_evaluate(id).is_err());
    assert_eq!(arena.magnitude(id), 0.0);
    spec.release(&mut arena);
}
