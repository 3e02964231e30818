use std::fs;
use std::path::{Path, PathBuf};

use effects_content::{ContentFactory, ScenarioStep};
use effects_core::{AggregatorArena, AttributeId, AttributeSet, EffectTarget, EffectsConfig};
use tempfile::TempDir;

fn sample_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../sim/data")
}

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

#[test]
fn sample_content_loads() {
    let factory = ContentFactory::new(sample_dir());
    let content = factory.load_all().unwrap();

    assert_eq!(content.config, EffectsConfig::default());
    assert!(content.definitions.contains("Fireball"));
    assert!(content.definitions.contains("Overgrowth"));
    assert_eq!(content.curves.len(), 2);

    let scenario = factory.load_scenario("duel").unwrap();
    assert_eq!(scenario.seed, Some(7));
    for step in &scenario.steps {
        if let ScenarioStep::Apply { effect, .. } = step {
            assert!(content.definitions.contains(effect), "unknown effect {effect}");
        }
    }
}

#[test]
fn loaded_definitions_drive_the_engine() {
    let content = ContentFactory::new(sample_dir()).load_all().unwrap();
    let mut arena = AggregatorArena::with_curves(content.curves);
    let mage = EffectTarget::new(&mut arena, "mage", AttributeSet::new());
    let mut knight = EffectTarget::new(
        &mut arena,
        "knight",
        AttributeSet::new().with_attribute("Health", 150.0),
    );

    let fireball = content.definitions.get("Fireball").unwrap();
    let spec = mage.make_outgoing_spec(&mut arena, fireball, 3.0);
    mage.apply_spec_to_target(&mut arena, &spec, &mut knight, 1).unwrap();
    assert_eq!(knight.attribute_value(AttributeId::new("Health")), 110.0);

    spec.release(&mut arena);
    knight.release(&mut arena);
    mage.release(&mut arena);
    assert_eq!(arena.live_count(), 0);
}

#[test]
fn missing_curves_are_reported() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config.toml", "");
    write(dir.path(), "curves.ron", "{}");
    write(
        dir.path(),
        "effects.ron",
        r#"(effects: [(
            name: "Smite",
            modifiers: [(
                target: Attribute,
                attribute: "Health",
                op: Additive,
                magnitude: (value: -1.0, curve: (table: "Damage", row: "Smite")),
            )],
        )])"#,
    );

    let err = ContentFactory::new(dir.path()).load_all().unwrap_err();
    assert!(err.to_string().contains("Smite"), "{err}");
}

#[test]
fn missing_files_name_the_path() {
    let dir = TempDir::new().unwrap();
    let err = ContentFactory::new(dir.path()).load_config().unwrap_err();
    assert!(err.to_string().contains("config.toml"), "{err}");
}

#[test]
fn empty_config_uses_defaults() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "config.toml", "");
    let config = ContentFactory::new(dir.path()).load_config().unwrap();
    assert_eq!(config, EffectsConfig::default());
}
