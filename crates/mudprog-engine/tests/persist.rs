//! Snapshot export and hydration.

use chrono::NaiveDate;
use mudprog_engine::{
    Engine, EngineConfig, EngineError, GameCalendar, HookKind, IntervalUnit, LoadError,
    MemoryWorld, ProgDefinition, ProgRecord, RecurringInterval, RegisterEntryRecord,
    RegisterError, Snapshot,
};
use mudprog_foundation::{
    ConcreteKind, EntityRef, EventType, Parameter, ProgId, ProgSignature, ProgType, ReturnType,
    Value,
};

fn engine(world: &MemoryWorld) -> Engine {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    Engine::new(
        EngineConfig::default(),
        Box::new(world.clone()),
        Box::new(GameCalendar::new(start)),
    )
}

fn on_character(ret: impl Into<ReturnType>) -> ProgSignature {
    ProgSignature::typed(ret, vec![Parameter::new("who", ProgType::CHARACTER)])
}

/// An engine using every kind of record.
fn populated(world: &MemoryWorld) -> (Engine, EntityRef) {
    let bob = world.add(ConcreteKind::Character, "Bob");
    let mut engine = engine(world);
    engine
        .register_variable(ProgType::CHARACTER, "kills", ProgType::NUMBER)
        .unwrap();
    engine
        .set_register_value(bob, "kills", Value::number(7.0))
        .unwrap();

    let boast = engine
        .create_prog(
            ProgDefinition::new(
                "boast",
                on_character(ProgType::TEXT),
                r#"return name(who) + " has " + totext(who.kills) + " kills";"#,
            )
            .with_category("combat", "talk"),
        )
        .unwrap();
    let cry = engine
        .create_prog(ProgDefinition::new(
            "cry",
            ProgSignature::typed(ReturnType::Void, vec![Parameter::new("victim", ProgType::CHARACTER)]),
            r#"send(victim, boast(victim));"#,
        ))
        .unwrap();
    let always = engine
        .create_prog(ProgDefinition::new("always", on_character(ProgType::BOOLEAN), "return true;"))
        .unwrap();
    let dawn = engine
        .create_prog(ProgDefinition::new(
            "dawn",
            ProgSignature::typed(ReturnType::Void, vec![]),
            "",
        ))
        .unwrap();
    engine.set_source(boast, r#"return name(who) + " has " + totext(who.kills) + " kills!";"#).unwrap();

    let hook = engine
        .create_hook("death_cry", "combat", EventType::CharacterDies, HookKind::Generic, &[cry])
        .unwrap();
    engine.install_hook(bob, hook).unwrap();
    engine
        .add_default_hook(hook, ConcreteKind::Character, always)
        .unwrap();
    engine
        .add_schedule(dawn, RecurringInterval::new(1, IntervalUnit::Days))
        .unwrap();
    (engine, bob)
}

#[test]
fn test_snapshot_survives_yaml() {
    let world = MemoryWorld::new();
    let (engine, _) = populated(&world);
    let snapshot = engine.snapshot();

    let yaml = snapshot.to_yaml().unwrap();
    assert!(yaml.contains("every 1 days"));
    assert_eq!(Snapshot::from_yaml_str(&yaml).unwrap(), snapshot);
}

#[test]
fn test_reload_restores_behavior() {
    let world = MemoryWorld::new();
    let (original, bob) = populated(&world);
    let yaml = original.snapshot().to_yaml().unwrap();

    let mut restored = engine(&world);
    let report = restored
        .load_snapshot(Snapshot::from_yaml_str(&yaml).unwrap())
        .unwrap();
    assert_eq!(report.total, 4);
    assert_eq!(report.failing_after, 0);
    assert_eq!(restored.snapshot(), original.snapshot());

    let boast = restored.prog_by_name("boast").unwrap();
    assert_eq!(boast.revision, 2);
    assert_eq!(boast.category, "combat");

    let fired = restored.fire(EventType::CharacterDies, bob, &[Value::entity(bob)]).unwrap();
    assert_eq!(fired.executed, 1);
    let output: Vec<String> = restored.take_output().into_iter().map(|d| d.message).collect();
    assert_eq!(output, vec!["Bob has 7 kills!".to_string()]);

    // New records continue after the loaded ids.
    let next = restored
        .create_prog(ProgDefinition::new("extra", ProgSignature::typed(ReturnType::Void, vec![]), ""))
        .unwrap();
    assert_eq!(next, ProgId(5));
}

#[test]
fn test_missing_fields_take_defaults() {
    let yaml = r#"
progs:
  - id: 3
    name: four
    signature: !Typed
      return_type: !Value Number
      parameters: []
    source: "return 4;"
"#;
    let snapshot = Snapshot::from_yaml_str(yaml).unwrap();
    assert!(snapshot.hooks.is_empty());
    let record = &snapshot.progs[0];
    assert_eq!(record.revision, 1);
    assert_eq!(record.category, "");

    let world = MemoryWorld::new();
    let mut engine = engine(&world);
    engine.load_snapshot(snapshot).unwrap();
    assert_eq!(engine.execute(ProgId(3), &[]).unwrap(), Value::number(4.0));
}

#[test]
fn test_duplicate_ids_are_rejected() {
    let world = MemoryWorld::new();
    let mut engine = engine(&world);
    let record = ProgRecord {
        id: ProgId(1),
        name: "four".to_string(),
        category: String::new(),
        subcategory: String::new(),
        revision: 1,
        signature: ProgSignature::typed(ProgType::NUMBER, vec![]),
        staticness: Default::default(),
        source: "return 4;".to_string(),
    };
    engine.load_prog(record.clone()).unwrap();

    let renamed = ProgRecord {
        name: "five".to_string(),
        ..record
    };
    assert_eq!(
        engine.load_prog(renamed),
        Err(LoadError::DuplicateId("prog#1".to_string()))
    );
}

#[test]
fn test_prog_names_are_checked_on_load() {
    let world = MemoryWorld::new();
    let mut engine = engine(&world);
    let record = |id: u64, name: &str| ProgRecord {
        id: ProgId(id),
        name: name.to_string(),
        category: String::new(),
        subcategory: String::new(),
        revision: 1,
        signature: ProgSignature::typed(ProgType::NUMBER, vec![]),
        staticness: Default::default(),
        source: "return 4;".to_string(),
    };
    engine.load_prog(record(1, "four")).unwrap();

    assert_eq!(
        engine.load_prog(record(2, "FOUR")),
        Err(LoadError::Prog(EngineError::DuplicateName("FOUR".to_string())))
    );
    assert_eq!(
        engine.load_prog(record(3, "four more")),
        Err(LoadError::Prog(EngineError::InvalidName("four more".to_string())))
    );
}

#[test]
fn test_register_entries_are_checked_on_load() {
    let world = MemoryWorld::new();
    let mut engine = engine(&world);
    let record = |host, name: &str, ty, default| RegisterEntryRecord {
        host,
        name: name.to_string(),
        ty,
        default,
    };

    assert_eq!(
        engine.load_register_entry(record(
            ConcreteKind::Number,
            "kills",
            ProgType::NUMBER,
            Value::number(0.0)
        )),
        Err(RegisterError::InvalidHost(ProgType::NUMBER))
    );
    assert_eq!(
        engine.load_register_entry(record(
            ConcreteKind::Character,
            "bad name!",
            ProgType::NUMBER,
            Value::number(0.0)
        )),
        Err(RegisterError::InvalidName("bad name!".to_string()))
    );
    assert_eq!(
        engine.load_register_entry(record(
            ConcreteKind::Character,
            "tally",
            ProgType::NUMBER.collection(),
            Value::number(5.0)
        )),
        Err(RegisterError::InvalidType(ProgType::NUMBER.collection()))
    );
    assert!(matches!(
        engine.load_register_entry(record(
            ConcreteKind::Character,
            "kills",
            ProgType::NUMBER,
            Value::text("many")
        )),
        Err(RegisterError::TypeMismatch { .. })
    ));
    assert!(engine.register().entries().next().is_none());

    engine
        .load_register_entry(record(
            ConcreteKind::Character,
            "Kills",
            ProgType::NUMBER,
            Value::number(5.0),
        ))
        .unwrap();
    let entry = engine.register().entry(ConcreteKind::Character, "kills").unwrap();
    assert_eq!(entry.default, Value::number(5.0));
}
