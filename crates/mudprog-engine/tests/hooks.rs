//! Hooks, firing and default-hook rules.

use mudprog_engine::{
    BindError, Engine, EngineConfig, EngineError, GameCalendar, HookError, HookKind, MemoryWorld,
    ProgDefinition,
};
use mudprog_foundation::{
    ConcreteKind, EntityRef, EventType, Parameter, ProgId, ProgSignature, ProgType, ReturnType,
    Value,
};

fn engine(world: &MemoryWorld) -> Engine {
    Engine::new(
        EngineConfig::default(),
        Box::new(world.clone()),
        Box::new(GameCalendar::default()),
    )
}

fn with_params(ret: impl Into<ReturnType>, params: &[(&str, ProgType)]) -> ProgSignature {
    ProgSignature::typed(
        ret,
        params
            .iter()
            .map(|(name, ty)| Parameter::new(*name, *ty))
            .collect(),
    )
}

/// A `(victim: Character) -> Void` prog.
fn on_death(engine: &mut Engine, name: &str, source: &str) -> ProgId {
    let sig = with_params(ReturnType::Void, &[("victim", ProgType::CHARACTER)]);
    engine
        .create_prog(ProgDefinition::new(name, sig, source))
        .unwrap()
}

fn messages(engine: &mut Engine) -> Vec<String> {
    engine.take_output().into_iter().map(|d| d.message).collect()
}

#[test]
fn test_payload_must_accept_event_arguments() {
    let world = MemoryWorld::new();
    let mut engine = engine(&world);
    let cry = on_death(&mut engine, "cry", r#"send(victim, "Argh!");"#);
    let hook = engine
        .create_hook("death_cry", "combat", EventType::CharacterDies, HookKind::Generic, &[cry])
        .unwrap();
    let count_sig = with_params(ReturnType::Void, &[("n", ProgType::NUMBER)]);
    let count = engine
        .create_prog(ProgDefinition::new("count", count_sig, "var m = n;"))
        .unwrap();
    let anything = engine
        .create_prog(ProgDefinition::new(
            "anything",
            ProgSignature::any_params(ReturnType::Void),
            "",
        ))
        .unwrap();

    assert!(!engine.add_hook_prog(hook, cry).unwrap());
    let err = engine.add_hook_prog(hook, count).unwrap_err();
    assert!(matches!(
        err,
        HookError::Bind(BindError::IncompatibleSignature { ref prog, ref required, .. })
            if prog == "count" && required == "(Character)"
    ));
    assert_eq!(engine.hook(hook).unwrap().progs, vec![cry]);

    assert!(engine.add_hook_prog(hook, anything).unwrap());
    assert!(!engine.add_hook_prog(hook, anything).unwrap());
    assert_eq!(engine.hook(hook).unwrap().progs, vec![cry, anything]);

    engine.remove_hook_prog(hook, cry).unwrap();
    assert_eq!(
        engine.remove_hook_prog(hook, anything),
        Err(HookError::EmptyPayload)
    );
    assert_eq!(engine.hook(hook).unwrap().progs, vec![anything]);
}

#[test]
fn test_hook_needs_a_prog() {
    let world = MemoryWorld::new();
    let mut engine = engine(&world);
    assert_eq!(
        engine.create_hook("death_cry", "", EventType::CharacterDies, HookKind::Generic, &[]),
        Err(HookError::EmptyPayload)
    );
    assert_eq!(
        engine.create_hook(
            "death_cry",
            "",
            EventType::CharacterDies,
            HookKind::Generic,
            &[ProgId(42)]
        ),
        Err(HookError::UnknownProg(ProgId(42)))
    );
    assert_eq!(engine.hooks().count(), 0);
}

#[test]
fn test_install_is_idempotent() {
    let world = MemoryWorld::new();
    let bob = world.add(ConcreteKind::Character, "Bob");
    let mut engine = engine(&world);
    let cry = on_death(&mut engine, "cry", r#"send(victim, "Argh!");"#);
    let hook = engine
        .create_hook("death_cry", "", EventType::CharacterDies, HookKind::Generic, &[cry])
        .unwrap();

    assert!(engine.install_hook(bob, hook).unwrap());
    assert!(!engine.install_hook(bob, hook).unwrap());
    assert_eq!(engine.installed_hooks(bob), vec![hook]);

    let report = engine.fire(EventType::CharacterDies, bob, &[Value::entity(bob)]).unwrap();
    assert_eq!(report.hooks, 1);
    assert_eq!(report.executed, 1);
    assert_eq!(messages(&mut engine), vec!["Argh!".to_string()]);

    assert!(engine.uninstall_hook(bob, hook).unwrap());
    assert!(!engine.uninstall_hook(bob, hook).unwrap());
    let report = engine.fire(EventType::CharacterDies, bob, &[Value::entity(bob)]).unwrap();
    assert_eq!(report.hooks, 0);
}

#[test]
fn test_fire_only_runs_hooks_for_the_event_and_target() {
    let world = MemoryWorld::new();
    let bob = world.add(ConcreteKind::Character, "Bob");
    let alice = world.add(ConcreteKind::Character, "Alice");
    let mut engine = engine(&world);
    let cry = on_death(&mut engine, "cry", r#"send(victim, "Argh!");"#);
    let hook = engine
        .create_hook("death_cry", "", EventType::CharacterDies, HookKind::Generic, &[cry])
        .unwrap();
    engine.install_hook(bob, hook).unwrap();

    assert_eq!(engine.fire(EventType::CharacterDies, alice, &[Value::entity(alice)]).unwrap().hooks, 0);
    assert_eq!(engine.fire(EventType::CharacterEntersGame, bob, &[Value::entity(bob)]).unwrap().hooks, 0);
    assert!(engine.take_output().is_empty());
}

#[test]
fn test_failing_prog_does_not_stop_its_siblings() {
    let world = MemoryWorld::new();
    let bob = world.add(ConcreteKind::Character, "Bob");
    let mut engine = engine(&world);
    let broken = on_death(&mut engine, "broken", "var zero = 0; var x = 10 / zero;");
    let cry = on_death(&mut engine, "cry", r#"send(victim, "Argh!");"#);
    let hook = engine
        .create_hook(
            "death_cry",
            "",
            EventType::CharacterDies,
            HookKind::Generic,
            &[broken, cry],
        )
        .unwrap();
    engine.install_hook(bob, hook).unwrap();

    let report = engine.fire(EventType::CharacterDies, bob, &[Value::entity(bob)]).unwrap();
    assert_eq!(report.executed, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, broken);
    assert_eq!(messages(&mut engine), vec!["Argh!".to_string()]);
}

#[test]
fn test_command_hooks_match_their_keyword() {
    let world = MemoryWorld::new();
    let bob = world.add(ConcreteKind::Character, "Bob");
    let mut engine = engine(&world);
    let sig = with_params(
        ReturnType::Void,
        &[
            ("actor", ProgType::CHARACTER),
            ("command", ProgType::TEXT),
            ("arguments", ProgType::TEXT),
        ],
    );
    let dance = engine
        .create_prog(ProgDefinition::new(
            "dance",
            sig,
            r#"send(actor, "You dance " + arguments + ".");"#,
        ))
        .unwrap();
    let hook = engine
        .create_hook(
            "dance",
            "social",
            EventType::CommandInput,
            HookKind::Command {
                keyword: "dance".to_string(),
            },
            &[dance],
        )
        .unwrap();
    engine.install_hook(bob, hook).unwrap();

    let input = |command: &str| {
        [
            Value::entity(bob),
            Value::text(command),
            Value::text("wildly"),
        ]
    };
    assert_eq!(engine.fire(EventType::CommandInput, bob, &input("DANCE")).unwrap().executed, 1);
    assert_eq!(engine.fire(EventType::CommandInput, bob, &input("sing")).unwrap().hooks, 0);
    assert_eq!(messages(&mut engine), vec!["You dance wildly.".to_string()]);

    assert_eq!(
        engine.create_hook(
            "bad",
            "",
            EventType::CharacterDies,
            HookKind::Command {
                keyword: "die".to_string()
            },
            &[dance]
        ),
        Err(HookError::NotCommandEvent(EventType::CharacterDies))
    );
}

#[test]
fn test_progs_can_fire_events() {
    let world = MemoryWorld::new();
    let bob = world.add(ConcreteKind::Character, "Bob");
    let mut engine = engine(&world);
    let cry = on_death(&mut engine, "cry", r#"send(victim, "Argh!");"#);
    let hook = engine
        .create_hook("death_cry", "", EventType::CharacterDies, HookKind::Generic, &[cry])
        .unwrap();
    engine.install_hook(bob, hook).unwrap();

    let sig = with_params(ReturnType::Void, &[("who", ProgType::CHARACTER)]);
    let slay = engine
        .create_prog(ProgDefinition::new("slay", sig, r#"fire("CharacterDies", who, who);"#))
        .unwrap();
    engine.execute(slay, &[Value::entity(bob)]).unwrap();
    assert_eq!(messages(&mut engine), vec!["Argh!".to_string()]);
}

#[test]
fn test_attached_prog_cannot_be_deleted_without_detaching() {
    let world = MemoryWorld::new();
    let mut engine = engine(&world);
    let cry = on_death(&mut engine, "cry", r#"send(victim, "Argh!");"#);
    let hook = engine
        .create_hook("death_cry", "", EventType::CharacterDies, HookKind::Generic, &[cry])
        .unwrap();

    assert_eq!(
        engine.delete_prog(cry, false),
        Err(EngineError::ProgInUse {
            prog: "cry".to_string(),
            uses: vec!["hook 'death_cry'".to_string()],
        })
    );
    assert!(engine.prog(cry).is_some());

    engine.delete_prog(cry, true).unwrap();
    assert!(engine.prog(cry).is_none());
    assert!(engine.hook(hook).is_none());
}

#[test]
fn test_signature_edit_cannot_break_a_hook() {
    let world = MemoryWorld::new();
    let mut engine = engine(&world);
    let cry = on_death(&mut engine, "cry", r#"send(victim, "Argh!");"#);
    let hook = engine
        .create_hook("death_cry", "", EventType::CharacterDies, HookKind::Generic, &[cry])
        .unwrap();

    let result = engine.set_signature(cry, with_params(ReturnType::Void, &[]));
    assert!(matches!(result, Err(EngineError::Bind(_))));
    assert_eq!(engine.prog(cry).unwrap().revision, 1);
}

#[test]
fn test_delete_hook_uninstalls_everywhere() {
    let world = MemoryWorld::new();
    let bob = world.add(ConcreteKind::Character, "Bob");
    let alice = world.add(ConcreteKind::Character, "Alice");
    let mut engine = engine(&world);
    let cry = on_death(&mut engine, "cry", r#"send(victim, "Argh!");"#);
    let hook = engine
        .create_hook("death_cry", "", EventType::CharacterDies, HookKind::Generic, &[cry])
        .unwrap();
    engine.install_hook(bob, hook).unwrap();
    engine.install_hook(alice, hook).unwrap();

    assert_eq!(engine.delete_hook(hook).unwrap(), 2);
    assert!(engine.installed_hooks(bob).is_empty());
    assert!(engine.hook(hook).is_none());
    assert_eq!(engine.delete_hook(hook), Err(HookError::UnknownHook(hook)));
}

#[test]
fn test_hook_names_are_unique() {
    let world = MemoryWorld::new();
    let mut engine = engine(&world);
    let cry = on_death(&mut engine, "cry", r#"send(victim, "Argh!");"#);
    let hook = engine
        .create_hook("death_cry", "", EventType::CharacterDies, HookKind::Generic, &[cry])
        .unwrap();
    assert!(matches!(
        engine.create_hook("Death_Cry", "", EventType::CharacterDies, HookKind::Generic, &[cry]),
        Err(HookError::DuplicateName(_))
    ));
    engine.rename_hook(hook, "last_words").unwrap();
    assert_eq!(engine.hook_by_name("LAST_WORDS").unwrap().id, hook);
}

fn default_rule_setup(world: &MemoryWorld) -> (Engine, EntityRef, EntityRef) {
    let bob = world.add(ConcreteKind::Character, "Bob");
    let alice = world.add(ConcreteKind::Character, "Alice");
    (engine(world), bob, alice)
}

#[test]
fn test_default_hook_installs_on_eligible_entities() {
    let world = MemoryWorld::new();
    let (mut engine, bob, alice) = default_rule_setup(&world);
    let cry = on_death(&mut engine, "cry", r#"send(victim, "Argh!");"#);
    let hook = engine
        .create_hook("death_cry", "", EventType::CharacterDies, HookKind::Generic, &[cry])
        .unwrap();
    let sig = with_params(ProgType::BOOLEAN, &[("c", ProgType::CHARACTER)]);
    let eligible = engine
        .create_prog(ProgDefinition::new("is_bob", sig, r#"return name(c) == "Bob";"#))
        .unwrap();
    let rule = engine
        .add_default_hook(hook, ConcreteKind::Character, eligible)
        .unwrap();

    // Existing entities are untouched until materialized or reconciled.
    assert!(engine.installed_hooks(bob).is_empty());

    assert_eq!(engine.materialize(bob), vec![hook]);
    assert!(engine.materialize(alice).is_empty());
    assert!(engine.materialize(bob).is_empty());
    assert_eq!(engine.installed_hooks(bob), vec![hook]);

    let sword = world.add(ConcreteKind::Item, "sword");
    assert!(engine.materialize(sword).is_empty());

    engine.uninstall_hook(bob, hook).unwrap();
    assert_eq!(
        engine
            .reconcile_default_hook(rule, &[alice, bob, sword])
            .unwrap(),
        1
    );
    assert_eq!(engine.installed_hooks(bob), vec![hook]);

    assert_eq!(engine.remove_default_hook(rule).unwrap().eligibility, eligible);
    assert_eq!(engine.installed_hooks(bob), vec![hook]);
}

#[test]
fn test_default_hook_checks_its_eligibility_prog() {
    let world = MemoryWorld::new();
    let (mut engine, _, _) = default_rule_setup(&world);
    let cry = on_death(&mut engine, "cry", r#"send(victim, "Argh!");"#);
    let hook = engine
        .create_hook("death_cry", "", EventType::CharacterDies, HookKind::Generic, &[cry])
        .unwrap();
    let numeric = engine
        .create_prog(ProgDefinition::new(
            "score",
            with_params(ProgType::NUMBER, &[("c", ProgType::CHARACTER)]),
            "return 1;",
        ))
        .unwrap();
    let wrong_kind = engine
        .create_prog(ProgDefinition::new(
            "is_sharp",
            with_params(ProgType::BOOLEAN, &[("i", ProgType::ITEM)]),
            "return true;",
        ))
        .unwrap();

    assert_eq!(
        engine.add_default_hook(hook, ConcreteKind::Character, numeric),
        Err(HookError::EligibilityReturnType("score".to_string()))
    );
    assert!(matches!(
        engine.add_default_hook(hook, ConcreteKind::Character, wrong_kind),
        Err(HookError::Bind(_))
    ));
    assert!(matches!(
        engine.add_default_hook(hook, ConcreteKind::Number, wrong_kind),
        Err(HookError::InvalidKind(ConcreteKind::Number))
    ));
    assert_eq!(engine.default_hooks().count(), 0);
}

#[test]
fn test_fired_arguments_must_match_the_event() {
    let world = MemoryWorld::new();
    let bob = world.add(ConcreteKind::Character, "Bob");
    let sword = world.add(ConcreteKind::Item, "sword");
    let mut engine = engine(&world);
    let anything = engine
        .create_prog(ProgDefinition::new(
            "anything",
            ProgSignature::any_params(ReturnType::Void),
            "",
        ))
        .unwrap();
    let hook = engine
        .create_hook("catch_all", "", EventType::CharacterDies, HookKind::Generic, &[anything])
        .unwrap();
    engine.install_hook(bob, hook).unwrap();

    assert_eq!(
        engine.fire(EventType::CharacterDies, bob, &[]),
        Err(BindError::ArgumentCount {
            expected: 1,
            found: 0
        })
    );
    assert!(matches!(
        engine.fire(EventType::CharacterDies, bob, &[Value::entity(sword)]),
        Err(BindError::ArgumentType { position: 1, .. })
    ));
    assert!(engine.take_output().is_empty());

    assert_eq!(
        engine
            .fire(EventType::CharacterDies, bob, &[Value::entity(bob)])
            .unwrap()
            .executed,
        1
    );
}
