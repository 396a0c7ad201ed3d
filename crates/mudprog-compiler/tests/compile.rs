//! Compiler tests over real prog source.

use mudprog_ast::{TypedExpr, TypedExprKind, TypedStmtKind};
use mudprog_compiler::{
    CompileError, DiagnosticFormatter, EmptyEnvironment, ErrorKind, StaticEnvironment, compile,
};
use mudprog_foundation::{ConcreteKind, Parameter, ProgId, ProgSignature, ProgType, ReturnType};
use mudprog_functions::ExtensionOp;

fn returns(ty: ProgType) -> ProgSignature {
    ProgSignature::typed(ty, vec![])
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

fn errors(source: &str, sig: &ProgSignature) -> Vec<CompileError> {
    compile(source, sig, &EmptyEnvironment).expect_err("expected compile errors")
}

fn first_kind(source: &str, sig: &ProgSignature) -> ErrorKind {
    errors(source, sig)[0].kind
}

fn world_env() -> StaticEnvironment {
    StaticEnvironment::new()
        .with_register(ConcreteKind::Character, "Mood", ProgType::TEXT)
        .with_register(ConcreteKind::Character, "kills", ProgType::NUMBER)
        .with_prog(
            "double",
            ProgId(7),
            with_params(ProgType::NUMBER, &[("n", ProgType::NUMBER)]),
        )
        .with_prog("log", ProgId(8), ProgSignature::any_params(ReturnType::Void))
}

#[test]
fn test_two_plus_two_compiles() {
    let prog = compile("return 2 + 2;", &returns(ProgType::NUMBER), &EmptyEnvironment).unwrap();
    assert_eq!(prog.return_type, ReturnType::Value(ProgType::NUMBER));
    assert_eq!(prog.parameter_count, 0);
    assert!(matches!(prog.body[0].kind, TypedStmtKind::Return(Some(_))));
}

#[test]
fn test_compilation_is_pure() {
    let source = r#"
        var total = 0;
        for n in [1, 2, 3] {
            if n > 1 { total = total + n; }
        }
        return total;
    "#;
    let sig = returns(ProgType::NUMBER);
    let a = compile(source, &sig, &EmptyEnvironment);
    let b = compile(source, &sig, &EmptyEnvironment);
    assert_eq!(a, b);
    assert_eq!(format!("{:?}", a), format!("{:?}", b));

    let broken = "return missing;";
    assert_eq!(
        compile(broken, &sig, &EmptyEnvironment),
        compile(broken, &sig, &EmptyEnvironment)
    );
}

#[test]
fn test_parameters_bind_to_leading_slots() {
    let sig = with_params(
        ProgType::TEXT,
        &[("who", ProgType::CHARACTER), ("greeting", ProgType::TEXT)],
    );
    let prog = compile("var out = greeting + name(who); return out;", &sig, &EmptyEnvironment)
        .unwrap();
    assert_eq!(prog.parameter_count, 2);
    assert_eq!(prog.slot_count, 3);
    let TypedStmtKind::Declare { slot, .. } = &prog.body[0].kind else {
        panic!("expected declaration");
    };
    assert_eq!(*slot, 2);
}

#[test]
fn test_any_params_binds_nothing() {
    let sig = ProgSignature::any_params(ProgType::NUMBER);
    let prog = compile("return 1;", &sig, &EmptyEnvironment).unwrap();
    assert_eq!(prog.parameter_count, 0);
}

#[test]
fn test_undefined_name_is_compile_error() {
    let errs = errors("return count;", &returns(ProgType::NUMBER));
    assert_eq!(errs[0].kind, ErrorKind::UndefinedName);
    assert!(errs[0].notes[0].contains("count()"));
}

#[test]
fn test_undefined_name_suggests_case_fix() {
    let errs = errors("var Total = 1; return total;", &returns(ProgType::NUMBER));
    assert_eq!(errs[0].notes, vec!["did you mean 'Total'?".to_string()]);
}

#[test]
fn test_return_type_checked_with_assignability() {
    assert_eq!(
        first_kind("return \"four\";", &returns(ProgType::NUMBER)),
        ErrorKind::TypeMismatch
    );
    let sig = with_params(ProgType::PERCEIVABLE, &[("c", ProgType::CHARACTER)]);
    assert!(compile("return c;", &sig, &EmptyEnvironment).is_ok());
    let narrow = with_params(ProgType::CHARACTER, &[("p", ProgType::PERCEIVABLE)]);
    assert_eq!(
        compile("return p;", &narrow, &EmptyEnvironment).unwrap_err()[0].kind,
        ErrorKind::TypeMismatch
    );
}

#[test]
fn test_missing_return_on_some_path() {
    let sig = with_params(ProgType::NUMBER, &[("x", ProgType::NUMBER)]);
    let errs = compile("if x > 0 { return 1; }", &sig, &EmptyEnvironment).unwrap_err();
    assert_eq!(errs[0].kind, ErrorKind::MissingReturn);

    let ok = "if x > 0 { return 1; } else if x < 0 { return -1; } else { return 0; }";
    assert!(compile(ok, &sig, &EmptyEnvironment).is_ok());
}

#[test]
fn test_infinite_loop_counts_as_returning() {
    let sig = returns(ProgType::NUMBER);
    assert!(compile("var i = 0; while true { i = i + 1; if i > 3 { return i; } }", &sig, &EmptyEnvironment).is_ok());
    assert_eq!(
        first_kind("while true { break; }", &sig),
        ErrorKind::MissingReturn
    );
}

#[test]
fn test_void_prog_rules() {
    let void = ProgSignature::typed(ReturnType::Void, vec![]);
    assert!(compile("return;", &void, &EmptyEnvironment).is_ok());
    assert!(compile("", &void, &EmptyEnvironment).is_ok());
    assert_eq!(first_kind("return 1;", &void), ErrorKind::TypeMismatch);
    assert_eq!(
        first_kind("return;", &returns(ProgType::NUMBER)),
        ErrorKind::TypeMismatch
    );
}

#[test]
fn test_void_call_cannot_be_a_value() {
    let sig = with_params(ProgType::TEXT, &[("who", ProgType::CHARACTER)]);
    let errs = compile("var x = send(who, \"hi\"); return \"x\";", &sig, &EmptyEnvironment)
        .unwrap_err();
    assert_eq!(errs[0].kind, ErrorKind::VoidValue);

    let stmt = with_params(ReturnType::Void, &[("who", ProgType::CHARACTER)]);
    assert!(compile("send(who, \"hi\");", &stmt, &EmptyEnvironment).is_ok());
}

#[test]
fn test_break_outside_loop() {
    let void = ProgSignature::typed(ReturnType::Void, vec![]);
    assert_eq!(first_kind("break;", &void), ErrorKind::InvalidStatement);
    assert_eq!(first_kind("continue;", &void), ErrorKind::InvalidStatement);
    assert!(compile("for x in [1, 2] { if x > 1 { break; } continue; }", &void, &EmptyEnvironment).is_ok());
}

#[test]
fn test_duplicate_declaration() {
    let void = ProgSignature::typed(ReturnType::Void, vec![]);
    assert_eq!(
        first_kind("var x = 1; var x = 2;", &void),
        ErrorKind::DuplicateName
    );
    assert!(compile("var x = 1; if true { var x = \"inner\"; }", &void, &EmptyEnvironment).is_ok());
}

#[test]
fn test_null_needs_context() {
    let void = ProgSignature::typed(ReturnType::Void, vec![]);
    assert_eq!(first_kind("var x = null;", &void), ErrorKind::CannotInfer);
    assert!(compile("var c: Character = null;", &void, &EmptyEnvironment).is_ok());
    let sig = with_params(ProgType::BOOLEAN, &[("c", ProgType::CHARACTER)]);
    assert!(compile("return c == null;", &sig, &EmptyEnvironment).is_ok());
    assert!(compile("return isnull(c);", &sig, &EmptyEnvironment).is_ok());
}

#[test]
fn test_literal_types() {
    let sig = returns(ProgType::VALUE.collection());
    assert!(compile("return [1, \"two\"];", &sig, &EmptyEnvironment).is_ok());

    let void = ProgSignature::typed(ReturnType::Void, vec![]);
    assert_eq!(first_kind("var xs = [];", &void), ErrorKind::CannotInfer);
    assert!(compile("var xs: Number Collection = []; xs = append(xs, 1);", &void, &EmptyEnvironment).is_ok());

    let dict = returns(ProgType::NUMBER.dictionary());
    assert!(compile("return {\"a\": 1, \"b\": 2};", &dict, &EmptyEnvironment).is_ok());

    let multi = returns(ProgType::TEXT.collection_dictionary());
    let prog = compile("return {\"a\": [\"x\"], \"b\": []};", &multi, &EmptyEnvironment).unwrap();
    let TypedStmtKind::Return(Some(expr)) = &prog.body[0].kind else {
        panic!("expected return");
    };
    assert_eq!(expr.value_type(), Some(ProgType::TEXT.collection_dictionary()));
}

#[test]
fn test_operator_typing() {
    let text = returns(ProgType::TEXT);
    assert!(compile("return \"n = \" + 3;", &text, &EmptyEnvironment).is_ok());

    let dt = returns(ProgType::DATETIME);
    assert!(compile("return now() + days(1) - hours(2);", &dt, &EmptyEnvironment).is_ok());

    let boolean = returns(ProgType::BOOLEAN);
    assert_eq!(first_kind("return \"a\" < 1;", &boolean), ErrorKind::TypeMismatch);
    assert_eq!(first_kind("return 1 and true;", &boolean), ErrorKind::TypeMismatch);
    assert!(compile("return not (1 < 2) or \"a\" == \"b\";", &boolean, &EmptyEnvironment).is_ok());

    let chars = with_params(
        ProgType::BOOLEAN,
        &[("c", ProgType::CHARACTER), ("i", ProgType::ITEM)],
    );
    assert_eq!(
        compile("return c == i;", &chars, &EmptyEnvironment).unwrap_err()[0].kind,
        ErrorKind::TypeMismatch
    );
}

#[test]
fn test_builtin_overloads_and_return_types() {
    let sig = with_params(ProgType::ITEM, &[("items", ProgType::ITEM.collection())]);
    let prog = compile("return items.first;", &sig, &EmptyEnvironment).unwrap();
    let TypedStmtKind::Return(Some(expr)) = &prog.body[0].kind else {
        panic!("expected return");
    };
    let TypedExprKind::Builtin { function, .. } = &expr.kind else {
        panic!("expected builtin call");
    };
    assert_eq!(function.name, "first");

    let num = returns(ProgType::NUMBER);
    assert!(compile("return round(2.567, 2) + ROUND(1.5);", &num, &EmptyEnvironment).is_ok());

    let errs = errors("return abs(\"x\");", &num);
    assert_eq!(errs[0].kind, ErrorKind::TypeMismatch);
    assert!(errs[0].notes.iter().any(|n| n.contains("abs(Number) -> Number")));
    assert_eq!(first_kind("return abs(1, 2);", &num), ErrorKind::WrongArgCount);
    assert_eq!(first_kind("return frobnicate(1);", &num), ErrorKind::UnknownFunction);
}

#[test]
fn test_extension_inner_type_is_checked() {
    let sig = with_params(ProgType::NUMBER, &[("xs", ProgType::NUMBER.collection())]);
    assert!(compile("return xs.where(|x| x > 2).sum(|x| x * 2);", &sig, &EmptyEnvironment).is_ok());

    let errs = compile("return xs.sum(|x| x > 2);", &sig, &EmptyEnvironment).unwrap_err();
    assert_eq!(errs[0].kind, ErrorKind::InvalidExtension);
    assert!(errs[0].message.contains("must return Number"));

    assert_eq!(
        compile("return xs.frob(|x| x);", &sig, &EmptyEnvironment).unwrap_err()[0].kind,
        ErrorKind::InvalidExtension
    );
}

#[test]
fn test_extension_result_types() {
    let sig = with_params(
        ProgType::TEXT.collection(),
        &[("people", ProgType::CHARACTER.collection())],
    );
    let prog = compile("return people.select(|p| name(p));", &sig, &EmptyEnvironment).unwrap();
    let TypedStmtKind::Return(Some(expr)) = &prog.body[0].kind else {
        panic!("expected return");
    };
    let TypedExprKind::Extension { op, .. } = &expr.kind else {
        panic!("expected extension");
    };
    assert_eq!(*op, ExtensionOp::Select);

    let first = with_params(ProgType::CHARACTER, &[("people", ProgType::CHARACTER.collection())]);
    assert!(compile("return people.first(|p| name(p) == \"Bob\");", &first, &EmptyEnvironment).is_ok());
}

#[test]
fn test_lambda_only_inside_extensions() {
    let void = ProgSignature::typed(ReturnType::Void, vec![]);
    assert_eq!(
        first_kind("var f = abs(|y| y);", &void),
        ErrorKind::InvalidExtension
    );
    assert!(compile("var n = [1, 2].count(|x| x > 1);", &void, &EmptyEnvironment).is_ok());
}

#[test]
fn test_register_forms() {
    let env = world_env();
    let sig = with_params(ProgType::TEXT, &[("who", ProgType::CHARACTER)]);
    let prog = compile(
        r#"setregister(who, "mood", "grumpy"); resetregister(who, "KILLS"); return getregister(who, "Mood");"#,
        &sig,
        &env,
    )
    .unwrap();
    assert_eq!(prog.body.len(), 3);

    let accessor = compile("return who.mood;", &sig, &env).unwrap();
    assert!(matches!(
        &accessor.body[0].kind,
        TypedStmtKind::Return(Some(TypedExpr { kind: TypedExprKind::GetRegister { name, .. }, .. }))
            if name == "mood"
    ));
}

#[test]
fn test_register_misuse() {
    let env = world_env();
    let sig = with_params(ProgType::TEXT, &[("who", ProgType::CHARACTER), ("p", ProgType::PERCEIVABLE)]);
    let kind = |source: &str| compile(source, &sig, &env).unwrap_err()[0].kind;

    assert_eq!(kind(r#"return getregister(who, "hunger");"#), ErrorKind::InvalidRegister);
    assert_eq!(kind(r#"return getregister(p, "mood");"#), ErrorKind::InvalidRegister);
    assert_eq!(kind(r#"setregister(who, "kills", "many"); return "";"#), ErrorKind::TypeMismatch);
    assert_eq!(kind(r#"var n = "mood"; return getregister(who, n);"#), ErrorKind::InvalidRegister);
    assert_eq!(kind("return who.hunger;"), ErrorKind::UnknownFunction);
}

#[test]
fn test_register_accessor_wins_over_function_names() {
    let env = world_env()
        .with_register(ConcreteKind::Character, "name", ProgType::NUMBER)
        .with_register(ConcreteKind::Character, "double", ProgType::BOOLEAN);
    let sig = with_params(ProgType::NUMBER, &[("who", ProgType::CHARACTER)]);

    assert!(compile("return who.name;", &sig, &env).is_ok());
    assert!(compile("if who.double { return 1; } return 0;", &sig, &env).is_ok());

    // Plain calls still reach the built-in and the prog.
    let text = with_params(ProgType::TEXT, &[("who", ProgType::CHARACTER)]);
    assert!(compile("return name(who);", &text, &env).is_ok());
    assert!(compile("return double(2);", &sig, &env).is_ok());
}

#[test]
fn test_removing_register_breaks_dependent_prog() {
    let sig = with_params(ProgType::TEXT, &[("who", ProgType::CHARACTER)]);
    let source = r#"return getregister(who, "mood");"#;
    assert!(compile(source, &sig, &world_env()).is_ok());
    assert!(compile(source, &sig, &EmptyEnvironment).is_err());
}

#[test]
fn test_fire_checks_event_tuple() {
    let sig = with_params(ReturnType::Void, &[("who", ProgType::CHARACTER), ("n", ProgType::NUMBER)]);
    let compiles = |source: &str| compile(source, &sig, &EmptyEnvironment);

    assert!(compiles(r#"fire("CharacterDies", who, who);"#).is_ok());
    assert_eq!(
        compiles(r#"fire("CharacterDies", who);"#).unwrap_err()[0].kind,
        ErrorKind::WrongArgCount
    );
    assert_eq!(
        compiles(r#"fire("Teleported", who, who);"#).unwrap_err()[0].kind,
        ErrorKind::InvalidEvent
    );
    assert_eq!(
        compiles(r#"fire("CharacterDies", n, who);"#).unwrap_err()[0].kind,
        ErrorKind::InvalidEvent
    );
}

#[test]
fn test_prog_calls() {
    let env = world_env();
    let sig = returns(ProgType::NUMBER);
    let prog = compile("log(\"hello\", 3, [1]); return double(21) + Double(1);", &sig, &env).unwrap();
    assert_eq!(prog.called_progs(), vec![ProgId(8), ProgId(7)]);

    assert_eq!(
        compile("return double(\"x\");", &sig, &env).unwrap_err()[0].kind,
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        compile("return double();", &sig, &env).unwrap_err()[0].kind,
        ErrorKind::WrongArgCount
    );
    assert_eq!(
        compile("return log(1);", &sig, &env).unwrap_err()[0].kind,
        ErrorKind::VoidValue
    );
}

#[test]
fn test_index_and_index_assignment() {
    let sig = with_params(
        ProgType::NUMBER,
        &[("xs", ProgType::NUMBER.collection()), ("d", ProgType::TEXT.dictionary())],
    );
    assert!(compile("xs[0] = 5; d[\"k\"] = \"v\"; return xs[1];", &sig, &EmptyEnvironment).is_ok());
    assert_eq!(
        compile("xs[0] = \"five\"; return 1;", &sig, &EmptyEnvironment).unwrap_err()[0].kind,
        ErrorKind::TypeMismatch
    );
    assert_eq!(
        compile("return d[0];", &sig, &EmptyEnvironment).unwrap_err()[0].kind,
        ErrorKind::TypeMismatch
    );
}

#[test]
fn test_reports_every_broken_statement() {
    let void = ProgSignature::typed(ReturnType::Void, vec![]);
    let errs = errors("var a = missing; var b = 1; break; var c: Number = \"x\";", &void);
    let kinds: Vec<ErrorKind> = errs.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ErrorKind::UndefinedName,
            ErrorKind::InvalidStatement,
            ErrorKind::TypeMismatch
        ]
    );
}

#[test]
fn test_syntax_errors_surface_as_compile_errors() {
    let errs = errors("return (1 + ;", &returns(ProgType::NUMBER));
    assert!(errs.iter().all(|e| e.kind == ErrorKind::Syntax));
}

#[test]
fn test_formatted_diagnostic_points_at_source() {
    let source = "var x = 1;\nreturn x + \"a\" < 2;";
    let errs = errors(source, &returns(ProgType::BOOLEAN));
    let text = DiagnosticFormatter::new("check", source).format_all(&errs);
    assert!(text.starts_with("error: type mismatch: operator '<'"));
    assert!(text.contains("--> check:2:8"));
    assert!(text.contains("  2 | return x + \"a\" < 2;"));
}
