//! Unit tests for method handles and dispatch tables.

use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;

struct Counter {
    start: i64,
}

#[fixture]
fn table() -> MethodTable<Counter> {
    MethodTable::builder("Counter")
        .method("start", Visibility::Public, |counter: &Counter, _| {
            Ok(json!(counter.start))
        })
        .method("add", Visibility::Public, |counter: &Counter, args| {
            let delta = args.first().and_then(Value::as_i64).unwrap_or_default();
            Ok(json!(counter.start + delta))
        })
        .method("reset", Visibility::Private, |_, _| Ok(Value::Null))
        .build()
        .expect("table builds")
}

#[test]
fn super_and_declared_handles_differ_only_by_kind() {
    let greet = Method::public("greet");
    let proceed = greet.super_method();
    assert_ne!(greet, proceed);
    assert_eq!(proceed.declared(), greet);
    assert!(proceed.is_super());
    assert!(!greet.is_super());
}

#[rstest]
#[case(Method::public("greet"), "greet")]
#[case(Method::public("greet").super_method(), "super::greet")]
fn display_marks_super_handles(#[case] method: Method, #[case] expected: &str) {
    assert_eq!(method.to_string(), expected);
}

#[rstest]
#[case(Visibility::Public, true)]
#[case(Visibility::Protected, false)]
#[case(Visibility::Private, false)]
fn visibility_reports_public(#[case] visibility: Visibility, #[case] expected: bool) {
    assert_eq!(visibility.is_public(), expected);
}

#[rstest]
fn lookup_returns_declared_handles(table: MethodTable<Counter>) {
    let reset = table.lookup("reset").expect("reset declared");
    assert_eq!(reset.visibility(), Visibility::Private);
    assert_eq!(reset.kind(), MethodKind::Declared);
    assert!(table.lookup("missing").is_none());
}

#[rstest]
fn methods_iterate_in_name_order(table: MethodTable<Counter>) {
    let names: Vec<&str> = table.methods().map(Method::name).collect();
    assert_eq!(names, vec!["add", "reset", "start"]);
    assert_eq!(table.len(), 3);
    assert!(!table.is_empty());
}

#[rstest]
fn call_runs_bound_body(table: MethodTable<Counter>) {
    let counter = Counter { start: 40 };
    let result = table
        .call(&counter, "add", &[json!(2)])
        .expect("add succeeds");
    assert_eq!(result, json!(42));
}

#[rstest]
fn call_unknown_method_fails(table: MethodTable<Counter>) {
    let counter = Counter { start: 0 };
    let error = table
        .call(&counter, "multiply", &[])
        .expect_err("multiply is not declared");
    assert!(matches!(error, DispatchError::NoSuchMethod { .. }));
}

#[test]
fn duplicate_method_names_are_rejected() {
    let result = MethodTable::<Counter>::builder("Counter")
        .method("start", Visibility::Public, |_, _| Ok(Value::Null))
        .method("start", Visibility::Private, |_, _| Ok(Value::Null))
        .build();
    let error = result.expect_err("duplicate should fail");
    assert!(matches!(error, DispatchError::DuplicateMethod { .. }));
}
