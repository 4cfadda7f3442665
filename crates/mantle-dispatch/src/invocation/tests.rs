//! Unit tests for the reflective invocation boundary.

use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::method::MethodTable;
use crate::proxy::Managed;

#[derive(Debug, thiserror::Error)]
#[error("vault sealed")]
struct VaultSealed;

struct Vault;

#[fixture]
fn vault() -> Managed<Vault> {
    let table = MethodTable::builder("Vault")
        .method("peek", Visibility::Public, |_: &Vault, _| Ok(json!("gold")))
        .method("open", Visibility::Private, |_: &Vault, _| {
            Err(DispatchError::application(VaultSealed))
        })
        .method("echo", Visibility::Protected, |_: &Vault, args| {
            Ok(Value::Array(args.to_vec()))
        })
        .build()
        .expect("vault table builds");
    Managed::new(Vault, table)
}

#[rstest]
fn invokes_public_method(vault: Managed<Vault>) {
    let result = invoke_method(
        &vault,
        &Method::public("peek"),
        &[],
        AccessPolicy::PublicOnly,
    )
    .expect("peek is public");
    assert_eq!(result, json!("gold"));
}

#[rstest]
fn arguments_reach_the_body_unchanged(vault: Managed<Vault>) {
    let args = [json!(1), json!("two"), json!({"three": 3})];
    let method = Method::new("echo", Visibility::Protected);
    let result = invoke_method(&vault, &method, &args, AccessPolicy::Permissive)
        .expect("echo succeeds");
    assert_eq!(result, Value::Array(args.to_vec()));
}

#[rstest]
#[case::private(Method::private("open"))]
#[case::protected(Method::new("echo", Visibility::Protected))]
fn public_only_policy_denies_non_public(vault: Managed<Vault>, #[case] method: Method) {
    let error = invoke_method(&vault, &method, &[], AccessPolicy::PublicOnly)
        .expect_err("non-public method is denied");
    assert!(matches!(error, DispatchError::Access { .. }), "got {error}");
}

#[rstest]
fn access_uses_the_receivers_declared_visibility(vault: Managed<Vault>) {
    // The handle claims public, but the receiver declares `open` private.
    let error = ensure_accessible(&vault, &Method::public("open"), AccessPolicy::PublicOnly)
        .expect_err("declared visibility wins");
    assert!(matches!(error, DispatchError::Access { .. }));
}

#[rstest]
fn undeclared_method_is_reported(vault: Managed<Vault>) {
    let error = invoke_method(
        &vault,
        &Method::public("melt"),
        &[],
        AccessPolicy::Permissive,
    )
    .expect_err("melt is not declared");
    assert!(matches!(error, DispatchError::NoSuchMethod { .. }));
}

#[rstest]
fn body_failures_are_wrapped(vault: Managed<Vault>) {
    let error = invoke_method(
        &vault,
        &Method::private("open"),
        &[],
        AccessPolicy::Permissive,
    )
    .expect_err("open raises");
    assert!(error.is_invocation_wrapper());
    let cause = unwrap_invocation(error);
    assert!(cause.downcast_ref::<VaultSealed>().is_some());
}

#[test]
fn unwrap_strips_exactly_one_layer() {
    let cause = DispatchError::application(VaultSealed);
    let twice = DispatchError::invocation_target(DispatchError::invocation_target(cause.clone()));
    let once = unwrap_invocation(twice);
    assert!(once.is_invocation_wrapper());
    assert!(unwrap_invocation(once).is_same_application_error(&cause));
}

#[test]
fn unwrap_passes_other_errors_through() {
    let error = unwrap_invocation(DispatchError::access("Vault", "open"));
    assert!(matches!(error, DispatchError::Access { .. }));
}
