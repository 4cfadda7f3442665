//! Unit tests for the invocation context stack.

use std::thread;

use rstest::{fixture, rstest};

use super::*;

#[fixture]
fn stack() -> ContextStack {
    ContextStack::new()
}

#[rstest]
fn new_stack_is_empty(stack: ContextStack) {
    assert!(stack.is_empty());
    assert_eq!(stack.depth(), 0);
}

#[rstest]
fn peek_on_empty_stack_underflows(stack: ContextStack) {
    let error = stack.peek().expect_err("empty stack cannot be peeked");
    assert!(matches!(error, DispatchError::ContextUnderflow));
}

#[rstest]
fn push_opens_an_empty_scope(mut stack: ContextStack) {
    stack.push();
    assert!(!stack.is_empty());
    let scope = stack.peek().expect("scope is active");
    assert!(scope.is_empty());
}

#[rstest]
fn scopes_are_lifo(mut stack: ContextStack) {
    let outer = DispatcherId::from_raw(1);
    let inner = DispatcherId::from_raw(2);

    stack.push();
    stack.peek_mut().expect("outer scope").insert(outer);
    stack.push();
    stack.peek_mut().expect("inner scope").insert(inner);

    let popped = stack.pop().expect("inner scope pops");
    assert!(popped.contains(inner));
    assert!(!popped.contains(outer));

    let remaining = stack.peek().expect("outer scope remains");
    assert!(remaining.contains(outer));
    assert_eq!(stack.depth(), 1);
}

#[rstest]
fn pop_on_empty_stack_returns_none(mut stack: ContextStack) {
    assert!(stack.pop().is_none());
}

#[test]
fn scope_insert_and_remove_report_membership_changes() {
    let id = DispatcherId::from_raw(5);
    let mut scope = InterceptionScope::default();
    assert!(scope.insert(id));
    assert!(!scope.insert(id));
    assert_eq!(scope.len(), 1);
    assert!(scope.remove(id));
    assert!(!scope.remove(id));
    assert!(scope.is_empty());
}

#[test]
fn thread_local_stacks_are_independent() {
    with_context_stack(ContextStack::push);
    assert_eq!(current_depth(), 1);

    let other_depth = thread::spawn(current_depth)
        .join()
        .expect("worker thread joins");
    assert_eq!(other_depth, 0);

    with_context_stack(|stack| {
        stack.pop();
    });
    assert_eq!(current_depth(), 0);
}

#[test]
fn try_with_context_stack_declines_while_borrowed() {
    let nested = with_context_stack(|_| try_with_context_stack(|stack| stack.depth()));
    assert!(nested.is_none());
    assert_eq!(try_with_context_stack(|stack| stack.depth()), Some(0));
}
