//! Thread-confined stack of interception scopes.
//!
//! Each scope records the dispatchers whose interception or decoration logic
//! is currently running within one outer call boundary. A dispatcher found in
//! the top scope is re-entering itself and must fall through to the real
//! method body.
//!
//! The stack lives in a `thread_local!` cell, so every thread sees its own
//! stack and no synchronisation is needed. Access goes through
//! [`with_context_stack`]; callers must not invoke handlers or method bodies
//! from inside the closure, because a re-entrant call would try to borrow the
//! cell again.

use std::cell::RefCell;
use std::collections::HashSet;

use crate::dispatcher::DispatcherId;
use crate::error::DispatchError;

/// Dispatchers suppressed for re-entrancy within one outer call boundary.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InterceptionScope {
    disabled: HashSet<DispatcherId>,
}

impl InterceptionScope {
    /// Returns `true` when `id` is being processed in this scope.
    #[must_use]
    pub fn contains(&self, id: DispatcherId) -> bool {
        self.disabled.contains(&id)
    }

    /// Marks `id` as being processed. Returns `false` if it already was.
    pub fn insert(&mut self, id: DispatcherId) -> bool {
        self.disabled.insert(id)
    }

    /// Clears `id`. Returns `false` if it was not present.
    pub fn remove(&mut self, id: DispatcherId) -> bool {
        self.disabled.remove(&id)
    }

    /// Number of suppressed dispatchers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.disabled.len()
    }

    /// Returns `true` when no dispatcher is suppressed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.disabled.is_empty()
    }
}

/// LIFO stack of [`InterceptionScope`]s for one thread.
#[derive(Debug, Default)]
pub struct ContextStack {
    scopes: Vec<InterceptionScope>,
}

impl ContextStack {
    /// Creates an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    /// Returns `true` when no scope is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Number of active scopes.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Opens a new, empty scope on top of the stack.
    pub fn push(&mut self) {
        self.scopes.push(InterceptionScope::default());
    }

    /// Returns the top scope.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ContextUnderflow`] when the stack is empty.
    pub fn peek(&self) -> Result<&InterceptionScope, DispatchError> {
        self.scopes.last().ok_or(DispatchError::ContextUnderflow)
    }

    /// Returns the top scope mutably.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ContextUnderflow`] when the stack is empty.
    pub fn peek_mut(&mut self) -> Result<&mut InterceptionScope, DispatchError> {
        self.scopes.last_mut().ok_or(DispatchError::ContextUnderflow)
    }

    /// Discards the top scope, returning it if one was active.
    pub fn pop(&mut self) -> Option<InterceptionScope> {
        self.scopes.pop()
    }
}

thread_local! {
    static CONTEXT_STACK: RefCell<ContextStack> = const { RefCell::new(ContextStack::new()) };
}

/// Runs `f` against the current thread's context stack.
///
/// # Panics
///
/// Panics if called re-entrantly from inside another `with_context_stack`
/// closure on the same thread.
pub fn with_context_stack<R>(f: impl FnOnce(&mut ContextStack) -> R) -> R {
    CONTEXT_STACK.with(|cell| f(&mut cell.borrow_mut()))
}

/// Variant of [`with_context_stack`] usable from destructors.
///
/// Returns `None` when the thread-local has already been torn down or is
/// currently borrowed.
pub(crate) fn try_with_context_stack<R>(f: impl FnOnce(&mut ContextStack) -> R) -> Option<R> {
    CONTEXT_STACK
        .try_with(|cell| cell.try_borrow_mut().ok().map(|mut stack| f(&mut stack)))
        .ok()
        .flatten()
}

/// Number of scopes active on the current thread.
#[must_use]
pub fn current_depth() -> usize {
    with_context_stack(|stack| stack.depth())
}

#[cfg(test)]
mod tests;
