//! Combined interceptor and decorator dispatcher.
//!
//! A [`CombinedDispatcher`] is wired onto every intercepted or decorated proxy
//! instance. For each call it decides whether to run the interceptor chain,
//! forward to the outermost decorator, or fall through to the original method.
//!
//! ## Re-entrancy
//!
//! Interceptors and decorators frequently call back into the proxy they wrap.
//! The dispatcher therefore records its [`DispatcherId`] in the top
//! [`InterceptionScope`](crate::context::InterceptionScope) while its own
//! logic runs. A call that finds the identity already recorded is re-entrant
//! and goes straight to the original method, so each dispatcher's logic runs
//! at most once per outer call boundary. Other dispatchers nested in the same
//! boundary are unaffected.
//!
//! ## Wiring
//!
//! Dispatchers are created unwired because their collaborators may refer back
//! to the proxy. The container assigns the interceptor handler and outer
//! decorator exactly once before first use. An unwired dispatcher is still
//! usable: every call falls through to the original method.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use mantle_config::AccessPolicy;

use crate::context::{try_with_context_stack, with_context_stack};
use crate::error::DispatchError;
use crate::handler::DispatchHandler;
use crate::invocation::{Receiver, invoke_method, unwrap_invocation};
use crate::method::Method;

/// Tracing target for dispatch routing decisions.
pub const DISPATCH_TARGET: &str = "mantle_dispatch::dispatch";

static NEXT_DISPATCHER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a dispatcher, used for re-entrancy checks.
///
/// Identities are allocated from a process-wide counter, so two dispatchers
/// built with [`CombinedDispatcher::new`] never compare equal. The identity
/// serialises transparently so a reactivated dispatcher keeps it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DispatcherId(u64);

impl DispatcherId {
    fn next() -> Self {
        Self(NEXT_DISPATCHER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Rebuilds an identity from its raw value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identity value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DispatcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dispatcher-{}", self.0)
    }
}

/// Routes proxied calls through interceptors and decorators.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use mantle_dispatch::{CombinedDispatcher, MethodTable, ProxyInstance, Visibility};
/// use serde_json::json;
///
/// struct Greeter;
///
/// let table = MethodTable::builder("Greeter")
///     .method("greet", Visibility::Public, |_: &Greeter, _| Ok(json!("hello")))
///     .build()
///     .expect("table builds");
/// let dispatcher = Arc::new(CombinedDispatcher::new());
/// let proxy = ProxyInstance::new(Greeter, Arc::new(table), dispatcher);
///
/// // Nothing is wired, so the call falls through to the original body.
/// assert_eq!(proxy.invoke("greet", &[]).expect("greet succeeds"), json!("hello"));
/// ```
pub struct CombinedDispatcher {
    id: DispatcherId,
    interceptor_handler: OnceLock<Arc<dyn DispatchHandler>>,
    outer_decorator: OnceLock<Arc<dyn Receiver>>,
    access: AccessPolicy,
}

impl CombinedDispatcher {
    /// Creates an unwired dispatcher with a fresh identity.
    #[must_use]
    pub fn new() -> Self {
        Self::reactivate(DispatcherId::next())
    }

    /// Recreates an unwired dispatcher that keeps a previously issued
    /// identity.
    #[must_use]
    pub const fn reactivate(id: DispatcherId) -> Self {
        Self {
            id,
            interceptor_handler: OnceLock::new(),
            outer_decorator: OnceLock::new(),
            access: AccessPolicy::Permissive,
        }
    }

    /// Selects the accessibility policy used for reflective calls.
    #[must_use]
    pub fn with_access_policy(mut self, access: AccessPolicy) -> Self {
        self.access = access;
        self
    }

    /// Identity used for re-entrancy checks.
    #[must_use]
    pub const fn id(&self) -> DispatcherId {
        self.id
    }

    /// Accessibility policy for reflective calls.
    #[must_use]
    pub const fn access_policy(&self) -> AccessPolicy {
        self.access
    }

    /// Assigns the interceptor chain handler.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::AlreadyWired`] if a handler was already
    /// assigned; the existing handler stays in place.
    pub fn set_interceptor_handler(
        &self,
        handler: Arc<dyn DispatchHandler>,
    ) -> Result<(), DispatchError> {
        self.interceptor_handler
            .set(handler)
            .map_err(|_| DispatchError::AlreadyWired {
                field: "interceptor handler",
            })
    }

    /// Assigns the outermost decorator.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::AlreadyWired`] if a decorator was already
    /// assigned; the existing decorator stays in place.
    pub fn set_outer_decorator(&self, decorator: Arc<dyn Receiver>) -> Result<(), DispatchError> {
        self.outer_decorator
            .set(decorator)
            .map_err(|_| DispatchError::AlreadyWired {
                field: "outer decorator",
            })
    }

    /// Returns the wired interceptor handler.
    #[must_use]
    pub fn interceptor_handler(&self) -> Option<&Arc<dyn DispatchHandler>> {
        self.interceptor_handler.get()
    }

    /// Returns the wired outer decorator.
    #[must_use]
    pub fn outer_decorator(&self) -> Option<&Arc<dyn Receiver>> {
        self.outer_decorator.get()
    }

    /// Routes a call of `called` on `target`.
    ///
    /// `fallback` is the original method to run when no interception or
    /// decoration applies; `None` marks a lifecycle callback. The outer call
    /// boundary is opened here when the thread has none, and is closed again
    /// on every exit path.
    ///
    /// # Errors
    ///
    /// Propagates failures from the interceptor handler, the decorator or the
    /// original method with their identity preserved. Reflective access
    /// failures surface as [`DispatchError::Access`].
    pub fn invoke(
        &self,
        target: &dyn Receiver,
        called: &Method,
        fallback: Option<&Method>,
        args: &[Value],
    ) -> Result<Value, DispatchError> {
        let _boundary = BoundaryGuard::enter();
        self.route(target, called, fallback, args)
            .map_err(unwrap_invocation)
    }

    fn route(
        &self,
        target: &dyn Receiver,
        called: &Method,
        fallback: Option<&Method>,
        args: &[Value],
    ) -> Result<Value, DispatchError> {
        if let Some(_suppressed) = SuppressionGuard::acquire(self.id)? {
            if let Some(handler) = self.interceptor_handler.get() {
                return match fallback {
                    Some(_) => {
                        let resolved: &dyn Receiver = match self.outer_decorator.get() {
                            Some(decorator) => decorator.as_ref(),
                            None => target,
                        };
                        debug!(
                            target: DISPATCH_TARGET,
                            dispatcher = %self.id,
                            method = %called,
                            receiver = resolved.type_name(),
                            "routing business call to interceptors"
                        );
                        handler.invoke(resolved, called, Some(called), args)
                    }
                    None => {
                        debug!(
                            target: DISPATCH_TARGET,
                            dispatcher = %self.id,
                            method = %called,
                            "routing lifecycle callback to interceptors"
                        );
                        handler.invoke(target, called, None, args)
                    }
                };
            }
            if let Some(decorator) = self.outer_decorator.get() {
                debug!(
                    target: DISPATCH_TARGET,
                    dispatcher = %self.id,
                    method = %called,
                    decorator = decorator.type_name(),
                    "routing call to outer decorator"
                );
                return invoke_method(decorator.as_ref(), called, args, self.access);
            }
        } else {
            trace!(
                target: DISPATCH_TARGET,
                dispatcher = %self.id,
                method = %called,
                "re-entrant call proceeds to original method"
            );
        }
        self.proceed(target, called, fallback, args)
    }

    fn proceed(
        &self,
        target: &dyn Receiver,
        called: &Method,
        fallback: Option<&Method>,
        args: &[Value],
    ) -> Result<Value, DispatchError> {
        match fallback {
            Some(method) => invoke_method(target, method, args, self.access),
            None => {
                trace!(
                    target: DISPATCH_TARGET,
                    dispatcher = %self.id,
                    method = %called,
                    "lifecycle callback has nothing to run"
                );
                Ok(Value::Null)
            }
        }
    }
}

impl Default for CombinedDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CombinedDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedDispatcher")
            .field("id", &self.id)
            .field("has_interceptor_handler", &self.interceptor_handler.get().is_some())
            .field("has_outer_decorator", &self.outer_decorator.get().is_some())
            .field("access", &self.access)
            .finish()
    }
}

impl DispatchHandler for CombinedDispatcher {
    fn invoke(
        &self,
        target: &dyn Receiver,
        called: &Method,
        fallback: Option<&Method>,
        args: &[Value],
    ) -> Result<Value, DispatchError> {
        Self::invoke(self, target, called, fallback, args)
    }
}

/// Opens the outer call boundary if none is active and closes it on drop.
struct BoundaryGuard {
    opened: bool,
}

impl BoundaryGuard {
    fn enter() -> Self {
        let opened = with_context_stack(|stack| {
            if stack.is_empty() {
                stack.push();
                true
            } else {
                false
            }
        });
        if opened {
            trace!(target: DISPATCH_TARGET, "opened outer call boundary");
        }
        Self { opened }
    }
}

impl Drop for BoundaryGuard {
    fn drop(&mut self) {
        if self.opened {
            try_with_context_stack(|stack| stack.pop());
            trace!(target: DISPATCH_TARGET, "closed outer call boundary");
        }
    }
}

/// Holds a dispatcher's identity in the top scope while its logic runs.
struct SuppressionGuard {
    id: DispatcherId,
}

impl SuppressionGuard {
    /// Returns `None` when `id` is already suppressed in the top scope.
    fn acquire(id: DispatcherId) -> Result<Option<Self>, DispatchError> {
        with_context_stack(|stack| {
            stack
                .peek_mut()
                .map(|scope| scope.insert(id).then_some(Self { id }))
        })
    }
}

impl Drop for SuppressionGuard {
    fn drop(&mut self) {
        try_with_context_stack(|stack| {
            if let Ok(scope) = stack.peek_mut() {
                scope.remove(self.id);
            }
        });
    }
}
