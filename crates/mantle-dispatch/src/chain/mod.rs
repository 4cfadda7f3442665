//! Interceptor chain handler.
//!
//! [`InterceptorChain`] is the dispatch handler variant that executes an
//! ordered list of [`Interceptor`]s around a call. Each interceptor receives
//! an [`Invocation`] and decides whether, and how often, to
//! [`proceed`](Invocation::proceed). Once the last interceptor proceeds, the
//! terminal step invokes the fallback method on the target.
//!
//! For business calls the [`CombinedDispatcher`](crate::CombinedDispatcher)
//! passes the called method itself as fallback. The terminal step therefore
//! re-enters the proxy (or the outer decorator), where the dispatcher's
//! re-entrancy guard sends the call to the original body. Lifecycle callbacks
//! have no fallback and complete with `null` once every interceptor has run.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use mantle_config::AccessPolicy;

use crate::error::DispatchError;
use crate::handler::DispatchHandler;
use crate::invocation::{Receiver, invoke_method, unwrap_invocation};
use crate::method::Method;

/// Tracing target for interceptor execution.
pub const CHAIN_TARGET: &str = "mantle_dispatch::chain";

/// Cross-cutting logic run around a method call.
///
/// Closures of the form `Fn(&Invocation<'_>) -> Result<Value, DispatchError>`
/// implement this trait.
pub trait Interceptor: Send + Sync {
    /// Runs around the call described by `invocation`.
    ///
    /// # Errors
    ///
    /// Returns the failure raised by the interceptor or by the rest of the
    /// chain.
    fn intercept(&self, invocation: &Invocation<'_>) -> Result<Value, DispatchError>;
}

impl<F> Interceptor for F
where
    F: Fn(&Invocation<'_>) -> Result<Value, DispatchError> + Send + Sync,
{
    fn intercept(&self, invocation: &Invocation<'_>) -> Result<Value, DispatchError> {
        self(invocation)
    }
}

/// Ordered list of interceptors executed as one dispatch handler.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
    access: AccessPolicy,
}

impl InterceptorChain {
    /// Creates a chain running `interceptors` in order.
    #[must_use]
    pub fn new(interceptors: Vec<Arc<dyn Interceptor>>) -> Self {
        Self {
            interceptors,
            access: AccessPolicy::Permissive,
        }
    }

    /// Selects the accessibility policy used by the terminal step.
    #[must_use]
    pub fn with_access_policy(mut self, access: AccessPolicy) -> Self {
        self.access = access;
        self
    }

    /// Number of interceptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Returns `true` when the chain has no interceptors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("interceptors", &self.interceptors.len())
            .field("access", &self.access)
            .finish()
    }
}

impl DispatchHandler for InterceptorChain {
    fn invoke(
        &self,
        target: &dyn Receiver,
        called: &Method,
        fallback: Option<&Method>,
        args: &[Value],
    ) -> Result<Value, DispatchError> {
        Invocation {
            chain: self,
            position: 0,
            target,
            called,
            fallback,
            args,
        }
        .proceed()
    }
}

/// One step of an interceptor chain.
#[derive(Clone, Copy)]
pub struct Invocation<'a> {
    chain: &'a InterceptorChain,
    position: usize,
    target: &'a dyn Receiver,
    called: &'a Method,
    fallback: Option<&'a Method>,
    args: &'a [Value],
}

impl<'a> Invocation<'a> {
    /// The receiver the terminal step will invoke.
    #[must_use]
    pub fn target(&self) -> &'a dyn Receiver {
        self.target
    }

    /// The method that was called on the proxy.
    #[must_use]
    pub const fn method(&self) -> &'a Method {
        self.called
    }

    /// The method the terminal step proceeds to, absent for lifecycle
    /// callbacks.
    #[must_use]
    pub const fn fallback(&self) -> Option<&'a Method> {
        self.fallback
    }

    /// Call arguments.
    #[must_use]
    pub const fn args(&self) -> &'a [Value] {
        self.args
    }

    /// Returns `true` for lifecycle callbacks.
    #[must_use]
    pub const fn is_lifecycle(&self) -> bool {
        self.fallback.is_none()
    }

    /// Index of the interceptor that will run on the next `proceed`.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Runs the rest of the chain with the current arguments.
    ///
    /// # Errors
    ///
    /// Returns the failure raised by a later interceptor or by the terminal
    /// method, unwrapped from any invocation wrapper.
    pub fn proceed(&self) -> Result<Value, DispatchError> {
        self.proceed_with(self.args)
    }

    /// Runs the rest of the chain with replacement arguments.
    ///
    /// # Errors
    ///
    /// Returns the failure raised by a later interceptor or by the terminal
    /// method, unwrapped from any invocation wrapper.
    pub fn proceed_with(&self, args: &[Value]) -> Result<Value, DispatchError> {
        let next = Invocation {
            chain: self.chain,
            position: self.position + 1,
            target: self.target,
            called: self.called,
            fallback: self.fallback,
            args,
        };
        match self.chain.interceptors.get(self.position) {
            Some(interceptor) => {
                trace!(
                    target: CHAIN_TARGET,
                    position = self.position,
                    method = %self.called,
                    "running interceptor"
                );
                interceptor.intercept(&next)
            }
            None => next.complete(),
        }
    }

    fn complete(&self) -> Result<Value, DispatchError> {
        match self.fallback {
            Some(method) => {
                trace!(
                    target: CHAIN_TARGET,
                    method = %method,
                    receiver = self.target.type_name(),
                    "chain reached its terminal step"
                );
                invoke_method(self.target, method, self.args, self.chain.access)
                    .map_err(unwrap_invocation)
            }
            None => Ok(Value::Null),
        }
    }
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("position", &self.position)
            .field("target", &self.target.type_name())
            .field("method", self.called)
            .field("fallback", &self.fallback)
            .field("args", &self.args)
            .finish()
    }
}
