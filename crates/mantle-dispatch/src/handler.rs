//! The dispatch handler capability.
//!
//! A [`DispatchHandler`] takes a call target, the method that was called, an
//! optional fallback method and the arguments, and produces a result or a
//! failure. Two variants live in this crate: the
//! [`InterceptorChain`](crate::chain::InterceptorChain), which runs an ordered
//! interceptor list, and the
//! [`CombinedDispatcher`](crate::dispatcher::CombinedDispatcher), which routes
//! proxied calls between an interceptor handler, an outer decorator and the
//! original method.

use serde_json::Value;

use crate::error::DispatchError;
use crate::invocation::Receiver;
use crate::method::Method;

/// Routes one invocation.
///
/// A `None` fallback marks a lifecycle callback: there is no original method
/// to proceed to.
pub trait DispatchHandler: Send + Sync {
    /// Handles a call of `called` on `target`.
    ///
    /// # Errors
    ///
    /// Returns the failure raised while handling the call.
    fn invoke(
        &self,
        target: &dyn Receiver,
        called: &Method,
        fallback: Option<&Method>,
        args: &[Value],
    ) -> Result<Value, DispatchError>;
}

/// Read-only type metadata supplied by the container.
///
/// The engine only consults it when a proxy is assembled through
/// [`ProxyInstance::checked`](crate::proxy::ProxyInstance::checked).
pub trait TypeMetadata {
    /// Returns `true` when instances of `type_name` may be proxied.
    fn is_proxyable(&self, type_name: &str) -> bool;
}
