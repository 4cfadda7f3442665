//! Reflective invocation boundary.
//!
//! Every call the engine makes on a receiver goes through [`invoke_method`].
//! It checks that the method is declared, enforces the [`AccessPolicy`], and
//! wraps whatever the body raises in [`DispatchError::InvocationTarget`],
//! just as a reflective call mechanism would. [`unwrap_invocation`] is the
//! matching normaliser: it strips that wrapper so the original failure can
//! propagate with its identity intact.

use serde_json::Value;
use tracing::trace;

use mantle_config::AccessPolicy;

use crate::error::DispatchError;
use crate::method::{Method, Visibility};

/// Tracing target for the invocation boundary.
pub const INVOCATION_TARGET: &str = "mantle_dispatch::invocation";

/// A call target: anything exposing methods by handle.
///
/// Plain instances ([`Managed`](crate::proxy::Managed)) and proxies
/// ([`ProxyInstance`](crate::proxy::ProxyInstance)) both implement this trait.
/// A proxy routes declared methods through its dispatcher and runs super
/// methods directly.
pub trait Receiver: Send + Sync {
    /// Name of the receiver's component type.
    fn type_name(&self) -> &'static str;

    /// Declared visibility of `method` on this receiver, if declared.
    fn visibility_of(&self, method: &Method) -> Option<Visibility>;

    /// Calls `method` with `args`.
    ///
    /// # Errors
    ///
    /// Returns whatever the method body raises, or
    /// [`DispatchError::NoSuchMethod`] when the method is not declared.
    fn call(&self, method: &Method, args: &[Value]) -> Result<Value, DispatchError>;
}

/// Makes `method` callable on `receiver` under `policy`.
///
/// # Errors
///
/// Returns [`DispatchError::NoSuchMethod`] when the receiver does not declare
/// the method and [`DispatchError::Access`] when the policy denies it.
pub fn ensure_accessible(
    receiver: &dyn Receiver,
    method: &Method,
    policy: AccessPolicy,
) -> Result<(), DispatchError> {
    let visibility = receiver
        .visibility_of(method)
        .ok_or_else(|| DispatchError::no_such_method(receiver.type_name(), method.name()))?;
    if policy.permits(visibility.is_public()) {
        Ok(())
    } else {
        Err(DispatchError::access(receiver.type_name(), method.name()))
    }
}

/// Invokes `method` on `receiver` the way a reflective call would.
///
/// # Errors
///
/// Fails with [`DispatchError::NoSuchMethod`] or [`DispatchError::Access`]
/// before the call, or with [`DispatchError::InvocationTarget`] wrapping the
/// failure raised by the body.
pub fn invoke_method(
    receiver: &dyn Receiver,
    method: &Method,
    args: &[Value],
    policy: AccessPolicy,
) -> Result<Value, DispatchError> {
    ensure_accessible(receiver, method, policy)?;
    trace!(
        target: INVOCATION_TARGET,
        receiver = receiver.type_name(),
        method = %method,
        "invoking method"
    );
    receiver
        .call(method, args)
        .map_err(DispatchError::invocation_target)
}

/// Strips one invocation wrapper, returning the failure it carried.
///
/// Every other error is returned unchanged.
///
/// # Example
///
/// ```
/// use mantle_dispatch::{DispatchError, unwrap_invocation};
///
/// let cause = DispatchError::application(std::io::Error::other("boom"));
/// let wrapped = DispatchError::invocation_target(cause.clone());
/// assert!(unwrap_invocation(wrapped).is_same_application_error(&cause));
/// ```
#[must_use]
pub fn unwrap_invocation(error: DispatchError) -> DispatchError {
    match error {
        DispatchError::InvocationTarget(cause) => {
            trace!(target: INVOCATION_TARGET, %cause, "unwrapped invocation failure");
            *cause
        }
        other => other,
    }
}

#[cfg(test)]
mod tests;
