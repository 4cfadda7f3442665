//! Dispatch engine for proxied managed components.
//!
//! The `mantle-dispatch` crate routes every method call made on a proxied
//! component. Depending on how the proxy's [`CombinedDispatcher`] is wired,
//! a call runs an interceptor chain, is forwarded to the outermost decorator,
//! or falls through to the original method body.
//!
//! # Re-entrancy
//!
//! Interceptors and decorators routinely call back into the proxy they wrap.
//! A thread-confined stack of interception scopes ([`context`]) records which
//! dispatchers are busy within the current outer call boundary. A dispatcher
//! that re-enters itself skips its own logic and proceeds to the original
//! method, so its interceptors and decorators run at most once per boundary.
//!
//! # Failures
//!
//! Calls on receivers cross a reflective boundary ([`invoke_method`]) that
//! wraps body failures in [`DispatchError::InvocationTarget`]. The dispatcher
//! strips that wrapper ([`unwrap_invocation`]) before returning, so callers
//! observe the original failure.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use mantle_dispatch::{
//!     CombinedDispatcher, DispatchError, Interceptor, InterceptorChain, Invocation,
//!     MethodTable, ProxyInstance, Visibility,
//! };
//! use serde_json::{Value, json};
//!
//! struct Greeter;
//!
//! struct Shout;
//!
//! impl Interceptor for Shout {
//!     fn intercept(&self, invocation: &Invocation<'_>) -> Result<Value, DispatchError> {
//!         let value = invocation.proceed()?;
//!         Ok(json!(value.as_str().unwrap_or_default().to_uppercase()))
//!     }
//! }
//!
//! let table = MethodTable::builder("Greeter")
//!     .method("greet", Visibility::Public, |_: &Greeter, _| Ok(json!("hello")))
//!     .build()
//!     .expect("table builds");
//! let dispatcher = Arc::new(CombinedDispatcher::new());
//! let proxy = ProxyInstance::new(Greeter, table, Arc::clone(&dispatcher));
//!
//! let interceptors: Vec<Arc<dyn Interceptor>> = vec![Arc::new(Shout)];
//! dispatcher
//!     .set_interceptor_handler(Arc::new(InterceptorChain::new(interceptors)))
//!     .expect("wired once");
//!
//! assert_eq!(proxy.invoke("greet", &[]).expect("greet succeeds"), json!("HELLO"));
//! ```

pub mod chain;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod invocation;
pub mod method;
pub mod proxy;

#[cfg(test)]
mod tests;

pub use mantle_config::AccessPolicy;

pub use self::chain::{Interceptor, InterceptorChain, Invocation};
pub use self::context::{ContextStack, InterceptionScope, current_depth, with_context_stack};
pub use self::dispatcher::{CombinedDispatcher, DISPATCH_TARGET, DispatcherId};
pub use self::error::DispatchError;
pub use self::handler::{DispatchHandler, TypeMetadata};
pub use self::invocation::{Receiver, ensure_accessible, invoke_method, unwrap_invocation};
pub use self::method::{Method, MethodBody, MethodKind, MethodTable, MethodTableBuilder, Visibility};
pub use self::proxy::{Managed, ProxyInstance};
