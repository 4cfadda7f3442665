//! Receivers assembled by the container.
//!
//! [`Managed`] wraps a plain instance: every method runs its body directly.
//! It is the shape decorators and other unproxied collaborators take.
//!
//! [`ProxyInstance`] wraps an intercepted or decorated instance together with
//! its [`CombinedDispatcher`]. Calls of declared methods go through the
//! dispatcher with the matching super method as fallback, while super methods
//! run the original body. Proxy classes themselves are not generated here; the
//! container assembles a proxy from an instance, its method table and a
//! dispatcher.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::dispatcher::{CombinedDispatcher, DISPATCH_TARGET};
use crate::error::DispatchError;
use crate::handler::TypeMetadata;
use crate::invocation::Receiver;
use crate::method::{Method, MethodTable, Visibility};

/// A plain, unproxied instance together with its method table.
pub struct Managed<T> {
    instance: T,
    table: Arc<MethodTable<T>>,
}

impl<T> Managed<T> {
    /// Wraps `instance` with the table describing its type.
    pub fn new(instance: T, table: impl Into<Arc<MethodTable<T>>>) -> Self {
        Self {
            instance,
            table: table.into(),
        }
    }

    /// The wrapped instance.
    #[must_use]
    pub const fn instance(&self) -> &T {
        &self.instance
    }

    /// The method table of the wrapped instance.
    #[must_use]
    pub const fn table(&self) -> &Arc<MethodTable<T>> {
        &self.table
    }
}

impl<T: Send + Sync> Receiver for Managed<T> {
    fn type_name(&self) -> &'static str {
        self.table.type_name()
    }

    fn visibility_of(&self, method: &Method) -> Option<Visibility> {
        self.table.lookup(method.name()).map(Method::visibility)
    }

    fn call(&self, method: &Method, args: &[Value]) -> Result<Value, DispatchError> {
        self.table.call(&self.instance, method.name(), args)
    }
}

impl<T> fmt::Debug for Managed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Managed")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

/// An intercepted or decorated instance routed through a dispatcher.
pub struct ProxyInstance<T> {
    instance: T,
    table: Arc<MethodTable<T>>,
    dispatcher: Arc<CombinedDispatcher>,
}

impl<T> ProxyInstance<T> {
    /// Assembles a proxy without consulting type metadata.
    pub fn new(
        instance: T,
        table: impl Into<Arc<MethodTable<T>>>,
        dispatcher: Arc<CombinedDispatcher>,
    ) -> Self {
        Self {
            instance,
            table: table.into(),
            dispatcher,
        }
    }

    /// Assembles a proxy after checking that its type may be proxied.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Unproxyable`] when `metadata` rejects the
    /// table's type.
    pub fn checked(
        metadata: &dyn TypeMetadata,
        instance: T,
        table: impl Into<Arc<MethodTable<T>>>,
        dispatcher: Arc<CombinedDispatcher>,
    ) -> Result<Self, DispatchError> {
        let table = table.into();
        if !metadata.is_proxyable(table.type_name()) {
            return Err(DispatchError::Unproxyable {
                type_name: table.type_name().to_owned(),
            });
        }
        Ok(Self::new(instance, table, dispatcher))
    }

    /// The proxied instance.
    #[must_use]
    pub const fn instance(&self) -> &T {
        &self.instance
    }

    /// The method table of the proxied instance.
    #[must_use]
    pub const fn table(&self) -> &Arc<MethodTable<T>> {
        &self.table
    }

    /// The dispatcher wired onto this proxy.
    #[must_use]
    pub const fn dispatcher(&self) -> &Arc<CombinedDispatcher> {
        &self.dispatcher
    }
}

impl<T: Send + Sync> ProxyInstance<T> {
    /// Invokes the business method `name` through the proxy.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NoSuchMethod`] for undeclared methods, or any
    /// failure produced while dispatching the call.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, DispatchError> {
        let method = self
            .table
            .lookup(name)
            .cloned()
            .ok_or_else(|| DispatchError::no_such_method(self.table.type_name(), name))?;
        self.call(&method, args)
    }

    /// Delivers the lifecycle callback `name` through the proxy.
    ///
    /// Lifecycle callbacks carry no fallback method. They reach the
    /// interceptor handler when one is wired, otherwise the outer decorator,
    /// and complete with `null` when neither is.
    ///
    /// # Errors
    ///
    /// Returns any failure raised by the interceptor handler or the decorator,
    /// including [`DispatchError::NoSuchMethod`] from a decorator that does
    /// not declare the callback.
    pub fn lifecycle(&self, name: &str) -> Result<Value, DispatchError> {
        let method = self
            .table
            .lookup(name)
            .cloned()
            .unwrap_or_else(|| Method::public(name));
        debug!(
            target: DISPATCH_TARGET,
            receiver = self.table.type_name(),
            callback = name,
            "delivering lifecycle callback"
        );
        self.dispatcher.invoke(self, &method, None, &[])
    }
}

impl<T: Send + Sync> Receiver for ProxyInstance<T> {
    fn type_name(&self) -> &'static str {
        self.table.type_name()
    }

    fn visibility_of(&self, method: &Method) -> Option<Visibility> {
        self.table.lookup(method.name()).map(Method::visibility)
    }

    fn call(&self, method: &Method, args: &[Value]) -> Result<Value, DispatchError> {
        if method.is_super() {
            return self.table.call(&self.instance, method.name(), args);
        }
        let proceed = method.super_method();
        self.dispatcher.invoke(self, method, Some(&proceed), args)
    }
}

impl<T> fmt::Debug for ProxyInstance<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyInstance")
            .field("table", &self.table)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
