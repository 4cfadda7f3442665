//! Method handles and per-type dispatch tables.
//!
//! A [`Method`] is an opaque, comparable handle standing in for a reflective
//! method object. Handles come in two kinds: the [`MethodKind::Declared`]
//! method as seen by callers of a proxy, and its [`MethodKind::Super`]
//! counterpart which runs the original body without consulting the proxy's
//! dispatcher. The super handle is what the engine passes as the fallback
//! ("proceed") method of a business call.
//!
//! A [`MethodTable`] binds method names to bodies for one component type. It
//! is resolved once when instances of that type are assembled and shared
//! between them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::DispatchError;

/// Declared visibility of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Callable by anyone.
    #[default]
    Public,
    /// Callable by subtypes only.
    Protected,
    /// Callable by the declaring type only.
    Private,
}

impl Visibility {
    /// Returns `true` for [`Visibility::Public`].
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Public)
    }
}

/// Distinguishes the intercepted method from its original body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    /// The method as declared; invoking it on a proxy consults the dispatcher.
    Declared,
    /// The original body; invoking it on a proxy bypasses the dispatcher.
    Super,
}

/// Opaque handle to a method of a component type.
///
/// # Example
///
/// ```
/// use mantle_dispatch::{Method, MethodKind};
///
/// let greet = Method::public("greet");
/// let proceed = greet.super_method();
/// assert_eq!(proceed.name(), "greet");
/// assert_eq!(proceed.kind(), MethodKind::Super);
/// assert_ne!(greet, proceed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Method {
    name: Arc<str>,
    visibility: Visibility,
    kind: MethodKind,
}

impl Method {
    /// Creates a declared method handle.
    pub fn new(name: impl Into<Arc<str>>, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            visibility,
            kind: MethodKind::Declared,
        }
    }

    /// Creates a declared public method handle.
    pub fn public(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, Visibility::Public)
    }

    /// Creates a declared private method handle.
    pub fn private(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, Visibility::Private)
    }

    /// Returns the super handle that runs this method's original body.
    #[must_use]
    pub fn super_method(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            visibility: self.visibility,
            kind: MethodKind::Super,
        }
    }

    /// Returns the declared handle for this method.
    #[must_use]
    pub fn declared(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            visibility: self.visibility,
            kind: MethodKind::Declared,
        }
    }

    /// Method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared visibility.
    #[must_use]
    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Returns `true` when the method is declared public.
    #[must_use]
    pub const fn is_public(&self) -> bool {
        self.visibility.is_public()
    }

    /// Handle kind.
    #[must_use]
    pub const fn kind(&self) -> MethodKind {
        self.kind
    }

    /// Returns `true` for super handles.
    #[must_use]
    pub const fn is_super(&self) -> bool {
        matches!(self.kind, MethodKind::Super)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MethodKind::Declared => f.write_str(&self.name),
            MethodKind::Super => write!(f, "super::{}", self.name),
        }
    }
}

/// Body bound to a method of `T`.
pub type MethodBody<T> = Arc<dyn Fn(&T, &[Value]) -> Result<Value, DispatchError> + Send + Sync>;

/// Dispatch table of one component type.
///
/// # Example
///
/// ```
/// use mantle_dispatch::{MethodTable, Visibility};
/// use serde_json::json;
///
/// struct Counter;
///
/// let table = MethodTable::<Counter>::builder("Counter")
///     .method("next", Visibility::Public, |_, _| Ok(json!(1)))
///     .build()
///     .expect("table builds");
/// assert!(table.lookup("next").is_some());
/// ```
pub struct MethodTable<T> {
    type_name: &'static str,
    entries: BTreeMap<Arc<str>, (Method, MethodBody<T>)>,
}

impl<T> MethodTable<T> {
    /// Starts building a table for `type_name`.
    #[must_use]
    pub const fn builder(type_name: &'static str) -> MethodTableBuilder<T> {
        MethodTableBuilder {
            type_name,
            entries: Vec::new(),
        }
    }

    /// Name of the component type this table describes.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the declared handle for `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Method> {
        self.entries.get(name).map(|(method, _)| method)
    }

    /// Returns the body bound to `name`.
    #[must_use]
    pub fn body(&self, name: &str) -> Option<&MethodBody<T>> {
        self.entries.get(name).map(|(_, body)| body)
    }

    /// Iterates declared handles in name order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.entries.values().map(|(method, _)| method)
    }

    /// Number of declared methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no methods are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs the body bound to `name` against `instance`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NoSuchMethod`] when `name` is not declared, or
    /// whatever the body raises.
    pub fn call(&self, instance: &T, name: &str, args: &[Value]) -> Result<Value, DispatchError> {
        let body = self
            .body(name)
            .ok_or_else(|| DispatchError::no_such_method(self.type_name(), name))?;
        body(instance, args)
    }
}

impl<T> fmt::Debug for MethodTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("type_name", &self.type_name)
            .field("methods", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder collecting method bodies before the table is sealed.
pub struct MethodTableBuilder<T> {
    type_name: &'static str,
    entries: Vec<(Method, MethodBody<T>)>,
}

impl<T> MethodTableBuilder<T> {
    /// Binds `body` to a method called `name`.
    #[must_use]
    pub fn method<F>(mut self, name: &str, visibility: Visibility, body: F) -> Self
    where
        F: Fn(&T, &[Value]) -> Result<Value, DispatchError> + Send + Sync + 'static,
    {
        self.entries
            .push((Method::new(name, visibility), Arc::new(body)));
        self
    }

    /// Seals the table.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateMethod`] when a name was bound twice.
    pub fn build(self) -> Result<MethodTable<T>, DispatchError> {
        let mut entries = BTreeMap::new();
        for (method, body) in self.entries {
            let key: Arc<str> = Arc::from(method.name());
            if entries.contains_key(&key) {
                return Err(DispatchError::DuplicateMethod {
                    type_name: self.type_name.to_owned(),
                    method: method.name().to_owned(),
                });
            }
            entries.insert(key, (method, body));
        }
        Ok(MethodTable {
            type_name: self.type_name,
            entries,
        })
    }
}

#[cfg(test)]
mod tests;
