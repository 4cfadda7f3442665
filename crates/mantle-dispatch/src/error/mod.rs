//! Domain errors raised while routing proxied invocations.
//!
//! Every failure that can leave the engine is a [`DispatchError`]. Failures
//! raised by method bodies, interceptors or decorators travel as
//! [`DispatchError::Application`] and keep their original error value, so a
//! caller can downcast and observe exactly what was raised. The
//! [`DispatchError::InvocationTarget`] wrapper only exists between the
//! reflective invocation boundary and the dispatcher, which strips it before
//! returning.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Errors arising from proxied method dispatch.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// The method could not be made callable under the active access policy.
    #[error("method '{method}' on '{type_name}' is not accessible")]
    Access {
        /// Type that declares the method.
        type_name: String,
        /// Name of the denied method.
        method: String,
    },

    /// The receiver has no method bound to the requested handle.
    #[error("no method '{method}' declared on '{type_name}'")]
    NoSuchMethod {
        /// Type that was searched.
        type_name: String,
        /// Name that was looked up.
        method: String,
    },

    /// Wrapper produced by the reflective boundary around a failure raised
    /// inside the invoked body.
    #[error("invocation target failed: {0}")]
    InvocationTarget(#[source] Box<DispatchError>),

    /// The invocation context stack was inspected while empty.
    #[error("invocation context stack is empty")]
    ContextUnderflow,

    /// A dispatcher collaborator was assigned a second time.
    #[error("dispatcher {field} is already wired")]
    AlreadyWired {
        /// Which collaborator slot was already filled.
        field: &'static str,
    },

    /// A method table received two bodies for the same method name.
    #[error("method '{method}' is declared twice on '{type_name}'")]
    DuplicateMethod {
        /// Type owning the table.
        type_name: String,
        /// Duplicated method name.
        method: String,
    },

    /// The metadata provider reported the type as not proxyable.
    #[error("type '{type_name}' cannot be proxied")]
    Unproxyable {
        /// Rejected type name.
        type_name: String,
    },

    /// A failure raised by application code (a method body, interceptor or
    /// decorator).
    #[error(transparent)]
    Application(Arc<dyn StdError + Send + Sync>),
}

impl DispatchError {
    /// Raises an application failure carrying `error` unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use mantle_dispatch::DispatchError;
    ///
    /// let error = DispatchError::application(std::io::Error::other("disk full"));
    /// let io = error.downcast_ref::<std::io::Error>().expect("io error");
    /// assert_eq!(io.to_string(), "disk full");
    /// ```
    pub fn application<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Application(Arc::new(error))
    }

    /// Creates an access error.
    pub fn access(type_name: impl Into<String>, method: impl Into<String>) -> Self {
        Self::Access {
            type_name: type_name.into(),
            method: method.into(),
        }
    }

    /// Creates a missing-method error.
    pub fn no_such_method(type_name: impl Into<String>, method: impl Into<String>) -> Self {
        Self::NoSuchMethod {
            type_name: type_name.into(),
            method: method.into(),
        }
    }

    /// Wraps a failure raised behind the reflective invocation boundary.
    #[must_use]
    pub fn invocation_target(cause: Self) -> Self {
        Self::InvocationTarget(Box::new(cause))
    }

    /// Returns the application error as `E` when this is an application
    /// failure of that type.
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        match self {
            Self::Application(error) => error.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Returns `true` when both errors are the same application failure
    /// instance.
    #[must_use]
    pub fn is_same_application_error(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Application(left), Self::Application(right)) => Arc::ptr_eq(left, right),
            _ => false,
        }
    }

    /// Returns `true` for the reflective invocation wrapper.
    #[must_use]
    pub const fn is_invocation_wrapper(&self) -> bool {
        matches!(self, Self::InvocationTarget(_))
    }
}
