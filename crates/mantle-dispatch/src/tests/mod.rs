//! Shared fixtures for crate-level and behaviour tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde_json::{Value, json};

use crate::chain::{Interceptor, Invocation};
use crate::dispatcher::CombinedDispatcher;
use crate::error::DispatchError;
use crate::invocation::Receiver;
use crate::method::{Method, MethodTable, Visibility};
use crate::proxy::{Managed, ProxyInstance};


/// Failure raised by the greeter's `fail` method.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("greeting refused with code {code}")]
pub(crate) struct GreetingRefused {
    pub(crate) code: u32,
}

/// Component under test. `greet_twice` calls back into its own proxy.
pub(crate) struct Greeter {
    pub(crate) body_calls: AtomicUsize,
    this: Weak<ProxyInstance<Greeter>>,
}

impl Greeter {
    pub(crate) fn body_calls(&self) -> usize {
        self.body_calls.load(Ordering::SeqCst)
    }
}

fn name_arg(args: &[Value]) -> String {
    args.first()
        .and_then(Value::as_str)
        .unwrap_or("nobody")
        .to_owned()
}

pub(crate) fn greeter_table() -> Arc<MethodTable<Greeter>> {
    let table = MethodTable::builder("Greeter")
        .method("greet", Visibility::Public, |greeter: &Greeter, args| {
            greeter.body_calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!(format!("hello {}", name_arg(args))))
        })
        .method("greet_twice", Visibility::Public, |greeter: &Greeter, args| {
            let proxy = greeter
                .this
                .upgrade()
                .ok_or_else(|| DispatchError::no_such_method("Greeter", "this"))?;
            let first = proxy.invoke("greet", args)?;
            let second = proxy.invoke("greet", args)?;
            Ok(json!([first, second]))
        })
        .method("fail", Visibility::Public, |_: &Greeter, args| {
            let code = args
                .first()
                .and_then(Value::as_u64)
                .and_then(|code| u32::try_from(code).ok())
                .unwrap_or(1);
            Err(DispatchError::application(GreetingRefused { code }))
        })
        .method("panic", Visibility::Public, |_: &Greeter, _| {
            panic!("greeter body panicked")
        })
        .method("secret", Visibility::Private, |_: &Greeter, _| {
            Ok(json!("classified"))
        })
        .build()
        .expect("greeter table builds");
    Arc::new(table)
}

/// Builds a greeter proxy around `dispatcher`.
pub(crate) fn greeter_proxy(dispatcher: Arc<CombinedDispatcher>) -> Arc<ProxyInstance<Greeter>> {
    let table = greeter_table();
    Arc::new_cyclic(|this| {
        ProxyInstance::new(
            Greeter {
                body_calls: AtomicUsize::new(0),
                this: this.clone(),
            },
            table,
            dispatcher,
        )
    })
}

/// Interceptor that counts its executions and tags results with a label.
#[derive(Debug, Default)]
pub(crate) struct TaggingInterceptor {
    label: String,
    business: AtomicUsize,
    lifecycle: AtomicUsize,
    seen_targets: Mutex<Vec<&'static str>>,
}

impl TaggingInterceptor {
    pub(crate) fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub(crate) fn business_hits(&self) -> usize {
        self.business.load(Ordering::SeqCst)
    }

    pub(crate) fn lifecycle_hits(&self) -> usize {
        self.lifecycle.load(Ordering::SeqCst)
    }

    pub(crate) fn seen_targets(&self) -> Vec<&'static str> {
        self.seen_targets
            .lock()
            .expect("target log lock")
            .clone()
    }
}

impl Interceptor for TaggingInterceptor {
    fn intercept(&self, invocation: &Invocation<'_>) -> Result<Value, DispatchError> {
        self.seen_targets
            .lock()
            .expect("target log lock")
            .push(invocation.target().type_name());
        if invocation.is_lifecycle() {
            self.lifecycle.fetch_add(1, Ordering::SeqCst);
            return invocation.proceed();
        }
        self.business.fetch_add(1, Ordering::SeqCst);
        let value = invocation.proceed()?;
        Ok(json!(format!("[{}] {}", self.label, render(&value))))
    }
}

/// Decorator that upper-cases what its delegate returns.
pub(crate) struct LoudDecorator {
    delegate: Arc<dyn Receiver>,
    calls: AtomicUsize,
}

impl LoudDecorator {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Builds a decorator delegating to `delegate`.
pub(crate) fn loud_decorator(delegate: Arc<dyn Receiver>) -> Arc<Managed<LoudDecorator>> {
    let table = MethodTable::builder("LoudDecorator")
        .method("greet", Visibility::Public, |decorator: &LoudDecorator, args| {
            decorator.calls.fetch_add(1, Ordering::SeqCst);
            let value = decorator.delegate.call(&Method::public("greet"), args)?;
            Ok(json!(render(&value).to_uppercase()))
        })
        .build()
        .expect("decorator table builds");
    Arc::new(Managed::new(
        LoudDecorator {
            delegate,
            calls: AtomicUsize::new(0),
        },
        table,
    ))
}

pub(crate) fn render(value: &Value) -> String {
    value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_owned)
}
