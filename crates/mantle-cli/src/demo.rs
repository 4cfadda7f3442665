//! Demonstration component graph driven by the `mantle` binary.
//!
//! A `Greeter` component is proxied by a [`CombinedDispatcher`]. Depending on
//! the [`Scenario`], an auditing interceptor and a polite decorator are wired
//! onto the dispatcher. The decorator delegates back to the proxy it
//! decorates, so every decorated call re-enters the dispatcher once and is
//! routed to the original method by the re-entrancy guard.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use mantle_dispatch::{
    AccessPolicy, CombinedDispatcher, DispatchError, Interceptor, InterceptorChain, Invocation,
    Managed, Method, MethodTable, ProxyInstance, Receiver, TypeMetadata, Visibility,
    current_depth,
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

use crate::cli::Scenario;

/// Tracing target for the demonstration graph.
pub(crate) const DEMO_TARGET: &str = "mantle_cli::demo";

const GREETER: &str = "Greeter";
const POLITE_DECORATOR: &str = "PoliteDecorator";

/// Types the demonstration container is allowed to proxy.
const PROXYABLE_TYPES: &[&str] = &[GREETER];

/// Raised by the decorator when the proxy it decorates has been dropped.
#[derive(Debug, thiserror::Error)]
#[error("decorated component is no longer alive")]
pub(crate) struct DelegateDropped;

pub(crate) struct Greeter {
    calls: AtomicUsize,
}

impl Greeter {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

fn name_argument(args: &[Value]) -> &str {
    args.first().and_then(Value::as_str).unwrap_or("stranger")
}

fn greeter_table() -> Result<MethodTable<Greeter>, DispatchError> {
    MethodTable::builder(GREETER)
        .method("greet", Visibility::Public, |greeter: &Greeter, args| {
            greeter.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!(format!("hello {}", name_argument(args))))
        })
        .build()
}

/// Counts and logs every call it observes, then proceeds.
#[derive(Debug, Default)]
pub(crate) struct AuditInterceptor {
    business: AtomicUsize,
    lifecycle: AtomicUsize,
}

impl Interceptor for AuditInterceptor {
    fn intercept(&self, invocation: &Invocation<'_>) -> Result<Value, DispatchError> {
        let counter = if invocation.is_lifecycle() {
            &self.lifecycle
        } else {
            &self.business
        };
        counter.fetch_add(1, Ordering::SeqCst);
        info!(
            target: DEMO_TARGET,
            method = %invocation.method(),
            receiver = invocation.target().type_name(),
            lifecycle = invocation.is_lifecycle(),
            "audited call"
        );
        invocation.proceed()
    }
}

pub(crate) struct PoliteDecorator {
    delegate: Weak<ProxyInstance<Greeter>>,
    calls: AtomicUsize,
    ready: AtomicUsize,
}

impl PoliteDecorator {
    fn new(delegate: Weak<ProxyInstance<Greeter>>) -> Self {
        Self {
            delegate,
            calls: AtomicUsize::new(0),
            ready: AtomicUsize::new(0),
        }
    }
}

fn decorator_table() -> Result<MethodTable<PoliteDecorator>, DispatchError> {
    MethodTable::builder(POLITE_DECORATOR)
        .method("greet", Visibility::Public, |decorator: &PoliteDecorator, args| {
            decorator.calls.fetch_add(1, Ordering::SeqCst);
            let delegate = decorator
                .delegate
                .upgrade()
                .ok_or_else(|| DispatchError::application(DelegateDropped))?;
            let greeting = delegate.call(&Method::public("greet"), args)?;
            let text = greeting.as_str().unwrap_or_default();
            Ok(json!(format!("{text}, pleased to meet you")))
        })
        // With no interceptors wired, the dispatcher hands lifecycle callbacks
        // to the outer decorator, so it must declare them.
        .method("post_construct", Visibility::Public, |decorator: &PoliteDecorator, _| {
            decorator.ready.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Null)
        })
        .build()
}

/// Metadata provider backed by a fixed list of proxyable types.
struct RegisteredTypes(&'static [&'static str]);

impl TypeMetadata for RegisteredTypes {
    fn is_proxyable(&self, type_name: &str) -> bool {
        self.0.contains(&type_name)
    }
}

/// A wired proxy together with handles on its collaborators.
pub(crate) struct Assembly {
    pub(crate) proxy: Arc<ProxyInstance<Greeter>>,
    pub(crate) interceptor: Option<Arc<AuditInterceptor>>,
    pub(crate) decorator: Option<Arc<Managed<PoliteDecorator>>>,
}

/// Builds the component graph for `scenario` and delivers its
/// `post_construct` callback.
pub(crate) fn assemble(scenario: Scenario, access: AccessPolicy) -> Result<Assembly, DispatchError> {
    let dispatcher = Arc::new(CombinedDispatcher::new().with_access_policy(access));
    let proxy = Arc::new(ProxyInstance::checked(
        &RegisteredTypes(PROXYABLE_TYPES),
        Greeter::new(),
        greeter_table()?,
        Arc::clone(&dispatcher),
    )?);

    let interceptor = if scenario.intercepts() {
        let interceptor = Arc::new(AuditInterceptor::default());
        let interceptors: Vec<Arc<dyn Interceptor>> =
            vec![Arc::clone(&interceptor) as Arc<dyn Interceptor>];
        dispatcher.set_interceptor_handler(Arc::new(
            InterceptorChain::new(interceptors).with_access_policy(access),
        ))?;
        Some(interceptor)
    } else {
        None
    };

    let decorator = if scenario.decorates() {
        let decorator = Arc::new(Managed::new(
            PoliteDecorator::new(Arc::downgrade(&proxy)),
            decorator_table()?,
        ));
        dispatcher.set_outer_decorator(Arc::clone(&decorator) as Arc<dyn Receiver>)?;
        Some(decorator)
    } else {
        None
    };

    info!(
        target: DEMO_TARGET,
        scenario = scenario.as_str(),
        dispatcher = %dispatcher.id(),
        "component graph assembled"
    );
    proxy.lifecycle("post_construct")?;

    Ok(Assembly {
        proxy,
        interceptor,
        decorator,
    })
}

/// Outcome of one scenario run, written as a JSON line.
#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct Report {
    pub(crate) scenario: &'static str,
    pub(crate) result: Value,
    pub(crate) interceptor_calls: usize,
    pub(crate) lifecycle_callbacks: usize,
    pub(crate) decorator_calls: usize,
    pub(crate) greeter_calls: usize,
    pub(crate) context_depth: usize,
}

impl Assembly {
    fn decorator_ready(&self) -> usize {
        self.decorator
            .as_ref()
            .map_or(0, |polite| polite.instance().ready.load(Ordering::SeqCst))
    }

    /// Calls `greet(name)` through the proxy and summarises what ran.
    pub(crate) fn greet(&self, scenario: Scenario, name: &str) -> Result<Report, DispatchError> {
        let result = self.proxy.invoke("greet", &[json!(name)])?;
        let interceptor = self.interceptor.as_deref();
        Ok(Report {
            scenario: scenario.as_str(),
            result,
            interceptor_calls: interceptor
                .map_or(0, |audit| audit.business.load(Ordering::SeqCst)),
            lifecycle_callbacks: interceptor
                .map_or(0, |audit| audit.lifecycle.load(Ordering::SeqCst))
                + self.decorator_ready(),
            decorator_calls: self
                .decorator
                .as_ref()
                .map_or(0, |polite| polite.instance().calls.load(Ordering::SeqCst)),
            greeter_calls: self.proxy.instance().calls.load(Ordering::SeqCst),
            context_depth: current_depth(),
        })
    }
}
