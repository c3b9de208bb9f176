//! Activation handlers observing every freshly built instance.
//!
//! The activation pipeline runs synchronously on the resolving thread, in
//! handler registration order, right after a factory returns and before the
//! instance is cached or handed to the caller. Cached instances are never
//! re-activated.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{BoxError, DiError, DiResult};
use crate::key::{ImplType, Key};
use crate::registration::Instance;

/// A freshly built instance handed to activation handlers.
pub struct Activation<'a> {
    instance: &'a Instance,
}

impl<'a> Activation<'a> {
    pub(crate) fn new(instance: &'a Instance) -> Self {
        Self { instance }
    }

    /// Contract the instance was requested through.
    #[inline]
    pub fn contract(&self) -> Key {
        self.instance.contract()
    }

    #[inline]
    pub fn implementation(&self) -> ImplType {
        self.instance.implementation()
    }

    #[inline]
    pub fn instance(&self) -> &Instance {
        self.instance
    }

    /// Borrows the instance as its concrete type.
    pub fn concrete<I: 'static>(&self) -> Option<&I> {
        self.instance.concrete::<I>()
    }

    /// The contract view, when `C` is the requested contract.
    pub fn downcast<C: ?Sized + 'static>(&self) -> Option<Arc<C>> {
        self.instance.downcast::<C>()
    }
}

/// Observer invoked on every newly materialized instance.
///
/// Returning an error aborts the resolution call; nothing built during that
/// call is cached.
///
/// # Examples
///
/// ```rust
/// use appcore_di::{activation_fn, Activation, BindingRegistry, Resolver};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// struct Worker;
///
/// let started = Arc::new(AtomicUsize::new(0));
/// let seen = started.clone();
///
/// let registry = BindingRegistry::new();
/// registry.add_activation_handler(activation_fn(move |a: &Activation<'_>| {
///     if a.concrete::<Worker>().is_some() {
///         seen.fetch_add(1, Ordering::SeqCst);
///     }
///     Ok(())
/// }));
/// registry.register_singleton::<Worker, Worker, _>(|_| Worker).unwrap();
///
/// let provider = registry.build();
/// provider.get_required::<Worker>().unwrap();
/// provider.get_required::<Worker>().unwrap();
/// assert_eq!(started.load(Ordering::SeqCst), 1);
/// ```
pub trait ActivationHandler: Send + Sync {
    fn on_activated(&self, activation: &Activation<'_>) -> Result<(), BoxError>;
}

impl<F> ActivationHandler for F
where
    F: Fn(&Activation<'_>) -> Result<(), BoxError> + Send + Sync,
{
    fn on_activated(&self, activation: &Activation<'_>) -> Result<(), BoxError> {
        self(activation)
    }
}

/// Wraps a closure as a shareable activation handler.
pub fn activation_fn<F>(f: F) -> Arc<dyn ActivationHandler>
where
    F: Fn(&Activation<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Ordered, append-only list of activation handlers.
#[derive(Default, Clone)]
pub(crate) struct ActivationPipeline {
    handlers: Vec<Arc<dyn ActivationHandler>>,
}

impl ActivationPipeline {
    pub(crate) fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Adds a handler unless the same `Arc` is already present.
    pub(crate) fn add(&mut self, handler: Arc<dyn ActivationHandler>) -> bool {
        let ptr = Arc::as_ptr(&handler) as *const ();
        if self.handlers.iter().any(|h| Arc::as_ptr(h) as *const () == ptr) {
            return false;
        }
        self.handlers.push(handler);
        true
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.handlers.len()
    }

    pub(crate) fn run(&self, instance: &Instance) -> DiResult<()> {
        if self.handlers.is_empty() {
            return Ok(());
        }
        let activation = Activation::new(instance);
        for handler in &self.handlers {
            handler
                .on_activated(&activation)
                .map_err(|source| DiError::Activation {
                    implementation: instance.implementation().name(),
                    source,
                })?;
        }
        Ok(())
    }
}

/// Built-in handler that emits a `tracing` event per activation.
///
/// Installed automatically when
/// [`ContainerOptions::log_activations`](crate::ContainerOptions::log_activations)
/// is set.
#[derive(Debug, Clone)]
pub struct LoggingActivationHandler {
    host: String,
}

impl LoggingActivationHandler {
    pub fn new() -> Self {
        Self {
            host: "appcore".to_string(),
        }
    }

    /// Tags every event with the given host label.
    pub fn with_host(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl Default for LoggingActivationHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivationHandler for LoggingActivationHandler {
    fn on_activated(&self, activation: &Activation<'_>) -> Result<(), BoxError> {
        debug!(
            host = %self.host,
            contract = activation.contract().display_name(),
            implementation = activation.implementation().name(),
            "instance activated"
        );
        Ok(())
    }
}

/// Records every activation it sees, in order.
///
/// Handy for provenance and for asserting activation behaviour in tests.
#[derive(Debug, Default)]
pub struct ActivationLog {
    entries: Mutex<Vec<(Key, ImplType)>>,
}

impl ActivationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded `(contract, implementation)` pairs.
    pub fn entries(&self) -> Vec<(Key, ImplType)> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Number of activations of implementation `I`.
    pub fn count_of<I: 'static>(&self) -> usize {
        self.entries.lock().iter().filter(|(_, i)| i.is::<I>()).count()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl ActivationHandler for ActivationLog {
    fn on_activated(&self, activation: &Activation<'_>) -> Result<(), BoxError> {
        self.entries
            .lock()
            .push((activation.contract(), activation.implementation()));
        Ok(())
    }
}
