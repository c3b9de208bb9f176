//! Binding registry: the write side of the container.
//!
//! Collaborators register their bindings here during bootstrap, possibly
//! from several threads at once. Every registration runs the constraint
//! pipeline against a snapshot of its contract, then commits only if that
//! contract is unchanged; a failed registration leaves the registry exactly
//! as it was.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::activation::{ActivationHandler, ActivationPipeline, LoggingActivationHandler};
use crate::config::ContainerOptions;
use crate::constraints::{ConstraintHandler, ConstraintPipeline};
use crate::descriptors::{validate_bindings, BindingDescriptor};
use crate::error::{DiError, DiResult};
use crate::fallback::DynamicResolver;
use crate::key::{ImplType, Key};
use crate::lifetime::Lifetime;
use crate::provider::{ResolverContext, ServiceProvider};
use crate::registration::{Binding, Implements};

pub mod module_system;
pub use module_system::*;

/// How a registration combines with an existing descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Commit {
    Replace,
    Append,
}

/// Registry of contract bindings.
///
/// All methods take `&self`, so the registry can be shared (for instance in
/// an `Arc`) between independently loaded collaborators. Registration is
/// expected to finish before [`build`](Self::build) is called; the built
/// provider works from a snapshot and does not see later registrations.
///
/// # Examples
///
/// ```rust
/// use appcore_di::{Binding, BindingRegistry, Key, Resolver};
///
/// trait Logger: Send + Sync { fn name(&self) -> &'static str; }
/// struct FileLogger;
/// impl Logger for FileLogger { fn name(&self) -> &'static str { "file" } }
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger { fn name(&self) -> &'static str { "console" } }
/// struct NetworkLogger;
/// impl Logger for NetworkLogger { fn name(&self) -> &'static str { "network" } }
/// appcore_di::implements!(FileLogger => dyn Logger);
/// appcore_di::implements!(ConsoleLogger => dyn Logger);
/// appcore_di::implements!(NetworkLogger => dyn Logger);
///
/// let registry = BindingRegistry::new();
/// registry
///     .register_transient_set::<dyn Logger>(vec![
///         Binding::new::<dyn Logger, FileLogger, _>(|_| FileLogger),
///         Binding::new::<dyn Logger, ConsoleLogger, _>(|_| ConsoleLogger),
///     ])?
///     .add_transient::<dyn Logger, NetworkLogger, _>(|_| NetworkLogger)?;
///
/// let bound = registry.bound_implementations(&Key::of::<dyn Logger>()).unwrap();
/// assert_eq!(bound.len(), 3);
///
/// let provider = registry.build();
/// let names: Vec<_> = provider.get_all::<dyn Logger>()?.iter().map(|l| l.name()).collect();
/// assert_eq!(names, ["file", "console", "network"]);
/// # Ok::<(), appcore_di::DiError>(())
/// ```
pub struct BindingRegistry {
    options: ContainerOptions,
    bindings: DashMap<Key, BindingDescriptor>,
    sequence: AtomicU64,
    revision: AtomicU64,
    constraints: RwLock<ConstraintPipeline>,
    activation: RwLock<ActivationPipeline>,
    fallback: RwLock<Option<Arc<dyn DynamicResolver>>>,
}

impl BindingRegistry {
    /// Creates an empty registry with default options.
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    /// Creates an empty registry labelled with host type `H`.
    pub fn for_host<H: ?Sized + 'static>() -> Self {
        Self::with_options(ContainerOptions::default().host(std::any::type_name::<H>()))
    }

    /// Creates an empty registry with the given options.
    pub fn with_options(options: ContainerOptions) -> Self {
        let mut activation = ActivationPipeline::new();
        if options.log_activations {
            activation.add(Arc::new(LoggingActivationHandler::with_host(options.host.clone())));
        }
        Self {
            options,
            bindings: DashMap::new(),
            sequence: AtomicU64::new(0),
            revision: AtomicU64::new(1),
            constraints: RwLock::new(ConstraintPipeline::new()),
            activation: RwLock::new(activation),
            fallback: RwLock::new(None),
        }
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    pub fn host(&self) -> &str {
        &self.options.host
    }

    // ----- Singleton Registrations -----

    /// Binds `I` as the single implementation of `C`, materialized once.
    ///
    /// Replaces any earlier registration for `C`. A constraint veto fails
    /// with [`DiError::ConstraintViolation`] and leaves the registry untouched.
    pub fn register_singleton<C, I, F>(&self, factory: F) -> DiResult<&Self>
    where
        C: ?Sized + Send + Sync + 'static,
        I: Implements<C>,
        F: Fn(&ResolverContext<'_>) -> I + Send + Sync + 'static,
    {
        self.register_singleton_binding(Binding::new::<C, I, F>(factory))
    }

    /// Binds an already-built instance as the singleton for `C`.
    pub fn register_singleton_instance<C, I>(&self, value: Arc<I>) -> DiResult<&Self>
    where
        C: ?Sized + Send + Sync + 'static,
        I: Implements<C>,
    {
        self.register_singleton_binding(Binding::instance::<C, I>(value))
    }

    /// Singleton registration from a prepared binding.
    pub fn register_singleton_binding(&self, binding: Binding) -> DiResult<&Self> {
        self.commit(binding.contract(), Lifetime::Singleton, vec![binding], Commit::Replace)?;
        Ok(self)
    }

    // ----- Transient Registrations -----

    /// Binds `I` as the only implementation of `C`, rebuilt on each resolution.
    ///
    /// Replaces any earlier registration for `C`.
    pub fn register_transient<C, I, F>(&self, factory: F) -> DiResult<&Self>
    where
        C: ?Sized + Send + Sync + 'static,
        I: Implements<C>,
        F: Fn(&ResolverContext<'_>) -> I + Send + Sync + 'static,
    {
        let binding = Binding::new::<C, I, F>(factory);
        self.commit(binding.contract(), Lifetime::Transient, vec![binding], Commit::Replace)?;
        Ok(self)
    }

    /// Replaces the whole ordered implementation list of `C`.
    ///
    /// Every binding is constraint-checked before any is committed. Fails
    /// with [`DiError::EmptyBindingSet`] for an empty list and with
    /// [`DiError::NotAssignable`] for a binding built for another contract.
    pub fn register_transient_set<C>(&self, bindings: Vec<Binding>) -> DiResult<&Self>
    where
        C: ?Sized + 'static,
    {
        self.commit(Key::of::<C>(), Lifetime::Transient, bindings, Commit::Replace)?;
        Ok(self)
    }

    /// Appends `I` to the implementations of `C`, keeping earlier ones.
    ///
    /// Creates a transient descriptor when `C` has none yet. Appending to a
    /// singleton contract fails with [`DiError::LifetimeConflict`].
    pub fn add_transient<C, I, F>(&self, factory: F) -> DiResult<&Self>
    where
        C: ?Sized + Send + Sync + 'static,
        I: Implements<C>,
        F: Fn(&ResolverContext<'_>) -> I + Send + Sync + 'static,
    {
        self.add_binding(Binding::new::<C, I, F>(factory))
    }

    /// Appends a prepared binding to its contract's transient descriptor.
    pub fn add_binding(&self, binding: Binding) -> DiResult<&Self> {
        self.commit(binding.contract(), Lifetime::Transient, vec![binding], Commit::Append)?;
        Ok(self)
    }

    fn commit(
        &self,
        key: Key,
        lifetime: Lifetime,
        candidates: Vec<Binding>,
        mode: Commit,
    ) -> DiResult<()> {
        validate_bindings(key, &candidates)?;

        loop {
            // Handlers run with no registry lock held, so they may read the
            // registry. The entry is written only if no other commit for `key`
            // landed since the snapshot; otherwise the check runs again.
            let observed = self
                .bindings
                .get(&key)
                .map(|d| (d.revision(), d.lifetime(), d.implementations()));
            let existing = match (&observed, mode) {
                (Some((_, current, implementations)), Commit::Append) => {
                    if *current != lifetime {
                        return Err(DiError::LifetimeConflict {
                            contract: key.display_name(),
                            existing: lifetime_name(*current),
                        });
                    }
                    implementations.clone()
                }
                _ => Vec::new(),
            };
            let pipeline = self.constraints.read().clone();
            check_candidates(&pipeline, key, lifetime, existing, &candidates)?;
            let observed = observed.map(|(revision, ..)| revision);

            match (self.bindings.entry(key), observed) {
                (Entry::Occupied(mut occupied), Some(seen)) if occupied.get().revision() == seen => {
                    let current = occupied.get();
                    let sequence = current.sequence();
                    let bindings = match mode {
                        Commit::Replace => candidates,
                        Commit::Append => {
                            let mut merged = current.bindings().to_vec();
                            merged.extend(candidates);
                            merged
                        }
                    };
                    let descriptor = BindingDescriptor::new(key, lifetime, bindings)?
                        .with_sequence(sequence)
                        .with_revision(self.revision.fetch_add(1, Ordering::Relaxed));
                    log_commit(&descriptor, mode, true);
                    occupied.insert(descriptor);
                    return Ok(());
                }
                (Entry::Vacant(vacant), None) => {
                    let descriptor = BindingDescriptor::new(key, lifetime, candidates)?
                        .with_sequence(self.sequence.fetch_add(1, Ordering::Relaxed))
                        .with_revision(self.revision.fetch_add(1, Ordering::Relaxed));
                    log_commit(&descriptor, mode, false);
                    vacant.insert(descriptor);
                    return Ok(());
                }
                _ => debug!(contract = key.display_name(), "binding changed during constraint check, retrying"),
            }
        }
    }

    // ----- Pipelines -----

    /// Adds a constraint handler. Returns `false` if this exact handler is already present.
    pub fn add_constraint_handler(&self, handler: Arc<dyn ConstraintHandler>) -> bool {
        self.constraints.write().add(handler)
    }

    /// Adds an activation handler. Returns `false` if this exact handler is already present.
    pub fn add_activation_handler(&self, handler: Arc<dyn ActivationHandler>) -> bool {
        self.activation.write().add(handler)
    }

    /// Installs the dynamic fallback resolver. Only one may be installed.
    pub fn set_dynamic_resolver(&self, resolver: Arc<dyn DynamicResolver>) -> DiResult<()> {
        let mut slot = self.fallback.write();
        if slot.is_some() {
            return Err(DiError::ResolverAlreadyInstalled);
        }
        *slot = Some(resolver);
        Ok(())
    }

    pub fn constraint_handler_count(&self) -> usize {
        self.constraints.read().len()
    }

    pub fn activation_handler_count(&self) -> usize {
        self.activation.read().len()
    }

    pub fn has_dynamic_resolver(&self) -> bool {
        self.fallback.read().is_some()
    }

    // ----- Introspection -----

    /// Implementations currently bound to `key`, in registration order.
    pub fn bound_implementations(&self, key: &Key) -> Option<Vec<ImplType>> {
        self.bindings.get(key).map(|d| d.implementations())
    }

    /// Lifetime tag of `key`, if registered.
    pub fn lifetime_of(&self, key: &Key) -> Option<Lifetime> {
        self.bindings.get(key).map(|d| d.lifetime())
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.bindings.contains_key(key)
    }

    /// Registered contracts in first-registration order.
    pub fn contracts(&self) -> Vec<Key> {
        let mut keyed: Vec<(u64, Key)> = self
            .bindings
            .iter()
            .map(|e| (e.value().sequence(), *e.key()))
            .collect();
        keyed.sort_unstable_by_key(|(sequence, _)| *sequence);
        keyed.into_iter().map(|(_, key)| key).collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    // ----- Build -----

    /// Freezes the current registrations into a [`ServiceProvider`].
    ///
    /// The provider gets its own copy of every descriptor with an empty
    /// instance cache, so two providers built from one registry never share
    /// instances.
    pub fn build(&self) -> ServiceProvider {
        let descriptors: Vec<BindingDescriptor> =
            self.bindings.iter().map(|e| e.value().fresh_copy()).collect();
        ServiceProvider::new(
            self.options.host.clone(),
            self.options.max_depth,
            descriptors,
            self.activation.read().clone(),
            self.fallback.read().clone(),
        )
    }
}

impl Default for BindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingRegistry")
            .field("host", &self.options.host)
            .field("contracts", &self.bindings.len())
            .field("constraint_handlers", &self.constraint_handler_count())
            .field("activation_handlers", &self.activation_handler_count())
            .field("dynamic_resolver", &self.has_dynamic_resolver())
            .finish()
    }
}

/// Runs the pipeline for each candidate, growing `existing` as it goes.
fn check_candidates(
    pipeline: &ConstraintPipeline,
    key: Key,
    lifetime: Lifetime,
    mut existing: Vec<ImplType>,
    candidates: &[Binding],
) -> DiResult<()> {
    for candidate in candidates {
        pipeline.evaluate(key, candidate.implementation(), lifetime, &existing)?;
        existing.push(candidate.implementation());
    }
    Ok(())
}

fn lifetime_name(lifetime: Lifetime) -> &'static str {
    match lifetime {
        Lifetime::Singleton => "singleton",
        Lifetime::Transient => "transient",
    }
}

fn log_commit(descriptor: &BindingDescriptor, mode: Commit, replaced: bool) {
    debug!(
        contract = descriptor.contract().display_name(),
        lifetime = lifetime_name(descriptor.lifetime()),
        implementations = descriptor.len(),
        mode = ?mode,
        replaced,
        "binding committed"
    );
}
