//! Registration-time constraint handlers.
//!
//! Constraint handlers let independent parts of a large system enforce
//! global binding policies without the registry knowing about them. They run
//! before a registration is committed; the first one to call
//! [`ConstraintCheck::fail`] aborts it.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use crate::error::{DiError, DiResult};
use crate::key::{ImplType, Key};
use crate::lifetime::Lifetime;

/// A candidate binding under validation.
///
/// `existing` lists the implementations that will share the contract with
/// the candidate once the registration commits: the current bindings for an
/// append, the earlier members of the same set for a replacing registration.
pub struct ConstraintCheck<'a> {
    contract: Key,
    implementation: ImplType,
    lifetime: Lifetime,
    existing: &'a [ImplType],
    failure: Option<String>,
}

impl<'a> ConstraintCheck<'a> {
    pub(crate) fn new(
        contract: Key,
        implementation: ImplType,
        lifetime: Lifetime,
        existing: &'a [ImplType],
    ) -> Self {
        Self {
            contract,
            implementation,
            lifetime,
            existing,
            failure: None,
        }
    }

    #[inline]
    pub fn contract(&self) -> Key {
        self.contract
    }

    #[inline]
    pub fn implementation(&self) -> ImplType {
        self.implementation
    }

    #[inline]
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    #[inline]
    pub fn existing(&self) -> &[ImplType] {
        self.existing
    }

    /// Vetoes the registration. The first reason given wins.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.failure.is_none() {
            self.failure = Some(reason.into());
        }
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Validator consulted for every candidate binding.
///
/// Handlers run without any registry lock held, so they may read the
/// registry. A handler can be consulted more than once for the same
/// registration when another commit for the contract lands in between, so
/// bookkeeping should not assume one call per registration.
///
/// # Examples
///
/// ```rust
/// use appcore_di::{BindingRegistry, ConstraintCheck, ConstraintHandler, DiError};
/// use std::sync::Arc;
///
/// struct NoTestDoubles;
/// impl ConstraintHandler for NoTestDoubles {
///     fn check(&self, check: &mut ConstraintCheck<'_>) {
///         if check.implementation().short_name().starts_with("Fake") {
///             check.fail("test doubles are not allowed in production wiring");
///         }
///     }
/// }
///
/// trait Store: Send + Sync {}
/// struct FakeStore;
/// impl Store for FakeStore {}
/// appcore_di::implements!(FakeStore => dyn Store);
///
/// let registry = BindingRegistry::new();
/// registry.add_constraint_handler(Arc::new(NoTestDoubles));
/// let err = registry.register_singleton::<dyn Store, FakeStore, _>(|_| FakeStore).unwrap_err();
/// assert!(matches!(err, DiError::ConstraintViolation { .. }));
/// ```
pub trait ConstraintHandler: Send + Sync {
    fn check(&self, check: &mut ConstraintCheck<'_>);
}

impl<F> ConstraintHandler for F
where
    F: Fn(&mut ConstraintCheck<'_>) + Send + Sync,
{
    fn check(&self, check: &mut ConstraintCheck<'_>) {
        self(check)
    }
}

/// Wraps a closure as a shareable constraint handler.
pub fn constraint_fn<F>(f: F) -> Arc<dyn ConstraintHandler>
where
    F: Fn(&mut ConstraintCheck<'_>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Ordered, append-only list of constraint handlers.
#[derive(Default, Clone)]
pub(crate) struct ConstraintPipeline {
    handlers: Vec<Arc<dyn ConstraintHandler>>,
}

impl ConstraintPipeline {
    pub(crate) fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Adds a handler unless the same `Arc` is already present.
    pub(crate) fn add(&mut self, handler: Arc<dyn ConstraintHandler>) -> bool {
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

    /// Runs every handler in order, stopping at the first failure.
    pub(crate) fn evaluate(
        &self,
        contract: Key,
        implementation: ImplType,
        lifetime: Lifetime,
        existing: &[ImplType],
    ) -> DiResult<()> {
        let mut check = ConstraintCheck::new(contract, implementation, lifetime, existing);
        for handler in &self.handlers {
            handler.check(&mut check);
            if let Some(reason) = check.failure.take() {
                warn!(
                    contract = contract.display_name(),
                    implementation = implementation.name(),
                    %reason,
                    "registration vetoed"
                );
                return Err(DiError::ConstraintViolation {
                    contract: contract.display_name(),
                    implementation: implementation.name(),
                    reason,
                });
            }
        }
        Ok(())
    }
}

/// Allows at most one implementation for each listed contract.
///
/// Replacing registrations with a single implementation always pass; sets
/// and appends that would leave two implementations behind one listed
/// contract are vetoed.
///
/// ```rust
/// use appcore_di::{BindingRegistry, ExclusiveContract};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {}
/// struct SystemClock;
/// impl Clock for SystemClock {}
/// struct FrozenClock;
/// impl Clock for FrozenClock {}
/// appcore_di::implements!(SystemClock => dyn Clock);
/// appcore_di::implements!(FrozenClock => dyn Clock);
///
/// let registry = BindingRegistry::new();
/// registry.add_constraint_handler(Arc::new(ExclusiveContract::new().with::<dyn Clock>()));
/// registry.add_transient::<dyn Clock, SystemClock, _>(|_| SystemClock).unwrap();
/// assert!(registry.add_transient::<dyn Clock, FrozenClock, _>(|_| FrozenClock).is_err());
/// ```
#[derive(Debug, Default, Clone)]
pub struct ExclusiveContract {
    contracts: HashSet<Key>,
}

impl ExclusiveContract {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks contract `C` as exclusive.
    pub fn with<C: ?Sized + 'static>(mut self) -> Self {
        self.contracts.insert(Key::of::<C>());
        self
    }

    pub fn with_key(mut self, key: Key) -> Self {
        self.contracts.insert(key);
        self
    }
}

impl ConstraintHandler for ExclusiveContract {
    fn check(&self, check: &mut ConstraintCheck<'_>) {
        if !self.contracts.contains(&check.contract()) {
            return;
        }
        if let Some(holder) = check.existing().first() {
            let reason = format!(
                "{} is exclusive and already claimed by {}",
                check.contract(),
                holder.short_name()
            );
            check.fail(reason);
        }
    }
}
