//! Binding descriptors: per-contract bindings plus their instance cache.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{DiError, DiResult};
use crate::key::{ImplType, Key};
use crate::lifetime::Lifetime;
use crate::registration::{Binding, Instance};

/// Every implementation registered for one contract.
///
/// A descriptor owns the ordered, non-empty binding list for its contract,
/// the lifetime tag chosen at registration, and the instance cache the
/// provider fills on a cached materialization. The bindings never change
/// after construction; the cache is written only by the provider, under the
/// descriptor's own lock, and only once a whole materialization succeeded.
///
/// Descriptors are normally built by [`BindingRegistry`](crate::BindingRegistry).
/// A [`DynamicResolver`](crate::DynamicResolver) builds them directly.
///
/// # Examples
///
/// ```rust
/// use appcore_di::{Binding, BindingDescriptor, Key, Lifetime};
///
/// trait Job: Send + Sync {}
/// struct Cleanup;
/// impl Job for Cleanup {}
/// appcore_di::implements!(Cleanup => dyn Job);
///
/// let descriptor = BindingDescriptor::new(
///     Key::of::<dyn Job>(),
///     Lifetime::Transient,
///     vec![Binding::new::<dyn Job, Cleanup, _>(|_| Cleanup)],
/// ).unwrap();
/// assert_eq!(descriptor.len(), 1);
/// assert!(descriptor.implementations()[0].is::<Cleanup>());
/// assert!(!descriptor.is_materialized());
///
/// assert!(BindingDescriptor::new(Key::of::<dyn Job>(), Lifetime::Transient, vec![]).is_err());
/// ```
pub struct BindingDescriptor {
    contract: Key,
    lifetime: Lifetime,
    bindings: Vec<Binding>,
    pub(crate) instances: Mutex<Option<Arc<[Instance]>>>,
    sequence: u64,
    revision: u64,
}

impl BindingDescriptor {
    /// Creates a descriptor, validating the binding list.
    ///
    /// Fails with [`DiError::EmptyBindingSet`] for an empty list and with
    /// [`DiError::NotAssignable`] when a binding was built for another contract.
    pub fn new(contract: Key, lifetime: Lifetime, bindings: Vec<Binding>) -> DiResult<Self> {
        validate_bindings(contract, &bindings)?;
        Ok(Self {
            contract,
            lifetime,
            bindings,
            instances: Mutex::new(None),
            sequence: 0,
            revision: 0,
        })
    }

    /// Creates a descriptor holding a single binding.
    pub fn single(lifetime: Lifetime, binding: Binding) -> Self {
        Self {
            contract: binding.contract(),
            lifetime,
            bindings: vec![binding],
            instances: Mutex::new(None),
            sequence: 0,
            revision: 0,
        }
    }

    pub(crate) fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Stamps the registry commit that produced this descriptor.
    pub(crate) fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    /// Same bindings and tag, empty cache.
    pub(crate) fn fresh_copy(&self) -> Self {
        Self {
            contract: self.contract,
            lifetime: self.lifetime,
            bindings: self.bindings.clone(),
            instances: Mutex::new(None),
            sequence: self.sequence,
            revision: self.revision,
        }
    }

    #[inline]
    pub fn contract(&self) -> Key {
        self.contract
    }

    #[inline]
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Bound implementations in registration order.
    #[inline]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Implementation identities in registration order.
    pub fn implementations(&self) -> Vec<ImplType> {
        self.bindings.iter().map(Binding::implementation).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Always `false` for a validated descriptor.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Whether a cached instance list is present.
    pub fn is_materialized(&self) -> bool {
        self.instances.lock().is_some()
    }

    #[inline]
    pub(crate) fn sequence(&self) -> u64 {
        self.sequence
    }

    #[inline]
    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }
}

impl fmt::Debug for BindingDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingDescriptor")
            .field("contract", &self.contract)
            .field("lifetime", &self.lifetime)
            .field("implementations", &self.implementations())
            .finish()
    }
}

pub(crate) fn validate_bindings(contract: Key, bindings: &[Binding]) -> DiResult<()> {
    if bindings.is_empty() {
        return Err(DiError::EmptyBindingSet(contract.display_name()));
    }
    if let Some(foreign) = bindings.iter().find(|b| b.contract() != contract) {
        return Err(DiError::NotAssignable {
            contract: contract.display_name(),
            implementation: foreign.implementation().name(),
        });
    }
    Ok(())
}
