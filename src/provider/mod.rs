//! Resolution provider.
//!
//! The provider is the read side of the container: it owns an immutable
//! snapshot of the registry, the memo of dynamically resolved contracts,
//! and is the only component that touches instance caches or triggers the
//! activation pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::activation::ActivationPipeline;
use crate::descriptors::BindingDescriptor;
use crate::error::{DiError, DiResult};
use crate::fallback::DynamicResolver;
use crate::internal::{Owner, ResolutionFrame};
use crate::key::{ImplType, Key};
use crate::lifetime::{CachePolicy, Cardinality, Lifetime, ResolvePolicy};
use crate::registration::Instance;
use crate::traits::ResolverCore;

pub mod context;
pub use context::ResolverContext;

#[cfg(feature = "ahash")]
type SnapshotMap = HashMap<Key, Arc<BindingDescriptor>, ahash::RandomState>;
#[cfg(not(feature = "ahash"))]
type SnapshotMap = HashMap<Key, Arc<BindingDescriptor>>;

/// Provider for resolving contracts from a frozen registry.
///
/// Built by [`BindingRegistry::build`](crate::BindingRegistry::build). The
/// provider is a cheap handle: clones share the same snapshot, caches and
/// fallback memo, so the host can pass it to every collaborator it
/// constructs.
///
/// # Thread Safety
///
/// Each contract has its own lock. Resolutions of unrelated contracts never
/// contend, and concurrent resolutions of one cached contract all observe
/// the same instances.
///
/// # Examples
///
/// ```
/// use appcore_di::{Binding, BindingRegistry, Resolver};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter { fn greet(&self) -> String { "Hello".into() } }
/// appcore_di::implements!(EnglishGreeter => dyn Greeter);
///
/// let registry = BindingRegistry::new();
/// registry.register_singleton::<dyn Greeter, EnglishGreeter, _>(|_| EnglishGreeter).unwrap();
///
/// let provider = registry.build();
/// let a = provider.get_required::<dyn Greeter>().unwrap();
/// let b = provider.get_required::<dyn Greeter>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// assert_eq!(a.greet(), "Hello");
/// ```
#[derive(Clone)]
pub struct ServiceProvider {
    inner: Arc<ProviderInner>,
}

pub(crate) struct ProviderInner {
    pub host: String,
    pub max_depth: usize,
    pub snapshot: SnapshotMap,
    /// Static contracts in first-registration order
    pub order: Vec<Key>,
    /// Descriptors produced by the dynamic resolver
    pub resolved: DashMap<Key, Arc<BindingDescriptor>>,
    pub activation: ActivationPipeline,
    pub fallback: Option<Arc<dyn DynamicResolver>>,
}

impl ServiceProvider {
    pub(crate) fn new(
        host: String,
        max_depth: usize,
        descriptors: Vec<BindingDescriptor>,
        activation: ActivationPipeline,
        fallback: Option<Arc<dyn DynamicResolver>>,
    ) -> Self {
        let mut descriptors = descriptors;
        descriptors.sort_by_key(BindingDescriptor::sequence);

        let order: Vec<Key> = descriptors.iter().map(BindingDescriptor::contract).collect();
        let mut snapshot = SnapshotMap::default();
        snapshot.reserve(descriptors.len());
        for descriptor in descriptors {
            snapshot.insert(descriptor.contract(), Arc::new(descriptor));
        }

        debug!(
            host = %host,
            contracts = order.len(),
            activation_handlers = activation.len(),
            dynamic_resolver = fallback.is_some(),
            "provider built"
        );

        Self {
            inner: Arc::new(ProviderInner {
                host,
                max_depth,
                snapshot,
                order,
                resolved: DashMap::new(),
                activation,
                fallback,
            }),
        }
    }

    #[inline]
    pub(crate) fn inner(&self) -> &ProviderInner {
        &self.inner
    }

    // Clones share the inner state, so they count as the same provider.
    #[inline]
    fn owner(&self) -> Owner {
        Arc::as_ptr(&self.inner) as *const () as Owner
    }

    /// Label of the host this provider serves.
    pub fn host(&self) -> &str {
        &self.inner.host
    }

    /// Statically registered contracts, in first-registration order.
    ///
    /// Used by the host's startup sequencer to discover everything that has
    /// to be instantiated at boot.
    pub fn registered_contracts(&self) -> Vec<Key> {
        self.inner.order.clone()
    }

    /// Contracts that were resolved through the dynamic resolver so far.
    pub fn resolved_contracts(&self) -> Vec<Key> {
        self.inner.resolved.iter().map(|e| *e.key()).collect()
    }

    /// Whether `key` has a static or already memoized dynamic binding.
    ///
    /// Never consults the dynamic resolver.
    pub fn is_bound(&self, key: &Key) -> bool {
        self.inner.snapshot.contains_key(key) || self.inner.resolved.contains_key(key)
    }

    /// Lifetime tag of a static or memoized contract.
    pub fn lifetime_of(&self, key: &Key) -> Option<Lifetime> {
        self.known(key).map(|d| d.lifetime())
    }

    fn known(&self, key: &Key) -> Option<Arc<BindingDescriptor>> {
        if let Some(descriptor) = self.inner.snapshot.get(key) {
            return Some(descriptor.clone());
        }
        self.inner.resolved.get(key).map(|e| e.value().clone())
    }

    /// Finds the descriptor for `key`, consulting the dynamic resolver on a miss.
    fn lookup(&self, key: &Key, cardinality: Cardinality) -> DiResult<Option<Arc<BindingDescriptor>>> {
        if let Some(descriptor) = self.known(key) {
            return Ok(Some(descriptor));
        }
        let Some(fallback) = &self.inner.fallback else {
            return Ok(None);
        };

        let Some(descriptor) = fallback.resolve(key, cardinality)? else {
            trace!(contract = key.display_name(), "no binding");
            return Ok(None);
        };
        if descriptor.contract() != *key {
            return Err(DiError::NotAssignable {
                contract: key.display_name(),
                implementation: descriptor.contract().display_name(),
            });
        }

        // Two threads may both reach the resolver for an unseen contract;
        // the first insert wins and both return it.
        let memo = self
            .inner
            .resolved
            .entry(*key)
            .or_insert_with(|| Arc::new(descriptor))
            .value()
            .clone();
        debug!(
            contract = key.display_name(),
            implementations = memo.len(),
            "contract resolved dynamically"
        );
        Ok(Some(memo))
    }

    fn resolve_with(
        &self,
        key: &Key,
        cache: Option<CachePolicy>,
        cardinality: Cardinality,
    ) -> DiResult<Option<Arc<[Instance]>>> {
        let Some(descriptor) = self.lookup(key, cardinality)? else {
            return Ok(None);
        };
        let cache = cache.unwrap_or_else(|| descriptor.lifetime().default_cache());
        self.materialize(&descriptor, ResolvePolicy::new(cache, cardinality))
            .map(Some)
    }

    fn materialize(
        &self,
        descriptor: &BindingDescriptor,
        policy: ResolvePolicy,
    ) -> DiResult<Arc<[Instance]>> {
        let key = descriptor.contract();
        let _frame = ResolutionFrame::enter(self.owner(), key, self.inner.max_depth)?;
        let mut slot = descriptor.instances.lock();

        if let Some(cached) = slot.as_ref() {
            trace!(contract = key.display_name(), "cache hit");
            return Ok(cached.clone());
        }

        let bindings = if policy.single() {
            &descriptor.bindings()[..1]
        } else {
            descriptor.bindings()
        };

        let ctx = ResolverContext::new(self);
        let mut built = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let instance = binding.create(&ctx)?;
            self.inner.activation.run(&instance)?;
            built.push(instance);
        }
        let built: Arc<[Instance]> = built.into();

        trace!(
            contract = key.display_name(),
            instances = built.len(),
            cached = policy.caches(),
            "materialized"
        );
        if policy.caches() {
            *slot = Some(built.clone());
        }
        Ok(built)
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("=== Service Provider Debug ({}) ===\n", self.inner.host));
        s.push_str("Static Bindings:\n");
        for key in &self.inner.order {
            if let Some(d) = self.inner.snapshot.get(key) {
                s.push_str(&format!(
                    "  {} [{:?}, cached: {}]\n",
                    key,
                    d.lifetime(),
                    d.is_materialized()
                ));
                for implementation in d.implementations() {
                    s.push_str(&format!("    - {}\n", implementation));
                }
            }
        }
        s.push_str("Dynamic Bindings:\n");
        for entry in self.inner.resolved.iter() {
            s.push_str(&format!("  {} [{:?}]\n", entry.key(), entry.value().lifetime()));
        }
        s
    }
}

impl ResolverCore for ServiceProvider {
    fn resolve_erased(&self, key: &Key, policy: ResolvePolicy) -> DiResult<Option<Arc<[Instance]>>> {
        self.resolve_with(key, Some(policy.cache), policy.cardinality)
    }

    fn resolve_by_lifetime(&self, key: &Key, cardinality: Cardinality) -> DiResult<Option<Arc<[Instance]>>> {
        self.resolve_with(key, None, cardinality)
    }

    fn bound_implementations(&self, key: &Key) -> Option<Vec<ImplType>> {
        self.known(key).map(|d| d.implementations())
    }
}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("host", &self.inner.host)
            .field("contracts", &self.inner.order.len())
            .field("resolved", &self.inner.resolved.len())
            .finish()
    }
}
