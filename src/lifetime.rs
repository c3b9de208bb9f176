//! Lifetime tags and resolution policies.

/// Lifetime discipline a contract was registered under.
///
/// The tag is chosen by the registration call and decides the default cache
/// policy used by [`Resolver::get`](crate::Resolver::get) and
/// [`Resolver::get_all`](crate::Resolver::get_all). Callers that need a
/// specific regime pass a [`ResolvePolicy`] explicitly instead.
///
/// # Examples
///
/// ```rust
/// use appcore_di::{BindingRegistry, Implements, Key, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {}
/// struct SystemClock;
/// impl Clock for SystemClock {}
/// appcore_di::implements!(SystemClock => dyn Clock);
///
/// let registry = BindingRegistry::new();
/// registry.register_singleton::<dyn Clock, SystemClock, _>(|_| SystemClock).unwrap();
/// assert_eq!(registry.lifetime_of(&Key::of::<dyn Clock>()), Some(Lifetime::Singleton));
///
/// let provider = registry.build();
/// let a = provider.get_required::<dyn Clock>().unwrap();
/// let b = provider.get_required::<dyn Clock>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Materialized once, cached for the life of the provider.
    Singleton,
    /// Re-materialized on every resolution unless the caller asks for caching.
    Transient,
}

impl Lifetime {
    /// Cache policy implied by this lifetime.
    #[inline]
    pub fn default_cache(self) -> CachePolicy {
        match self {
            Lifetime::Singleton => CachePolicy::Cached,
            Lifetime::Transient => CachePolicy::Fresh,
        }
    }
}

/// Whether a materialized instance list is stored in the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachePolicy {
    /// Store the list; later resolutions return the same instances.
    Cached,
    /// Return the list without storing it.
    Fresh,
}

/// How many bound implementations a resolution materializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// Only the first implementation, in registration order.
    First,
    /// Every implementation, in registration order.
    All,
}

/// Combination of cache and cardinality policy for one resolution.
///
/// The four constants cover every meaningful regime:
///
/// | constant            | cache  | cardinality |
/// |---------------------|--------|-------------|
/// | `SINGLETON`         | Cached | First       |
/// | `FIRST_WINS`        | Fresh  | First       |
/// | `BROADCAST_CACHED`  | Cached | All         |
/// | `BROADCAST_FRESH`   | Fresh  | All         |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvePolicy {
    pub cache: CachePolicy,
    pub cardinality: Cardinality,
}

impl ResolvePolicy {
    /// Single implementation, cached forever.
    pub const SINGLETON: Self = Self::new(CachePolicy::Cached, Cardinality::First);
    /// First implementation only, rebuilt every call.
    pub const FIRST_WINS: Self = Self::new(CachePolicy::Fresh, Cardinality::First);
    /// All implementations, built once and cached as a fixed chain.
    pub const BROADCAST_CACHED: Self = Self::new(CachePolicy::Cached, Cardinality::All);
    /// All implementations, rebuilt every call.
    pub const BROADCAST_FRESH: Self = Self::new(CachePolicy::Fresh, Cardinality::All);

    pub const fn new(cache: CachePolicy, cardinality: Cardinality) -> Self {
        Self { cache, cardinality }
    }

    /// Policy used by the lifetime-driven helpers.
    #[inline]
    pub fn for_lifetime(lifetime: Lifetime, cardinality: Cardinality) -> Self {
        Self::new(lifetime.default_cache(), cardinality)
    }

    #[inline]
    pub fn caches(&self) -> bool {
        self.cache == CachePolicy::Cached
    }

    #[inline]
    pub fn single(&self) -> bool {
        self.cardinality == Cardinality::First
    }
}
