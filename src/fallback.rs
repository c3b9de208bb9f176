//! Dynamic fallback resolution for contracts with no static binding.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::descriptors::BindingDescriptor;
use crate::error::DiResult;
use crate::key::Key;
use crate::lifetime::{Cardinality, Lifetime};
use crate::registration::Binding;

/// Last-resort resolver consulted when a contract has no static binding.
///
/// The provider asks at most once per contract for its whole lifetime: a
/// `Some` descriptor is memoized and `None` means "nothing bound", which the
/// caller sees as an absent result. A registry holds at most one resolver.
///
/// # Examples
///
/// ```rust
/// use appcore_di::{resolver_fn, Binding, BindingDescriptor, BindingRegistry, Key, Lifetime, Resolver};
///
/// struct Plugin(&'static str);
///
/// let registry = BindingRegistry::new();
/// registry.set_dynamic_resolver(resolver_fn(|key: &Key, _| {
///     if *key == Key::of::<Plugin>() {
///         let binding = Binding::new::<Plugin, Plugin, _>(|_| Plugin("late"));
///         return Ok(Some(BindingDescriptor::single(Lifetime::Singleton, binding)));
///     }
///     Ok(None)
/// })).unwrap();
///
/// let provider = registry.build();
/// assert_eq!(provider.get_required::<Plugin>().unwrap().0, "late");
/// assert!(provider.get::<String>().unwrap().is_none());
/// ```
pub trait DynamicResolver: Send + Sync {
    /// Produces a descriptor for `contract`, or `None` when nothing is available.
    ///
    /// `cardinality` is the cardinality of the resolution that triggered the call.
    fn resolve(&self, contract: &Key, cardinality: Cardinality) -> DiResult<Option<BindingDescriptor>>;
}

impl<F> DynamicResolver for F
where
    F: Fn(&Key, Cardinality) -> DiResult<Option<BindingDescriptor>> + Send + Sync,
{
    fn resolve(&self, contract: &Key, cardinality: Cardinality) -> DiResult<Option<BindingDescriptor>> {
        self(contract, cardinality)
    }
}

/// Wraps a closure as a shareable dynamic resolver.
pub fn resolver_fn<F>(f: F) -> Arc<dyn DynamicResolver>
where
    F: Fn(&Key, Cardinality) -> DiResult<Option<BindingDescriptor>> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Dynamic resolver backed by a catalogue of late-discovered bindings.
///
/// Plugins loaded after startup publish their bindings here; a contract
/// becomes resolvable the first time it is requested after being published.
/// The catalogue is shared, so it can be filled after the provider is built.
///
/// ```rust
/// use appcore_di::{Binding, BindingCatalog, BindingRegistry, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// trait Codec: Send + Sync { fn id(&self) -> u8; }
/// struct Gzip;
/// impl Codec for Gzip { fn id(&self) -> u8 { 1 } }
/// appcore_di::implements!(Gzip => dyn Codec);
///
/// let catalog = Arc::new(BindingCatalog::new());
/// let registry = BindingRegistry::new();
/// registry.set_dynamic_resolver(catalog.clone()).unwrap();
/// let provider = registry.build();
///
/// catalog.publish(Lifetime::Transient, Binding::new::<dyn Codec, Gzip, _>(|_| Gzip));
/// assert_eq!(provider.get_required::<dyn Codec>().unwrap().id(), 1);
/// ```
#[derive(Default)]
pub struct BindingCatalog {
    entries: DashMap<Key, (Lifetime, Vec<Binding>)>,
}

impl BindingCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a binding for its contract.
    ///
    /// The first publication for a contract fixes its lifetime tag.
    pub fn publish(&self, lifetime: Lifetime, binding: Binding) {
        debug!(
            contract = binding.contract().display_name(),
            implementation = binding.implementation().name(),
            "binding published to catalog"
        );
        self.entries
            .entry(binding.contract())
            .or_insert_with(|| (lifetime, Vec::new()))
            .1
            .push(binding);
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DynamicResolver for BindingCatalog {
    fn resolve(&self, contract: &Key, _cardinality: Cardinality) -> DiResult<Option<BindingDescriptor>> {
        match self.entries.get(contract) {
            Some(entry) => {
                let (lifetime, bindings) = entry.value();
                BindingDescriptor::new(*contract, *lifetime, bindings.clone()).map(Some)
            }
            None => Ok(None),
        }
    }
}
