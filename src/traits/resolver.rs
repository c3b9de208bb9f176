//! Resolver traits for contract resolution.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::{ImplType, Key};
use crate::lifetime::{Cardinality, ResolvePolicy};
use crate::registration::Instance;

/// Object-safe resolution core.
///
/// Implemented by [`ServiceProvider`](crate::ServiceProvider) and by the
/// [`ResolverContext`](crate::ResolverContext) handed to factories. Results
/// are type-erased [`Instance`] lists; `Ok(None)` means nothing is bound to
/// the contract, which is a normal outcome rather than an error.
pub trait ResolverCore: Send + Sync {
    /// Resolves `key` with an explicit cache and cardinality policy.
    fn resolve_erased(&self, key: &Key, policy: ResolvePolicy) -> DiResult<Option<Arc<[Instance]>>>;

    /// Resolves `key`, caching according to the contract's lifetime tag.
    fn resolve_by_lifetime(&self, key: &Key, cardinality: Cardinality) -> DiResult<Option<Arc<[Instance]>>>;

    /// Implementations bound to `key`, in registration order, without instantiating them.
    fn bound_implementations(&self, key: &Key) -> Option<Vec<ImplType>>;
}

/// Typed resolution API built on [`ResolverCore`].
///
/// # Examples
///
/// ```
/// use appcore_di::{Binding, BindingRegistry, ResolvePolicy, Resolver};
/// use std::sync::Arc;
///
/// trait Handler: Send + Sync { fn id(&self) -> u8; }
/// struct First;
/// impl Handler for First { fn id(&self) -> u8 { 1 } }
/// struct Second;
/// impl Handler for Second { fn id(&self) -> u8 { 2 } }
/// appcore_di::implements!(First => dyn Handler);
/// appcore_di::implements!(Second => dyn Handler);
///
/// let registry = BindingRegistry::new();
/// registry.register_transient_set::<dyn Handler>(vec![
///     Binding::new::<dyn Handler, First, _>(|_| First),
///     Binding::new::<dyn Handler, Second, _>(|_| Second),
/// ]).unwrap();
/// let provider = registry.build();
///
/// // first-wins, rebuilt on every call
/// let one = provider.resolve::<dyn Handler>(ResolvePolicy::FIRST_WINS).unwrap().unwrap();
/// assert_eq!(one.len(), 1);
/// assert_eq!(one[0].id(), 1);
///
/// // the whole chain, cached
/// let chain = provider.resolve::<dyn Handler>(ResolvePolicy::BROADCAST_CACHED).unwrap().unwrap();
/// let again = provider.resolve::<dyn Handler>(ResolvePolicy::BROADCAST_CACHED).unwrap().unwrap();
/// assert!(Arc::ptr_eq(&chain[1], &again[1]));
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves contract `C` with an explicit policy.
    ///
    /// Returns `Ok(None)` when nothing is bound to `C`.
    fn resolve<C>(&self, policy: ResolvePolicy) -> DiResult<Option<Vec<Arc<C>>>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let key = Key::of::<C>();
        self.resolve_erased(&key, policy)?
            .map(|instances| downcast_all::<C>(&key, &instances))
            .transpose()
    }

    /// Resolves the first implementation of `C`, cached per its lifetime tag.
    fn get<C>(&self) -> DiResult<Option<Arc<C>>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let key = Key::of::<C>();
        match self.resolve_by_lifetime(&key, Cardinality::First)? {
            Some(instances) => match instances.first() {
                Some(instance) => downcast_one::<C>(&key, instance).map(Some),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    /// Like [`get`](Self::get), but a missing binding is [`DiError::NotFound`].
    fn get_required<C>(&self) -> DiResult<Arc<C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.get::<C>()?
            .ok_or(DiError::NotFound(std::any::type_name::<C>()))
    }

    /// Resolves every implementation of `C` in registration order.
    ///
    /// Caching follows the lifetime tag. A contract with nothing bound
    /// yields an empty list.
    fn get_all<C>(&self) -> DiResult<Vec<Arc<C>>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let key = Key::of::<C>();
        match self.resolve_by_lifetime(&key, Cardinality::All)? {
            Some(instances) => downcast_all::<C>(&key, &instances),
            None => Ok(Vec::new()),
        }
    }

    /// Implementations bound to `C` without instantiating them.
    fn implementations_of<C: ?Sized + 'static>(&self) -> Option<Vec<ImplType>> {
        self.bound_implementations(&Key::of::<C>())
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}

fn downcast_one<C: ?Sized + 'static>(key: &Key, instance: &Instance) -> DiResult<Arc<C>> {
    instance
        .downcast::<C>()
        .ok_or(DiError::TypeMismatch(key.display_name()))
}

fn downcast_all<C: ?Sized + 'static>(key: &Key, instances: &[Instance]) -> DiResult<Vec<Arc<C>>> {
    instances.iter().map(|i| downcast_one::<C>(key, i)).collect()
}
