//! Resolver context handed to factories.

use std::sync::Arc;

use crate::error::DiResult;
use crate::key::{ImplType, Key};
use crate::lifetime::{Cardinality, ResolvePolicy};
use crate::registration::Instance;
use crate::traits::ResolverCore;

/// Context passed to factory functions for resolving their dependencies.
///
/// Wraps the provider that is materializing the instance. Resolutions made
/// through the context take part in circular-dependency detection, so a
/// factory that (directly or indirectly) asks for its own contract gets
/// [`DiError::Circular`](crate::DiError::Circular) rather than a deadlock.
///
/// # Examples
///
/// ```
/// use appcore_di::{BindingRegistry, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let registry = BindingRegistry::new();
/// registry.register_singleton::<Database, Database, _>(|_| Database {
///     url: "postgres://localhost".to_string(),
/// }).unwrap();
/// registry.register_transient::<UserService, UserService, _>(|ctx| UserService {
///     db: ctx.get_required::<Database>().unwrap(),
/// }).unwrap();
///
/// let provider = registry.build();
/// let users = provider.get_required::<UserService>().unwrap();
/// assert_eq!(users.db.url, "postgres://localhost");
/// ```
pub struct ResolverContext<'a> {
    resolver: &'a dyn ResolverCore,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new<T>(resolver: &'a T) -> Self
    where
        T: ResolverCore,
    {
        Self { resolver }
    }
}

impl<'a> ResolverCore for ResolverContext<'a> {
    fn resolve_erased(&self, key: &Key, policy: ResolvePolicy) -> DiResult<Option<Arc<[Instance]>>> {
        self.resolver.resolve_erased(key, policy)
    }

    fn resolve_by_lifetime(&self, key: &Key, cardinality: Cardinality) -> DiResult<Option<Arc<[Instance]>>> {
        self.resolver.resolve_by_lifetime(key, cardinality)
    }

    fn bound_implementations(&self, key: &Key) -> Option<Vec<ImplType>> {
        self.resolver.bound_implementations(key)
    }
}
