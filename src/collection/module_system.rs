//! Binding modules for grouping a collaborator's registrations.
//!
//! Independently loaded parts of an application each ship one module and
//! install it into the shared registry during bootstrap.

use crate::collection::BindingRegistry;
use crate::error::DiResult;

/// A unit of registrations contributed by one collaborator.
///
/// # Example
///
/// ```rust
/// use appcore_di::{BindingModule, BindingRegistry, DiResult, Resolver};
/// use std::sync::Arc;
///
/// struct UserConfig { table: &'static str }
/// struct UserService { config: Arc<UserConfig> }
///
/// struct UserModule;
///
/// impl BindingModule for UserModule {
///     fn register(self, registry: &BindingRegistry) -> DiResult<()> {
///         registry
///             .register_singleton::<UserConfig, UserConfig, _>(|_| UserConfig { table: "users" })?
///             .register_transient::<UserService, UserService, _>(|ctx| UserService {
///                 config: ctx.get_required::<UserConfig>().unwrap(),
///             })?;
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let registry = BindingRegistry::new();
/// registry.install(UserModule)?;
/// let provider = registry.build();
/// assert_eq!(provider.get_required::<UserService>()?.config.table, "users");
/// # Ok(())
/// # }
/// ```
pub trait BindingModule {
    /// Registers this module's bindings.
    fn register(self, registry: &BindingRegistry) -> DiResult<()>;
}

impl<F> BindingModule for F
where
    F: FnOnce(&BindingRegistry) -> DiResult<()>,
{
    fn register(self, registry: &BindingRegistry) -> DiResult<()> {
        self(registry)
    }
}

impl BindingRegistry {
    /// Installs a module, chaining like the other registration methods.
    ///
    /// Registrations the module made before a failure stay committed; each
    /// of them was atomic on its own.
    ///
    /// ```rust
    /// use appcore_di::{BindingRegistry, DiResult};
    ///
    /// struct Metrics;
    ///
    /// # fn main() -> DiResult<()> {
    /// let registry = BindingRegistry::new();
    /// registry
    ///     .install(|r: &BindingRegistry| -> DiResult<()> {
    ///         r.register_singleton::<Metrics, Metrics, _>(|_| Metrics)?;
    ///         Ok(())
    ///     })?
    ///     .install(|_: &BindingRegistry| -> DiResult<()> { Ok(()) })?;
    /// assert_eq!(registry.len(), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn install<M: BindingModule>(&self, module: M) -> DiResult<&Self> {
        let module_name = std::any::type_name::<M>();
        tracing::debug!(module = module_name, host = %self.host(), "installing binding module");
        module.register(self)?;
        Ok(self)
    }
}
