//! Bound implementations and the instances they produce.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, DiError, DiResult};
use crate::key::{ImplType, Key};
use crate::provider::ResolverContext;

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type Factory = Arc<dyn Fn(&ResolverContext<'_>) -> DiResult<Instance> + Send + Sync>;

/// Statically proves that `Self` can be handed out as contract `C`.
///
/// Every type is its own contract through the blanket impl. Binding a
/// concrete type to a trait object takes one impl, usually written with the
/// [`implements!`](crate::implements) macro. Because the upcast is checked by
/// the compiler, an implementation that is not assignable to its contract, or
/// an unsized (abstract) one, can never be registered.
///
/// # Examples
///
/// ```rust
/// use appcore_di::Implements;
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter {
///     fn greet(&self) -> String { "hello".into() }
/// }
///
/// impl Implements<dyn Greeter> for EnglishGreeter {
///     fn upcast(self: Arc<Self>) -> Arc<dyn Greeter> { self }
/// }
///
/// let greeter: Arc<dyn Greeter> = Arc::new(EnglishGreeter).upcast();
/// assert_eq!(greeter.greet(), "hello");
/// ```
pub trait Implements<C: ?Sized>: Send + Sync + 'static {
    /// Converts the concrete instance into the contract view.
    fn upcast(self: Arc<Self>) -> Arc<C>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
    #[inline]
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// Declares that a concrete type implements one or more contracts.
///
/// ```rust
/// trait Sender: Send + Sync {}
/// trait Named: Send + Sync {}
///
/// struct SmtpSender;
/// impl Sender for SmtpSender {}
/// impl Named for SmtpSender {}
///
/// appcore_di::implements!(SmtpSender => dyn Sender, dyn Named);
/// ```
#[macro_export]
macro_rules! implements {
    ($impl_ty:ty => $($contract:ty),+ $(,)?) => {
        $(
            impl $crate::Implements<$contract> for $impl_ty {
                #[inline]
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$contract> {
                    self
                }
            }
        )+
    };
}

/// A live instance produced by a binding.
///
/// Holds the contract view (`Arc<C>`) and the same allocation viewed as its
/// concrete type, so activation handlers can inspect the implementation
/// without knowing the contract statically.
#[derive(Clone)]
pub struct Instance {
    contract: Key,
    implementation: ImplType,
    // Arc<C> stored as Arc<Arc<C>> so unsized contracts survive erasure
    view: AnyArc,
    concrete: AnyArc,
}

impl Instance {
    pub(crate) fn new<C, I>(value: Arc<I>) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        I: Implements<C>,
    {
        let concrete: AnyArc = value.clone();
        let view: Arc<C> = value.upcast();
        Self {
            contract: Key::of::<C>(),
            implementation: ImplType::of::<I>(),
            view: Arc::new(view),
            concrete,
        }
    }

    /// Contract this instance was built for.
    #[inline]
    pub fn contract(&self) -> Key {
        self.contract
    }

    /// Concrete implementation type.
    #[inline]
    pub fn implementation(&self) -> ImplType {
        self.implementation
    }

    /// Returns the contract view if `C` is the contract this instance was built for.
    pub fn downcast<C: ?Sized + 'static>(&self) -> Option<Arc<C>> {
        self.view.downcast_ref::<Arc<C>>().cloned()
    }

    /// Borrows the instance as its concrete type.
    pub fn concrete<I: 'static>(&self) -> Option<&I> {
        self.concrete.downcast_ref::<I>()
    }

    /// The concrete instance behind `dyn Any`.
    pub fn as_any(&self) -> &(dyn Any + Send + Sync) {
        &*self.concrete
    }

    /// Returns `true` when both handles point at the same object.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.concrete, &other.concrete)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("contract", &self.contract)
            .field("implementation", &self.implementation)
            .finish()
    }
}

/// One implementation bound to one contract.
///
/// A binding pairs the identity of a concrete type with the factory that
/// builds it. Bindings are built through typed constructors only, so the
/// contract they carry always matches the instances they produce. The
/// factory receives a [`ResolverContext`] for resolving its own
/// dependencies.
///
/// # Examples
///
/// ```rust
/// use appcore_di::{Binding, BindingRegistry, Resolver};
///
/// trait Logger: Send + Sync {
///     fn name(&self) -> &'static str;
/// }
///
/// struct FileLogger;
/// impl Logger for FileLogger { fn name(&self) -> &'static str { "file" } }
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger { fn name(&self) -> &'static str { "console" } }
///
/// appcore_di::implements!(FileLogger => dyn Logger);
/// appcore_di::implements!(ConsoleLogger => dyn Logger);
///
/// let registry = BindingRegistry::new();
/// registry.register_transient_set::<dyn Logger>(vec![
///     Binding::new::<dyn Logger, FileLogger, _>(|_| FileLogger),
///     Binding::new::<dyn Logger, ConsoleLogger, _>(|_| ConsoleLogger),
/// ]).unwrap();
///
/// let provider = registry.build();
/// let names: Vec<_> = provider.get_all::<dyn Logger>().unwrap()
///     .iter().map(|l| l.name()).collect();
/// assert_eq!(names, ["file", "console"]);
/// ```
#[derive(Clone)]
pub struct Binding {
    contract: Key,
    implementation: ImplType,
    factory: Factory,
}

impl Binding {
    /// Binds `I` to `C` with an infallible factory.
    pub fn new<C, I, F>(factory: F) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        I: Implements<C>,
        F: Fn(&ResolverContext<'_>) -> I + Send + Sync + 'static,
    {
        let ctor = move |ctx: &ResolverContext<'_>| -> DiResult<Instance> {
            Ok(Instance::new::<C, I>(Arc::new(factory(ctx))))
        };
        Self::from_parts::<C, I>(Arc::new(ctor))
    }

    /// Binds `I` to `C` with a factory that may fail.
    ///
    /// The error is surfaced to the resolving caller as [`DiError::Factory`].
    pub fn fallible<C, I, F, E>(factory: F) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        I: Implements<C>,
        F: Fn(&ResolverContext<'_>) -> Result<I, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let ctor = move |ctx: &ResolverContext<'_>| -> DiResult<Instance> {
            let value = factory(ctx).map_err(|e| DiError::Factory {
                implementation: std::any::type_name::<I>(),
                source: e.into(),
            })?;
            Ok(Instance::new::<C, I>(Arc::new(value)))
        };
        Self::from_parts::<C, I>(Arc::new(ctor))
    }

    /// Binds an already-built instance of `I` to `C`.
    ///
    /// Every materialization hands out the same object, whatever the cache policy.
    pub fn instance<C, I>(value: Arc<I>) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        I: Implements<C>,
    {
        let ctor = move |_: &ResolverContext<'_>| -> DiResult<Instance> {
            Ok(Instance::new::<C, I>(value.clone()))
        };
        Self::from_parts::<C, I>(Arc::new(ctor))
    }

    fn from_parts<C: ?Sized + 'static, I: 'static>(factory: Factory) -> Self {
        Self {
            contract: Key::of::<C>(),
            implementation: ImplType::of::<I>(),
            factory,
        }
    }

    /// Contract this binding was built for.
    #[inline]
    pub fn contract(&self) -> Key {
        self.contract
    }

    /// Concrete implementation type.
    #[inline]
    pub fn implementation(&self) -> ImplType {
        self.implementation
    }

    #[inline]
    pub(crate) fn create(&self, ctx: &ResolverContext<'_>) -> DiResult<Instance> {
        (self.factory)(ctx)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("contract", &self.contract)
            .field("implementation", &self.implementation)
            .finish_non_exhaustive()
    }
}
