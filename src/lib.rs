//! # appcore-di
//!
//! Component binding and resolution container for long-lived application cores.
//!
//! Independently loaded collaborators register *bindings* from abstract
//! contracts to concrete implementations in a shared [`BindingRegistry`].
//! Once bootstrap is over the registry is frozen into a [`ServiceProvider`],
//! which materializes instances on demand under a per-call
//! [`ResolvePolicy`].
//!
//! ## Features
//!
//! - **Multi-binding**: a contract holds an ordered list of implementations
//! - **Four resolution policies**: cached or fresh, first-wins or broadcast
//! - **Constraint pipeline**: pluggable validators veto registrations atomically
//! - **Activation pipeline**: observers see every freshly built instance once
//! - **Dynamic fallback**: one resolver may supply bindings on a miss, memoized
//! - **Thread-safe**: concurrent registration and resolution, one lock per contract
//! - **Circular dependency detection**: cycles surface as errors, never deadlocks
//!
//! ## Quick Start
//!
//! ```rust
//! use appcore_di::{BindingRegistry, Resolver};
//! use std::sync::Arc;
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self, who: &str) -> String;
//! }
//!
//! struct EnglishGreeter;
//! impl Greeter for EnglishGreeter {
//!     fn greet(&self, who: &str) -> String { format!("Hello, {who}") }
//! }
//! appcore_di::implements!(EnglishGreeter => dyn Greeter);
//!
//! let registry = BindingRegistry::new();
//! registry.register_singleton::<dyn Greeter, EnglishGreeter, _>(|_| EnglishGreeter)?;
//!
//! let provider = registry.build();
//! let first = provider.get_required::<dyn Greeter>()?;
//! let second = provider.get_required::<dyn Greeter>()?;
//! assert!(Arc::ptr_eq(&first, &second));
//! assert_eq!(first.greet("core"), "Hello, core");
//! # Ok::<(), appcore_di::DiError>(())
//! ```
//!
//! ## Resolution Policies
//!
//! | Policy | Cache | Cardinality |
//! |--------|-------|-------------|
//! | [`ResolvePolicy::SINGLETON`] | cached | first |
//! | [`ResolvePolicy::FIRST_WINS`] | fresh | first |
//! | [`ResolvePolicy::BROADCAST_CACHED`] | cached | all |
//! | [`ResolvePolicy::BROADCAST_FRESH`] | fresh | all |
//!
//! [`Resolver::get`] and [`Resolver::get_all`] pick the cache policy from
//! the lifetime the contract was registered with.
//!
//! ```rust
//! use appcore_di::{Binding, BindingRegistry, ResolvePolicy, Resolver};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync { fn name(&self) -> &'static str; }
//! struct FileLogger;
//! impl Logger for FileLogger { fn name(&self) -> &'static str { "file" } }
//! struct ConsoleLogger;
//! impl Logger for ConsoleLogger { fn name(&self) -> &'static str { "console" } }
//! appcore_di::implements!(FileLogger => dyn Logger);
//! appcore_di::implements!(ConsoleLogger => dyn Logger);
//!
//! let registry = BindingRegistry::new();
//! registry.register_transient_set::<dyn Logger>(vec![
//!     Binding::new::<dyn Logger, FileLogger, _>(|_| FileLogger),
//!     Binding::new::<dyn Logger, ConsoleLogger, _>(|_| ConsoleLogger),
//! ])?;
//! let provider = registry.build();
//!
//! let all = provider.resolve::<dyn Logger>(ResolvePolicy::BROADCAST_CACHED)?.unwrap();
//! let names: Vec<_> = all.iter().map(|l| l.name()).collect();
//! assert_eq!(names, ["file", "console"]);
//!
//! let again = provider.resolve::<dyn Logger>(ResolvePolicy::BROADCAST_CACHED)?.unwrap();
//! assert!(Arc::ptr_eq(&all[0], &again[0]));
//! # Ok::<(), appcore_di::DiError>(())
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events: `debug` for registrations, builds and
//! dynamic resolutions, `trace` for cache hits, `warn` for vetoed
//! registrations. Install any subscriber in the host to see them.

pub mod activation;
pub mod collection;
pub mod config;
pub mod constraints;
pub mod descriptors;
pub mod error;
pub mod fallback;
pub mod key;
pub mod lifetime;
pub mod prewarm;
pub mod provider;
pub mod traits;

// Internal modules
mod internal;
mod registration;

pub use activation::{activation_fn, Activation, ActivationHandler, ActivationLog, LoggingActivationHandler};
pub use collection::{BindingModule, BindingRegistry};
pub use config::{ContainerOptions, DEFAULT_MAX_DEPTH};
pub use constraints::{constraint_fn, ConstraintCheck, ConstraintHandler, ExclusiveContract};
pub use descriptors::BindingDescriptor;
pub use error::{BoxError, DiError, DiResult};
pub use fallback::{resolver_fn, BindingCatalog, DynamicResolver};
pub use key::{key_of, ImplType, Key};
pub use lifetime::{CachePolicy, Cardinality, Lifetime, ResolvePolicy};
pub use prewarm::{ReadinessReport, ReadinessResult};
pub use provider::{ResolverContext, ServiceProvider};
pub use registration::{Binding, Implements, Instance};
pub use traits::{Resolver, ResolverCore};
