//! Error types for the binding container.

use thiserror::Error;

/// Boxed error carried by fallible factories and activation handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Binding and resolution errors.
///
/// Registration-time variants are configuration errors: the offending
/// registration is not committed and bootstrap of that collaborator should
/// stop. Resolution-time variants abort only the call in progress. A missing
/// binding is not an error at all: the resolution methods return `Ok(None)`
/// and only [`get_required`](crate::Resolver::get_required) turns absence into
/// [`DiError::NotFound`].
///
/// # Examples
///
/// ```rust
/// use appcore_di::{BindingRegistry, DiError, Resolver};
///
/// trait Mailer: Send + Sync {}
///
/// let provider = BindingRegistry::new().build();
/// assert!(provider.get::<dyn Mailer>().unwrap().is_none());
/// match provider.get_required::<dyn Mailer>() {
///     Err(DiError::NotFound(name)) => assert!(name.contains("Mailer")),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Error)]
pub enum DiError {
    /// A constraint handler vetoed the registration
    #[error("Registration of {implementation} for {contract} rejected: {reason}")]
    ConstraintViolation {
        contract: &'static str,
        implementation: &'static str,
        reason: String,
    },
    /// Set registration with no implementations
    #[error("Empty implementation set for {0}")]
    EmptyBindingSet(&'static str),
    /// Binding was built for a different contract
    #[error("{implementation} is not bound to contract {contract}")]
    NotAssignable {
        contract: &'static str,
        implementation: &'static str,
    },
    /// Appending a transient binding to a singleton contract
    #[error("Cannot append to {contract}: registered as {existing}")]
    LifetimeConflict {
        contract: &'static str,
        existing: &'static str,
    },
    /// A dynamic resolver is already installed
    #[error("Dynamic resolver already installed")]
    ResolverAlreadyInstalled,
    /// Required contract has no binding
    #[error("Contract not found: {0}")]
    NotFound(&'static str),
    /// Type downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Circular dependency detected (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
    /// Maximum resolution depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// A factory failed to construct an instance
    #[error("Factory for {implementation} failed: {source}")]
    Factory {
        implementation: &'static str,
        #[source]
        source: BoxError,
    },
    /// An activation handler rejected a fresh instance
    #[error("Activation of {implementation} failed: {source}")]
    Activation {
        implementation: &'static str,
        #[source]
        source: BoxError,
    },
}

impl DiError {
    /// Returns `true` for errors raised while registering bindings.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DiError::ConstraintViolation { .. }
                | DiError::EmptyBindingSet(_)
                | DiError::NotAssignable { .. }
                | DiError::LifetimeConflict { .. }
                | DiError::ResolverAlreadyInstalled
        )
    }
}

/// Result type for container operations
pub type DiResult<T> = Result<T, DiError>;
