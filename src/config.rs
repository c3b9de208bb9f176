//! Container options.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default maximum nesting of factory-driven resolutions.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Options applied when a [`BindingRegistry`](crate::BindingRegistry) is created.
///
/// Options are fixed for the life of the registry and are carried over to
/// every provider it builds. With the `serde` feature the struct can be
/// loaded from the host's own configuration; missing fields take defaults.
///
/// # Examples
///
/// ```rust
/// use appcore_di::{BindingRegistry, ContainerOptions};
///
/// let options = ContainerOptions::new()
///     .host("billing")
///     .max_depth(64)
///     .log_activations(true);
///
/// let registry = BindingRegistry::with_options(options);
/// assert_eq!(registry.host(), "billing");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ContainerOptions {
    /// Label of the hosted application instance, used in diagnostics
    pub host: String,
    /// Maximum depth of nested resolutions before `DepthExceeded`
    pub max_depth: usize,
    /// Install a [`LoggingActivationHandler`](crate::LoggingActivationHandler) first
    pub log_activations: bool,
}

impl ContainerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the resolution depth limit. Zero is raised to one.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    pub fn log_activations(mut self, enabled: bool) -> Self {
        self.log_activations = enabled;
        self
    }
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            host: "appcore".to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            log_activations: false,
        }
    }
}
