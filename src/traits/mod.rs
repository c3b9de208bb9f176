//! Core traits for the binding container.

mod resolver;

pub use resolver::{Resolver, ResolverCore};
