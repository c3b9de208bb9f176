//! Contract and implementation identifiers for the binding container.

use std::any::TypeId;
use std::fmt;

/// Key identifying a contract in the container.
///
/// A contract is any `'static` type a consumer can ask for, most commonly a
/// trait object such as `dyn Greeter`. Registration and resolution both go
/// through the same key, so the container never needs runtime reflection:
/// the `TypeId` is the identity and the type name is kept for diagnostics.
///
/// # Examples
///
/// ```rust
/// use appcore_di::Key;
///
/// trait Greeter: Send + Sync {}
///
/// let a = Key::of::<dyn Greeter>();
/// let b = Key::of::<dyn Greeter>();
/// assert_eq!(a, b);
/// assert!(a.display_name().contains("Greeter"));
/// assert_ne!(a, Key::of::<String>());
/// ```
#[derive(Clone, Copy)]
pub struct Key {
    type_id: TypeId,
    name: &'static str,
}

impl Key {
    /// Returns the key for contract type `C`.
    #[inline(always)]
    pub fn of<C: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
        }
    }

    /// The `TypeId` of the contract type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Human-readable contract name, the `std::any::type_name` result.
    #[inline]
    pub fn display_name(&self) -> &'static str {
        self.name
    }
}

// Hot path: identity is the TypeId alone, the name only feeds diagnostics.
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Identity of a concrete implementation type bound to a contract.
///
/// Returned by the introspection calls so hosts can see what is bound to a
/// contract without instantiating anything.
#[derive(Clone, Copy)]
pub struct ImplType {
    type_id: TypeId,
    name: &'static str,
}

impl ImplType {
    /// Returns the identity of concrete type `I`.
    #[inline]
    pub fn of<I: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<I>(),
            name: std::any::type_name::<I>(),
        }
    }

    /// The `TypeId` of the implementation type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Full type name of the implementation.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path, e.g. `EnglishGreeter`.
    pub fn short_name(&self) -> &'static str {
        // Generic arguments may contain `::` too; only strip the leading path.
        let head = self.name.split('<').next().unwrap_or(self.name);
        match head.rfind("::") {
            Some(pos) => &self.name[pos + 2..],
            None => self.name,
        }
    }

    /// Returns `true` when this is the identity of `I`.
    #[inline]
    pub fn is<I: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<I>()
    }
}

impl PartialEq for ImplType {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ImplType {}

impl std::hash::Hash for ImplType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ImplType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImplType({})", self.name)
    }
}

impl fmt::Display for ImplType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// Helper for creating contract keys
#[inline(always)]
pub fn key_of<C: ?Sized + 'static>() -> Key {
    Key::of::<C>()
}
