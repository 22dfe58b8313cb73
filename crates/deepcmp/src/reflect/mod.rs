//! Type descriptors and value views.
//!
//! Rust has no runtime reflection, so every type the engine walks describes
//! itself through [`Reflect`]: a [`Type`] token (identity, name, [`Kind`]) plus a
//! borrowed [`View`] of its contents. Built-in descriptors live in `impls`;
//! user structs usually get theirs from [`reflect_struct!`](crate::reflect_struct).
//!
//! Views never enforce field visibility. A [`StructView`] hands out every field
//! together with its `exported` flag and the engine decides whether it may be
//! read.

mod impls;

use serde::{Serialize, Serializer};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

pub use impls::{AnyValue, Complex64};

/// The structural category of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Kind {
    Bool,
    Int,
    Uint,
    Float,
    Complex,
    String,
    Func,
    /// Raw pointer compared by address only
    RawPointer,
    /// Optional reference to another value; may carry an identity address
    Pointer,
    /// Dynamically typed value
    Interface,
    Struct,
    Array,
    Slice,
    Map,
}

/// Runtime type token.
///
/// Identity is the [`TypeId`]; `name` is the fully qualified Rust type name.
#[derive(Clone, Copy)]
pub struct Type {
    id: TypeId,
    name: &'static str,
    kind: Kind,
}

/// Marker behind [`Type::dynamic`]; not nameable outside the crate.
struct DynamicRoot;

impl Type {
    /// Build the token for `T` with the given kind.
    pub fn of<T: ?Sized + 'static>(kind: Kind) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind,
        }
    }

    /// Synthetic interface type used when the two roots have different types.
    pub(crate) fn dynamic() -> Self {
        Self {
            id: TypeId::of::<DynamicRoot>(),
            name: "any",
            kind: Kind::Interface,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Module path that declares the type (empty for primitives).
    ///
    /// Generic arguments are ignored: `alloc::vec::Vec<app::Foo>` is declared
    /// in `alloc::vec`.
    pub fn module(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit_once("::").map(|(module, _)| module).unwrap_or("")
    }

    /// Type name with every module path removed, e.g. `Vec<Foo>`.
    pub fn short_name(&self) -> String {
        short_type_name(self.name)
    }

    /// Whether values of this type are declared inside `prefix`.
    ///
    /// A prefix matches whole path segments only: `app::models` matches
    /// `app::models` and `app::models::user` but not `app::modelsx`.
    pub fn within_module(&self, prefix: &str) -> bool {
        let module = self.module();
        if prefix.is_empty() {
            return true;
        }
        match module.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with("::"),
            None => false,
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.short_name())
    }
}

fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment_start = 0;
    let mut chars = full.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(segment_start);
            continue;
        }
        out.push(c);
        if !(c.is_alphanumeric() || c == '_') {
            segment_start = out.len();
        }
    }
    out
}

/// Borrowed view of a value's contents.
pub enum View<'a> {
    Bool(bool),
    Int(i128),
    Uint(u128),
    Float(f64),
    Complex(f64, f64),
    Str(&'a str),
    Func { is_nil: bool },
    RawPointer(usize),
    Pointer {
        target: Option<&'a dyn Reflect>,
        /// Identity of the pointee, used for cycle detection and ordering
        addr: Option<usize>,
    },
    Interface(Option<&'a dyn Reflect>),
    Struct(&'a dyn StructView),
    Seq(&'a dyn SeqView),
    Map(&'a dyn MapView),
}

/// One field of a struct-like value.
pub struct Field<'a> {
    pub name: &'static str,
    pub exported: bool,
    pub value: &'a dyn Reflect,
}

/// Field enumeration for struct-like values, in declaration order.
pub trait StructView {
    fn fields(&self) -> Vec<Field<'_>>;
}

/// Ordered sequence access for arrays and slices.
pub trait SeqView {
    fn len(&self) -> usize;
    fn index(&self, i: usize) -> Option<&dyn Reflect>;

    /// An unset sequence, distinct from an empty one.
    fn is_nil(&self) -> bool {
        false
    }
}

/// Keyed access for map-like values.
pub trait MapView {
    fn len(&self) -> usize;
    fn keys(&self) -> Vec<&dyn Reflect>;
    fn get(&self, key: &dyn Reflect) -> Option<&dyn Reflect>;

    /// An unset map, distinct from an empty one.
    fn is_nil(&self) -> bool {
        false
    }
}

/// A value the comparison engine can walk.
pub trait Reflect: Any {
    /// The type token of `Self`.
    fn static_type() -> Type
    where
        Self: Sized;

    /// The type token of this value.
    fn type_of(&self) -> Type;

    fn as_any(&self) -> &dyn Any;

    fn view(&self) -> View<'_>;

    /// The type's own equality operation, if it declares one.
    ///
    /// When this returns `Some`, the engine uses the answer as the leaf
    /// decision and does not descend. Implementations must be symmetric.
    fn try_equal(&self, _other: &dyn Reflect) -> Option<bool> {
        None
    }

    /// Preferred human-readable rendering, if any.
    fn stringer(&self) -> Option<String> {
        None
    }
}

impl<'a> dyn Reflect + 'a {
    /// Typed access to the underlying value.
    pub fn downcast_ref<T: Reflect>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl<'a> fmt::Debug for dyn Reflect + 'a {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::format::format_value(
            self,
            &crate::format::FormatConfig::default(),
        ))
    }
}

/// Struct view with no fields, used by opaque descriptors.
#[doc(hidden)]
pub struct Opaque;

impl StructView for Opaque {
    fn fields(&self) -> Vec<Field<'_>> {
        Vec::new()
    }
}

#[doc(hidden)]
pub static OPAQUE: Opaque = Opaque;

/// Equality method backed by `PartialEq`; used by the descriptor macros.
#[doc(hidden)]
pub fn equal_by_partial_eq<T: Reflect + PartialEq>(x: &T, y: &dyn Reflect) -> Option<bool> {
    Some(y.downcast_ref::<T>().is_some_and(|y| x == y))
}

/// Placeholder for descriptors without an equality method.
#[doc(hidden)]
pub fn no_equal_method<T>(_x: &T, _y: &dyn Reflect) -> Option<bool> {
    None
}
