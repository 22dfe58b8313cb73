//! Descriptors for standard library types.

use super::{Field, Kind, MapView, Reflect, SeqView, StructView, Type, View};
use std::any::Any;
use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::rc::Rc;
use std::sync::Arc;

macro_rules! impl_scalar {
    ($($t:ty => $kind:ident, $variant:ident as $wide:ty;)*) => {$(
        impl Reflect for $t {
            fn static_type() -> Type {
                Type::of::<$t>(Kind::$kind)
            }
            fn type_of(&self) -> Type {
                Self::static_type()
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
            fn view(&self) -> View<'_> {
                View::$variant(*self as $wide)
            }
        }
    )*};
}

impl_scalar! {
    i8 => Int, Int as i128;
    i16 => Int, Int as i128;
    i32 => Int, Int as i128;
    i64 => Int, Int as i128;
    i128 => Int, Int as i128;
    isize => Int, Int as i128;
    u8 => Uint, Uint as u128;
    u16 => Uint, Uint as u128;
    u32 => Uint, Uint as u128;
    u64 => Uint, Uint as u128;
    u128 => Uint, Uint as u128;
    usize => Uint, Uint as u128;
    char => Uint, Uint as u128;
    f32 => Float, Float as f64;
    f64 => Float, Float as f64;
}

impl Reflect for bool {
    fn static_type() -> Type {
        Type::of::<bool>(Kind::Bool)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::Bool(*self)
    }
}

/// Complex number with `f64` parts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex64 {
    pub re: f64,
    pub im: f64,
}

impl Complex64 {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

impl Reflect for Complex64 {
    fn static_type() -> Type {
        Type::of::<Complex64>(Kind::Complex)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::Complex(self.re, self.im)
    }
}

impl Reflect for String {
    fn static_type() -> Type {
        Type::of::<String>(Kind::String)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::Str(self.as_str())
    }
}

impl Reflect for &'static str {
    fn static_type() -> Type {
        Type::of::<&'static str>(Kind::String)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::Str(self)
    }
}

// ---- sequences ----

impl<T: Reflect> Reflect for Vec<T> {
    fn static_type() -> Type {
        Type::of::<Self>(Kind::Slice)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::Seq(self)
    }
}

impl<T: Reflect> SeqView for Vec<T> {
    fn len(&self) -> usize {
        <[T]>::len(self)
    }
    fn index(&self, i: usize) -> Option<&dyn Reflect> {
        <[T]>::get(self, i).map(|v| v as &dyn Reflect)
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn static_type() -> Type {
        Type::of::<Self>(Kind::Array)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::Seq(self)
    }
}

impl<T: Reflect, const N: usize> SeqView for [T; N] {
    fn len(&self) -> usize {
        N
    }
    fn index(&self, i: usize) -> Option<&dyn Reflect> {
        <[T]>::get(self, i).map(|v| v as &dyn Reflect)
    }
}

impl<T: Reflect> Reflect for VecDeque<T> {
    fn static_type() -> Type {
        Type::of::<Self>(Kind::Slice)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::Seq(self)
    }
}

impl<T: Reflect> SeqView for VecDeque<T> {
    fn len(&self) -> usize {
        VecDeque::len(self)
    }
    fn index(&self, i: usize) -> Option<&dyn Reflect> {
        VecDeque::get(self, i).map(|v| v as &dyn Reflect)
    }
}

// ---- maps and sets ----

static UNIT: () = ();

impl<K, V> Reflect for HashMap<K, V>
where
    K: Reflect + Eq + Hash,
    V: Reflect,
{
    fn static_type() -> Type {
        Type::of::<Self>(Kind::Map)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::Map(self)
    }
}

impl<K, V> MapView for HashMap<K, V>
where
    K: Reflect + Eq + Hash,
    V: Reflect,
{
    fn len(&self) -> usize {
        HashMap::len(self)
    }
    fn keys(&self) -> Vec<&dyn Reflect> {
        HashMap::keys(self).map(|k| k as &dyn Reflect).collect()
    }
    fn get(&self, key: &dyn Reflect) -> Option<&dyn Reflect> {
        let key = key.downcast_ref::<K>()?;
        HashMap::get(self, key).map(|v| v as &dyn Reflect)
    }
}

impl<K: Reflect + Ord, V: Reflect> Reflect for BTreeMap<K, V> {
    fn static_type() -> Type {
        Type::of::<Self>(Kind::Map)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::Map(self)
    }
}

impl<K: Reflect + Ord, V: Reflect> MapView for BTreeMap<K, V> {
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }
    fn keys(&self) -> Vec<&dyn Reflect> {
        BTreeMap::keys(self).map(|k| k as &dyn Reflect).collect()
    }
    fn get(&self, key: &dyn Reflect) -> Option<&dyn Reflect> {
        let key = key.downcast_ref::<K>()?;
        BTreeMap::get(self, key).map(|v| v as &dyn Reflect)
    }
}

impl<K: Reflect + Eq + Hash> Reflect for HashSet<K> {
    fn static_type() -> Type {
        Type::of::<Self>(Kind::Map)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::Map(self)
    }
}

impl<K: Reflect + Eq + Hash> MapView for HashSet<K> {
    fn len(&self) -> usize {
        HashSet::len(self)
    }
    fn keys(&self) -> Vec<&dyn Reflect> {
        self.iter().map(|k| k as &dyn Reflect).collect()
    }
    fn get(&self, key: &dyn Reflect) -> Option<&dyn Reflect> {
        let key = key.downcast_ref::<K>()?;
        self.contains(key).then_some(&UNIT as &dyn Reflect)
    }
}

impl<K: Reflect + Ord> Reflect for BTreeSet<K> {
    fn static_type() -> Type {
        Type::of::<Self>(Kind::Map)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::Map(self)
    }
}

impl<K: Reflect + Ord> MapView for BTreeSet<K> {
    fn len(&self) -> usize {
        BTreeSet::len(self)
    }
    fn keys(&self) -> Vec<&dyn Reflect> {
        self.iter().map(|k| k as &dyn Reflect).collect()
    }
    fn get(&self, key: &dyn Reflect) -> Option<&dyn Reflect> {
        let key = key.downcast_ref::<K>()?;
        self.contains(key).then_some(&UNIT as &dyn Reflect)
    }
}

// ---- pointers ----

impl<T: Reflect> Reflect for Option<T> {
    fn static_type() -> Type {
        Type::of::<Self>(Kind::Pointer)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::Pointer {
            target: self.as_ref().map(|v| v as &dyn Reflect),
            addr: None,
        }
    }
}

// A box owns its target, so it can never close a cycle.
impl<T: Reflect> Reflect for Box<T> {
    fn static_type() -> Type {
        Type::of::<Self>(Kind::Pointer)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::Pointer {
            target: Some(&**self as &dyn Reflect),
            addr: None,
        }
    }
}

impl<T: Reflect> Reflect for Rc<T> {
    fn static_type() -> Type {
        Type::of::<Self>(Kind::Pointer)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::Pointer {
            target: Some(&**self as &dyn Reflect),
            addr: Some(Rc::as_ptr(self) as *const () as usize),
        }
    }
}

impl<T: Reflect> Reflect for Arc<T> {
    fn static_type() -> Type {
        Type::of::<Self>(Kind::Pointer)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::Pointer {
            target: Some(&**self as &dyn Reflect),
            addr: Some(Arc::as_ptr(self) as *const () as usize),
        }
    }
}

impl<T: Reflect> Reflect for OnceCell<T> {
    fn static_type() -> Type {
        Type::of::<Self>(Kind::Pointer)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::Pointer {
            target: self.get().map(|v| v as &dyn Reflect),
            addr: None,
        }
    }
}

impl<T: ?Sized + 'static> Reflect for *const T {
    fn static_type() -> Type {
        Type::of::<Self>(Kind::RawPointer)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::RawPointer(*self as *const () as usize)
    }
}

impl<T: ?Sized + 'static> Reflect for *mut T {
    fn static_type() -> Type {
        Type::of::<Self>(Kind::RawPointer)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::RawPointer(*self as *const () as usize)
    }
}

// ---- dynamic values ----

/// A dynamically typed slot that may be empty.
///
/// Two `AnyValue`s are equal when both are empty, or when both hold values of
/// the same concrete type that compare equal.
#[derive(Default)]
pub struct AnyValue(Option<Box<dyn Reflect>>);

impl AnyValue {
    pub fn new<T: Reflect>(value: T) -> Self {
        Self(Some(Box::new(value)))
    }

    pub fn nil() -> Self {
        Self(None)
    }

    pub fn get(&self) -> Option<&dyn Reflect> {
        self.0.as_deref()
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_none()
    }
}

impl Reflect for AnyValue {
    fn static_type() -> Type {
        Type::of::<AnyValue>(Kind::Interface)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::Interface(self.get())
    }
}

// ---- tuples ----

impl Reflect for () {
    fn static_type() -> Type {
        Type::of::<()>(Kind::Struct)
    }
    fn type_of(&self) -> Type {
        Self::static_type()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn view(&self) -> View<'_> {
        View::Struct(self)
    }
}

impl StructView for () {
    fn fields(&self) -> Vec<Field<'_>> {
        Vec::new()
    }
}

macro_rules! impl_tuple {
    ($(($($name:ident $idx:tt),+))*) => {$(
        impl<$($name: Reflect),+> Reflect for ($($name,)+) {
            fn static_type() -> Type {
                Type::of::<Self>(Kind::Struct)
            }
            fn type_of(&self) -> Type {
                Self::static_type()
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
            fn view(&self) -> View<'_> {
                View::Struct(self)
            }
        }

        impl<$($name: Reflect),+> StructView for ($($name,)+) {
            fn fields(&self) -> Vec<Field<'_>> {
                vec![$(Field {
                    name: stringify!($idx),
                    exported: true,
                    value: &self.$idx,
                }),+]
            }
        }
    )*};
}

impl_tuple! {
    (A 0)
    (A 0, B 1)
    (A 0, B 1, C 2)
    (A 0, B 1, C 2, D 3)
}

// ---- functions ----

macro_rules! impl_fn_pointer {
    ($(($($arg:ident),*))*) => {$(
        impl<R: 'static, $($arg: 'static),*> Reflect for fn($($arg),*) -> R {
            fn static_type() -> Type {
                Type::of::<Self>(Kind::Func)
            }
            fn type_of(&self) -> Type {
                Self::static_type()
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
            fn view(&self) -> View<'_> {
                View::Func { is_nil: false }
            }
        }
    )*};
}

impl_fn_pointer! {
    ()
    (A)
    (A, B)
}

crate::reflect_eq!(std::time::Duration);
