//! Descriptor macros.

/// Describe a named struct to the comparison engine.
///
/// List every field with its visibility; fields not declared `pub` are
/// reported as unexported and can only be compared under a visibility grant
/// or ignored. Invoke the macro in the module that defines the struct.
///
/// Prefix the name with `#[equal]` to make the struct's `PartialEq` its
/// equality method, which the engine then uses instead of descending.
///
/// ```
/// use deepcmp::reflect_struct;
///
/// #[derive(Debug)]
/// pub struct Point {
///     pub x: i32,
///     pub y: i32,
///     label: String,
/// }
///
/// reflect_struct!(Point { pub x, pub y, label });
/// ```
#[macro_export]
macro_rules! reflect_struct {
    (#[equal] $name:ident { $($body:tt)* }) => {
        $crate::reflect_struct!(@emit $name, $crate::reflect::equal_by_partial_eq, { $($body)* });
    };
    ($name:ident { $($body:tt)* }) => {
        $crate::reflect_struct!(@emit $name, $crate::reflect::no_equal_method, { $($body)* });
    };
    (@emit $name:ident, $equal:path, { $($fvis:vis $field:ident),* $(,)? }) => {
        impl $crate::Reflect for $name {
            fn static_type() -> $crate::Type {
                $crate::Type::of::<$name>($crate::Kind::Struct)
            }
            fn type_of(&self) -> $crate::Type {
                <Self as $crate::Reflect>::static_type()
            }
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
            fn view(&self) -> $crate::View<'_> {
                $crate::View::Struct(self)
            }
            fn try_equal(&self, other: &dyn $crate::Reflect) -> ::std::option::Option<bool> {
                $equal(self, other)
            }
        }

        impl $crate::StructView for $name {
            fn fields(&self) -> ::std::vec::Vec<$crate::Field<'_>> {
                ::std::vec![$($crate::Field {
                    name: stringify!($field),
                    exported: stringify!($fvis) == "pub",
                    value: &self.$field,
                }),*]
            }
        }
    };
}

/// Describe an opaque type compared only through its `PartialEq` and
/// rendered through its `Debug` output.
///
/// ```
/// use deepcmp::{equal, reflect_eq};
///
/// #[derive(Debug, PartialEq)]
/// pub struct Token(u64);
///
/// reflect_eq!(Token);
///
/// assert!(equal(&Token(1), &Token(1), &[]).unwrap());
/// ```
#[macro_export]
macro_rules! reflect_eq {
    ($($t:ty),+ $(,)?) => {$(
        impl $crate::Reflect for $t {
            fn static_type() -> $crate::Type {
                $crate::Type::of::<$t>($crate::Kind::Struct)
            }
            fn type_of(&self) -> $crate::Type {
                <Self as $crate::Reflect>::static_type()
            }
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
            fn view(&self) -> $crate::View<'_> {
                $crate::View::Struct(&$crate::reflect::OPAQUE)
            }
            fn try_equal(&self, other: &dyn $crate::Reflect) -> ::std::option::Option<bool> {
                $crate::reflect::equal_by_partial_eq(self, other)
            }
            fn stringer(&self) -> ::std::option::Option<::std::string::String> {
                ::std::option::Option::Some(::std::format!("{:?}", self))
            }
        }
    )+};
}
