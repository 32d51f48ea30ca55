//! Implements a variety of macros for simple binding declarations

///Helps generate bindings for a native enum, as a struct with const members.
///
/// # example
///
/// ```
///# use gobr::bindings::*;
///glib_enum! {
///     pub struct GtkWindowType<i32>;
///     impl GtkWindowType {
///         TOPLEVEL = 0,
///         POPUP = 1
///     }
/// }
/// assert_eq!(GtkWindowType::POPUP.field(), 1);
///```
/// # Notes
/// This macro requires
/// * a struct with a single field
/// * implementation block
/// * simple comments only; doc comments on members are not supported
#[macro_export]
macro_rules! glib_enum {
    (
        $(#[$attribute:meta])*
        $pub:vis struct $enum:ident<$type:ty>;
        impl $ignore:ident {
            $($a:ident = $b:expr),*
        }
    ) => (
        $(#[$attribute])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        $pub struct $enum($type);
        #[allow(non_upper_case_globals)]
        impl $enum {
           $($pub const $a: $enum = $enum($b);)*
           $pub const fn field(&self) -> $type { self.0 }
           ///Wraps a raw value.  Values that are not one of the declared members are preserved as-is.
           $pub const fn from_field(field: $type) -> Self { $enum(field) }
        }
    )
}

///Like [glib_enum!], for bit flags.  Adds the bitwise operators and [contains](#contains).
///
/// ```
///# use gobr::bindings::*;
///glib_flags! {
///     pub struct GApplicationFlags<u32>;
///     impl GApplicationFlags {
///         IS_SERVICE = 1,
///         IS_LAUNCHER = 2
///     }
/// }
/// let both = GApplicationFlags::IS_SERVICE | GApplicationFlags::IS_LAUNCHER;
/// assert!(both.contains(GApplicationFlags::IS_LAUNCHER));
/// assert!(!GApplicationFlags::empty().contains(GApplicationFlags::IS_SERVICE));
///```
#[macro_export]
macro_rules! glib_flags {
    (
        $(#[$attribute:meta])*
        $pub:vis struct $flags:ident<$type:ty>;
        impl $ignore:ident {
            $($a:ident = $b:expr),*
        }
    ) => (
        $(#[$attribute])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
        $pub struct $flags($type);
        #[allow(non_upper_case_globals)]
        impl $flags {
           $($pub const $a: $flags = $flags($b);)*
           $pub const fn field(&self) -> $type { self.0 }
           $pub const fn from_field(field: $type) -> Self { $flags(field) }
           $pub const fn empty() -> Self { $flags(0) }
           ///Whether every bit of `other` is set in `self`.
           $pub const fn contains(&self, other: Self) -> bool { self.0 & other.0 == other.0 }
        }
        impl std::ops::BitOr for $flags {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self { $flags(self.0 | rhs.0) }
        }
        impl std::ops::BitOrAssign for $flags {
            fn bitor_assign(&mut self, rhs: Self) { self.0 |= rhs.0 }
        }
        impl std::ops::BitAnd for $flags {
            type Output = Self;
            fn bitand(self, rhs: Self) -> Self { $flags(self.0 & rhs.0) }
        }
    )
}
