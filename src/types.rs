///! Runtime type identifiers.  A [Type] names a class, interface or fundamental type in the GType system.
use std::ffi::CStr;
use std::fmt::Formatter;
use crate::strings::to_cstring;

const FUNDAMENTAL_SHIFT: usize = 2;
const fn fundamental(n: usize) -> Type {
    Type(n << FUNDAMENTAL_SHIFT)
}

///A `GType`.
///
/// This is a plain integer, so it is `Copy` and threadsafe.  Type names are interned by GLib and
/// never freed, which is why [Type::name] can hand out a `'static` string.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Type(glib_sys::GType);

impl Type {
    pub const INVALID: Type = fundamental(0);
    pub const NONE: Type = fundamental(1);
    pub const INTERFACE: Type = fundamental(2);
    pub const CHAR: Type = fundamental(3);
    pub const UCHAR: Type = fundamental(4);
    pub const BOOL: Type = fundamental(5);
    pub const INT: Type = fundamental(6);
    pub const UINT: Type = fundamental(7);
    pub const LONG: Type = fundamental(8);
    pub const ULONG: Type = fundamental(9);
    pub const I64: Type = fundamental(10);
    pub const U64: Type = fundamental(11);
    pub const ENUM: Type = fundamental(12);
    pub const FLAGS: Type = fundamental(13);
    pub const F32: Type = fundamental(14);
    pub const F64: Type = fundamental(15);
    pub const STRING: Type = fundamental(16);
    pub const POINTER: Type = fundamental(17);
    pub const BOXED: Type = fundamental(18);
    pub const PARAM: Type = fundamental(19);
    pub const OBJECT: Type = fundamental(20);
    pub const VARIANT: Type = fundamental(21);

    ///The type of `GType` values themselves.  Registered at runtime, so this cannot be a constant.
    pub fn gtype() -> Type {
        Type(unsafe { gobject_sys::g_gtype_get_type() })
    }

    #[inline] pub const unsafe fn from_raw(raw: glib_sys::GType) -> Type { Type(raw) }
    #[inline] pub const fn into_raw(self) -> glib_sys::GType { self.0 }

    ///The registered name, e.g. `GObject`.  Invalid types are named `<invalid>`.
    pub fn name(&self) -> &'static str {
        unsafe {
            let ptr = gobject_sys::g_type_name(self.0);
            if ptr.is_null() {
                "<invalid>"
            } else {
                CStr::from_ptr(ptr).to_str().unwrap_or("<invalid>")
            }
        }
    }
    ///Number of ancestors including the type itself.  Fundamental types have depth 1.
    pub fn depth(&self) -> u32 {
        unsafe { gobject_sys::g_type_depth(self.0) }
    }
    ///Direct parent, or `None` for fundamental types.
    pub fn parent(&self) -> Option<Type> {
        match unsafe { gobject_sys::g_type_parent(self.0) } {
            0 => None,
            p => Some(Type(p)),
        }
    }
    pub fn fundamental(&self) -> Type {
        Type(unsafe { gobject_sys::g_type_fundamental(self.0) })
    }
    ///Whether `self` is `other` or derives from (or implements) it.
    pub fn is_a(&self, other: Type) -> bool {
        unsafe { gobject_sys::g_type_is_a(self.0, other.0) != glib_sys::GFALSE }
    }
    ///Looks up a registered type.  Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Type> {
        let name = to_cstring(name).ok()?;
        match unsafe { gobject_sys::g_type_from_name(name.as_ptr()) } {
            0 => None,
            t => Some(Type(t)),
        }
    }
    pub fn is_valid(&self) -> bool {
        self.0 != 0 && !unsafe { gobject_sys::g_type_name(self.0) }.is_null()
    }
    ///Iterates from `self` up to the fundamental type.
    pub fn ancestors(&self) -> impl Iterator<Item = Type> {
        std::iter::successors(Some(*self), |t| t.parent())
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
impl std::fmt::Debug for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Type({})", self.name())
    }
}

///Types with a known runtime [Type].
pub trait StaticType {
    fn static_type() -> Type;
}

macro_rules! static_type_impl {
    ($($t:ty => $gtype:expr),*) => {
        $(impl StaticType for $t {
            #[inline] fn static_type() -> Type { $gtype }
        })*
    }
}
static_type_impl!(
    bool => Type::BOOL,
    i8 => Type::CHAR,
    u8 => Type::UCHAR,
    i32 => Type::INT,
    u32 => Type::UINT,
    i64 => Type::I64,
    u64 => Type::U64,
    f32 => Type::F32,
    f64 => Type::F64,
    str => Type::STRING,
    String => Type::STRING,
    *mut std::ffi::c_void => Type::POINTER,
    *const std::ffi::c_void => Type::POINTER
);
impl StaticType for Type {
    fn static_type() -> Type { Type::gtype() }
}
impl<T: StaticType + ?Sized> StaticType for &T {
    fn static_type() -> Type { T::static_type() }
}

#[test] fn fundamentals() {
    assert_eq!(Type::OBJECT.name(), "GObject");
    assert_eq!(Type::INT.name(), "gint");
    assert_eq!(Type::STRING.name(), "gchararray");
    assert_eq!(Type::VARIANT.name(), "GVariant");
    assert_eq!(Type::OBJECT.fundamental(), Type::OBJECT);
    assert_eq!(Type::OBJECT.depth(), 1);
    assert_eq!(Type::OBJECT.parent(), None);
    assert!(!Type::INVALID.is_valid());
    assert_eq!(Type::INVALID.name(), "<invalid>");
    assert!(Type::gtype().is_valid());
    assert_eq!(Type::gtype().name(), "GType");
}

#[test] fn hierarchy() {
    let unowned = <crate::object::InitiallyUnowned as StaticType>::static_type();
    assert_eq!(Type::from_name("GInitiallyUnowned"), Some(unowned));
    assert_eq!(unowned.parent(), Some(Type::OBJECT));
    assert_eq!(unowned.depth(), 2);
    assert!(unowned.is_a(Type::OBJECT));
    assert!(!Type::OBJECT.is_a(unowned));
    assert_eq!(unowned.fundamental(), Type::OBJECT);
    assert_eq!(unowned.ancestors().collect::<Vec<_>>(), vec![unowned, Type::OBJECT]);
    assert_eq!(Type::from_name("NoSuchTypeAnywhere"), None);
}
