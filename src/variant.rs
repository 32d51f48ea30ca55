//! `GVariant`, GLib's immutable serializable value, and `GVariantType`, the type of one.

use std::borrow::Borrow;
use std::ffi::{c_void, CStr};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::NonNull;
use glib_sys::{GVariant, GVariantType};
use gobr_procmacro::gstr;
use crate::error::{check_gerror, Error, Result};
use crate::instance::Refcounted;
use crate::objectpointers::StrongCell;
use crate::strings::{from_glib_full, to_cstring};
use crate::types::{StaticType, Type};

///An immutable, threadsafe tree of typed values.  Always handled through a [StrongCell].
///
/// Constructors return a floating reference, which the cell sinks.
#[repr(transparent)]
pub struct Variant(c_void, PhantomData<*const ()>);

unsafe impl Refcounted for Variant {
    unsafe fn ref_raw(ptr: *const Self) {
        log::trace!("variant ref {:p}", ptr);
        glib_sys::g_variant_ref(ptr as *mut GVariant);
    }
    unsafe fn unref_raw(ptr: *const Self) {
        log::trace!("variant unref {:p}", ptr);
        glib_sys::g_variant_unref(ptr as *mut GVariant);
    }
    unsafe fn ref_sink_raw(ptr: *const Self) {
        log::trace!("variant ref_sink {:p}", ptr);
        glib_sys::g_variant_ref_sink(ptr as *mut GVariant);
    }
    unsafe fn is_floating_raw(ptr: *const Self) -> bool {
        glib_sys::g_variant_is_floating(ptr as *mut GVariant) != glib_sys::GFALSE
    }
}

impl StaticType for Variant {
    fn static_type() -> Type { Type::VARIANT }
}

//variants are immutable
unsafe impl Send for Variant {}
unsafe impl Sync for Variant {}

///Wraps a variant returned by a native constructor.  Those never return NULL.
unsafe fn wrap(ptr: *mut GVariant) -> StrongCell<Variant> {
    StrongCell::assume_retained(&*(ptr as *const Variant))
}

impl Variant {
    #[inline] pub(crate) fn as_raw(&self) -> *mut GVariant {
        self as *const Variant as *mut GVariant
    }

    pub fn from_bool(b: bool) -> StrongCell<Variant> {
        unsafe { wrap(glib_sys::g_variant_new_boolean(b as glib_sys::gboolean)) }
    }
    pub fn from_u8(v: u8) -> StrongCell<Variant> {
        unsafe { wrap(glib_sys::g_variant_new_byte(v)) }
    }
    pub fn from_i16(v: i16) -> StrongCell<Variant> {
        unsafe { wrap(glib_sys::g_variant_new_int16(v)) }
    }
    pub fn from_u16(v: u16) -> StrongCell<Variant> {
        unsafe { wrap(glib_sys::g_variant_new_uint16(v)) }
    }
    pub fn from_i32(v: i32) -> StrongCell<Variant> {
        unsafe { wrap(glib_sys::g_variant_new_int32(v)) }
    }
    pub fn from_u32(v: u32) -> StrongCell<Variant> {
        unsafe { wrap(glib_sys::g_variant_new_uint32(v)) }
    }
    pub fn from_i64(v: i64) -> StrongCell<Variant> {
        unsafe { wrap(glib_sys::g_variant_new_int64(v)) }
    }
    pub fn from_u64(v: u64) -> StrongCell<Variant> {
        unsafe { wrap(glib_sys::g_variant_new_uint64(v)) }
    }
    pub fn from_f64(v: f64) -> StrongCell<Variant> {
        unsafe { wrap(glib_sys::g_variant_new_double(v)) }
    }
    ///A string variant (type `s`).  Fails for strings with an interior nul.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<StrongCell<Variant>> {
        let c = to_cstring(s)?;
        Ok(unsafe { wrap(glib_sys::g_variant_new_string(c.as_ptr())) })
    }
    ///A tuple of `children`.  The children are referenced, not copied.
    pub fn tuple(children: &[&Variant]) -> StrongCell<Variant> {
        let raw: Vec<*mut GVariant> = children.iter().map(|c| c.as_raw()).collect();
        unsafe { wrap(glib_sys::g_variant_new_tuple(raw.as_ptr(), raw.len())) }
    }

    ///The variant's type.  Always definite.
    pub fn variant_type(&self) -> &VariantType {
        //owned by the variant
        unsafe { VariantType::from_raw(glib_sys::g_variant_get_type(self.as_raw())) }
    }
    ///The type string, such as `i` or `(si)`.
    pub fn type_string(&self) -> &str {
        unsafe {
            //owned by the variant
            CStr::from_ptr(glib_sys::g_variant_get_type_string(self.as_raw())).to_str().unwrap_or("")
        }
    }
    ///Whether the variant matches `ty`, which may be indefinite.
    pub fn is_of_type(&self, ty: &VariantType) -> bool {
        unsafe { glib_sys::g_variant_is_of_type(self.as_raw(), ty.as_raw()) != glib_sys::GFALSE }
    }

    fn typed<R>(&self, ty: &str, read: impl FnOnce(*mut GVariant) -> R) -> Option<R> {
        if self.type_string() == ty { Some(read(self.as_raw())) } else { None }
    }
    pub fn as_bool(&self) -> Option<bool> {
        self.typed("b", |v| unsafe { glib_sys::g_variant_get_boolean(v) } != glib_sys::GFALSE)
    }
    pub fn as_u8(&self) -> Option<u8> {
        self.typed("y", |v| unsafe { glib_sys::g_variant_get_byte(v) })
    }
    pub fn as_i16(&self) -> Option<i16> {
        self.typed("n", |v| unsafe { glib_sys::g_variant_get_int16(v) })
    }
    pub fn as_u16(&self) -> Option<u16> {
        self.typed("q", |v| unsafe { glib_sys::g_variant_get_uint16(v) })
    }
    pub fn as_i32(&self) -> Option<i32> {
        self.typed("i", |v| unsafe { glib_sys::g_variant_get_int32(v) })
    }
    pub fn as_u32(&self) -> Option<u32> {
        self.typed("u", |v| unsafe { glib_sys::g_variant_get_uint32(v) })
    }
    pub fn as_i64(&self) -> Option<i64> {
        self.typed("x", |v| unsafe { glib_sys::g_variant_get_int64(v) })
    }
    pub fn as_u64(&self) -> Option<u64> {
        self.typed("t", |v| unsafe { glib_sys::g_variant_get_uint64(v) })
    }
    pub fn as_f64(&self) -> Option<f64> {
        self.typed("d", |v| unsafe { glib_sys::g_variant_get_double(v) })
    }
    ///Borrows the contents of a string, object path or signature variant.
    pub fn str(&self) -> Option<&str> {
        match self.type_string() {
            "s" | "o" | "g" => unsafe {
                let ptr = glib_sys::g_variant_get_string(self.as_raw(), std::ptr::null_mut());
                CStr::from_ptr(ptr).to_str().ok()
            },
            _ => None,
        }
    }

    ///Text form, as accepted by [Self::parse].  With `type_annotate`, ambiguous values carry their type.
    pub fn print(&self, type_annotate: bool) -> String {
        unsafe { from_glib_full(glib_sys::g_variant_print(self.as_raw(), type_annotate as glib_sys::gboolean)) }
            .unwrap_or_default()
    }
    ///Parses the text form.  `ty` constrains the result type; without it the type is inferred.
    pub fn parse(ty: Option<&VariantType>, text: &str) -> Result<StrongCell<Variant>> {
        let text = to_cstring(text)?;
        unsafe {
            let mut error = std::ptr::null_mut();
            let ty_ptr = ty.map_or(std::ptr::null(), VariantType::as_raw);
            let raw = glib_sys::g_variant_parse(ty_ptr, text.as_ptr(), std::ptr::null(), std::ptr::null_mut(), &mut error);
            check_gerror(error)?;
            StrongCell::from_raw_full(raw as *mut Variant)
        }
    }

    ///Number of children of a container (tuple, array, dictionary, maybe).  Zero for other variants.
    pub fn n_children(&self) -> usize {
        unsafe {
            if glib_sys::g_variant_is_container(self.as_raw()) == glib_sys::GFALSE {
                return 0;
            }
            glib_sys::g_variant_n_children(self.as_raw())
        }
    }
    pub fn child(&self, index: usize) -> Option<StrongCell<Variant>> {
        if index >= self.n_children() {
            return None;
        }
        unsafe { StrongCell::from_raw_full(glib_sys::g_variant_get_child_value(self.as_raw(), index) as *mut Variant).ok() }
    }
}

/**
A variant type, borrowed.  Owned types are [VariantTypeBuf].

Besides definite types such as `i` or `(sa{sv})` there are indefinite ones (`*`, `a*`, `r`, ...) that match a
whole family.  [Variant::is_of_type] and [VariantType::is_subtype_of] understand both.

```
use gobr::glib::*;
let pairs = VariantTypeBuf::new("a(si)").unwrap();
assert!(pairs.is_definite());
assert!(pairs.is_subtype_of(VariantType::ARRAY));
assert_eq!(pairs.element().map(VariantType::as_str), Some("(si)"));
```
*/
//zero-sized so the built-in constants below can point at plain type strings
#[repr(C)]
pub struct VariantType([u8; 0], PhantomData<*const ()>);

//immutable
unsafe impl Send for VariantType {}
unsafe impl Sync for VariantType {}

///Built-in types are the type string itself.
const fn builtin(type_string: &'static CStr) -> &'static VariantType {
    unsafe { &*(type_string.as_ptr() as *const VariantType) }
}

impl VariantType {
    pub const BOOLEAN: &'static VariantType = builtin(gstr!("b"));
    pub const BYTE: &'static VariantType = builtin(gstr!("y"));
    pub const INT16: &'static VariantType = builtin(gstr!("n"));
    pub const UINT16: &'static VariantType = builtin(gstr!("q"));
    pub const INT32: &'static VariantType = builtin(gstr!("i"));
    pub const UINT32: &'static VariantType = builtin(gstr!("u"));
    pub const INT64: &'static VariantType = builtin(gstr!("x"));
    pub const UINT64: &'static VariantType = builtin(gstr!("t"));
    pub const HANDLE: &'static VariantType = builtin(gstr!("h"));
    pub const DOUBLE: &'static VariantType = builtin(gstr!("d"));
    pub const STRING: &'static VariantType = builtin(gstr!("s"));
    pub const OBJECT_PATH: &'static VariantType = builtin(gstr!("o"));
    pub const SIGNATURE: &'static VariantType = builtin(gstr!("g"));
    pub const VARIANT: &'static VariantType = builtin(gstr!("v"));
    ///Matches every type.
    pub const ANY: &'static VariantType = builtin(gstr!("*"));
    ///Matches every basic type.
    pub const BASIC: &'static VariantType = builtin(gstr!("?"));
    pub const MAYBE: &'static VariantType = builtin(gstr!("m*"));
    pub const ARRAY: &'static VariantType = builtin(gstr!("a*"));
    ///Matches every tuple.
    pub const TUPLE: &'static VariantType = builtin(gstr!("r"));
    ///The empty tuple.
    pub const UNIT: &'static VariantType = builtin(gstr!("()"));
    pub const DICT_ENTRY: &'static VariantType = builtin(gstr!("{?*}"));
    pub const DICTIONARY: &'static VariantType = builtin(gstr!("a{?*}"));
    pub const STRING_ARRAY: &'static VariantType = builtin(gstr!("as"));
    pub const OBJECT_PATH_ARRAY: &'static VariantType = builtin(gstr!("ao"));
    pub const BYTESTRING: &'static VariantType = builtin(gstr!("ay"));
    pub const BYTESTRING_ARRAY: &'static VariantType = builtin(gstr!("aay"));
    pub const VARDICT: &'static VariantType = builtin(gstr!("a{sv}"));

    ///Borrows a native type.
    ///
    /// # Safety
    /// `ptr` must be a valid, non-NULL `GVariantType` that outlives `'a`.
    #[inline] pub unsafe fn from_raw<'a>(ptr: *const GVariantType) -> &'a VariantType {
        &*(ptr as *const VariantType)
    }
    #[inline] pub fn as_raw(&self) -> *const GVariantType {
        self as *const Self as *const GVariantType
    }

    ///Whether `type_string` is exactly one complete type.
    pub fn string_is_valid(type_string: &str) -> bool {
        match to_cstring(type_string) {
            Ok(c) => unsafe { glib_sys::g_variant_type_string_is_valid(c.as_ptr()) != glib_sys::GFALSE },
            Err(_) => false,
        }
    }

    ///The type string.  Not nul-terminated on the native side, so this borrows exactly its length.
    pub fn as_str(&self) -> &str {
        unsafe {
            let len = glib_sys::g_variant_type_get_string_length(self.as_raw());
            let bytes = std::slice::from_raw_parts(glib_sys::g_variant_type_peek_string(self.as_raw()) as *const u8, len);
            //type strings are ascii
            std::str::from_utf8(bytes).unwrap_or("")
        }
    }

    pub fn is_definite(&self) -> bool {
        unsafe { glib_sys::g_variant_type_is_definite(self.as_raw()) != glib_sys::GFALSE }
    }
    pub fn is_container(&self) -> bool {
        unsafe { glib_sys::g_variant_type_is_container(self.as_raw()) != glib_sys::GFALSE }
    }
    pub fn is_basic(&self) -> bool {
        unsafe { glib_sys::g_variant_type_is_basic(self.as_raw()) != glib_sys::GFALSE }
    }
    pub fn is_maybe(&self) -> bool {
        unsafe { glib_sys::g_variant_type_is_maybe(self.as_raw()) != glib_sys::GFALSE }
    }
    pub fn is_array(&self) -> bool {
        unsafe { glib_sys::g_variant_type_is_array(self.as_raw()) != glib_sys::GFALSE }
    }
    pub fn is_tuple(&self) -> bool {
        unsafe { glib_sys::g_variant_type_is_tuple(self.as_raw()) != glib_sys::GFALSE }
    }
    pub fn is_dict_entry(&self) -> bool {
        unsafe { glib_sys::g_variant_type_is_dict_entry(self.as_raw()) != glib_sys::GFALSE }
    }
    ///Whether every value of `self` is also a value of `supertype`.
    pub fn is_subtype_of(&self, supertype: &VariantType) -> bool {
        unsafe { glib_sys::g_variant_type_is_subtype_of(self.as_raw(), supertype.as_raw()) != glib_sys::GFALSE }
    }

    ///The element type of an array or maybe type.
    pub fn element(&self) -> Option<&VariantType> {
        if !self.is_array() && !self.is_maybe() {
            return None;
        }
        unsafe { Some(VariantType::from_raw(glib_sys::g_variant_type_element(self.as_raw()))) }
    }
    ///Item types of a definite tuple or dictionary entry, in order.
    pub fn items(&self) -> Vec<&VariantType> {
        let mut items = Vec::new();
        if !(self.is_tuple() || self.is_dict_entry()) || !self.is_definite() {
            return items;
        }
        unsafe {
            let mut item = glib_sys::g_variant_type_first(self.as_raw());
            while !item.is_null() {
                items.push(VariantType::from_raw(item));
                item = glib_sys::g_variant_type_next(item);
            }
        }
        items
    }
}

impl ToOwned for VariantType {
    type Owned = VariantTypeBuf;
    fn to_owned(&self) -> VariantTypeBuf {
        unsafe { VariantTypeBuf::from_raw_full(glib_sys::g_variant_type_copy(self.as_raw())) }
    }
}
impl PartialEq for VariantType {
    fn eq(&self, other: &Self) -> bool {
        unsafe {
            glib_sys::g_variant_type_equal(self.as_raw() as glib_sys::gconstpointer, other.as_raw() as glib_sys::gconstpointer)
                != glib_sys::GFALSE
        }
    }
}
impl Eq for VariantType {}
impl Hash for VariantType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state)
    }
}
impl std::fmt::Display for VariantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
impl std::fmt::Debug for VariantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VariantType({})", self.as_str())
    }
}

///An owned `GVariantType`.  Freed on drop; `Clone` copies.
pub struct VariantTypeBuf(NonNull<VariantType>);

unsafe impl Send for VariantTypeBuf {}
unsafe impl Sync for VariantTypeBuf {}

impl VariantTypeBuf {
    ///Parses a type string such as `"s"` or `"a{sv}"`.
    pub fn new(type_string: &str) -> Result<VariantTypeBuf> {
        if !VariantType::string_is_valid(type_string) {
            return Err(Error::InvalidValue(format!("{:?} is not a variant type", type_string)));
        }
        let c = to_cstring(type_string)?;
        Ok(unsafe { VariantTypeBuf::from_raw_full(glib_sys::g_variant_type_new(c.as_ptr())) })
    }
    pub fn array(element: &VariantType) -> VariantTypeBuf {
        unsafe { VariantTypeBuf::from_raw_full(glib_sys::g_variant_type_new_array(element.as_raw())) }
    }
    pub fn maybe(element: &VariantType) -> VariantTypeBuf {
        unsafe { VariantTypeBuf::from_raw_full(glib_sys::g_variant_type_new_maybe(element.as_raw())) }
    }
    pub fn tuple(items: &[&VariantType]) -> VariantTypeBuf {
        let raw: Vec<*const GVariantType> = items.iter().map(|t| t.as_raw()).collect();
        unsafe { VariantTypeBuf::from_raw_full(glib_sys::g_variant_type_new_tuple(raw.as_ptr(), raw.len() as i32)) }
    }
    ///Fails unless `key` is a basic type.
    pub fn dict_entry(key: &VariantType, value: &VariantType) -> Result<VariantTypeBuf> {
        if !key.is_basic() {
            return Err(Error::InvalidValue(format!("{} cannot be a dictionary key", key)));
        }
        Ok(unsafe { VariantTypeBuf::from_raw_full(glib_sys::g_variant_type_new_dict_entry(key.as_raw(), value.as_raw())) })
    }

    ///Adopts a type from a transfer-full native call.  Those never return NULL.
    pub(crate) unsafe fn from_raw_full(ptr: *mut GVariantType) -> VariantTypeBuf {
        VariantTypeBuf(NonNull::new_unchecked(ptr as *mut VariantType))
    }
}

impl Deref for VariantTypeBuf {
    type Target = VariantType;
    fn deref(&self) -> &VariantType {
        unsafe { self.0.as_ref() }
    }
}
impl Borrow<VariantType> for VariantTypeBuf {
    fn borrow(&self) -> &VariantType { self }
}
impl AsRef<VariantType> for VariantTypeBuf {
    fn as_ref(&self) -> &VariantType { self }
}
impl Drop for VariantTypeBuf {
    fn drop(&mut self) {
        unsafe { glib_sys::g_variant_type_free(self.as_raw() as *mut GVariantType) }
    }
}
impl Clone for VariantTypeBuf {
    fn clone(&self) -> Self {
        (**self).to_owned()
    }
}
impl std::str::FromStr for VariantTypeBuf {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        VariantTypeBuf::new(s)
    }
}
impl PartialEq for VariantTypeBuf {
    fn eq(&self, other: &Self) -> bool { **self == **other }
}
impl PartialEq<VariantType> for VariantTypeBuf {
    fn eq(&self, other: &VariantType) -> bool { **self == *other }
}
impl Eq for VariantTypeBuf {}
impl Hash for VariantTypeBuf {
    fn hash<H: Hasher>(&self, state: &mut H) { (**self).hash(state) }
}
impl std::fmt::Display for VariantTypeBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&**self, f)
    }
}
impl std::fmt::Debug for VariantTypeBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&**self, f)
    }
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        unsafe { glib_sys::g_variant_equal(self.as_raw() as glib_sys::gconstpointer, other.as_raw() as glib_sys::gconstpointer) != glib_sys::GFALSE }
    }
}
impl Eq for Variant {}
impl Hash for Variant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        unsafe {
            //g_variant_hash only handles basic types
            if self.variant_type().is_basic() {
                glib_sys::g_variant_hash(self.as_raw() as glib_sys::gconstpointer).hash(state)
            } else {
                self.print(true).hash(state)
            }
        }
    }
}
impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.print(false))
    }
}
impl std::fmt::Debug for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Variant({}: {})", self.type_string(), self.print(true))
    }
}

#[cfg(test)] mod tests {
    use crate::bindings::*;
    use std::collections::HashSet;

    #[test] fn basics() {
        assert_eq!(Variant::from_bool(true).as_bool(), Some(true));
        assert_eq!(Variant::from_u8(7).as_u8(), Some(7));
        assert_eq!(Variant::from_i16(-7).as_i16(), Some(-7));
        assert_eq!(Variant::from_u16(7).as_u16(), Some(7));
        assert_eq!(Variant::from_i32(-7).as_i32(), Some(-7));
        assert_eq!(Variant::from_u32(7).as_u32(), Some(7));
        assert_eq!(Variant::from_i64(i64::MIN).as_i64(), Some(i64::MIN));
        assert_eq!(Variant::from_u64(u64::MAX).as_u64(), Some(u64::MAX));
        assert_eq!(Variant::from_f64(0.5).as_f64(), Some(0.5));
        let s = Variant::from_str("hi").unwrap();
        assert_eq!(s.str(), Some("hi"));
        assert_eq!(s.type_string(), "s");
        //no implicit conversions
        assert_eq!(Variant::from_i32(1).as_i64(), None);
        assert_eq!(s.as_bool(), None);
        assert!(matches!(Variant::from_str("a\0b"), Err(Error::InteriorNul(_))));
    }

    #[test] fn types() {
        let v = Variant::from_i32(1);
        assert!(v.is_of_type(VariantType::INT32));
        assert!(v.is_of_type(VariantType::ANY));
        assert!(v.is_of_type(VariantType::BASIC));
        assert!(!v.is_of_type(VariantType::STRING));
        assert_eq!(v.variant_type(), VariantType::INT32);
        let t = Variant::tuple(&[&v, &*Variant::from_str("x").unwrap()]);
        assert!(t.is_of_type(VariantType::TUPLE));
        assert!(t.is_of_type(&VariantTypeBuf::new("(i*)").unwrap()));
        assert!(!t.is_of_type(VariantType::UNIT));
    }

    #[test] fn type_strings() {
        assert!(VariantType::string_is_valid("a{sv}"));
        assert!(VariantType::string_is_valid("m*"));
        assert!(!VariantType::string_is_valid("not a type"));
        assert!(!VariantType::string_is_valid("(("));
        assert!(!VariantType::string_is_valid("ii"));
        assert!(!VariantType::string_is_valid(""));
        assert!(matches!(VariantTypeBuf::new("not a type"), Err(Error::InvalidValue(_))));
        assert!(matches!("i\0".parse::<VariantTypeBuf>(), Err(Error::InvalidValue(_))));
        assert_eq!("as".parse::<VariantTypeBuf>().unwrap(), *VariantType::STRING_ARRAY);
    }

    #[test] fn builtin_types() {
        let all = [VariantType::BOOLEAN, VariantType::BYTE, VariantType::INT16, VariantType::UINT16,
                   VariantType::INT32, VariantType::UINT32, VariantType::INT64, VariantType::UINT64,
                   VariantType::HANDLE, VariantType::DOUBLE, VariantType::STRING, VariantType::OBJECT_PATH,
                   VariantType::SIGNATURE, VariantType::VARIANT, VariantType::ANY, VariantType::BASIC,
                   VariantType::MAYBE, VariantType::ARRAY, VariantType::TUPLE, VariantType::UNIT,
                   VariantType::DICT_ENTRY, VariantType::DICTIONARY, VariantType::STRING_ARRAY,
                   VariantType::OBJECT_PATH_ARRAY, VariantType::BYTESTRING, VariantType::BYTESTRING_ARRAY,
                   VariantType::VARDICT];
        for ty in all {
            assert!(VariantType::string_is_valid(ty.as_str()), "{}", ty);
            assert_eq!(*VariantTypeBuf::new(ty.as_str()).unwrap(), *ty);
        }
        assert_eq!(VariantType::DICT_ENTRY.as_str(), "{?*}");
    }

    #[test] fn type_equality() {
        assert_eq!(VariantType::BOOLEAN, VariantType::BOOLEAN);
        assert_ne!(VariantType::BOOLEAN, VariantType::STRING);
        assert_eq!(*VariantType::BOOLEAN, *VariantTypeBuf::new("b").unwrap());
        assert_ne!(VariantTypeBuf::new("b").unwrap(), VariantTypeBuf::new("s").unwrap());
        let mut set = HashSet::new();
        set.insert(VariantTypeBuf::new("a{sv}").unwrap());
        set.insert(VariantType::VARDICT.to_owned());
        assert_eq!(set.len(), 1);
        let copy = set.iter().next().unwrap().clone();
        assert_eq!(copy.as_str(), "a{sv}");
        assert_eq!(format!("{}", copy), "a{sv}");
    }

    #[test] fn type_classification() {
        let vardict = VariantType::VARDICT;
        assert!(vardict.is_definite());
        assert!(vardict.is_container());
        assert!(vardict.is_array());
        assert!(!vardict.is_basic());
        assert!(vardict.is_subtype_of(VariantType::DICTIONARY));
        assert!(vardict.is_subtype_of(VariantType::ARRAY));
        assert!(!VariantType::ARRAY.is_subtype_of(vardict));
        let entry = vardict.element().unwrap();
        assert!(entry.is_dict_entry());
        assert_eq!(entry.items().iter().map(|t| t.as_str()).collect::<Vec<_>>(), vec!["s", "v"]);

        assert!(!VariantType::ANY.is_definite());
        assert!(VariantType::STRING.is_basic());
        assert!(!VariantType::STRING.is_container());
        assert!(VariantType::INT32.element().is_none());
        assert!(VariantType::UNIT.is_tuple());
        assert!(VariantType::UNIT.items().is_empty());
        assert!(VariantType::TUPLE.items().is_empty());
    }

    #[test] fn type_constructors() {
        let maybe_str = VariantTypeBuf::maybe(VariantType::STRING);
        assert_eq!(maybe_str.as_str(), "ms");
        assert!(maybe_str.is_maybe());
        assert_eq!(maybe_str.element(), Some(VariantType::STRING));
        assert_eq!(VariantTypeBuf::array(&maybe_str).as_str(), "ams");
        let pair = VariantTypeBuf::tuple(&[VariantType::INT32, &*maybe_str]);
        assert_eq!(pair.as_str(), "(ims)");
        assert_eq!(pair.items().len(), 2);
        assert_eq!(VariantTypeBuf::tuple(&[]).as_str(), "()");
        assert_eq!(VariantTypeBuf::dict_entry(VariantType::STRING, VariantType::VARIANT).unwrap().as_str(), "{sv}");
        assert!(matches!(VariantTypeBuf::dict_entry(&pair, VariantType::VARIANT), Err(Error::InvalidValue(_))));
    }

    #[test] fn containers() {
        let a = Variant::from_str("x").unwrap();
        let b = Variant::from_i32(2);
        let t = Variant::tuple(&[&a, &b]);
        assert_eq!(t.type_string(), "(si)");
        assert_eq!(t.n_children(), 2);
        assert_eq!(t.child(1).unwrap().as_i32(), Some(2));
        assert!(t.child(2).is_none());
        assert_eq!(b.n_children(), 0);
        assert_eq!(t.print(false), "('x', 2)");
    }

    #[test] fn parse() {
        let v = Variant::parse(None, "('x', 2)").unwrap();
        assert_eq!(v, Variant::tuple(&[&Variant::from_str("x").unwrap(), &Variant::from_i32(2)]));
        let u = Variant::parse(Some(VariantType::UINT32), "5").unwrap();
        assert_eq!(u.as_u32(), Some(5));
        let string_array = VariantTypeBuf::new("as").unwrap();
        let strings = Variant::parse(Some(&*string_array), "['a', 'b']").unwrap();
        assert_eq!(strings.n_children(), 2);
        //the expected type must agree with the text
        assert!(matches!(Variant::parse(Some(VariantType::BOOLEAN), "5"), Err(Error::Glib(_))));
        match Variant::parse(None, "(unterminated") {
            Err(Error::Glib(e)) => assert!(!e.message.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test] fn equality_and_hash() {
        let mut set = HashSet::new();
        set.insert(Variant::from_i32(1));
        set.insert(Variant::from_i32(1));
        set.insert(Variant::tuple(&[&Variant::from_i32(1)]));
        set.insert(Variant::tuple(&[&Variant::from_i32(1)]));
        assert_eq!(set.len(), 2);
        assert_ne!(Variant::from_i32(1), Variant::from_u32(1));
        assert_eq!(format!("{}", Variant::from_u8(3)), "0x03");
    }
}
