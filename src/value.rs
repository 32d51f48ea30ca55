/*! `GValue`, the boxed "any" that native code uses for properties and signal arguments.

Conversions are trait based: [ToValue] builds a value from Rust data, [FromValue] reads one back.
Reading is lenient in one direction only: a value whose type derives from the requested type is accepted
as-is, and otherwise the value is run through GLib's registered transformations (so an enum can be read
as `i32`).  Anything else is [Error::TypeMismatch].
*/

use std::ffi::{c_void, CStr};
use gobject_sys::GValue;
use crate::error::{Error, Result};
use crate::instance::{instance_type, GObjectInstance};
use crate::objectpointers::StrongCell;
use crate::strings::{to_cstring, to_cstring_truncated};
use crate::types::{StaticType, Type};
use crate::variant::Variant;

///An owned `GValue`.  Unset on drop.
#[repr(transparent)]
pub struct Value(GValue);

impl Value {
    ///An uninitialized value (`G_VALUE_INIT`), with type [Type::INVALID].
    pub fn uninitialized() -> Value {
        //all-zero is G_VALUE_INIT
        Value(unsafe { std::mem::zeroed() })
    }
    ///A value of type `ty` holding that type's default.
    pub fn from_type(ty: Type) -> Value {
        let mut v = Value::uninitialized();
        unsafe { gobject_sys::g_value_init(&mut v.0, ty.into_raw()) };
        v
    }
    ///A value holding a new reference to `object`, typed as `T`.
    pub fn for_object<T: GObjectInstance>(object: &T) -> Value {
        let mut v = Value::from_type(T::static_type());
        unsafe { gobject_sys::g_value_set_object(&mut v.0, object as *const T as *mut _) };
        v
    }
    ///A string value.  Unlike `s.to_value()` this fails for strings with an interior nul.
    pub fn try_from_str(s: &str) -> Result<Value> {
        let c = to_cstring(s)?;
        let mut v = Value::from_type(Type::STRING);
        unsafe { gobject_sys::g_value_set_string(&mut v.0, c.as_ptr()) };
        Ok(v)
    }

    pub fn type_(&self) -> Type {
        unsafe { Type::from_raw(self.0.g_type) }
    }
    pub fn fundamental(&self) -> Type {
        self.type_().fundamental()
    }
    ///Whether the value has been initialized with a type.
    pub fn is_valid(&self) -> bool {
        self.0.g_type != 0
    }
    ///Reads the value as `T`.
    pub fn get<T: FromValue>(&self) -> Result<T> {
        T::from_value(self)
    }
    ///Converts to a value of type `ty` using GLib's registered transformations.
    pub fn transform(&self, ty: Type) -> Result<Value> {
        if self.type_() == ty {
            return Ok(self.clone());
        }
        let mut dest = Value::from_type(ty);
        let ok = unsafe { gobject_sys::g_value_transform(&self.0, &mut dest.0) } != glib_sys::GFALSE;
        if ok {
            Ok(dest)
        } else {
            Err(Error::TypeMismatch { expected: ty, actual: self.type_() })
        }
    }
    ///Returns `self` if it already is a `ty`, else [Self::transform]s it.
    pub(crate) fn coerce(self, ty: Type) -> Result<Value> {
        if self.type_().is_a(ty) {
            Ok(self)
        } else {
            self.transform(ty)
        }
    }

    #[inline] pub fn as_ptr(&self) -> *const GValue { &self.0 }
    #[inline] pub fn as_mut_ptr(&mut self) -> *mut GValue { &mut self.0 }

    ///Borrows a native value.
    ///
    /// # Safety
    /// `ptr` must point to an initialized `GValue` that outlives `'a`.
    pub unsafe fn from_raw_borrow<'a>(ptr: *const GValue) -> &'a Value {
        &*(ptr as *const Value)
    }
    ///Copies a native value.
    ///
    /// # Safety
    /// `ptr` must point to an initialized `GValue`.
    pub unsafe fn from_raw_none(ptr: *const GValue) -> Value {
        Value::from_raw_borrow(ptr).clone()
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        if !self.is_valid() {
            return Value::uninitialized();
        }
        let mut v = Value::from_type(self.type_());
        unsafe { gobject_sys::g_value_copy(&self.0, &mut v.0) };
        v
    }
}
impl Drop for Value {
    fn drop(&mut self) {
        if self.is_valid() {
            unsafe { gobject_sys::g_value_unset(&mut self.0) }
        }
    }
}
impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.is_valid() {
            return f.write_str("Value(<uninitialized>)");
        }
        let contents = unsafe { crate::strings::from_glib_full(gobject_sys::g_strdup_value_contents(&self.0)) };
        write!(f, "Value({}: {})", self.type_(), contents.unwrap_or_default())
    }
}

///Types that can be stored into a [Value].
pub trait ToValue {
    fn to_value(&self) -> Value;
    ///The type [Self::to_value] produces.
    fn value_type(&self) -> Type;
}

///Types that can be read from a [Value].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self>;
    ///Whether a value of type `ty` could be read as `Self`.  Used to check callback parameters ahead of time.
    fn accepts(ty: Type) -> bool;
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value { (**self).to_value() }
    fn value_type(&self) -> Type { (**self).value_type() }
}

impl ToValue for Value {
    fn to_value(&self) -> Value { self.clone() }
    fn value_type(&self) -> Type { self.type_() }
}
///Callbacks that want raw arguments can take `Value`.
impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> { Ok(value.clone()) }
    fn accepts(_ty: Type) -> bool { true }
}

///Reads `value` as `expected`, transforming when needed.  The callback gets the value to read from.
fn read_as<R>(value: &Value, expected: Type, read: impl FnOnce(&Value) -> R) -> Result<R> {
    if value.type_().is_a(expected) {
        Ok(read(value))
    } else {
        let transformed = value.transform(expected)?;
        Ok(read(&transformed))
    }
}
fn transformable(ty: Type, to: Type) -> bool {
    ty.is_a(to) || unsafe { gobject_sys::g_value_type_transformable(ty.into_raw(), to.into_raw()) != glib_sys::GFALSE }
}

macro_rules! primitive_impl {
    ($($t:ty: $get:ident, $set:ident, $to_native:expr, $from_native:expr);* $(;)?) => {
        $(
        impl ToValue for $t {
            fn to_value(&self) -> Value {
                let mut v = Value::from_type(<$t>::static_type());
                let to_native = $to_native;
                unsafe { gobject_sys::$set(&mut v.0, to_native(*self)) };
                v
            }
            fn value_type(&self) -> Type { <$t>::static_type() }
        }
        impl FromValue for $t {
            fn from_value(value: &Value) -> Result<Self> {
                let from_native = $from_native;
                read_as(value, <$t>::static_type(), |v| from_native(unsafe { gobject_sys::$get(&v.0) }))
            }
            fn accepts(ty: Type) -> bool { transformable(ty, <$t>::static_type()) }
        }
        )*
    }
}

primitive_impl!(
    bool: g_value_get_boolean, g_value_set_boolean, |b: bool| b as glib_sys::gboolean, |b: glib_sys::gboolean| b != glib_sys::GFALSE;
    i8: g_value_get_schar, g_value_set_schar, |x| x, |x| x;
    u8: g_value_get_uchar, g_value_set_uchar, |x| x, |x| x;
    i32: g_value_get_int, g_value_set_int, |x| x, |x| x;
    u32: g_value_get_uint, g_value_set_uint, |x| x, |x| x;
    i64: g_value_get_int64, g_value_set_int64, |x| x, |x| x;
    u64: g_value_get_uint64, g_value_set_uint64, |x| x, |x| x;
    f32: g_value_get_float, g_value_set_float, |x| x, |x| x;
    f64: g_value_get_double, g_value_set_double, |x| x, |x| x;
);

impl ToValue for str {
    ///Strings with an interior nul are stored up to the nul.  [Value::try_from_str] rejects them instead.
    fn to_value(&self) -> Value {
        let mut v = Value::from_type(Type::STRING);
        let c = to_cstring_truncated(self);
        unsafe { gobject_sys::g_value_set_string(&mut v.0, c.as_ptr()) };
        v
    }
    fn value_type(&self) -> Type { Type::STRING }
}
impl ToValue for String {
    fn to_value(&self) -> Value { self.as_str().to_value() }
    fn value_type(&self) -> Type { Type::STRING }
}
impl<T: ToValue + StaticType> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(t) => t.to_value(),
            //NULL string, NULL object, ...
            None => Value::from_type(T::static_type()),
        }
    }
    fn value_type(&self) -> Type { T::static_type() }
}

///Reads a string value.  NULL strings are `None`.
fn read_string(value: &Value) -> Result<Option<String>> {
    read_as(value, Type::STRING, |v| unsafe {
        let ptr = gobject_sys::g_value_get_string(&v.0);
        if ptr.is_null() { None } else { Some(CStr::from_ptr(ptr).to_string_lossy().into_owned()) }
    })
}
impl FromValue for Option<String> {
    fn from_value(value: &Value) -> Result<Self> { read_string(value) }
    fn accepts(ty: Type) -> bool { transformable(ty, Type::STRING) }
}
impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        read_string(value)?.ok_or(Error::NullPointer)
    }
    fn accepts(ty: Type) -> bool { transformable(ty, Type::STRING) }
}

impl ToValue for Type {
    fn to_value(&self) -> Value {
        let mut v = Value::from_type(Type::gtype());
        unsafe { gobject_sys::g_value_set_gtype(&mut v.0, self.into_raw()) };
        v
    }
    fn value_type(&self) -> Type { Type::gtype() }
}
impl FromValue for Type {
    fn from_value(value: &Value) -> Result<Self> {
        read_as(value, Type::gtype(), |v| unsafe { Type::from_raw(gobject_sys::g_value_get_gtype(&v.0)) })
    }
    fn accepts(ty: Type) -> bool { ty.is_a(Type::gtype()) }
}

impl ToValue for *mut c_void {
    fn to_value(&self) -> Value {
        let mut v = Value::from_type(Type::POINTER);
        unsafe { gobject_sys::g_value_set_pointer(&mut v.0, *self) };
        v
    }
    fn value_type(&self) -> Type { Type::POINTER }
}
impl FromValue for *mut c_void {
    fn from_value(value: &Value) -> Result<Self> {
        if value.type_().is_a(Type::POINTER) {
            Ok(unsafe { gobject_sys::g_value_get_pointer(&value.0) })
        } else {
            Err(Error::TypeMismatch { expected: Type::POINTER, actual: value.type_() })
        }
    }
    fn accepts(ty: Type) -> bool { ty.is_a(Type::POINTER) }
}

///Object pointer held by an object- or interface-typed value, possibly NULL.
fn peek_object(value: &Value) -> Result<*mut c_void> {
    let fundamental = value.fundamental();
    if fundamental != Type::OBJECT && fundamental != Type::INTERFACE {
        return Err(Error::TypeMismatch { expected: Type::OBJECT, actual: value.type_() });
    }
    Ok(unsafe { gobject_sys::g_value_peek_pointer(&value.0) })
}
///Checks the runtime type of a non-NULL instance.
unsafe fn checked_instance<T: GObjectInstance>(ptr: *mut c_void) -> Result<StrongCell<T>> {
    let actual = instance_type(ptr);
    if actual.is_a(T::static_type()) {
        StrongCell::from_raw_none(ptr as *mut T)
    } else {
        Err(Error::TypeMismatch { expected: T::static_type(), actual })
    }
}

impl<T: GObjectInstance> ToValue for StrongCell<T> where T: ToValue {
    fn to_value(&self) -> Value { (**self).to_value() }
    fn value_type(&self) -> Type { (**self).value_type() }
}
impl<T: GObjectInstance> StaticType for StrongCell<T> {
    fn static_type() -> Type { T::static_type() }
}
impl<T: GObjectInstance> FromValue for StrongCell<T> {
    fn from_value(value: &Value) -> Result<Self> {
        let ptr = peek_object(value)?;
        if ptr.is_null() {
            return Err(Error::NullPointer);
        }
        unsafe { checked_instance(ptr) }
    }
    fn accepts(ty: Type) -> bool {
        ty.is_a(T::static_type()) || T::static_type().is_a(ty)
    }
}
impl<T: GObjectInstance> FromValue for Option<StrongCell<T>> {
    fn from_value(value: &Value) -> Result<Self> {
        let ptr = peek_object(value)?;
        if ptr.is_null() {
            Ok(None)
        } else {
            unsafe { checked_instance(ptr) }.map(Some)
        }
    }
    fn accepts(ty: Type) -> bool { StrongCell::<T>::accepts(ty) }
}

impl ToValue for Variant {
    fn to_value(&self) -> Value {
        let mut v = Value::from_type(Type::VARIANT);
        //takes its own reference
        unsafe { gobject_sys::g_value_set_variant(&mut v.0, self as *const Variant as *mut _) };
        v
    }
    fn value_type(&self) -> Type { Type::VARIANT }
}
impl ToValue for StrongCell<Variant> {
    fn to_value(&self) -> Value { (**self).to_value() }
    fn value_type(&self) -> Type { Type::VARIANT }
}
impl StaticType for StrongCell<Variant> {
    fn static_type() -> Type { Type::VARIANT }
}
impl FromValue for Option<StrongCell<Variant>> {
    fn from_value(value: &Value) -> Result<Self> {
        if !value.type_().is_a(Type::VARIANT) {
            return Err(Error::TypeMismatch { expected: Type::VARIANT, actual: value.type_() });
        }
        unsafe {
            let ptr = gobject_sys::g_value_get_variant(&value.0) as *mut Variant;
            if ptr.is_null() { Ok(None) } else { StrongCell::from_raw_none(ptr).map(Some) }
        }
    }
    fn accepts(ty: Type) -> bool { ty.is_a(Type::VARIANT) }
}
impl FromValue for StrongCell<Variant> {
    fn from_value(value: &Value) -> Result<Self> {
        Option::<StrongCell<Variant>>::from_value(value)?.ok_or(Error::NullPointer)
    }
    fn accepts(ty: Type) -> bool { ty.is_a(Type::VARIANT) }
}

#[cfg(test)] mod tests {
    use crate::bindings::*;

    #[test] fn primitives() {
        assert_eq!(true.to_value().get::<bool>().unwrap(), true);
        assert_eq!((-3i8).to_value().get::<i8>().unwrap(), -3);
        assert_eq!(200u8.to_value().get::<u8>().unwrap(), 200);
        assert_eq!((-42i32).to_value().get::<i32>().unwrap(), -42);
        assert_eq!(42u32.to_value().get::<u32>().unwrap(), 42);
        assert_eq!(i64::MIN.to_value().get::<i64>().unwrap(), i64::MIN);
        assert_eq!(u64::MAX.to_value().get::<u64>().unwrap(), u64::MAX);
        assert_eq!(1.5f32.to_value().get::<f32>().unwrap(), 1.5);
        assert_eq!(2.25f64.to_value().get::<f64>().unwrap(), 2.25);
        assert_eq!(42i32.to_value().type_(), Type::INT);
        assert_eq!(42i32.value_type(), Type::INT);
    }

    #[test] fn strings() {
        let v = "hello".to_value();
        assert_eq!(v.type_(), Type::STRING);
        assert_eq!(v.get::<String>().unwrap(), "hello");
        assert_eq!(String::from("owned").to_value().get::<Option<String>>().unwrap().as_deref(), Some("owned"));
        let none: Option<String> = None;
        let v = none.to_value();
        assert_eq!(v.get::<Option<String>>().unwrap(), None);
        assert!(matches!(v.get::<String>(), Err(Error::NullPointer)));
    }

    #[test] fn interior_nul() {
        assert_eq!("head\0tail".to_value().get::<String>().unwrap(), "head");
        assert!(matches!(Value::try_from_str("head\0tail"), Err(Error::InteriorNul(_))));
        assert_eq!(Value::try_from_str("whole").unwrap().get::<String>().unwrap(), "whole");
    }

    #[test] fn mismatch_and_transform() {
        let v = "not a number".to_value();
        assert!(matches!(v.get::<Type>(), Err(Error::TypeMismatch { .. })));
        //int to double is a registered transformation
        let v = 3i32.to_value();
        assert_eq!(v.get::<f64>().unwrap(), 3.0);
        let t = v.transform(Type::STRING).unwrap();
        assert_eq!(t.get::<String>().unwrap(), "3");
        assert!(i32::accepts(Type::F64));
        assert!(!Type::accepts(Type::INT));
    }

    #[test] fn gtype_values() {
        let v = Type::OBJECT.to_value();
        assert_eq!(v.type_(), Type::gtype());
        assert_eq!(v.get::<Type>().unwrap(), Type::OBJECT);
    }

    #[test] fn uninitialized() {
        let v = Value::uninitialized();
        assert!(!v.is_valid());
        assert_eq!(v.type_(), Type::INVALID);
        let c = v.clone();
        assert!(!c.is_valid());
        let d = Value::from_type(Type::INT);
        assert_eq!(d.get::<i32>().unwrap(), 0);
        assert_eq!(d.fundamental(), Type::INT);
    }

    #[test] fn objects() {
        let o = Object::new();
        let v = o.to_value();
        assert_eq!(v.type_(), Type::OBJECT);
        assert_eq!(o.ref_count(), 2);
        let back: StrongCell<Object> = v.get().unwrap();
        assert_eq!(back, o);
        assert!(v.get::<StrongCell<InitiallyUnowned>>().is_err());
        drop(back);
        drop(v);
        assert_eq!(o.ref_count(), 1);

        let none: Option<StrongCell<Object>> = None;
        let v = none.to_value();
        assert_eq!(v.get::<Option<StrongCell<Object>>>().unwrap(), None);
        assert!(matches!(v.get::<StrongCell<Object>>(), Err(Error::NullPointer)));
        assert!(matches!(3i32.to_value().get::<StrongCell<Object>>(), Err(Error::TypeMismatch{..})));
    }

    #[test] fn variants() {
        let variant = Variant::from_str("payload").unwrap();
        let v = variant.to_value();
        assert_eq!(v.type_(), Type::VARIANT);
        let back: StrongCell<Variant> = v.get().unwrap();
        assert_eq!(back, variant);
        assert_eq!(back.str(), Some("payload"));
    }

    #[test] fn debug_contents() {
        let s = format!("{:?}", 42i32.to_value());
        assert!(s.contains("gint"));
        assert!(s.contains("42"));
    }
}
