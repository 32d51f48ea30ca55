/*! Dynamic conversion of values whose type is only known at runtime.

Typed code reads values with [FromValue](crate::glib::FromValue).  Code that does not know what it is holding
(a debugger, a generic property inspector, a scripting bridge) asks for a [Dynamic] instead.  The conversion
is looked up in a table keyed by [Type]: first the value's own type, then its fundamental type.  Wrapper
modules extend the table with [register_marshalers] so their boxed types convert too.
*/

use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::OnceLock;
use parking_lot::RwLock;
use crate::error::{Error, Result};
use crate::object::Object;
use crate::objectpointers::StrongCell;
use crate::types::Type;
use crate::value::{FromValue, Value};
use crate::variant::Variant;

///A value converted without static knowledge of its type.
#[derive(Debug, Clone)]
pub enum Dynamic {
    Bool(bool),
    I8(i8),
    U8(u8),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    ///A string value; NULL is `None`.
    Str(Option<String>),
    Type(Type),
    ///Numeric value of an enum, tagged with the enum type.
    Enum(Type, i32),
    ///Bits of a flags value, tagged with the flags type.
    Flags(Type, u32),
    Object(Option<StrongCell<Object>>),
    Variant(Option<StrongCell<Variant>>),
    Pointer(*mut c_void),
    ///Produced by marshalers registered outside this crate.
    Custom(Value),
}

///Converts a value of one registered type.
pub type Marshaler = fn(&Value) -> Result<Dynamic>;

static MARSHALERS: OnceLock<RwLock<HashMap<Type, Marshaler>>> = OnceLock::new();

fn builtin() -> HashMap<Type, Marshaler> {
    let mut table: HashMap<Type, Marshaler> = HashMap::new();
    table.insert(Type::BOOL, |v| Ok(Dynamic::Bool(v.get()?)));
    table.insert(Type::CHAR, |v| Ok(Dynamic::I8(v.get()?)));
    table.insert(Type::UCHAR, |v| Ok(Dynamic::U8(v.get()?)));
    table.insert(Type::INT, |v| Ok(Dynamic::I32(v.get()?)));
    table.insert(Type::UINT, |v| Ok(Dynamic::U32(v.get()?)));
    table.insert(Type::LONG, |v| Ok(Dynamic::I64(v.transform(Type::I64)?.get()?)));
    table.insert(Type::ULONG, |v| Ok(Dynamic::U64(v.transform(Type::U64)?.get()?)));
    table.insert(Type::I64, |v| Ok(Dynamic::I64(v.get()?)));
    table.insert(Type::U64, |v| Ok(Dynamic::U64(v.get()?)));
    table.insert(Type::F32, |v| Ok(Dynamic::F32(v.get()?)));
    table.insert(Type::F64, |v| Ok(Dynamic::F64(v.get()?)));
    table.insert(Type::STRING, |v| Ok(Dynamic::Str(v.get()?)));
    table.insert(Type::POINTER, |v| Ok(Dynamic::Pointer(v.get()?)));
    table.insert(Type::ENUM, |v| {
        Ok(Dynamic::Enum(v.type_(), unsafe { gobject_sys::g_value_get_enum(v.as_ptr()) }))
    });
    table.insert(Type::FLAGS, |v| {
        Ok(Dynamic::Flags(v.type_(), unsafe { gobject_sys::g_value_get_flags(v.as_ptr()) }))
    });
    table.insert(Type::OBJECT, |v| Ok(Dynamic::Object(v.get()?)));
    table.insert(Type::INTERFACE, |v| Ok(Dynamic::Object(v.get()?)));
    table.insert(Type::VARIANT, |v| Ok(Dynamic::Variant(v.get()?)));
    table.insert(Type::gtype(), |v| Ok(Dynamic::Type(v.get()?)));
    #[cfg(feature = "gio")]
    table.extend(crate::gio::marshalers());
    table
}

fn marshalers() -> &'static RwLock<HashMap<Type, Marshaler>> {
    MARSHALERS.get_or_init(|| RwLock::new(builtin()))
}

///Adds (or replaces) conversions for the given types.
pub fn register_marshalers(entries: &[(Type, Marshaler)]) {
    let mut table = marshalers().write();
    for (ty, marshaler) in entries {
        log::debug!("registering marshaler for {}", ty);
        table.insert(*ty, *marshaler);
    }
}

fn lookup(ty: Type) -> Option<Marshaler> {
    let table = marshalers().read();
    table.get(&ty).or_else(|| table.get(&ty.fundamental())).copied()
}

impl Value {
    ///Converts to a [Dynamic] using the marshaler table.
    pub fn to_dynamic(&self) -> Result<Dynamic> {
        let marshaler = lookup(self.type_()).ok_or(Error::MissingMarshaler(self.type_()))?;
        //the lock is released; marshalers may re-enter
        marshaler(self)
    }
}

impl FromValue for Dynamic {
    fn from_value(value: &Value) -> Result<Self> { value.to_dynamic() }
    fn accepts(ty: Type) -> bool { lookup(ty).is_some() }
}

#[cfg(test)] mod tests {
    use crate::bindings::*;

    #[test] fn builtin_types() {
        assert!(matches!(true.to_value().to_dynamic().unwrap(), Dynamic::Bool(true)));
        assert!(matches!(7i32.to_value().to_dynamic().unwrap(), Dynamic::I32(7)));
        assert!(matches!(7u64.to_value().to_dynamic().unwrap(), Dynamic::U64(7)));
        match "x".to_value().to_dynamic().unwrap() {
            Dynamic::Str(Some(s)) => assert_eq!(s, "x"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(Type::OBJECT.to_value().to_dynamic().unwrap(), Dynamic::Type(Type::OBJECT)));
    }

    #[test] fn falls_back_to_fundamental() {
        //InitiallyUnowned has no entry of its own
        let u = InitiallyUnowned::new();
        match u.to_value().to_dynamic().unwrap() {
            Dynamic::Object(Some(o)) => assert_eq!(o.type_(), InitiallyUnowned::static_type()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test] fn missing() {
        //boxed types have no generic conversion
        let ty = unsafe { Type::from_raw(gobject_sys::g_closure_get_type()) };
        let v = Value::from_type(ty);
        assert!(matches!(v.to_dynamic(), Err(Error::MissingMarshaler(t)) if t == ty));
    }

    #[test] fn registered() {
        let ty = crate::testsupport::counter_type();
        fn marshal(v: &Value) -> Result<Dynamic> {
            Ok(Dynamic::Custom(v.clone()))
        }
        register_marshalers(&[(ty, marshal)]);
        //a NULL instance of the registered type
        let v = Value::from_type(ty);
        assert!(matches!(v.to_dynamic().unwrap(), Dynamic::Custom(_)));
        //its parent still goes through the fundamental entry
        assert!(matches!(Value::from_type(Type::OBJECT).to_dynamic().unwrap(), Dynamic::Object(None)));
    }
}
