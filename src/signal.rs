/*! Signals: lookup, registration, connection and emission.

Connecting and emitting are exposed as methods on [ObjectExt](crate::glib::ObjectExt).  This module holds the
pieces that do not need an instance: [Signal] identifies a signal of some type, [SignalQuery] describes it, and
[SignalBuilder] registers new ones.
*/

use std::ffi::{c_uint, c_ulong};
use gobject_sys::GObject;
use log::{debug, warn};
use crate::closure::{self, Closure};
use crate::error::{Error, Result};
use crate::strings::{from_glib_none, to_cstring};
use crate::types::Type;
use crate::value::{ToValue, Value};

crate::glib_flags! {
    pub struct SignalFlags<u32>;
    impl SignalFlags {
        RUN_FIRST = 1,
        RUN_LAST = 2,
        RUN_CLEANUP = 4,
        NO_RECURSE = 8,
        DETAILED = 16,
        ACTION = 32,
        NO_HOOKS = 64,
        MUST_COLLECT = 128,
        DEPRECATED = 256
    }
}

///Identifies one connected handler.  Handler ids are unique across all instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignalHandlerId(c_ulong);

impl SignalHandlerId {
    #[inline] pub const fn from_raw(raw: c_ulong) -> Self { SignalHandlerId(raw) }
    #[inline] pub const fn into_raw(self) -> c_ulong { self.0 }
}

///A registered signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signal(c_uint);

///Everything the type system knows about a signal.
#[derive(Debug, Clone)]
pub struct SignalQuery {
    pub signal: Signal,
    pub name: String,
    pub owner: Type,
    pub flags: SignalFlags,
    pub return_type: Type,
    pub param_types: Vec<Type>,
}

//G_SIGNAL_TYPE_STATIC_SCOPE
const STATIC_SCOPE: glib_sys::GType = 1;

fn strip_scope(raw: glib_sys::GType) -> Type {
    unsafe { Type::from_raw(raw & !STATIC_SCOPE) }
}

impl Signal {
    ///Finds the signal `name` on `owner` or one of its ancestors.
    pub fn lookup(name: &str, owner: Type) -> Option<Signal> {
        let c = to_cstring(name).ok()?;
        let id = unsafe { gobject_sys::g_signal_lookup(c.as_ptr(), owner.into_raw()) };
        if id == 0 { None } else { Some(Signal(id)) }
    }
    #[inline] pub const fn id(&self) -> u32 { self.0 }

    pub fn query(&self) -> SignalQuery {
        unsafe {
            let mut q: gobject_sys::GSignalQuery = std::mem::zeroed();
            gobject_sys::g_signal_query(self.0, &mut q);
            let param_types = if q.n_params == 0 || q.param_types.is_null() {
                Vec::new()
            } else {
                std::slice::from_raw_parts(q.param_types, q.n_params as usize).iter().map(|t| strip_scope(*t)).collect()
            };
            SignalQuery {
                signal: *self,
                name: from_glib_none(q.signal_name).unwrap_or_default(),
                owner: Type::from_raw(q.itype),
                flags: SignalFlags::from_field(q.signal_flags),
                return_type: strip_scope(q.return_type),
                param_types,
            }
        }
    }

    ///Registers a parameterless action signal `name` on `GObject` itself, so every object can emit and connect it.
    pub fn new(name: &str) -> Result<Signal> {
        Signal::builder(name, Type::OBJECT).flags(SignalFlags::RUN_LAST | SignalFlags::ACTION).build()
    }

    pub fn builder(name: &str, owner: Type) -> SignalBuilder {
        SignalBuilder {
            name: name.to_owned(),
            owner,
            flags: SignalFlags::RUN_LAST,
            params: Vec::new(),
            return_type: Type::NONE,
        }
    }
}

pub(crate) fn valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

///Registers a new signal.  Build with [Signal::builder].
#[derive(Debug, Clone)]
pub struct SignalBuilder {
    name: String,
    owner: Type,
    flags: SignalFlags,
    params: Vec<Type>,
    return_type: Type,
}

impl SignalBuilder {
    ///Replaces the default flags ([SignalFlags::RUN_LAST]).
    pub fn flags(mut self, flags: SignalFlags) -> Self {
        self.flags = flags;
        self
    }
    pub fn param(mut self, ty: Type) -> Self {
        self.params.push(ty);
        self
    }
    pub fn params(mut self, types: &[Type]) -> Self {
        self.params.extend_from_slice(types);
        self
    }
    pub fn return_type(mut self, ty: Type) -> Self {
        self.return_type = ty;
        self
    }
    pub fn build(self) -> Result<Signal> {
        if !valid_name(&self.name) {
            return Err(Error::Registration(format!("{:?} is not a valid signal name", self.name)));
        }
        //looking up a signal of a type whose class was never loaded logs a critical; g_signal_newv checks again
        let loaded = unsafe { !gobject_sys::g_type_class_peek(self.owner.into_raw()).is_null() };
        if loaded && Signal::lookup(&self.name, self.owner).is_some() {
            return Err(Error::Registration(format!("{} already has a signal {:?}", self.owner, self.name)));
        }
        let name = to_cstring(&self.name)?;
        let mut params: Vec<glib_sys::GType> = self.params.iter().map(|t| t.into_raw()).collect();
        let id = unsafe {
            gobject_sys::g_signal_newv(name.as_ptr(), self.owner.into_raw(), self.flags.field(), std::ptr::null_mut(),
                                       None, std::ptr::null_mut(), None, self.return_type.into_raw(),
                                       params.len() as c_uint, params.as_mut_ptr())
        };
        if id == 0 {
            return Err(Error::Registration(format!("g_signal_newv rejected {:?} on {}", self.name, self.owner)));
        }
        debug!("registered signal {} ({}) on {}", self.name, id, self.owner);
        Ok(Signal(id))
    }
}

fn parse_name(detailed: &str, type_: Type) -> Result<(c_uint, glib_sys::GQuark)> {
    let c = to_cstring(detailed)?;
    let mut id = 0;
    let mut detail = 0;
    let ok = unsafe {
        gobject_sys::g_signal_parse_name(c.as_ptr(), type_.into_raw(), &mut id, &mut detail, glib_sys::GTRUE)
    };
    if ok == glib_sys::GFALSE {
        return Err(Error::UnknownSignal { type_, name: detailed.to_owned() });
    }
    Ok((id, detail))
}

pub(crate) fn connect(instance: *mut GObject, type_: Type, detailed: &str, closure: Closure, after: bool) -> Result<SignalHandlerId> {
    let (id, detail) = parse_name(detailed, type_)?;
    let handler = unsafe {
        gobject_sys::g_signal_connect_closure_by_id(instance as _, id, detail, closure.as_ptr(),
                                                    after as glib_sys::gboolean)
    };
    if handler == 0 {
        return Err(Error::UnknownSignal { type_, name: detailed.to_owned() });
    }
    closure::index_handler(handler, closure.key());
    debug!("connected {:?} to {}::{} as handler {}", closure, type_, detailed, handler);
    Ok(SignalHandlerId(handler))
}

pub(crate) fn is_connected(instance: *mut GObject, id: SignalHandlerId) -> bool {
    unsafe { gobject_sys::g_signal_handler_is_connected(instance as _, id.0) != glib_sys::GFALSE }
}

pub(crate) fn disconnect(instance: *mut GObject, id: SignalHandlerId) {
    closure::forget_handler(id.0);
    if is_connected(instance, id) {
        //invalidates the closure and drops the signal's reference
        unsafe { gobject_sys::g_signal_handler_disconnect(instance as _, id.0) }
    } else {
        warn!("handler {} is not connected to {:p}", id.0, instance);
    }
}

pub(crate) fn block(instance: *mut GObject, id: SignalHandlerId) {
    unsafe { gobject_sys::g_signal_handler_block(instance as _, id.0) }
}
pub(crate) fn unblock(instance: *mut GObject, id: SignalHandlerId) {
    unsafe { gobject_sys::g_signal_handler_unblock(instance as _, id.0) }
}

pub(crate) fn stop_emission(instance: *mut GObject, type_: Type, detailed: &str) -> Result<()> {
    let (id, detail) = parse_name(detailed, type_)?;
    unsafe { gobject_sys::g_signal_stop_emission(instance as _, id, detail) };
    Ok(())
}

///Emits `detailed` on `instance`.  Returns the signal's return value, or an uninitialized value for void signals.
pub(crate) fn emit(instance: *mut GObject, type_: Type, detailed: &str, args: &[&dyn ToValue]) -> Result<Value> {
    let (id, detail) = parse_name(detailed, type_)?;
    let query = Signal(id).query();
    if args.len() != query.param_types.len() {
        return Err(Error::SignalArity { signal: detailed.to_owned(), expected: query.param_types.len(), actual: args.len() });
    }
    let mut values = Vec::with_capacity(args.len() + 1);
    let mut receiver = Value::from_type(type_);
    unsafe { gobject_sys::g_value_set_object(receiver.as_mut_ptr(), instance) };
    values.push(receiver);
    for (arg, ty) in args.iter().zip(&query.param_types) {
        values.push(arg.to_value().coerce(*ty)?);
    }
    let mut ret = Value::uninitialized();
    let ret_ptr = if query.return_type == Type::NONE {
        std::ptr::null_mut()
    } else {
        ret = Value::from_type(query.return_type);
        ret.as_mut_ptr()
    };
    unsafe { gobject_sys::g_signal_emitv(values.as_ptr() as *const gobject_sys::GValue, id, detail, ret_ptr) };
    Ok(ret)
}
