/*! `GObject`, `GInitiallyUnowned`, and the methods every object gets through [ObjectExt]. */

use std::any::Any;
use std::ffi::{c_char, c_uint};
use std::panic::Location;
use gobject_sys::{GObject, GObjectClass, GParamSpec, GValue};
use log::debug;
use crate::arguments::Callback;
use crate::closure::Closure;
use crate::error::{Error, Result};
use crate::instance::{instance_type, GObjectInstance};
use crate::objectpointers::StrongCell;
use crate::quark::Quark;
use crate::signal::{self, SignalHandlerId};
use crate::strings::{from_glib_none, to_cstring};
use crate::types::{StaticType, Type};
use crate::value::{FromValue, ToValue, Value};

crate::gobject_instance! {
    ///The root of the object hierarchy.
    pub struct Object: gobject_sys::g_object_get_type;
}
crate::gobject_instance! {
    ///Objects born with a floating reference, such as widgets.
    pub struct InitiallyUnowned: gobject_sys::g_initially_unowned_get_type;
}
crate::gobject_upcast!(InitiallyUnowned, unsafe Object, as_object);

///Constructs an instance of `ty` with default properties.  The reference is owned by the caller (and floating for
///`GInitiallyUnowned` types).
pub(crate) unsafe fn new_raw(ty: Type) -> *mut GObject {
    gobject_sys::g_object_new_with_properties(ty.into_raw(), 0, std::ptr::null_mut(), std::ptr::null())
}

///Wraps a freshly constructed object.  `g_object_new` aborts rather than returning NULL.
unsafe fn adopt_new<T: GObjectInstance>(ptr: *mut GObject) -> StrongCell<T> {
    StrongCell::assume_retained(&*(ptr as *const T))
}

unsafe fn object_class(ptr: *mut GObject) -> *mut GObjectClass {
    (*(ptr as *mut gobject_sys::GTypeInstance)).g_class as *mut GObjectClass
}

unsafe fn find_pspec(class: *mut GObjectClass, type_: Type, name: &str) -> Result<*mut GParamSpec> {
    let c = to_cstring(name)?;
    let pspec = gobject_sys::g_object_class_find_property(class, c.as_ptr());
    if pspec.is_null() {
        Err(Error::UnknownProperty { type_, name: name.to_owned() })
    } else {
        Ok(pspec)
    }
}

const PARAM_READABLE: u32 = 1;
const PARAM_WRITABLE: u32 = 2;
const PARAM_CONSTRUCT_ONLY: u32 = 8;

impl Object {
    pub fn new() -> StrongCell<Object> {
        unsafe { adopt_new(new_raw(Type::OBJECT)) }
    }

    ///Constructs an instance of `ty`, setting the given properties (including construct-only ones).
    ///
    /// Values are converted to each property's type the way [Value::transform] does.
    pub fn with_properties(ty: Type, properties: &[(&str, &dyn ToValue)]) -> Result<StrongCell<Object>> {
        if !ty.is_a(Type::OBJECT) {
            return Err(Error::TypeMismatch { expected: Type::OBJECT, actual: ty });
        }
        let is_abstract = unsafe {
            gobject_sys::g_type_test_flags(ty.into_raw(), gobject_sys::G_TYPE_FLAG_ABSTRACT) != glib_sys::GFALSE
        };
        if is_abstract {
            return Err(Error::InvalidValue(format!("{} is abstract", ty)));
        }
        let mut names = Vec::with_capacity(properties.len());
        let mut values = Vec::with_capacity(properties.len());
        unsafe {
            let class = gobject_sys::g_type_class_ref(ty.into_raw()) as *mut GObjectClass;
            let prepared: Result<()> = properties.iter().try_for_each(|(name, value)| {
                let pspec = find_pspec(class, ty, name)?;
                values.push(value.to_value().coerce(Type::from_raw((*pspec).value_type))?);
                names.push(to_cstring(name)?);
                Ok(())
            });
            gobject_sys::g_type_class_unref(class as glib_sys::gpointer);
            prepared?;
            let mut name_ptrs: Vec<*const c_char> = names.iter().map(|n| n.as_ptr()).collect();
            let raw = gobject_sys::g_object_new_with_properties(ty.into_raw(), name_ptrs.len() as c_uint,
                                                                name_ptrs.as_mut_ptr(), values.as_ptr() as *const GValue);
            Ok(adopt_new(raw))
        }
    }
}

impl InitiallyUnowned {
    ///A new instance.  The floating reference is sunk into the returned cell.
    pub fn new() -> StrongCell<InitiallyUnowned> {
        unsafe { adopt_new(new_raw(InitiallyUnowned::static_type())) }
    }
}

///Describes one property of a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpecInfo {
    pub name: String,
    pub nick: Option<String>,
    pub blurb: Option<String>,
    pub value_type: Type,
    ///The class that installed the property.
    pub owner: Type,
    flags: u32,
}

impl ParamSpecInfo {
    unsafe fn from_raw(pspec: *mut GParamSpec) -> ParamSpecInfo {
        ParamSpecInfo {
            name: from_glib_none((*pspec).name).unwrap_or_default(),
            nick: from_glib_none(gobject_sys::g_param_spec_get_nick(pspec)),
            blurb: from_glib_none(gobject_sys::g_param_spec_get_blurb(pspec)),
            value_type: Type::from_raw((*pspec).value_type),
            owner: Type::from_raw((*pspec).owner_type),
            flags: (*pspec).flags as u32,
        }
    }
    pub fn readable(&self) -> bool { self.flags & PARAM_READABLE != 0 }
    pub fn writable(&self) -> bool { self.flags & PARAM_WRITABLE != 0 }
    pub fn construct_only(&self) -> bool { self.flags & PARAM_CONSTRUCT_ONLY != 0 }
}

//leading fields of GObject
#[repr(C)]
struct ObjectHeader {
    g_type_instance: gobject_sys::GTypeInstance,
    ref_count: c_uint,
}

type DataBox = Box<dyn Any + Send>;

unsafe extern "C" fn drop_data(ptr: glib_sys::gpointer) {
    drop(Box::from_raw(ptr as *mut DataBox));
}

fn object_ptr<T: GObjectInstance>(t: &T) -> *mut GObject {
    t as *const T as *const GObject as *mut GObject
}

/**
Methods available on every [GObjectInstance].

```
use gobr::prelude::*;
use gobr::glib::Object;
let o = Object::new();
assert_eq!(o.ref_count(), 1);
o.set_data("answer", 42u32);
assert_eq!(o.data::<u32>("answer"), Some(42));
```
*/
pub trait ObjectExt: GObjectInstance + Sized {
    fn as_object(&self) -> &Object {
        unsafe { &*(self as *const Self as *const Object) }
    }
    ///The runtime type of the instance, which may be more derived than [StaticType::static_type].
    fn type_(&self) -> Type {
        unsafe { instance_type(self as *const Self as *const std::ffi::c_void) }
    }
    fn is<U: StaticType>(&self) -> bool {
        self.type_().is_a(U::static_type())
    }
    ///Checked cast to another wrapper type.
    fn downcast_ref<U: GObjectInstance>(&self) -> Option<&U> {
        if self.is::<U>() {
            Some(unsafe { &*(self as *const Self as *const U) })
        } else {
            None
        }
    }
    ///Current reference count.  Only meaningful for debugging; other threads may change it at any time.
    fn ref_count(&self) -> u32 {
        unsafe { (*(object_ptr(self) as *const ObjectHeader)).ref_count }
    }

    fn property_type(&self, name: &str) -> Result<Type> {
        unsafe {
            let pspec = find_pspec(object_class(object_ptr(self)), self.type_(), name)?;
            Ok(Type::from_raw((*pspec).value_type))
        }
    }
    fn property_value(&self, name: &str) -> Result<Value> {
        unsafe {
            let pspec = find_pspec(object_class(object_ptr(self)), self.type_(), name)?;
            if (*pspec).flags as u32 & PARAM_READABLE == 0 {
                return Err(Error::InvalidValue(format!("property {:?} of {} is not readable", name, self.type_())));
            }
            let mut v = Value::from_type(Type::from_raw((*pspec).value_type));
            gobject_sys::g_object_get_property(object_ptr(self), (*pspec).name, v.as_mut_ptr());
            Ok(v)
        }
    }
    fn property<V: FromValue>(&self, name: &str) -> Result<V> {
        self.property_value(name)?.get()
    }
    ///Sets a property, converting `value` to the property's type if needed.
    fn set_property<V: ToValue + ?Sized>(&self, name: &str, value: &V) -> Result<()> {
        unsafe {
            let pspec = find_pspec(object_class(object_ptr(self)), self.type_(), name)?;
            let flags = (*pspec).flags as u32;
            if flags & PARAM_WRITABLE == 0 || flags & PARAM_CONSTRUCT_ONLY != 0 {
                return Err(Error::InvalidValue(format!("property {:?} of {} is not writable", name, self.type_())));
            }
            let v = value.to_value().coerce(Type::from_raw((*pspec).value_type))?;
            gobject_sys::g_object_set_property(object_ptr(self), (*pspec).name, v.as_ptr());
            Ok(())
        }
    }
    fn list_properties(&self) -> Vec<ParamSpecInfo> {
        unsafe {
            let mut n: c_uint = 0;
            let specs = gobject_sys::g_object_class_list_properties(object_class(object_ptr(self)), &mut n);
            if specs.is_null() {
                return Vec::new();
            }
            let list = std::slice::from_raw_parts(specs, n as usize).iter().map(|p| ParamSpecInfo::from_raw(*p)).collect();
            glib_sys::g_free(specs as glib_sys::gpointer);
            list
        }
    }
    ///Emits `notify` for the property `name`.
    fn notify(&self, name: &str) -> Result<()> {
        unsafe {
            let pspec = find_pspec(object_class(object_ptr(self)), self.type_(), name)?;
            gobject_sys::g_object_notify_by_pspec(object_ptr(self), pspec);
        }
        Ok(())
    }
    ///Queues `notify` emissions until the matching [Self::thaw_notify].  Each property is notified at most once.
    fn freeze_notify(&self) {
        unsafe { gobject_sys::g_object_freeze_notify(object_ptr(self)) }
    }
    fn thaw_notify(&self) {
        unsafe { gobject_sys::g_object_thaw_notify(object_ptr(self)) }
    }

    ///Attaches `data` under `key`, replacing (and dropping) any previous value.  The value is dropped when the
    ///object is finalized.
    fn set_data<D: Send + 'static>(&self, key: &str, data: D) {
        let boxed: Box<DataBox> = Box::new(Box::new(data));
        unsafe {
            gobject_sys::g_object_set_qdata_full(object_ptr(self), Quark::from_str(key).into_raw(),
                                                 Box::into_raw(boxed) as glib_sys::gpointer, Some(drop_data));
        }
    }
    ///A copy of the data under `key`, if there is some and it is a `D`.
    fn data<D: Clone + 'static>(&self, key: &str) -> Option<D> {
        let quark = Quark::try_from_str(key)?;
        unsafe {
            let ptr = gobject_sys::g_object_get_qdata(object_ptr(self), quark.into_raw()) as *const DataBox;
            ptr.as_ref()?.downcast_ref::<D>().cloned()
        }
    }
    ///Removes the data under `key` without dropping it.  Data of another type is left in place.
    fn steal_data<D: 'static>(&self, key: &str) -> Option<D> {
        let quark = Quark::try_from_str(key)?;
        unsafe {
            let ptr = gobject_sys::g_object_steal_qdata(object_ptr(self), quark.into_raw()) as *mut DataBox;
            if ptr.is_null() {
                return None;
            }
            let boxed = Box::from_raw(ptr);
            if boxed.is::<D>() {
                (*boxed).downcast::<D>().ok().map(|d| *d)
            } else {
                gobject_sys::g_object_set_qdata_full(object_ptr(self), quark.into_raw(),
                                                     Box::into_raw(boxed) as glib_sys::gpointer, Some(drop_data));
                None
            }
        }
    }

    ///Connects `f` to `signal` (optionally detailed, as in `notify::label`).
    ///
    /// The callback receives as many of the emitted values as it has parameters: the instance first, then the
    /// signal's parameters.
    #[track_caller]
    fn connect<Args, F: Callback<Args> + Send + Sync>(&self, signal: &str, f: F) -> Result<SignalHandlerId> {
        let location = Location::caller();
        Closure::check_receiver::<Args, F>(self.type_(), location);
        signal::connect(object_ptr(self), self.type_(), signal, Closure::with_location(f, location), false)
    }
    ///Like [Self::connect], running after the class handler.
    #[track_caller]
    fn connect_after<Args, F: Callback<Args> + Send + Sync>(&self, signal: &str, f: F) -> Result<SignalHandlerId> {
        let location = Location::caller();
        Closure::check_receiver::<Args, F>(self.type_(), location);
        signal::connect(object_ptr(self), self.type_(), signal, Closure::with_location(f, location), true)
    }
    ///Connects a callback that is not `Send`.  Emissions on other threads skip it with a warning.
    #[track_caller]
    fn connect_local<Args, F: Callback<Args>>(&self, signal: &str, f: F) -> Result<SignalHandlerId> {
        let location = Location::caller();
        Closure::check_receiver::<Args, F>(self.type_(), location);
        signal::connect(object_ptr(self), self.type_(), signal, Closure::local_with_location(f, location), false)
    }
    fn disconnect(&self, id: SignalHandlerId) {
        debug!("disconnect handler {:?} from {:p}", id, object_ptr(self));
        signal::disconnect(object_ptr(self), id)
    }
    fn block(&self, id: SignalHandlerId) {
        signal::block(object_ptr(self), id)
    }
    fn unblock(&self, id: SignalHandlerId) {
        signal::unblock(object_ptr(self), id)
    }
    fn is_connected(&self, id: SignalHandlerId) -> bool {
        signal::is_connected(object_ptr(self), id)
    }
    ///Stops the current emission of `signal`.  Handlers that have not run yet are skipped.
    fn stop_emission(&self, signal: &str) -> Result<()> {
        signal::stop_emission(object_ptr(self), self.type_(), signal)
    }
    ///Emits `signal` with `args`, which are converted to the signal's parameter types.
    ///
    /// Returns the handlers' return value, or an uninitialized [Value] for signals that return nothing.
    fn emit(&self, signal: &str, args: &[&dyn ToValue]) -> Result<Value> {
        signal::emit(object_ptr(self), self.type_(), signal, args)
    }
}

impl<T: GObjectInstance> ObjectExt for T {}

#[cfg(test)] mod tests {
    use crate::bindings::*;
    use crate::testsupport::counter_type;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

    #[test] fn construct() {
        let o = Object::new();
        assert_eq!(o.ref_count(), 1);
        assert_eq!(o.type_(), Type::OBJECT);
        assert!(o.is::<Object>());
        assert!(!o.is::<InitiallyUnowned>());
        assert!(o.downcast_ref::<InitiallyUnowned>().is_none());
        let u = InitiallyUnowned::new();
        assert_eq!(u.ref_count(), 1);
        assert!(u.downcast_ref::<Object>().is_some());
        assert!(format!("{}", o).starts_with("<GObject: 0x"));
    }

    #[test] fn properties() {
        let o = Object::with_properties(counter_type(), &[]).unwrap();
        assert_eq!(o.property_type("count").unwrap(), Type::INT);
        assert_eq!(o.property::<i32>("count").unwrap(), 7);
        o.set_property("count", &9i32).unwrap();
        assert_eq!(o.property::<i32>("count").unwrap(), 9);
        //u8 converts to int
        o.set_property("count", &3u8).unwrap();
        assert_eq!(o.property::<i64>("count").unwrap(), 3);
        assert!(matches!(o.set_property("count", "three"), Err(Error::TypeMismatch { .. })));
        assert!(matches!(o.property::<i32>("missing"), Err(Error::UnknownProperty { .. })));
        let names: Vec<String> = o.list_properties().into_iter().map(|p| p.name).collect();
        assert!(names.contains(&"count".to_string()));
        let info = o.list_properties().into_iter().find(|p| p.name == "count").unwrap();
        assert!(info.readable() && info.writable());
        assert_eq!(info.owner, counter_type());
    }

    #[test] fn with_properties() {
        let o = Object::with_properties(counter_type(), &[("count", &11i32)]).unwrap();
        assert_eq!(o.property::<i32>("count").unwrap(), 11);
        assert!(matches!(Object::with_properties(counter_type(), &[("nope", &1i32)]),
                         Err(Error::UnknownProperty { .. })));
        assert!(matches!(Object::with_properties(Type::INT, &[]), Err(Error::TypeMismatch { .. })));
    }

    #[test] fn notify_and_freeze() {
        let o = Object::with_properties(counter_type(), &[]).unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        o.connect("notify::count", move || { count2.fetch_add(1, Ordering::SeqCst); }).unwrap();
        o.set_property("count", &1i32).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        o.notify("count").unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
        o.freeze_notify();
        o.set_property("count", &2i32).unwrap();
        o.set_property("count", &3i32).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
        o.thaw_notify();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test] fn data() {
        let o = Object::new();
        o.set_data("k", 5i32);
        assert_eq!(o.data::<i32>("k"), Some(5));
        assert_eq!(o.data::<String>("k"), None);
        assert_eq!(o.steal_data::<String>("k"), None);
        assert_eq!(o.steal_data::<i32>("k"), Some(5));
        assert_eq!(o.data::<i32>("k"), None);

        let payload = Arc::new(());
        o.set_data("arc", payload.clone());
        assert_eq!(Arc::strong_count(&payload), 2);
        o.set_data("arc", 0u8);
        assert_eq!(Arc::strong_count(&payload), 1);
        o.set_data("arc", payload.clone());
        drop(o);
        assert_eq!(Arc::strong_count(&payload), 1);
    }

    #[test] fn connect_emit_disconnect() {
        crate::testsupport::init_logging();
        let o = Object::with_properties(counter_type(), &[]).unwrap();
        let total = Arc::new(AtomicI32::new(0));
        let total2 = total.clone();
        let id = o.connect("bumped", move |_o: StrongCell<Object>, by: i32| { total2.fetch_add(by, Ordering::SeqCst); }).unwrap();
        assert!(o.is_connected(id));
        o.emit("bumped", &[&3i32]).unwrap();
        //converted to the parameter type
        o.emit("bumped", &[&2u8]).unwrap();
        assert_eq!(total.load(Ordering::SeqCst), 5);
        assert!(matches!(o.emit("bumped", &[]), Err(Error::SignalArity { expected: 1, actual: 0, .. })));
        assert!(matches!(o.emit("no-such", &[]), Err(Error::UnknownSignal { .. })));

        o.block(id);
        o.emit("bumped", &[&1i32]).unwrap();
        assert_eq!(total.load(Ordering::SeqCst), 5);
        o.unblock(id);
        o.emit("bumped", &[&1i32]).unwrap();
        assert_eq!(total.load(Ordering::SeqCst), 6);

        assert_eq!(Arc::strong_count(&total), 2);
        o.disconnect(id);
        assert!(!o.is_connected(id));
        //the closure was finalized and its callback dropped
        assert_eq!(Arc::strong_count(&total), 1);
        o.emit("bumped", &[&1i32]).unwrap();
        assert_eq!(total.load(Ordering::SeqCst), 6);
    }

    #[test] fn return_values() {
        let name = crate::testsupport::unique_name("gobr-double");
        Signal::builder(&name, Type::OBJECT).param(Type::INT).return_type(Type::INT).build().unwrap();
        let o = Object::new();
        o.connect(&name, |_o: StrongCell<Object>, x: i32| x * 2).unwrap();
        assert_eq!(o.emit(&name, &[&21i32]).unwrap().get::<i32>().unwrap(), 42);
    }

    #[test] fn stop_emission() {
        let o = Object::with_properties(counter_type(), &[]).unwrap();
        let second = Arc::new(AtomicUsize::new(0));
        let second2 = second.clone();
        o.connect("bumped", |o: StrongCell<Object>| { o.stop_emission("bumped").unwrap(); }).unwrap();
        o.connect("bumped", move || { second2.fetch_add(1, Ordering::SeqCst); }).unwrap();
        o.emit("bumped", &[&1i32]).unwrap();
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test] fn connect_local() {
        use std::rc::Rc;
        use std::cell::Cell;
        let o = Object::with_properties(counter_type(), &[]).unwrap();
        let seen = Rc::new(Cell::new(0));
        let seen2 = seen.clone();
        o.connect_local("bumped", move |_o: StrongCell<Object>, by: i32| seen2.set(by)).unwrap();
        o.emit("bumped", &[&9i32]).unwrap();
        assert_eq!(seen.get(), 9);
    }

    #[test] fn unknown_signal() {
        let o = Object::new();
        assert!(matches!(o.connect("not-a-signal", || ()), Err(Error::UnknownSignal { .. })));
        //notify is detailed, but the detail must name something
        assert!(o.connect("notify::whatever", || ()).is_ok());
    }
}
