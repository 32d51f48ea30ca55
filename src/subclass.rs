/*!
Registers new GObject types from Rust.

```
use gobr::bindings::*;
let ty = TypeBuilder::new("DocsCounter")
    .property(PropertySpec::int("count", 0, 100, 7))
    .signal(SignalSpec::new("bumped").param(Type::INT))
    .register()
    .unwrap();
let counter = Object::with_properties(ty, &[("count", &10i32)]).unwrap();
assert_eq!(counter.property::<i32>("count").unwrap(), 10);
```

The new type derives from `GObject` (or any other object type not itself registered here).  Its properties are
stored by this module, one [Value] per property per instance, in the instance's private data.  They start out as
the default in the [PropertySpec] and are freed when the instance is finalized.  Behavior is added from the
outside, by connecting to the type's signals and to `notify`.
*/

use std::collections::HashMap;
use std::ffi::{c_char, c_int, c_uint, CString};
use std::sync::atomic::{AtomicI32, AtomicPtr, Ordering};
use std::sync::{Arc, OnceLock};
use gobject_sys::{GObject, GObjectClass, GParamSpec, GTypeInstance, GValue};
use log::{debug, error};
use parking_lot::{Mutex, RwLock};
use crate::error::{Error, Result};
use crate::signal::{valid_name, Signal, SignalFlags};
use crate::strings::{optional_ptr, to_cstring, to_optional_cstring};
use crate::types::Type;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
enum Kind {
    Bool(bool),
    Int { min: i32, max: i32, default: i32 },
    UInt { min: u32, max: u32, default: u32 },
    Int64 { min: i64, max: i64, default: i64 },
    Double { min: f64, max: f64, default: f64 },
    String(Option<String>),
    Object(Type),
}

const READABLE: u32 = 1;
const WRITABLE: u32 = 2;
const CONSTRUCT_ONLY: u32 = 8;

///Describes a property of a type built with [TypeBuilder].  Properties are readable and writable unless
///restricted.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySpec {
    name: String,
    nick: Option<String>,
    blurb: Option<String>,
    kind: Kind,
    flags: u32,
}

impl PropertySpec {
    fn new(name: &str, kind: Kind) -> Self {
        PropertySpec { name: name.to_owned(), nick: None, blurb: None, kind, flags: READABLE | WRITABLE }
    }
    pub fn bool(name: &str, default: bool) -> Self {
        Self::new(name, Kind::Bool(default))
    }
    pub fn int(name: &str, min: i32, max: i32, default: i32) -> Self {
        Self::new(name, Kind::Int { min, max, default })
    }
    pub fn uint(name: &str, min: u32, max: u32, default: u32) -> Self {
        Self::new(name, Kind::UInt { min, max, default })
    }
    pub fn int64(name: &str, min: i64, max: i64, default: i64) -> Self {
        Self::new(name, Kind::Int64 { min, max, default })
    }
    pub fn double(name: &str, min: f64, max: f64, default: f64) -> Self {
        Self::new(name, Kind::Double { min, max, default })
    }
    pub fn string(name: &str, default: Option<&str>) -> Self {
        Self::new(name, Kind::String(default.map(str::to_owned)))
    }
    ///An object property holding instances of `ty` (or NULL, the default).
    pub fn object(name: &str, ty: Type) -> Self {
        Self::new(name, Kind::Object(ty))
    }
    pub fn nick(mut self, nick: &str) -> Self {
        self.nick = Some(nick.to_owned());
        self
    }
    pub fn blurb(mut self, blurb: &str) -> Self {
        self.blurb = Some(blurb.to_owned());
        self
    }
    pub fn read_only(mut self) -> Self {
        self.flags = READABLE;
        self
    }
    ///Settable only while constructing, e.g. with [Object::with_properties](crate::glib::Object::with_properties).
    pub fn construct_only(mut self) -> Self {
        self.flags = READABLE | WRITABLE | CONSTRUCT_ONLY;
        self
    }

    fn validate(&self) -> Result<()> {
        if !valid_name(&self.name) {
            return Err(Error::Registration(format!("{:?} is not a valid property name", self.name)));
        }
        let in_range = match &self.kind {
            Kind::Int { min, max, default } => min <= default && default <= max,
            Kind::UInt { min, max, default } => min <= default && default <= max,
            Kind::Int64 { min, max, default } => min <= default && default <= max,
            Kind::Double { min, max, default } => min <= default && default <= max,
            Kind::Object(ty) => ty.is_a(Type::OBJECT) || ty.fundamental() == Type::INTERFACE,
            Kind::Bool(_) | Kind::String(_) => true,
        };
        if in_range {
            Ok(())
        } else {
            Err(Error::Registration(format!("invalid range or type for property {:?}", self.name)))
        }
    }

    ///Creates the native param spec.  Floating; installing it sinks it.
    unsafe fn to_pspec(&self) -> Result<*mut GParamSpec> {
        let name = to_cstring(&self.name)?;
        let nick = to_optional_cstring(self.nick.as_deref())?;
        let blurb = to_optional_cstring(self.blurb.as_deref())?;
        let (n, k, b, flags) = (name.as_ptr(), optional_ptr(&nick), optional_ptr(&blurb), self.flags as _);
        let pspec = match &self.kind {
            Kind::Bool(d) => gobject_sys::g_param_spec_boolean(n, k, b, *d as glib_sys::gboolean, flags),
            Kind::Int { min, max, default } => gobject_sys::g_param_spec_int(n, k, b, *min, *max, *default, flags),
            Kind::UInt { min, max, default } => gobject_sys::g_param_spec_uint(n, k, b, *min, *max, *default, flags),
            Kind::Int64 { min, max, default } => gobject_sys::g_param_spec_int64(n, k, b, *min, *max, *default, flags),
            Kind::Double { min, max, default } => gobject_sys::g_param_spec_double(n, k, b, *min, *max, *default, flags),
            Kind::String(d) => {
                let d = to_optional_cstring(d.as_deref())?;
                gobject_sys::g_param_spec_string(n, k, b, optional_ptr(&d), flags)
            }
            Kind::Object(ty) => gobject_sys::g_param_spec_object(n, k, b, ty.into_raw(), flags),
        };
        if pspec.is_null() {
            Err(Error::Registration(format!("could not create property {:?}", self.name)))
        } else {
            Ok(pspec)
        }
    }
}

///Describes a signal of a type built with [TypeBuilder].  Signals run last by default.
#[derive(Debug, Clone)]
pub struct SignalSpec {
    name: String,
    flags: SignalFlags,
    params: Vec<Type>,
    return_type: Type,
}

impl SignalSpec {
    pub fn new(name: &str) -> Self {
        SignalSpec { name: name.to_owned(), flags: SignalFlags::RUN_LAST, params: Vec::new(), return_type: Type::NONE }
    }
    pub fn flags(mut self, flags: SignalFlags) -> Self {
        self.flags = flags;
        self
    }
    pub fn param(mut self, ty: Type) -> Self {
        self.params.push(ty);
        self
    }
    pub fn return_type(mut self, ty: Type) -> Self {
        self.return_type = ty;
        self
    }
}

struct RawPspec(*mut GParamSpec);
//param specs of a static class live forever and are immutable
unsafe impl Send for RawPspec {}
unsafe impl Sync for RawPspec {}

struct TypeData {
    properties: Vec<PropertySpec>,
    pspecs: OnceLock<Vec<RawPspec>>,
    private_offset: AtomicI32,
    parent_class: AtomicPtr<GObjectClass>,
}

///Per-instance property storage, one slot per property in declaration order.
struct InstanceData {
    values: Mutex<Vec<Value>>,
}

static TYPES: OnceLock<RwLock<HashMap<Type, Arc<TypeData>>>> = OnceLock::new();

fn types() -> &'static RwLock<HashMap<Type, Arc<TypeData>>> {
    TYPES.get_or_init(|| RwLock::new(HashMap::new()))
}

fn type_data(ty: Type) -> Option<Arc<TypeData>> {
    types().read().get(&ty).cloned()
}
///The data of the first registered type among `ty` and its ancestors.
fn type_data_of_ancestry(ty: Type) -> Option<(Type, Arc<TypeData>)> {
    let map = types().read();
    ty.ancestors().find_map(|t| map.get(&t).map(|d| (t, d.clone())))
}

unsafe fn private_slot(instance: *mut GObject, data: &TypeData) -> *mut *mut InstanceData {
    let offset = data.private_offset.load(Ordering::Acquire) as isize;
    (instance as *mut u8).offset(offset) as *mut *mut InstanceData
}

unsafe extern "C" fn class_init(g_class: glib_sys::gpointer, _class_data: glib_sys::gpointer) {
    let ty = Type::from_raw((*(g_class as *mut gobject_sys::GTypeClass)).g_type);
    let Some(data) = type_data(ty) else {
        error!("class_init for unknown type {}", ty);
        return;
    };
    let mut offset = data.private_offset.load(Ordering::Acquire) as c_int;
    gobject_sys::g_type_class_adjust_private_offset(g_class, &mut offset);
    data.private_offset.store(offset, Ordering::Release);
    data.parent_class.store(gobject_sys::g_type_class_peek_parent(g_class) as *mut GObjectClass, Ordering::Release);

    let class = g_class as *mut GObjectClass;
    (*class).set_property = Some(set_property);
    (*class).get_property = Some(get_property);
    (*class).finalize = Some(finalize);

    let mut pspecs = Vec::with_capacity(data.properties.len());
    for (i, spec) in data.properties.iter().enumerate() {
        match spec.to_pspec() {
            Ok(pspec) => {
                gobject_sys::g_object_class_install_property(class, (i + 1) as c_uint, pspec);
                pspecs.push(RawPspec(pspec));
            }
            Err(e) => {
                //validated before registration
                error!("{}: {}", ty, e);
                pspecs.push(RawPspec(std::ptr::null_mut()));
            }
        }
    }
    let _ = data.pspecs.set(pspecs);
    debug!("class_init {}", ty);
}

unsafe extern "C" fn instance_init(instance: *mut GTypeInstance, g_class: glib_sys::gpointer) {
    let actual = Type::from_raw((*(g_class as *mut gobject_sys::GTypeClass)).g_type);
    let Some((_, data)) = type_data_of_ancestry(actual) else { return };
    let values = data.pspecs.get().map(|pspecs| pspecs.iter().map(|p| {
        if p.0.is_null() {
            return Value::uninitialized();
        }
        let mut v = Value::from_type(Type::from_raw((*p.0).value_type));
        gobject_sys::g_param_value_set_default(p.0, v.as_mut_ptr());
        v
    }).collect()).unwrap_or_default();
    let boxed = Box::new(InstanceData { values: Mutex::new(values) });
    *private_slot(instance as *mut GObject, &data) = Box::into_raw(boxed);
}

unsafe fn instance_data<'a>(object: *mut GObject, pspec: *mut GParamSpec) -> Option<&'a InstanceData> {
    let data = type_data(Type::from_raw((*pspec).owner_type))?;
    (*private_slot(object, &data)).as_ref()
}

unsafe extern "C" fn set_property(object: *mut GObject, property_id: c_uint, value: *mut GValue, pspec: *mut GParamSpec) {
    let Some(instance) = instance_data(object, pspec) else { return };
    let mut values = instance.values.lock();
    match values.get_mut(property_id as usize - 1) {
        Some(slot) => *slot = Value::from_raw_none(value),
        None => error!("invalid property id {} for {:p}", property_id, object),
    }
}

unsafe extern "C" fn get_property(object: *mut GObject, property_id: c_uint, value: *mut GValue, pspec: *mut GParamSpec) {
    let Some(instance) = instance_data(object, pspec) else { return };
    let values = instance.values.lock();
    match values.get(property_id as usize - 1) {
        Some(stored) if stored.is_valid() => gobject_sys::g_value_copy(stored.as_ptr(), value),
        _ => error!("invalid property id {} for {:p}", property_id, object),
    }
}

unsafe extern "C" fn finalize(object: *mut GObject) {
    let actual = crate::instance::instance_type(object as *const std::ffi::c_void);
    let Some((ty, data)) = type_data_of_ancestry(actual) else { return };
    let slot = private_slot(object, &data);
    if !(*slot).is_null() {
        drop(Box::from_raw(*slot));
        *slot = std::ptr::null_mut();
    }
    log::trace!("finalize {} ({}) {:p}", actual, ty, object);
    let parent = data.parent_class.load(Ordering::Acquire);
    if let Some(parent_finalize) = parent.as_ref().and_then(|p| p.finalize) {
        parent_finalize(object);
    }
}

/**
Builds and registers a new object type.

Registration fails if the name is taken, if the parent is not an object type, or if the parent was itself
registered by a `TypeBuilder`.
*/
#[derive(Debug, Clone)]
pub struct TypeBuilder {
    name: String,
    parent: Type,
    properties: Vec<PropertySpec>,
    signals: Vec<SignalSpec>,
}

impl TypeBuilder {
    pub fn new(name: &str) -> Self {
        TypeBuilder { name: name.to_owned(), parent: Type::OBJECT, properties: Vec::new(), signals: Vec::new() }
    }
    ///Defaults to `GObject`.
    pub fn parent(mut self, parent: Type) -> Self {
        self.parent = parent;
        self
    }
    pub fn property(mut self, spec: PropertySpec) -> Self {
        self.properties.push(spec);
        self
    }
    pub fn signal(mut self, spec: SignalSpec) -> Self {
        self.signals.push(spec);
        self
    }

    fn check_signals(&self) -> Result<()> {
        //ancestor signals are only visible once the parent class is loaded
        let parent_class = unsafe { gobject_sys::g_type_class_ref(self.parent.into_raw()) };
        let result = self.signals.iter().enumerate().try_for_each(|(i, s)| {
            if !valid_name(&s.name) {
                return Err(Error::Registration(format!("{:?} is not a valid signal name", s.name)));
            }
            //GLib treats `_` and `-` alike
            let canonical = s.name.replace('_', "-");
            if self.signals[..i].iter().any(|t| t.name.replace('_', "-") == canonical) {
                return Err(Error::Registration(format!("duplicate signal {:?}", s.name)));
            }
            if Signal::lookup(&s.name, self.parent).is_some() {
                return Err(Error::Registration(format!("{} already has a signal {:?}", self.parent, s.name)));
            }
            match s.params.iter().chain(std::iter::once(&s.return_type)).find(|t| !t.is_valid()) {
                Some(bad) => Err(Error::Registration(format!("signal {:?} uses invalid type {:?}", s.name, bad))),
                None => Ok(()),
            }
        });
        unsafe { gobject_sys::g_type_class_unref(parent_class) };
        result
    }

    pub fn register(self) -> Result<Type> {
        if Type::from_name(&self.name).is_some() {
            return Err(Error::Registration(format!("a type named {:?} already exists", self.name)));
        }
        if !self.parent.is_a(Type::OBJECT) {
            return Err(Error::TypeMismatch { expected: Type::OBJECT, actual: self.parent });
        }
        if type_data_of_ancestry(self.parent).is_some() {
            return Err(Error::Registration(format!("{} cannot derive from {}, which was built by TypeBuilder",
                                                   self.name, self.parent)));
        }
        for (i, p) in self.properties.iter().enumerate() {
            p.validate()?;
            if self.properties[..i].iter().any(|q| q.name == p.name) {
                return Err(Error::Registration(format!("duplicate property {:?}", p.name)));
            }
        }
        //nothing may fail once the type exists, its name could never be registered again
        self.check_signals()?;
        let name: CString = to_cstring(&self.name)?;
        let ty = unsafe {
            let mut query: gobject_sys::GTypeQuery = std::mem::zeroed();
            gobject_sys::g_type_query(self.parent.into_raw(), &mut query);
            if query.type_ == 0 {
                return Err(Error::Registration(format!("cannot query {}", self.parent)));
            }
            let raw = gobject_sys::g_type_register_static_simple(self.parent.into_raw(), name.as_ptr() as *const c_char,
                                                                 query.class_size, Some(class_init),
                                                                 query.instance_size, Some(instance_init), 0);
            if raw == 0 {
                return Err(Error::Registration(format!("g_type_register_static_simple rejected {:?}", self.name)));
            }
            Type::from_raw(raw)
        };
        let offset = unsafe {
            gobject_sys::g_type_add_instance_private(ty.into_raw(), std::mem::size_of::<*mut InstanceData>())
        };
        let data = TypeData {
            properties: self.properties,
            pspecs: OnceLock::new(),
            private_offset: AtomicI32::new(offset),
            parent_class: AtomicPtr::new(std::ptr::null_mut()),
        };
        types().write().insert(ty, Arc::new(data));
        for s in &self.signals {
            Signal::builder(&s.name, ty).flags(s.flags).params(&s.params).return_type(s.return_type).build()?;
        }
        //class_init takes the registry lock
        unsafe { gobject_sys::g_type_class_ref(ty.into_raw()) };
        debug!("registered type {} derived from {}", ty, self.parent);
        Ok(ty)
    }
}

#[cfg(test)] mod tests {
    use crate::bindings::*;
    use crate::testsupport::unique_name;

    #[test] fn property_kinds() {
        let ty = TypeBuilder::new(&unique_name("GobrKinds"))
            .property(PropertySpec::bool("flag", true))
            .property(PropertySpec::uint("size", 0, 10, 3))
            .property(PropertySpec::int64("big", i64::MIN, i64::MAX, -1))
            .property(PropertySpec::double("ratio", 0.0, 1.0, 0.5).nick("Ratio").blurb("A ratio"))
            .property(PropertySpec::string("label", Some("untitled")))
            .property(PropertySpec::object("peer", Type::OBJECT))
            .property(PropertySpec::string("id", None).construct_only())
            .property(PropertySpec::int("fixed", 0, 5, 5).read_only())
            .register()
            .unwrap();
        let o = Object::with_properties(ty, &[("id", &"abc")]).unwrap();
        assert_eq!(o.property::<bool>("flag").unwrap(), true);
        assert_eq!(o.property::<u32>("size").unwrap(), 3);
        assert_eq!(o.property::<i64>("big").unwrap(), -1);
        assert_eq!(o.property::<f64>("ratio").unwrap(), 0.5);
        assert_eq!(o.property::<String>("label").unwrap(), "untitled");
        assert!(o.property::<Option<StrongCell<Object>>>("peer").unwrap().is_none());
        assert_eq!(o.property::<String>("id").unwrap(), "abc");
        assert_eq!(o.property::<i32>("fixed").unwrap(), 5);
        assert!(o.set_property("id", "other").is_err());
        assert!(o.set_property("fixed", &1i32).is_err());

        o.set_property("label", "renamed").unwrap();
        assert_eq!(o.property::<String>("label").unwrap(), "renamed");
        let info = o.list_properties().into_iter().find(|p| p.name == "ratio").unwrap();
        assert_eq!(info.nick.as_deref(), Some("Ratio"));
        assert_eq!(info.blurb.as_deref(), Some("A ratio"));
    }

    #[test] fn instances_are_independent() {
        let ty = crate::testsupport::counter_type();
        let a = Object::with_properties(ty, &[]).unwrap();
        let b = Object::with_properties(ty, &[]).unwrap();
        a.set_property("count", &1i32).unwrap();
        assert_eq!(a.property::<i32>("count").unwrap(), 1);
        assert_eq!(b.property::<i32>("count").unwrap(), 7);
    }

    #[test] fn finalize_releases_values() {
        let ty = TypeBuilder::new(&unique_name("GobrHolder"))
            .property(PropertySpec::object("held", Type::OBJECT))
            .register()
            .unwrap();
        let holder = Object::with_properties(ty, &[]).unwrap();
        let held = Object::new();
        let weak = WeakCell::new(&*held);
        holder.set_property("held", &held).unwrap();
        drop(held);
        assert!(weak.upgrade().is_some());
        drop(holder);
        assert!(weak.upgrade().is_none());
    }

    #[test] fn unowned_parent() {
        let ty = TypeBuilder::new(&unique_name("GobrUnowned"))
            .parent(InitiallyUnowned::static_type())
            .property(PropertySpec::bool("on", false))
            .register()
            .unwrap();
        assert_eq!(ty.parent(), Some(InitiallyUnowned::static_type()));
        let o = Object::with_properties(ty, &[("on", &true)]).unwrap();
        //the floating reference was sunk
        assert_eq!(o.ref_count(), 1);
        assert!(o.property::<bool>("on").unwrap());
    }

    #[test] fn rejected() {
        let name = unique_name("GobrOnce");
        let ty = TypeBuilder::new(&name).register().unwrap();
        assert!(matches!(TypeBuilder::new(&name).register(), Err(Error::Registration(_))));
        assert!(matches!(TypeBuilder::new(&unique_name("GobrChild")).parent(ty).register(),
                         Err(Error::Registration(_))));
        assert!(matches!(TypeBuilder::new(&unique_name("GobrInt")).parent(Type::INT).register(),
                         Err(Error::TypeMismatch { .. })));
        assert!(matches!(TypeBuilder::new(&unique_name("GobrDup"))
                             .property(PropertySpec::bool("x", false))
                             .property(PropertySpec::bool("x", true))
                             .register(),
                         Err(Error::Registration(_))));
        assert!(matches!(TypeBuilder::new(&unique_name("GobrRange"))
                             .property(PropertySpec::int("x", 0, 1, 2))
                             .register(),
                         Err(Error::Registration(_))));
    }

    #[test] fn rejected_signals_leave_name_free() {
        let name = unique_name("GobrSignals");
        let twice = TypeBuilder::new(&name)
            .signal(SignalSpec::new("changed"))
            .signal(SignalSpec::new("changed").param(Type::INT));
        assert!(matches!(twice.register(), Err(Error::Registration(_))));
        assert!(Type::from_name(&name).is_none());
        let spelled_apart = TypeBuilder::new(&name)
            .signal(SignalSpec::new("size-changed"))
            .signal(SignalSpec::new("size_changed"));
        assert!(matches!(spelled_apart.register(), Err(Error::Registration(_))));
        assert!(Type::from_name(&name).is_none());
        //"notify" belongs to GObject
        assert!(matches!(TypeBuilder::new(&name).signal(SignalSpec::new("notify")).register(),
                         Err(Error::Registration(_))));
        assert!(matches!(TypeBuilder::new(&name).signal(SignalSpec::new("odd").param(Type::INVALID)).register(),
                         Err(Error::Registration(_))));
        assert!(Type::from_name(&name).is_none());

        let ty = TypeBuilder::new(&name).signal(SignalSpec::new("changed")).register().unwrap();
        assert_eq!(Signal::lookup("changed", ty).unwrap().query().owner, ty);
    }

    #[test] fn signals() {
        let ty = crate::testsupport::counter_type();
        let q = Signal::lookup("bumped", ty).unwrap().query();
        assert_eq!(q.owner, ty);
        assert_eq!(q.param_types, vec![Type::INT]);
    }
}
