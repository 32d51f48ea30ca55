use core::ffi::c_void;
use crate::types::{StaticType, Type};

///Native types whose lifetime is managed by a reference count.
///
/// This is implemented for every GObject type by `#[derive(GObjectInstance)]`, and by hand for
/// ref-counted boxed types like [Variant](crate::glib::Variant) and [MainContext](crate::glib::MainContext).
///
/// # Safety
/// The functions must implement the native reference counting protocol for `Self`.  For types without
/// floating references, `ref_sink_raw` must behave like `ref_raw` and `is_floating_raw` must return `false`.
pub unsafe trait Refcounted {
    unsafe fn ref_raw(ptr: *const Self);
    unsafe fn unref_raw(ptr: *const Self);
    unsafe fn ref_sink_raw(ptr: *const Self);
    unsafe fn is_floating_raw(ptr: *const Self) -> bool;
}

///Marks that a given type is a GObject type, e.g. its instances are `GObject*` (or derived) pointers.
///
/// Conforming types are usually declared via the [gobject_instance!] macro.
///
/// # Safety
/// A `&Self` must be a valid pointer to an instance of [StaticType::static_type] or a subtype.
pub unsafe trait GObjectInstance: StaticType + Refcounted {}

///Behavior we define for any [GObjectInstance]
pub trait GObjectInstanceBehavior {
    ///The native pointer, typed however the caller needs it.
    ///
    /// This is how bindings get a `*mut GtkWidget` out of a `&Widget`.
    fn as_native<N>(&self) -> *mut N;

    ///Reinterprets `self` as another type.
    ///
    /// # Safety
    /// There is no guarantee that the source type is compatible with the destination type.
    /// For checked conversions use [ObjectExt::downcast_ref](crate::glib::ObjectExt::downcast_ref).
    unsafe fn cast<R: GObjectInstance>(&self) -> &R;

    ///Borrows a native pointer as `&Self`.
    ///
    /// # Safety
    /// `ptr` must be a valid, non-NULL instance of `Self` that outlives `'a`.
    unsafe fn from_native<'a, N>(ptr: *mut N) -> &'a Self;
}

impl<T: GObjectInstance> GObjectInstanceBehavior for T {
    #[inline] fn as_native<N>(&self) -> *mut N {
        self as *const Self as *mut N
    }
    #[inline] unsafe fn cast<R: GObjectInstance>(&self) -> &R {
        &*(self as *const Self as *const R)
    }
    #[inline] unsafe fn from_native<'a, N>(ptr: *mut N) -> &'a Self {
        &*(ptr as *const Self)
    }
}

//these back the derive.  They take `c_void` so the expansion does not need the sys crates.

#[doc(hidden)]
#[inline] pub unsafe fn __object_ref(ptr: *mut c_void) {
    log::trace!("ref {:p}", ptr);
    gobject_sys::g_object_ref(ptr as *mut gobject_sys::GObject);
}
#[doc(hidden)]
#[inline] pub unsafe fn __object_unref(ptr: *mut c_void) {
    log::trace!("unref {:p}", ptr);
    gobject_sys::g_object_unref(ptr as *mut gobject_sys::GObject);
}
#[doc(hidden)]
#[inline] pub unsafe fn __object_ref_sink(ptr: *mut c_void) {
    log::trace!("ref_sink {:p}", ptr);
    gobject_sys::g_object_ref_sink(ptr as *mut gobject_sys::GObject);
}
#[doc(hidden)]
#[inline] pub unsafe fn __object_is_floating(ptr: *mut c_void) -> bool {
    gobject_sys::g_object_is_floating(ptr as *mut gobject_sys::GObject) != glib_sys::GFALSE
}

///Runtime type of an instance (`G_TYPE_FROM_INSTANCE`).
pub(crate) unsafe fn instance_type(ptr: *const c_void) -> Type {
    let instance = ptr as *const gobject_sys::GTypeInstance;
    Type::from_raw((*(*instance).g_class).g_type)
}

/**
Defines a struct (binding) for a specific GObject type.

The type will automagically conform to [GObjectInstance], and will be convertible to a `GValue`.

# Example

```
use gobr::bindings::*;
gobject_instance! {
    pub struct MyObject: gobject_sys::g_object_get_type;
}
let o = Object::new();
let mine: &MyObject = o.downcast_ref().unwrap();
assert_eq!(mine.type_(), Type::OBJECT);
```

# Representing GObject types

GObject types are declared as 'opaque' types.  While these types technically have a memory layout in Rust,
the memory layout is not the same as the corresponding C layout.  Therefore, such types are "effectively" DSTs,
and cannot be stored on the stack or dereferenced.  In short:

1. `example: MyObject`.  This type effectively is not instantiable.
2. `example: &MyObject`.  A borrowed native pointer.  It does not hold a reference; the borrow checker only tracks
   that you got it from something that does.
3. `example: StrongCell<MyObject>`.  An owned reference.  See [StrongCell](crate::bindings::StrongCell).

Nearly every native method takes `self` by shared reference.  GObjects are mutated through shared pointers all
the time (that is what signals and properties are), so modeling them with `&mut` would be fiction.

## Threads

Declared types are neither `Send` nor `Sync`.  Types that GLib documents as threadsafe (e.g. `GCancellable`)
opt in with an `unsafe impl`, which in turn makes `StrongCell<T>` sendable.
 */
#[macro_export]
macro_rules! gobject_instance {
    (
        $(#[$attribute:meta])*
        $pub:vis
        struct $gtype:ident : $get_type:path;
    ) => {
        $(#[$attribute])*
        #[repr(transparent)]
        #[derive(::gobr::bindings::GObjectInstance, Debug)]
        #[gtype($get_type)]
        $pub struct $gtype(core::ffi::c_void, ::core::marker::PhantomData<*const ()>);
    };
}

#[test] fn instance_type_matches_static_type() {
    use crate::bindings::*;
    let o = Object::new();
    let t = unsafe { instance_type(o.as_native::<c_void>()) };
    assert_eq!(t, Object::static_type());
    assert!(!unsafe { __object_is_floating(o.as_native::<c_void>()) });
}
