/*! object pointer types

1.  StrongCell - owns one native reference.  Takes (or adopts) it on creation, releases it on drop.
2.  WeakCell - a `GWeakRef`.  Does not keep the object alive; [WeakCell::upgrade] yields a [StrongCell] while it is.

Ownership conventions follow the native transfer annotations:

* *transfer none* (the callee keeps its reference): use [StrongCell::retaining] or [StrongCell::from_raw_none].
* *transfer full* (the caller receives a reference): use [StrongCell::assume_retained] or [StrongCell::from_raw_full].

Some objects (`GInitiallyUnowned` subclasses such as GTK widgets, and `GVariant`) are born with a *floating*
reference.  Both conventions sink a floating reference instead of adding to it, so that a freshly constructed
widget ends up with exactly one reference, owned by the cell.

See documentation for particular cells.
 */

use std::marker::PhantomData;
use std::ptr::NonNull;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::atomic::{AtomicU8, Ordering};
use log::trace;
use crate::error::{Error, Result};
use crate::instance::{GObjectInstance, Refcounted};
use crate::types::StaticType;

///Where the final `unref` of a dropped [StrongCell] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStrategy {
    ///`unref` inside `Drop`, on whatever thread dropped the cell.
    Immediate,
    ///Hand the `unref` to the default main context.  It runs immediately when the calling thread owns (or can
    /// acquire) that context, and is queued as an idle otherwise.  Use this when cells of thread-affine objects
    /// (GTK widgets) may be dropped on worker threads.
    DefaultMainContext,
}

static RELEASE_STRATEGY: AtomicU8 = AtomicU8::new(0);

///Sets the process-wide [ReleaseStrategy].  The default is [ReleaseStrategy::Immediate].
pub fn set_release_strategy(strategy: ReleaseStrategy) {
    let raw = match strategy {
        ReleaseStrategy::Immediate => 0,
        ReleaseStrategy::DefaultMainContext => 1,
    };
    RELEASE_STRATEGY.store(raw, Ordering::Relaxed);
}
pub fn release_strategy() -> ReleaseStrategy {
    match RELEASE_STRATEGY.load(Ordering::Relaxed) {
        0 => ReleaseStrategy::Immediate,
        _ => ReleaseStrategy::DefaultMainContext,
    }
}

unsafe extern "C" fn deferred_unref<T: Refcounted>(ptr: glib_sys::gpointer) -> glib_sys::gboolean {
    trace!("deferred unref {} {:p}", std::any::type_name::<T>(), ptr);
    T::unref_raw(ptr as *const T);
    glib_sys::GFALSE
}

unsafe fn release<T: Refcounted>(ptr: *const T) {
    match release_strategy() {
        ReleaseStrategy::Immediate => T::unref_raw(ptr),
        ReleaseStrategy::DefaultMainContext => {
            glib_sys::g_main_context_invoke_full(std::ptr::null_mut(), glib_sys::G_PRIORITY_DEFAULT,
                                                 Some(deferred_unref::<T>), ptr as glib_sys::gpointer, None);
        }
    }
}

/**
A strong pointer to a native object.

This is often the type you want as the return type when implementing a binding.

When this type is created, we will `ref` (unless using an unsafe [StrongCell::assume_retained()] constructor).
When the cell is dropped, we will `unref` exactly once, according to the [ReleaseStrategy].

While any `StrongCell` for an object is alive, the object holds at least one reference.
 */
pub struct StrongCell<T: Refcounted>(NonNull<T>);

impl<T: Refcounted> StrongCell<T> {
    ///Takes a new reference to `cell`.  A floating reference is sunk instead.
    pub fn retaining(cell: &T) -> Self {
        unsafe {
            if T::is_floating_raw(cell) {
                trace!("sink {} {:p}", std::any::type_name::<T>(), cell);
                T::ref_sink_raw(cell);
            } else {
                trace!("retain {} {:p}", std::any::type_name::<T>(), cell);
                T::ref_raw(cell);
            }
            Self::adopt(cell)
        }
    }

    ///Converts to [Self] by assuming the argument is already retained.
    ///
    /// This is usually the case for native functions annotated *transfer full*, like `g_object_new` or `*_new`.
    /// If the reference is floating it is sunk, which claims it without adding a count.
    /// # Safety
    /// You are responsible to check that the caller owns a reference, which is moved into the cell.
    pub unsafe fn assume_retained(reference: &T) -> Self {
        if T::is_floating_raw(reference) {
            trace!("assume_retained (sink) {} {:p}", std::any::type_name::<T>(), reference);
            T::ref_sink_raw(reference);
        } else {
            trace!("assume_retained {} {:p}", std::any::type_name::<T>(), reference);
        }
        Self::adopt(reference)
    }

    ///Adopts a reference without looking at the floating flag.
    pub(crate) unsafe fn adopt(reference: &T) -> Self {
        StrongCell(NonNull::from(reference))
    }

    ///[Self::retaining] for a raw *transfer none* pointer.
    ///
    /// # Safety
    /// `ptr` must be NULL or a valid instance of `T`.
    pub unsafe fn from_raw_none(ptr: *mut T) -> Result<Self> {
        match ptr.as_ref() {
            Some(r) => Ok(Self::retaining(r)),
            None => Err(Error::NullPointer),
        }
    }
    ///[Self::assume_retained] for a raw *transfer full* pointer.
    ///
    /// # Safety
    /// `ptr` must be NULL or a valid instance of `T` whose reference the caller owns.
    pub unsafe fn from_raw_full(ptr: *mut T) -> Result<Self> {
        match ptr.as_ref() {
            Some(r) => Ok(Self::assume_retained(r)),
            None => Err(Error::NullPointer),
        }
    }

    ///The native pointer.  The reference stays owned by the cell.
    #[inline] pub fn as_ptr(cell: &Self) -> *mut T {
        cell.0.as_ptr()
    }

    ///Gives up ownership without releasing.  The caller now owns the reference.
    pub fn into_raw(cell: Self) -> *mut T {
        let ptr = cell.0.as_ptr();
        std::mem::forget(cell);
        ptr
    }

    ///Reinterprets this cell as a cell of another type.
    ///
    /// # Performance
    /// This is a 0-cost abstraction.  The ref/unref calls of converting to the new cell type are elided.
    /// # Safety
    /// The object must actually be an instance of `U`.
    #[inline] pub unsafe fn cast_into<U: Refcounted>(self) -> StrongCell<U> {
        trace!("cast_into {} => {} {:p}", std::any::type_name::<T>(), std::any::type_name::<U>(), self.0.as_ptr());
        let r = StrongCell(self.0.cast());
        std::mem::forget(self);
        r
    }
}

impl<T: GObjectInstance> StrongCell<T> {
    ///Checked conversion to a more derived type.  Gives the cell back if the instance is not a `U`.
    pub fn downcast<U: GObjectInstance>(self) -> std::result::Result<StrongCell<U>, Self> {
        let is_a = unsafe {
            gobject_sys::g_type_check_instance_is_a(self.0.as_ptr() as *mut gobject_sys::GTypeInstance,
                                                    U::static_type().into_raw()) != glib_sys::GFALSE
        };
        if is_a {
            Ok(unsafe { self.cast_into() })
        } else {
            Err(self)
        }
    }
    ///Statically checked conversion to an ancestor type.
    pub fn upcast<U: GObjectInstance>(self) -> StrongCell<U> where T: crate::cast::IsA<U> {
        unsafe { self.cast_into() }
    }
}

impl<T: Refcounted> Clone for StrongCell<T> {
    fn clone(&self) -> Self {
        StrongCell::retaining(self)
    }
}
impl<T: Refcounted> Drop for StrongCell<T> {
    fn drop(&mut self) {
        trace!("Drop StrongCell<{}> {:p}", std::any::type_name::<T>(), self.0.as_ptr());
        unsafe { release(self.0.as_ptr() as *const T) }
    }
}
impl<T: Refcounted> Deref for StrongCell<T> {
    type Target = T;
    #[inline] fn deref(&self) -> &T {
        unsafe { self.0.as_ref() }
    }
}
impl<T: Refcounted> AsRef<T> for StrongCell<T> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T: Refcounted + std::fmt::Display> std::fmt::Display for StrongCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(self.deref(), f)
    }
}
impl<T: Refcounted + Debug> Debug for StrongCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "StrongCell<{}>({:p})", std::any::type_name::<T>(), self.0.as_ptr())
    }
}
impl<T: PartialEq + Refcounted> PartialEq for StrongCell<T> {
    fn eq(&self, other: &Self) -> bool {
        let a: &T = self;
        let b: &T = other;
        a == b
    }
}
impl<T: Eq + Refcounted> Eq for StrongCell<T> {}
impl<T: Hash + Refcounted> Hash for StrongCell<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let a: &T = self;
        a.hash(state);
    }
}

//If the underlying instance is sync, we are Send
unsafe impl<T: Refcounted + Sync> Send for StrongCell<T> {}
///We are also Sync, because of the above situation and because native refcounting is atomic.
unsafe impl<T: Refcounted + Sync> Sync for StrongCell<T> {}

/**
A weak reference to a GObject.

Weak cells do not keep the object alive.  They are typically captured by signal handlers that would otherwise
form a cycle with the object they are connected to.
*/
pub struct WeakCell<T: GObjectInstance> {
    //GWeakRef must not move after init
    weak: NonNull<gobject_sys::GWeakRef>,
    marker: PhantomData<*const T>,
}

impl<T: GObjectInstance> WeakCell<T> {
    pub fn new(object: &T) -> Self {
        Self::with_ptr(object as *const T as glib_sys::gpointer)
    }
    ///A weak cell that never upgrades.
    pub fn empty() -> Self {
        Self::with_ptr(std::ptr::null_mut())
    }
    fn with_ptr(object: glib_sys::gpointer) -> Self {
        let boxed: Box<gobject_sys::GWeakRef> = Box::new(unsafe { std::mem::zeroed() });
        let weak = NonNull::from(Box::leak(boxed));
        unsafe { gobject_sys::g_weak_ref_init(weak.as_ptr(), object as *mut gobject_sys::GObject) };
        WeakCell { weak, marker: PhantomData }
    }
    ///A strong reference, if the object is still alive.
    pub fn upgrade(&self) -> Option<StrongCell<T>> {
        unsafe {
            //g_weak_ref_get returns a full reference
            let ptr = gobject_sys::g_weak_ref_get(self.weak.as_ptr()) as *const T;
            ptr.as_ref().map(|r| StrongCell::adopt(r))
        }
    }
}
impl<T: GObjectInstance> Clone for WeakCell<T> {
    fn clone(&self) -> Self {
        match self.upgrade() {
            Some(strong) => WeakCell::new(&*strong),
            None => WeakCell::empty(),
        }
    }
}
impl<T: GObjectInstance> Drop for WeakCell<T> {
    fn drop(&mut self) {
        unsafe {
            gobject_sys::g_weak_ref_clear(self.weak.as_ptr());
            drop(Box::from_raw(self.weak.as_ptr()));
        }
    }
}
impl<T: GObjectInstance> Debug for WeakCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "WeakCell<{}>", std::any::type_name::<T>())
    }
}
//GWeakRef is threadsafe
unsafe impl<T: GObjectInstance + Sync> Send for WeakCell<T> {}
unsafe impl<T: GObjectInstance + Sync> Sync for WeakCell<T> {}

#[cfg(test)] mod tests {
    use crate::bindings::*;

    #[test] fn retain_release() {
        let o = Object::new();
        assert_eq!(o.ref_count(), 1);
        let o2 = o.clone();
        assert_eq!(o.ref_count(), 2);
        assert_eq!(o, o2);
        drop(o2);
        assert_eq!(o.ref_count(), 1);
        let o3 = StrongCell::retaining(&*o);
        assert_eq!(o.ref_count(), 2);
        drop(o3);
        assert_eq!(o.ref_count(), 1);
    }

    #[test] fn floating_is_sunk() {
        //a raw floating instance with one (floating) reference
        let raw = unsafe { crate::object::new_raw(InitiallyUnowned::static_type()) } as *mut InitiallyUnowned;
        let cell = unsafe { StrongCell::from_raw_full(raw) }.unwrap();
        assert_eq!(cell.ref_count(), 1);
        assert!(!unsafe { __object_is_floating(StrongCell::as_ptr(&cell) as *mut _) });

        //retaining a floating object also sinks
        let raw = unsafe { crate::object::new_raw(InitiallyUnowned::static_type()) } as *mut InitiallyUnowned;
        let cell = unsafe { StrongCell::from_raw_none(raw) }.unwrap();
        assert_eq!(cell.ref_count(), 1);
    }

    #[test] fn null_is_error() {
        let r = unsafe { StrongCell::<Object>::from_raw_none(std::ptr::null_mut()) };
        assert!(matches!(r, Err(Error::NullPointer)));
        let r = unsafe { StrongCell::<Object>::from_raw_full(std::ptr::null_mut()) };
        assert!(matches!(r, Err(Error::NullPointer)));
    }

    #[test] fn into_raw_keeps_reference() {
        let o = Object::new();
        let keep = o.clone();
        let raw = StrongCell::into_raw(o);
        assert_eq!(keep.ref_count(), 2);
        let back = unsafe { StrongCell::from_raw_full(raw) }.unwrap();
        drop(back);
        assert_eq!(keep.ref_count(), 1);
    }

    #[test] fn downcast() {
        let o: StrongCell<Object> = InitiallyUnowned::new().upcast();
        let o = o.downcast::<InitiallyUnowned>().unwrap();
        let plain = Object::new();
        assert!(plain.downcast::<InitiallyUnowned>().is_err());
        let _: StrongCell<Object> = o.upcast();
    }

    #[test] fn weak() {
        let o = Object::new();
        let weak = WeakCell::new(&*o);
        let weak2 = weak.clone();
        {
            let strong = weak.upgrade().unwrap();
            assert_eq!(strong, o);
            assert_eq!(o.ref_count(), 2);
        }
        drop(o);
        assert!(weak.upgrade().is_none());
        assert!(weak2.upgrade().is_none());
        assert!(WeakCell::<Object>::empty().upgrade().is_none());
    }
}
