/*! Event sources: idles, timeouts, and the functions that attach them to the default context.

Source callbacks go through the same closure bridge as signal handlers.  A callback that returns `true` stays
scheduled; one that returns `false` or nothing is removed after running.

```
use gobr::glib::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

let ctx = MainContext::new();
let ticks = Arc::new(AtomicU32::new(0));
let ticks2 = ticks.clone();
let source = Source::idle();
source.set_callback(move || ticks2.fetch_add(1, Ordering::SeqCst) < 2);
source.attach(Some(&*ctx));
while ctx.iteration(false) {}
assert_eq!(ticks.load(Ordering::SeqCst), 3);
assert!(source.is_destroyed());
```
*/

use std::ffi::{c_uint, c_void};
use std::marker::PhantomData;
use std::panic::Location;
use std::time::Duration;
use glib_sys::GSource;
use crate::arguments::Callback;
use crate::closure::Closure;
use crate::error::Result;
use crate::instance::Refcounted;
use crate::mainloop::MainContext;
use crate::objectpointers::StrongCell;
use crate::strings::{from_glib_none, to_cstring};

crate::glib_enum! {
    ///Dispatch priority.  Lower values run first.
    pub struct Priority<i32>;
    impl Priority {
        HIGH = -100,
        DEFAULT = 0,
        HIGH_IDLE = 100,
        DEFAULT_IDLE = 200,
        LOW = 300
    }
}

///Identifies a source attached to a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(c_uint);

impl SourceId {
    #[inline] pub const fn from_raw(raw: c_uint) -> Self { SourceId(raw) }
    #[inline] pub const fn into_raw(self) -> c_uint { self.0 }
}

///A `GSource`.
#[repr(transparent)]
pub struct Source(c_void, PhantomData<*const ()>);

unsafe impl Refcounted for Source {
    unsafe fn ref_raw(ptr: *const Self) {
        log::trace!("source ref {:p}", ptr);
        glib_sys::g_source_ref(ptr as *mut GSource);
    }
    unsafe fn unref_raw(ptr: *const Self) {
        log::trace!("source unref {:p}", ptr);
        glib_sys::g_source_unref(ptr as *mut GSource);
    }
    unsafe fn ref_sink_raw(ptr: *const Self) { Self::ref_raw(ptr) }
    unsafe fn is_floating_raw(_ptr: *const Self) -> bool { false }
}
//attach, destroy and the accessors lock the owning context
unsafe impl Send for Source {}
unsafe impl Sync for Source {}

unsafe fn wrap(ptr: *mut GSource) -> StrongCell<Source> {
    StrongCell::assume_retained(&*(ptr as *const Source))
}

impl Source {
    #[inline] fn as_raw(&self) -> *mut GSource {
        self as *const Self as *mut GSource
    }

    ///A source that is always ready.  Priority [Priority::DEFAULT_IDLE].
    pub fn idle() -> StrongCell<Source> {
        unsafe { wrap(glib_sys::g_idle_source_new()) }
    }
    ///A source that becomes ready every `interval`, with millisecond precision.  Priority [Priority::DEFAULT].
    pub fn timeout(interval: Duration) -> StrongCell<Source> {
        let ms = interval.as_millis().min(c_uint::MAX as u128) as c_uint;
        unsafe { wrap(glib_sys::g_timeout_source_new(ms)) }
    }
    ///Like [Self::timeout] with whole seconds, allowing GLib to group wakeups.
    pub fn timeout_seconds(interval: u32) -> StrongCell<Source> {
        unsafe { wrap(glib_sys::g_timeout_source_new_seconds(interval)) }
    }
    ///The source currently being dispatched on this thread.
    pub fn current() -> Option<StrongCell<Source>> {
        unsafe { StrongCell::from_raw_none(glib_sys::g_main_current_source() as *mut Source).ok() }
    }

    #[track_caller]
    pub fn set_callback<Args, F: Callback<Args> + Send + Sync>(&self, f: F) {
        self.set_closure(Closure::with_location(f, Location::caller()))
    }
    ///Like [Self::set_callback] for callbacks that are not `Send`.  Dispatch on another thread skips them.
    #[track_caller]
    pub fn set_callback_local<Args, F: Callback<Args>>(&self, f: F) {
        self.set_closure(Closure::local_with_location(f, Location::caller()))
    }
    fn set_closure(&self, closure: Closure) {
        //the source takes its own reference
        unsafe { gobject_sys::g_source_set_closure(self.as_raw(), closure.as_ptr()) }
    }

    pub fn set_priority(&self, priority: Priority) {
        unsafe { glib_sys::g_source_set_priority(self.as_raw(), priority.field()) }
    }
    pub fn priority(&self) -> Priority {
        Priority::from_field(unsafe { glib_sys::g_source_get_priority(self.as_raw()) })
    }
    ///A name for debugging.
    pub fn set_name(&self, name: &str) -> Result<()> {
        let c = to_cstring(name)?;
        unsafe { glib_sys::g_source_set_name(self.as_raw(), c.as_ptr()) };
        Ok(())
    }
    pub fn name(&self) -> Option<String> {
        unsafe { from_glib_none(glib_sys::g_source_get_name(self.as_raw())) }
    }

    ///Adds the source to `context` (the default context if `None`).
    pub fn attach(&self, context: Option<&MainContext>) -> SourceId {
        let ctx = context.map_or(std::ptr::null_mut(), MainContext::as_raw);
        SourceId(unsafe { glib_sys::g_source_attach(self.as_raw(), ctx) })
    }
    ///Removes the source from its context.  The callback will not run again.
    pub fn destroy(&self) {
        unsafe { glib_sys::g_source_destroy(self.as_raw()) }
    }
    pub fn is_destroyed(&self) -> bool {
        unsafe { glib_sys::g_source_is_destroyed(self.as_raw()) != glib_sys::GFALSE }
    }
    ///The id assigned by [Self::attach].  `None` before the source is attached.
    pub fn id(&self) -> Option<SourceId> {
        unsafe {
            if glib_sys::g_source_get_context(self.as_raw()).is_null() {
                return None;
            }
            Some(SourceId(glib_sys::g_source_get_id(self.as_raw())))
        }
    }
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Source({:p}, {:?})", self, self.name())
    }
}

fn add(source: StrongCell<Source>, closure: Closure) -> SourceId {
    source.set_closure(closure);
    //the context keeps the source alive from here on
    source.attach(None)
}

///Runs `f` from the default context whenever it is idle.
#[track_caller]
pub fn idle_add<Args, F: Callback<Args> + Send + Sync>(f: F) -> SourceId {
    add(Source::idle(), Closure::with_location(f, Location::caller()))
}
///[idle_add] for callbacks that are not `Send`.  They only run if the default context is iterated on this thread.
#[track_caller]
pub fn idle_add_local<Args, F: Callback<Args>>(f: F) -> SourceId {
    add(Source::idle(), Closure::local_with_location(f, Location::caller()))
}
#[track_caller]
pub fn timeout_add<Args, F: Callback<Args> + Send + Sync>(interval: Duration, f: F) -> SourceId {
    add(Source::timeout(interval), Closure::with_location(f, Location::caller()))
}
#[track_caller]
pub fn timeout_add_local<Args, F: Callback<Args>>(interval: Duration, f: F) -> SourceId {
    add(Source::timeout(interval), Closure::local_with_location(f, Location::caller()))
}
#[track_caller]
pub fn timeout_add_seconds<Args, F: Callback<Args> + Send + Sync>(interval: u32, f: F) -> SourceId {
    add(Source::timeout_seconds(interval), Closure::with_location(f, Location::caller()))
}

///Destroys the source `id` of the default context.  Returns false if there is no such source.
pub fn source_remove(id: SourceId) -> bool {
    match MainContext::default().find_source_by_id(id) {
        Some(source) => {
            source.destroy();
            true
        }
        None => false,
    }
}
