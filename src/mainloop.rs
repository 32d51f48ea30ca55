//! `GMainContext` and `GMainLoop`.

use std::ffi::c_void;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe, Location};
use glib_sys::{GMainContext, GMainLoop};
use log::{error, trace};
use crate::instance::Refcounted;
use crate::objectpointers::StrongCell;
use crate::source::{Source, SourceId};

///A set of sources to be dispatched, and the thread that dispatches them.
#[repr(transparent)]
pub struct MainContext(c_void, PhantomData<*const ()>);

unsafe impl Refcounted for MainContext {
    unsafe fn ref_raw(ptr: *const Self) {
        trace!("main context ref {:p}", ptr);
        glib_sys::g_main_context_ref(ptr as *mut GMainContext);
    }
    unsafe fn unref_raw(ptr: *const Self) {
        trace!("main context unref {:p}", ptr);
        glib_sys::g_main_context_unref(ptr as *mut GMainContext);
    }
    unsafe fn ref_sink_raw(ptr: *const Self) { Self::ref_raw(ptr) }
    unsafe fn is_floating_raw(_ptr: *const Self) -> bool { false }
}
//GMainContext locks internally
unsafe impl Send for MainContext {}
unsafe impl Sync for MainContext {}

unsafe extern "C" fn invoke_trampoline(data: glib_sys::gpointer) -> glib_sys::gboolean {
    let (f, location) = &mut *(data as *mut (Option<Box<dyn FnOnce() + Send>>, &'static Location<'static>));
    if let Some(f) = f.take() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
            let message = payload.downcast_ref::<&str>().copied()
                .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("<non-string panic>");
            error!("function invoked from {} panicked: {}", location, message);
            std::process::abort();
        }
    }
    glib_sys::GFALSE
}
unsafe extern "C" fn invoke_destroy(data: glib_sys::gpointer) {
    drop(Box::from_raw(data as *mut (Option<Box<dyn FnOnce() + Send>>, &'static Location<'static>)));
}

impl MainContext {
    #[inline] pub(crate) fn as_raw(&self) -> *mut GMainContext {
        self as *const Self as *mut GMainContext
    }

    ///The global default context, used by the main loop of most applications.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> StrongCell<MainContext> {
        unsafe { StrongCell::retaining(&*(glib_sys::g_main_context_default() as *const MainContext)) }
    }
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> StrongCell<MainContext> {
        unsafe { StrongCell::assume_retained(&*(glib_sys::g_main_context_new() as *const MainContext)) }
    }
    ///The context pushed with [Self::with_thread_default] on this thread, if any.
    pub fn thread_default() -> Option<StrongCell<MainContext>> {
        unsafe { StrongCell::from_raw_none(glib_sys::g_main_context_get_thread_default() as *mut MainContext).ok() }
    }

    ///Runs one iteration.  Returns whether any source was dispatched.
    pub fn iteration(&self, may_block: bool) -> bool {
        unsafe { glib_sys::g_main_context_iteration(self.as_raw(), may_block as glib_sys::gboolean) != glib_sys::GFALSE }
    }
    pub fn pending(&self) -> bool {
        unsafe { glib_sys::g_main_context_pending(self.as_raw()) != glib_sys::GFALSE }
    }
    ///Tries to become the owner of the context.  Succeeds if nobody else owns it.
    pub fn acquire(&self) -> bool {
        unsafe { glib_sys::g_main_context_acquire(self.as_raw()) != glib_sys::GFALSE }
    }
    pub fn release(&self) {
        unsafe { glib_sys::g_main_context_release(self.as_raw()) }
    }
    pub fn is_owner(&self) -> bool {
        unsafe { glib_sys::g_main_context_is_owner(self.as_raw()) != glib_sys::GFALSE }
    }
    pub fn find_source_by_id(&self, id: SourceId) -> Option<StrongCell<Source>> {
        unsafe {
            StrongCell::from_raw_none(glib_sys::g_main_context_find_source_by_id(self.as_raw(), id.into_raw()) as *mut Source).ok()
        }
    }
    ///Runs `f` with `self` as the thread-default context.
    pub fn with_thread_default<R>(&self, f: impl FnOnce() -> R) -> R {
        struct Pop<'a>(&'a MainContext);
        impl Drop for Pop<'_> {
            fn drop(&mut self) {
                unsafe { glib_sys::g_main_context_pop_thread_default(self.0.as_raw()) }
            }
        }
        unsafe { glib_sys::g_main_context_push_thread_default(self.as_raw()) };
        let _pop = Pop(self);
        f()
    }
    ///Interrupts a blocking [Self::iteration].
    pub fn wakeup(&self) {
        unsafe { glib_sys::g_main_context_wakeup(self.as_raw()) }
    }
    ///Runs `f` on the thread that owns the context.  Runs it immediately if that is the calling thread (or if the
    ///context is free to acquire), and queues it at default priority otherwise.
    #[track_caller]
    pub fn invoke<F: FnOnce() + Send + 'static>(&self, f: F) {
        let data: Box<(Option<Box<dyn FnOnce() + Send>>, &'static Location<'static>)> =
            Box::new((Some(Box::new(f)), Location::caller()));
        unsafe {
            glib_sys::g_main_context_invoke_full(self.as_raw(), glib_sys::G_PRIORITY_DEFAULT, Some(invoke_trampoline),
                                                 Box::into_raw(data) as glib_sys::gpointer, Some(invoke_destroy));
        }
    }
}

impl std::fmt::Debug for MainContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MainContext({:p})", self)
    }
}

///Nesting depth of the dispatch currently running on this thread.  Zero outside of any callback.
pub fn main_depth() -> i32 {
    unsafe { glib_sys::g_main_depth() }
}

///Runs a context until told to quit.
#[repr(transparent)]
pub struct MainLoop(c_void, PhantomData<*const ()>);

unsafe impl Refcounted for MainLoop {
    unsafe fn ref_raw(ptr: *const Self) {
        glib_sys::g_main_loop_ref(ptr as *mut GMainLoop);
    }
    unsafe fn unref_raw(ptr: *const Self) {
        glib_sys::g_main_loop_unref(ptr as *mut GMainLoop);
    }
    unsafe fn ref_sink_raw(ptr: *const Self) { Self::ref_raw(ptr) }
    unsafe fn is_floating_raw(_ptr: *const Self) -> bool { false }
}
unsafe impl Send for MainLoop {}
unsafe impl Sync for MainLoop {}

impl MainLoop {
    #[inline] fn as_raw(&self) -> *mut GMainLoop {
        self as *const Self as *mut GMainLoop
    }
    ///A loop over `context` (the default context if `None`).
    #[allow(clippy::new_ret_no_self)]
    pub fn new(context: Option<&MainContext>, is_running: bool) -> StrongCell<MainLoop> {
        let ctx = context.map_or(std::ptr::null_mut(), MainContext::as_raw);
        unsafe { StrongCell::assume_retained(&*(glib_sys::g_main_loop_new(ctx, is_running as glib_sys::gboolean) as *const MainLoop)) }
    }
    ///Iterates the context until [Self::quit].
    pub fn run(&self) {
        unsafe { glib_sys::g_main_loop_run(self.as_raw()) }
    }
    pub fn quit(&self) {
        unsafe { glib_sys::g_main_loop_quit(self.as_raw()) }
    }
    pub fn is_running(&self) -> bool {
        unsafe { glib_sys::g_main_loop_is_running(self.as_raw()) != glib_sys::GFALSE }
    }
    pub fn context(&self) -> StrongCell<MainContext> {
        unsafe { StrongCell::retaining(&*(glib_sys::g_main_loop_get_context(self.as_raw()) as *const MainContext)) }
    }
}

impl std::fmt::Debug for MainLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MainLoop({:p}, running: {})", self, self.is_running())
    }
}
