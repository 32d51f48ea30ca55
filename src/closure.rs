/*! Rust closures behind native `GClosure`s.

Every callback handed to native code (a signal handler, an idle or timeout source) becomes one `GClosure`.  The
closure itself carries no Rust data.  Its marshal data is a key into a registry owned by this module, and the
registry entry holds the erased callback together with the place it was registered from.  The entry is removed
by the closure's finalize notifier, so it lives exactly as long as native code can still invoke it.

When the closure is invoked, the meta marshal looks the entry up, converts as many arguments as the callback
wants, calls it, and writes the result (if any) back into the native return value.
*/

use std::collections::HashMap;
use std::ffi::{c_uint, c_ulong};
use std::panic::{self, AssertUnwindSafe, Location};
use std::ptr::NonNull;
use std::sync::{Arc, OnceLock};
use gobject_sys::{GClosure, GValue};
use log::{debug, error, warn};
use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};
use crate::arguments::Callback;
use crate::error::Result;
use crate::threadsafety::ThreadGuard;
use crate::types::Type;
use crate::value::Value;

new_key_type! {
    ///Identifies one registered callback.
    pub struct ClosureKey;
}

type Erased = Box<dyn Fn(&[Value]) -> Result<Option<Value>> + Send + Sync>;

struct Entry {
    callback: Erased,
    arity: usize,
    location: &'static Location<'static>,
}

struct Slot {
    entry: Arc<Entry>,
    ///Signal handlers running this closure, so finalization can unindex exactly those.
    handlers: Vec<c_ulong>,
}

static CLOSURES: OnceLock<Mutex<SlotMap<ClosureKey, Slot>>> = OnceLock::new();
static HANDLERS: OnceLock<Mutex<HashMap<c_ulong, ClosureKey>>> = OnceLock::new();

fn closures() -> &'static Mutex<SlotMap<ClosureKey, Slot>> {
    CLOSURES.get_or_init(|| Mutex::new(SlotMap::with_key()))
}
fn handlers() -> &'static Mutex<HashMap<c_ulong, ClosureKey>> {
    HANDLERS.get_or_init(|| Mutex::new(HashMap::new()))
}

///Number of callbacks currently registered, i.e. closures native code has not yet finalized.
pub fn registered() -> usize {
    closures().lock().len()
}

pub(crate) fn is_registered(key: ClosureKey) -> bool {
    closures().lock().contains_key(key)
}

///Records that signal handler `id` runs the closure `key`.
pub(crate) fn index_handler(id: c_ulong, key: ClosureKey) {
    match closures().lock().get_mut(key) {
        Some(slot) => slot.handlers.push(id),
        None => return,
    }
    handlers().lock().insert(id, key);
}
///Forgets a signal handler.  Returns its closure, if the handler was connected through this crate.
pub(crate) fn forget_handler(id: c_ulong) -> Option<ClosureKey> {
    let key = handlers().lock().remove(&id)?;
    if let Some(slot) = closures().lock().get_mut(key) {
        slot.handlers.retain(|h| *h != id);
    }
    Some(key)
}

/**
A `GClosure` that runs a Rust callback.

The closure is created with one (sunk) reference owned by this handle.  Native consumers such as
`g_signal_connect_closure_by_id` take their own reference, so the handle can be dropped as soon as the closure is
handed over.
*/
pub struct Closure {
    raw: NonNull<GClosure>,
    key: ClosureKey,
}

impl Closure {
    ///Wraps a callback that may run on any thread.
    #[track_caller]
    pub fn new<Args, F: Callback<Args> + Send + Sync>(f: F) -> Closure {
        Closure::with_location(f, Location::caller())
    }
    ///Wraps a callback that must run on the current thread.  Invocations on other threads are logged and skipped.
    #[track_caller]
    pub fn new_local<Args, F: Callback<Args>>(f: F) -> Closure {
        Closure::local_with_location(f, Location::caller())
    }

    pub(crate) fn with_location<Args, F: Callback<Args> + Send + Sync>(f: F, location: &'static Location<'static>) -> Closure {
        Closure::register(Box::new(move |args: &[Value]| f.call(args)), F::ARITY, location)
    }
    pub(crate) fn local_with_location<Args, F: Callback<Args>>(f: F, location: &'static Location<'static>) -> Closure {
        let guard = ThreadGuard::new(f);
        let callback = move |args: &[Value]| match guard.get() {
            Some(f) => f.call(args),
            None => {
                warn!("callback registered at {} invoked on {:?}, which did not register it; skipping",
                      location, std::thread::current().id());
                Ok(None)
            }
        };
        Closure::register(Box::new(callback), F::ARITY, location)
    }

    fn register(callback: Erased, arity: usize, location: &'static Location<'static>) -> Closure {
        let entry = Arc::new(Entry { callback, arity, location });
        let key = closures().lock().insert(Slot { entry, handlers: Vec::new() });
        debug!("registered closure {:?} (arity {}) at {}", key, arity, location);
        unsafe {
            let raw = gobject_sys::g_closure_new_simple(std::mem::size_of::<GClosure>() as c_uint, std::ptr::null_mut());
            gobject_sys::g_closure_ref(raw);
            gobject_sys::g_closure_sink(raw);
            let data = Box::into_raw(Box::new(key)) as glib_sys::gpointer;
            gobject_sys::g_closure_set_meta_marshal(raw, data, Some(meta_marshal));
            gobject_sys::g_closure_add_finalize_notifier(raw, data, Some(finalize_notify));
            Closure { raw: NonNull::new_unchecked(raw), key }
        }
    }

    #[inline] pub fn as_ptr(&self) -> *mut GClosure { self.raw.as_ptr() }
    #[inline] pub fn key(&self) -> ClosureKey { self.key }

    ///Calls the closure the way native code would.  Mostly useful for testing.
    pub fn invoke(&self, args: &[Value], return_type: Option<Type>) -> Option<Value> {
        let mut ret = return_type.map(Value::from_type);
        let ret_ptr = ret.as_mut().map_or(std::ptr::null_mut(), |v| v.as_mut_ptr());
        unsafe {
            gobject_sys::g_closure_invoke(self.as_ptr(), ret_ptr, args.len() as c_uint,
                                          args.as_ptr() as *const GValue, std::ptr::null_mut());
        }
        ret
    }

    ///Panics unless the callback's first parameter accepts `instance`.  Only active with the `check-receiver` feature.
    #[allow(unused_variables)]
    pub(crate) fn check_receiver<Args, F: Callback<Args>>(instance: Type, location: &'static Location<'static>) {
        #[cfg(feature = "check-receiver")]
        {
            if !F::first_accepts(instance) {
                panic!("callback registered at {} cannot receive a {} as its first argument", location, instance);
            }
        }
    }
}

impl Drop for Closure {
    fn drop(&mut self) {
        unsafe { gobject_sys::g_closure_unref(self.raw.as_ptr()) }
    }
}
impl std::fmt::Debug for Closure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Closure({:?}, {:p})", self.key, self.raw.as_ptr())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic>"
    }
}

unsafe fn write_return(return_value: *mut GValue, value: Value, location: &'static Location<'static>) {
    if return_value.is_null() || (*return_value).g_type == 0 {
        debug!("callback registered at {} returned {:?}, but nothing was expected", location, value);
        return;
    }
    let expected = Value::from_raw_borrow(return_value).type_();
    match value.coerce(expected) {
        Ok(v) => gobject_sys::g_value_copy(v.as_ptr(), return_value),
        Err(e) => error!("cannot write the return value of callback registered at {}: {}", location, e),
    }
}

unsafe extern "C" fn meta_marshal(_closure: *mut GClosure, return_value: *mut GValue, n_param_values: c_uint,
                                  param_values: *const GValue, _invocation_hint: glib_sys::gpointer,
                                  marshal_data: glib_sys::gpointer) {
    let key = *(marshal_data as *const ClosureKey);
    let entry = match closures().lock().get(key) {
        Some(slot) => slot.entry.clone(),
        None => {
            warn!("closure {:?} invoked after its callback was released", key);
            return;
        }
    };
    let args: &[Value] = if param_values.is_null() || n_param_values == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(param_values as *const Value, n_param_values as usize)
    };
    if entry.arity > args.len() {
        warn!("callback registered at {} takes {} arguments but only {} were provided; skipping",
              entry.location, entry.arity, args.len());
        return;
    }
    match panic::catch_unwind(AssertUnwindSafe(|| (entry.callback)(args))) {
        Ok(Ok(Some(value))) => write_return(return_value, value, entry.location),
        Ok(Ok(None)) => {}
        Ok(Err(e)) => warn!("skipping callback registered at {}: {}", entry.location, e),
        Err(payload) => {
            error!("callback registered at {} panicked: {}", entry.location, panic_message(&*payload));
            //unwinding into C is undefined behavior
            std::process::abort();
        }
    }
}

unsafe extern "C" fn finalize_notify(data: glib_sys::gpointer, _closure: *mut GClosure) {
    let key = *Box::from_raw(data as *mut ClosureKey);
    let slot = closures().lock().remove(key);
    if let Some(slot) = &slot {
        let mut handlers = handlers().lock();
        for id in &slot.handlers {
            handlers.remove(id);
        }
    }
    debug!("finalized closure {:?}", key);
    //dropping the callback may release objects, which may finalize other closures
    drop(slot);
}

#[cfg(test)] mod tests {
    use super::*;
    use crate::bindings::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test] fn invoke_with_return() {
        crate::testsupport::init_logging();
        let c = Closure::new(|a: i32, b: i32| a * b);
        let r = c.invoke(&[6i32.to_value(), 7i32.to_value()], Some(Type::INT)).unwrap();
        assert_eq!(r.get::<i32>().unwrap(), 42);
        //the return value is transformed into the expected type
        let r = c.invoke(&[2i32.to_value(), 2i32.to_value()], Some(Type::F64)).unwrap();
        assert_eq!(r.get::<f64>().unwrap(), 4.0);
    }

    #[test] fn arity_and_conversion_skip() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let c = Closure::new(move |_a: i32, _b: i32| { calls2.fetch_add(1, Ordering::SeqCst); });
        c.invoke(&[1i32.to_value()], None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        c.invoke(&["x".to_value(), 1i32.to_value()], None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        c.invoke(&[1i32.to_value(), 2i32.to_value(), 3i32.to_value()], None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test] fn finalize_releases_entry() {
        let captured = Arc::new(());
        let captured2 = captured.clone();
        let c = Closure::new(move || { let _keep = &captured2; });
        let key = c.key();
        assert!(is_registered(key));
        assert_eq!(Arc::strong_count(&captured), 2);
        drop(c);
        assert!(!is_registered(key));
        assert_eq!(Arc::strong_count(&captured), 1);
    }

    #[test] fn local_closure_other_thread() {
        use std::rc::Rc;
        use std::cell::Cell;
        let count = Rc::new(Cell::new(0));
        let count2 = count.clone();
        let c = Closure::new_local(move || count2.set(count2.get() + 1));
        c.invoke(&[], None);
        assert_eq!(count.get(), 1);
        let raw = c.as_ptr() as usize;
        std::thread::spawn(move || unsafe {
            gobject_sys::g_closure_invoke(raw as *mut GClosure, std::ptr::null_mut(), 0, std::ptr::null(), std::ptr::null_mut());
        }).join().unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test] fn handler_index() {
        let c = Closure::new(|| ());
        index_handler(c_ulong::MAX - 1, c.key());
        drop(c);
        //finalization forgets handlers of the closure
        assert_eq!(forget_handler(c_ulong::MAX - 1), None);
    }

    #[test] fn finalize_forgets_only_its_handlers() {
        let kept = Closure::new(|| ());
        let dropped = Closure::new(|| ());
        index_handler(c_ulong::MAX - 10, kept.key());
        index_handler(c_ulong::MAX - 11, dropped.key());
        index_handler(c_ulong::MAX - 12, dropped.key());
        assert_eq!(forget_handler(c_ulong::MAX - 12), Some(dropped.key()));
        let dropped_key = dropped.key();
        drop(dropped);
        assert!(!is_registered(dropped_key));
        assert_eq!(forget_handler(c_ulong::MAX - 11), None);
        assert_eq!(forget_handler(c_ulong::MAX - 10), Some(kept.key()));
        //handlers of a closure that is already gone are not indexed
        index_handler(c_ulong::MAX - 13, dropped_key);
        assert_eq!(forget_handler(c_ulong::MAX - 13), None);
    }
}
