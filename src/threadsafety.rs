/** Pins a value to the thread that created it.

Native code decides where a callback runs.  A signal emitted from a worker thread invokes its handlers on that worker,
and an idle source runs on whichever thread iterates its context.  Callbacks registered with `connect` therefore have to
be `Send + Sync`, which rules out closures that capture `Rc`, `RefCell` or thread-affine objects such as GTK widgets.

In practice most of those callbacks are only ever invoked on the UI thread.  `ThreadGuard` models that *use* of a value:
it can be moved anywhere, but the value inside is only reachable from the thread that wrapped it.  Access from any other
thread yields `None` (and the caller is expected to log and skip), and dropping on another thread leaks the value
rather than running its destructor in the wrong place.

```
use gobr::bindings::ThreadGuard;
use std::rc::Rc;

let guard = ThreadGuard::new(Rc::new(5));
assert_eq!(guard.get().map(|rc| **rc), Some(5));
let guard = std::thread::spawn(move || {
    assert!(guard.get().is_none());
    guard
}).join().unwrap();
assert!(guard.get().is_some());
```
*/
use std::mem::ManuallyDrop;
use std::thread::{self, ThreadId};

pub struct ThreadGuard<T> {
    value: ManuallyDrop<T>,
    thread: ThreadId,
}

impl<T> ThreadGuard<T> {
    ///Wraps `value`, pinning it to the current thread.
    pub fn new(value: T) -> Self {
        ThreadGuard { value: ManuallyDrop::new(value), thread: thread::current().id() }
    }
    ///Whether the current thread is the one that created the guard.
    #[inline] pub fn is_owner(&self) -> bool {
        thread::current().id() == self.thread
    }
    ///Borrows the value, if called on the owning thread.
    pub fn get(&self) -> Option<&T> {
        if self.is_owner() { Some(&*self.value) } else { None }
    }
    ///Unwraps the value, if called on the owning thread.  Otherwise the guard is given back.
    pub fn into_inner(self) -> Result<T, Self> {
        if self.is_owner() {
            let mut me = ManuallyDrop::new(self);
            Ok(unsafe { ManuallyDrop::take(&mut me.value) })
        } else {
            Err(self)
        }
    }
}

impl<T> Drop for ThreadGuard<T> {
    fn drop(&mut self) {
        if self.is_owner() {
            unsafe { ManuallyDrop::drop(&mut self.value) }
        } else {
            log::warn!("ThreadGuard<{}> dropped on {:?}, which does not own it; leaking",
                       std::any::type_name::<T>(), thread::current().id());
        }
    }
}

impl<T> std::fmt::Debug for ThreadGuard<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ThreadGuard<{}>({:?})", std::any::type_name::<T>(), self.thread)
    }
}

//the value is only touched on `thread`
unsafe impl<T> Send for ThreadGuard<T> {}
unsafe impl<T> Sync for ThreadGuard<T> {}

#[test] fn wrong_thread_drop_leaks() {
    use std::rc::Rc;
    let rc = Rc::new(());
    let guard = ThreadGuard::new(rc.clone());
    let guard = thread::spawn(move || guard.into_inner().err()).join().unwrap();
    //the worker could not unwrap it and handed it back
    let guard = guard.expect("not the owner");
    assert_eq!(Rc::strong_count(&rc), 2);
    let inner = guard.into_inner().unwrap();
    drop(inner);
    assert_eq!(Rc::strong_count(&rc), 1);

    let guard = ThreadGuard::new(rc.clone());
    thread::spawn(move || drop(guard)).join().unwrap();
    //leaked, never decremented
    assert_eq!(Rc::strong_count(&rc), 2);
}
