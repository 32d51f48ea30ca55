use crate::error::Result;
use crate::objectpointers::StrongCell;

crate::gobject_instance! {
    ///A `GCancellable`.  Cancelling emits `cancelled` on the cancelling thread.
    pub struct Cancellable: gio_sys::g_cancellable_get_type;
}
crate::gobject_upcast!(Cancellable, unsafe crate::object::Object, as_object);

//GCancellable is documented as threadsafe
unsafe impl Send for Cancellable {}
unsafe impl Sync for Cancellable {}

impl Cancellable {
    #[inline] fn as_raw(&self) -> *mut gio_sys::GCancellable {
        self as *const Self as *mut gio_sys::GCancellable
    }
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> StrongCell<Cancellable> {
        unsafe { StrongCell::assume_retained(&*(gio_sys::g_cancellable_new() as *const Cancellable)) }
    }
    pub fn cancel(&self) {
        unsafe { gio_sys::g_cancellable_cancel(self.as_raw()) }
    }
    pub fn is_cancelled(&self) -> bool {
        unsafe { gio_sys::g_cancellable_is_cancelled(self.as_raw()) != glib_sys::GFALSE }
    }
    ///Makes a cancelled instance usable again.  Must not be called while an operation is using it.
    pub fn reset(&self) {
        unsafe { gio_sys::g_cancellable_reset(self.as_raw()) }
    }
    ///[Error::Cancelled](crate::Error::Cancelled) if [Self::cancel] has been called.
    pub fn error_if_cancelled(&self) -> Result<()> {
        let mut error = std::ptr::null_mut();
        unsafe {
            gio_sys::g_cancellable_set_error_if_cancelled(self.as_raw(), &mut error);
            super::check_io_error(error)
        }
    }
}

#[cfg(test)] mod tests {
    use crate::bindings::*;
    use super::Cancellable;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test] fn cancel_and_reset() {
        let c = Cancellable::new();
        assert_eq!(c.type_().name(), "GCancellable");
        assert!(!c.is_cancelled());
        assert!(c.error_if_cancelled().is_ok());
        c.cancel();
        assert!(c.is_cancelled());
        assert!(matches!(c.error_if_cancelled(), Err(Error::Cancelled)));
        c.reset();
        assert!(!c.is_cancelled());
    }

    #[test] fn cancelled_from_another_thread() {
        let c = Cancellable::new();
        let fired = Arc::new(AtomicU32::new(0));
        let fired2 = fired.clone();
        c.connect("cancelled", move |_c: StrongCell<Cancellable>| {
            fired2.fetch_add(1, Ordering::SeqCst);
        }).unwrap();
        let c2 = c.clone();
        std::thread::spawn(move || c2.cancel()).join().unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        //a second cancel is a no-op
        c.cancel();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
