/*! GTK 3: initialization, the main loop, and a handful of widgets.

GTK is not threadsafe.  Call [init] and everything else from one thread, normally the one that owns the
default main context.  Widget handles are not `Send`, so the compiler enforces this for the widgets
themselves; [crate::bindings::set_release_strategy] can route the final unref of values that crossed
threads back to that context.
*/

mod widget;

pub use widget::{Container, Label, Widget, Window, WindowType};

use crate::error::{Error, Result};

///Opens the default display.  Succeeds immediately if GTK is already initialized.
pub fn init() -> Result<()> {
    let ok = unsafe { gtk_sys::gtk_init_check(std::ptr::null_mut(), std::ptr::null_mut()) };
    if ok == glib_sys::GFALSE {
        Err(Error::InvalidValue("GTK could not open a display".to_owned()))
    } else {
        log::debug!("GTK initialized");
        Ok(())
    }
}

///Runs the main loop until [main_quit].  Nests if already running.
pub fn main() {
    unsafe { gtk_sys::gtk_main() }
}
///Makes the innermost [main] return.
pub fn main_quit() {
    unsafe { gtk_sys::gtk_main_quit() }
}
///Nesting depth of [main].
pub fn main_level() -> u32 {
    unsafe { gtk_sys::gtk_main_level() }
}
pub fn events_pending() -> bool {
    unsafe { gtk_sys::gtk_events_pending() != glib_sys::GFALSE }
}
///Runs one blocking iteration.  Returns true if [main_quit] was called for the innermost loop.
pub fn main_iteration() -> bool {
    unsafe { gtk_sys::gtk_main_iteration() != glib_sys::GFALSE }
}
pub fn main_iteration_do(blocking: bool) -> bool {
    unsafe { gtk_sys::gtk_main_iteration_do(blocking as glib_sys::gboolean) != glib_sys::GFALSE }
}

#[cfg(test)] mod tests {
    use crate::bindings::*;
    use std::rc::Rc;
    use std::cell::Cell;

    #[test] fn main_loop() { crate::testsupport::with_gtk(|| {
        assert_eq!(super::main_level(), 0);
        let level = Rc::new(Cell::new(0));
        let level2 = level.clone();
        idle_add_local(move || {
            level2.set(super::main_level());
            super::main_quit();
        });
        super::main();
        assert_eq!(level.get(), 1);
        assert_eq!(super::main_level(), 0);
        while super::events_pending() {
            super::main_iteration_do(false);
        }
    })}
}
