//! `GApplication`.

use gio_sys::GApplication;
use crate::cast::IsA;
use crate::error::{Error, Result};
use crate::objectpointers::StrongCell;
use crate::strings::{from_glib_none, optional_ptr, to_cstring, to_optional_cstring, StrV};
use super::{Action, Cancellable};

crate::glib_flags! {
    pub struct ApplicationFlags<u32>;
    impl ApplicationFlags {
        DEFAULT_FLAGS = 0,
        IS_SERVICE = 1,
        IS_LAUNCHER = 2,
        HANDLES_OPEN = 4,
        HANDLES_COMMAND_LINE = 8,
        SEND_ENVIRONMENT = 16,
        NON_UNIQUE = 32,
        CAN_OVERRIDE_APP_ID = 64,
        ALLOW_REPLACEMENT = 128,
        REPLACE = 256
    }
}

crate::gobject_instance! {
    ///The application object: registration, the `activate` signal and the lifetime of the main loop.
    pub struct Application: gio_sys::g_application_get_type;
}
crate::gobject_upcast!(Application, unsafe crate::object::Object, as_object);

impl Application {
    #[inline] fn as_raw(&self) -> *mut GApplication {
        self as *const Self as *mut GApplication
    }
    ///Reverse-DNS names of at least two elements, such as `org.example.App`.
    pub fn id_is_valid(id: &str) -> bool {
        match to_cstring(id) {
            Ok(c) => unsafe { gio_sys::g_application_id_is_valid(c.as_ptr()) != glib_sys::GFALSE },
            Err(_) => false,
        }
    }
    #[allow(clippy::new_ret_no_self)]
    pub fn new(id: Option<&str>, flags: ApplicationFlags) -> Result<StrongCell<Application>> {
        if let Some(id) = id {
            if !Self::id_is_valid(id) {
                return Err(Error::InvalidValue(format!("{:?} is not a valid application id", id)));
            }
        }
        let c = to_optional_cstring(id)?;
        unsafe { StrongCell::from_raw_full(gio_sys::g_application_new(optional_ptr(&c), flags.field()) as *mut Application) }
    }
    pub fn application_id(&self) -> Option<String> {
        unsafe { from_glib_none(gio_sys::g_application_get_application_id(self.as_raw())) }
    }
    pub fn flags(&self) -> ApplicationFlags {
        ApplicationFlags::from_field(unsafe { gio_sys::g_application_get_flags(self.as_raw()) })
    }
    /**
    Registers, emits `activate` (or `open`/`command-line`, per the flags), and iterates the default context
    until the application is released or [Self::quit] is called.  Returns the exit status.

    `args` is the full command line including the program name.  Arguments with an interior nul make this
    return 1 without running.
    */
    pub fn run(&self, args: &[&str]) -> i32 {
        let mut argv = match StrV::new(args) {
            Ok(argv) => argv,
            Err(e) => {
                log::error!("application arguments: {}", e);
                return 1;
            }
        };
        unsafe { gio_sys::g_application_run(self.as_raw(), argv.len() as i32, argv.as_mut_ptr()) }
    }
    ///Makes [Self::run] return as soon as possible, regardless of holds.
    pub fn quit(&self) {
        unsafe { gio_sys::g_application_quit(self.as_raw()) }
    }
    ///Keeps [Self::run] going until a matching [Self::release].
    pub fn hold(&self) {
        unsafe { gio_sys::g_application_hold(self.as_raw()) }
    }
    pub fn release(&self) {
        unsafe { gio_sys::g_application_release(self.as_raw()) }
    }
    ///Registers without running.  [Self::run] does this itself.
    pub fn register(&self, cancellable: Option<&Cancellable>) -> Result<()> {
        let cancellable = cancellable.map_or(std::ptr::null_mut(), |c| c as *const Cancellable as *mut gio_sys::GCancellable);
        let mut error = std::ptr::null_mut();
        unsafe {
            gio_sys::g_application_register(self.as_raw(), cancellable, &mut error);
            super::check_io_error(error)
        }
    }
    pub fn is_registered(&self) -> bool {
        unsafe { gio_sys::g_application_get_is_registered(self.as_raw()) != glib_sys::GFALSE }
    }
    ///Emits `activate` directly.  Requires registration.
    pub fn activate(&self) {
        unsafe { gio_sys::g_application_activate(self.as_raw()) }
    }
    ///Exports `action` as `app.<name>`.
    pub fn add_action<A: IsA<Action>>(&self, action: &A) {
        let action = IsA::<Action>::upcast_ref(action) as *const Action as *mut gio_sys::GAction;
        unsafe { gio_sys::g_action_map_add_action(self.as_raw() as *mut gio_sys::GActionMap, action) }
    }
    pub fn has_action(&self, name: &str) -> bool {
        match to_cstring(name) {
            Ok(c) => unsafe {
                gio_sys::g_action_group_has_action(self.as_raw() as *mut gio_sys::GActionGroup, c.as_ptr()) != glib_sys::GFALSE
            },
            Err(_) => false,
        }
    }
}

#[cfg(test)] mod tests {
    use crate::bindings::*;
    use crate::gio::SimpleAction;
    use crate::testsupport::default_context_lock;
    use super::{Application, ApplicationFlags};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test] fn ids() {
        assert!(Application::id_is_valid("org.gobr.Test"));
        assert!(!Application::id_is_valid("nodots"));
        assert!(!Application::id_is_valid(""));
        assert!(matches!(Application::new(Some("not an id"), ApplicationFlags::NON_UNIQUE), Err(Error::InvalidValue(_))));
        let app = Application::new(Some("org.gobr.Ids"), ApplicationFlags::NON_UNIQUE).unwrap();
        assert_eq!(app.application_id().as_deref(), Some("org.gobr.Ids"));
        assert_eq!(app.flags(), ApplicationFlags::NON_UNIQUE);
    }

    #[test] fn run_activates() {
        let _lock = default_context_lock();
        let app = Application::new(None, ApplicationFlags::NON_UNIQUE).unwrap();
        let activated = Arc::new(AtomicU32::new(0));
        let activated2 = activated.clone();
        app.connect("activate", move |_app: StrongCell<Application>| {
            activated2.fetch_add(1, Ordering::SeqCst);
        }).unwrap();
        assert!(!app.is_registered());
        assert_eq!(app.run(&["gobr-test"]), 0);
        assert_eq!(activated.load(Ordering::SeqCst), 1);
        assert!(app.is_registered());
    }

    #[test] fn hold_until_quit() {
        let _lock = default_context_lock();
        let app = Application::new(None, ApplicationFlags::NON_UNIQUE).unwrap();
        let idles = Arc::new(AtomicU32::new(0));
        let idles2 = idles.clone();
        app.connect("activate", move |app: StrongCell<Application>| {
            app.hold();
            let idles3 = idles2.clone();
            idle_add_local(move || {
                //keep going for a few iterations, then stop the held application
                if idles3.fetch_add(1, Ordering::SeqCst) + 1 < 3 {
                    true
                } else {
                    app.quit();
                    false
                }
            });
        }).unwrap();
        assert_eq!(app.run(&["gobr-test"]), 0);
        assert_eq!(idles.load(Ordering::SeqCst), 3);
        app.release();
    }

    #[test] fn register_and_actions() {
        let app = Application::new(None, ApplicationFlags::NON_UNIQUE).unwrap();
        app.register(None).unwrap();
        assert!(app.is_registered());
        let action = SimpleAction::new("about", None).unwrap();
        app.add_action(&*action);
        assert!(app.has_action("about"));
        assert!(!app.has_action("missing"));
    }
}
