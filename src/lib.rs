/*!
# gobr: GObject bindings with an ownership bridge

This library provides low-level bindings to GLib, GObject, GIO and (optionally) GTK 3.  You might compare
this crate with [glib](https://crates.io/crates/glib) and the rest of gtk-rs; the difference is that this crate
only tries to get two things right, and leaves API coverage to other crates:

* **Ownership.**  Native objects are reference counted, some of them are born "floating", and every reference
  must be released exactly once.  [bindings::StrongCell] integrates that into safe Rust: creating a cell takes
  (or adopts, or sinks) one reference, dropping it releases one.
* **Closures.**  Signal handlers and idle/timeout sources are plain Rust closures.  Each one becomes a native
  `GClosure` whose callback lives in a registry owned by this crate, and arguments travel as `GValue`s
  converted by trait.

Distinctive features include:
* Opaque marker types (`#[repr(transparent)] struct Object(c_void)`) so that `&Object` is the native pointer
* `#[derive(GObjectInstance)]` and [gobject_instance!] for declaring new bindings in one line
* Callbacks of any arity up to 6 with typed arguments, checked at call time
* A [release strategy](bindings::set_release_strategy) that can send the final unref to the UI thread
* [Registering new GObject types](bindings::TypeBuilder) with properties and signals directly from Rust

# Using an existing type

```
use gobr::bindings::*;
gobject_instance! {
    pub struct MyCancellable: gio_sys::g_cancellable_get_type;
}
impl MyCancellable {
    pub fn new() -> StrongCell<MyCancellable> {
        //`g_cancellable_new` is transfer full
        unsafe { StrongCell::from_raw_full(gio_sys::g_cancellable_new() as *mut MyCancellable) }
            .expect("g_cancellable_new never returns NULL")
    }
}
let c = MyCancellable::new();
assert_eq!(c.type_().name(), "GCancellable");
```

# Signals

```
use gobr::bindings::*;
use gobr::gio::Cancellable;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

let c = Cancellable::new();
let fired = Arc::new(AtomicBool::new(false));
let fired2 = fired.clone();
c.connect("cancelled", move |_c: StrongCell<Cancellable>| {
    fired2.store(true, Ordering::SeqCst);
}).unwrap();
c.cancel();
assert!(fired.load(Ordering::SeqCst));
```

# Design limitations

This library intends to follow normal guidelines for safe Rust.  However, calling into C means there's
a giant ball of `unsafe` somewhere.  We assume the native libraries behave as documented; in particular,
transfer annotations are taken at face value when a binding picks `from_raw_none` or `from_raw_full`.
*/
extern crate self as gobr;

pub mod macros;
mod types;
mod instance;
mod objectpointers;
mod cast;
mod error;
mod quark;
mod strings;
mod object;
mod value;
mod marshal;
mod arguments;
mod threadsafety;
pub mod closure;
mod signal;
mod source;
mod mainloop;
mod variant;
mod list;
mod subclass;
pub mod utils;

#[cfg(feature = "gio")]
pub mod gio;
#[cfg(feature = "gtk")]
pub mod gdk;
#[cfg(feature = "gtk")]
pub mod gtk;

#[cfg(test)]
mod testsupport;

pub use error::{Error, GlibError, Result, ResultGlibError};

///Types and traits for everyday use of GLib and GObject.
pub mod glib {
    pub use super::types::Type;
    pub use super::quark::Quark;
    pub use super::object::{Object, InitiallyUnowned, ObjectExt, ParamSpecInfo};
    pub use super::value::{Value, ToValue, FromValue};
    pub use super::marshal::{Dynamic, Marshaler, register_marshalers};
    pub use super::signal::{Signal, SignalBuilder, SignalFlags, SignalHandlerId, SignalQuery};
    pub use super::source::{Source, SourceId, Priority, idle_add, idle_add_local, timeout_add,
                            timeout_add_local, timeout_add_seconds, source_remove};
    pub use super::mainloop::{MainContext, MainLoop, main_depth};
    pub use super::variant::{Variant, VariantType, VariantTypeBuf};
    pub use super::list::{List, ListIter, SList, SListIter};
    pub use super::subclass::{TypeBuilder, PropertySpec, SignalSpec};
}

///This namespace includes items that are appropriate for writing bindings
pub mod bindings {
    pub use super::glib::*;
    pub use super::types::StaticType;
    pub use super::instance::{GObjectInstance, GObjectInstanceBehavior, Refcounted};
    pub use super::objectpointers::{StrongCell, WeakCell, ReleaseStrategy, set_release_strategy, release_strategy};
    pub use super::cast::IsA;
    pub use super::arguments::{Callback, CallbackReturn};
    pub use super::threadsafety::ThreadGuard;
    pub use super::error::{Error, GlibError, Result, ResultGlibError};
    //import macros
    pub use crate::gobject_instance;
    pub use crate::gobject_upcast;
    pub use crate::glib_enum;
    pub use crate::glib_flags;
    pub use gobr_procmacro::{GObjectInstance, gstr};

    //used by macros
    #[doc(hidden)]
    pub use super::instance::{__object_ref, __object_unref, __object_ref_sink, __object_is_floating};
}

///Traits that add methods to wrapper types.
pub mod prelude {
    pub use super::object::ObjectExt;
    pub use super::instance::GObjectInstanceBehavior;
    pub use super::cast::IsA;
    pub use super::error::ResultGlibError;
}

mod private {
    ///"Sealed trait" pattern.  Traits will inherit from this trait to indicate they cannot be implemented outside the crate.
    ///
    /// See [the documentation](https://rust-lang.github.io/api-guidelines/future-proofing.html) for details.
    pub trait Sealed {}
}
