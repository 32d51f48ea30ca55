/*! GIO: cancellation, actions and the application object.

Everything here is an ordinary GObject binding declared with [gobject_instance!](crate::gobject_instance), so
it works with [ObjectExt](crate::glib::ObjectExt) for signals and properties.
*/

mod cancellable;
mod action;
mod application;

pub use cancellable::Cancellable;
pub use action::{Action, SimpleAction, SimpleActionGroup};
pub use application::{Application, ApplicationFlags};

use crate::error::{Error, GlibError, Result};
use crate::marshal::{Dynamic, Marshaler};
use crate::quark::Quark;
use crate::types::Type;
use crate::value::Value;
use crate::variant::VariantType;

///Converts a GIO out-parameter error.  `G_IO_ERROR_CANCELLED` becomes [Error::Cancelled].
pub(crate) unsafe fn check_io_error(error: *mut glib_sys::GError) -> Result<()> {
    if error.is_null() {
        return Ok(());
    }
    let e = GlibError::from_raw_full(error);
    if e.matches(Quark::from_raw(gio_sys::g_io_error_quark()), gio_sys::G_IO_ERROR_CANCELLED) {
        Err(Error::Cancelled)
    } else {
        Err(Error::Glib(e))
    }
}

///`GVariantType` is boxed; action properties such as `parameter-type` hold one.
fn marshal_variant_type(v: &Value) -> Result<Dynamic> {
    let boxed = unsafe { gobject_sys::g_value_get_boxed(v.as_ptr()) } as *const glib_sys::GVariantType;
    if boxed.is_null() {
        return Ok(Dynamic::Str(None));
    }
    Ok(Dynamic::Str(Some(unsafe { VariantType::from_raw(boxed) }.as_str().to_owned())))
}

pub(crate) fn marshalers() -> Vec<(Type, Marshaler)> {
    let variant_type = unsafe { Type::from_raw(glib_sys::g_variant_type_get_gtype()) };
    vec![(variant_type, marshal_variant_type as Marshaler)]
}

#[cfg(test)] mod tests {
    use crate::bindings::*;
    use super::SimpleAction;

    #[test] fn variant_type_properties() {
        let action = SimpleAction::new("open", Some(VariantType::STRING)).unwrap();
        match action.property_value("parameter-type").unwrap().to_dynamic().unwrap() {
            Dynamic::Str(Some(s)) => assert_eq!(s, "s"),
            other => panic!("unexpected {:?}", other),
        }
        let plain = SimpleAction::new("close", None).unwrap();
        assert!(matches!(plain.property_value("parameter-type").unwrap().to_dynamic().unwrap(), Dynamic::Str(None)));
    }
}
