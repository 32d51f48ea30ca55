//! The little of GDK that GTK users reach for directly.

use crate::objectpointers::StrongCell;
use crate::strings::from_glib_none;

crate::gobject_instance! {
    ///A connection to a windowing system.
    pub struct Display: gdk_sys::gdk_display_get_type;
}
crate::gobject_upcast!(Display, unsafe crate::object::Object, as_object);

impl Display {
    ///The display opened by [gtk::init](crate::gtk::init).  `None` before that.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Option<StrongCell<Display>> {
        unsafe { StrongCell::from_raw_none(gdk_sys::gdk_display_get_default() as *mut Display).ok() }
    }
    ///The name of the display, such as `:0` on X11.
    pub fn name(&self) -> String {
        unsafe { from_glib_none(gdk_sys::gdk_display_get_name(self as *const Self as *mut gdk_sys::GdkDisplay)) }
            .unwrap_or_default()
    }
}
