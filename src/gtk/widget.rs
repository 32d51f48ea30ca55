use gtk_sys::{GtkContainer, GtkLabel, GtkWidget, GtkWindow};
use crate::cast::IsA;
use crate::error::Result;
use crate::list::List;
use crate::object::{InitiallyUnowned, Object};
use crate::objectpointers::StrongCell;
use crate::strings::{from_glib_none, to_cstring};

crate::glib_enum! {
    pub struct WindowType<i32>;
    impl WindowType {
        TOPLEVEL = 0,
        POPUP = 1
    }
}

crate::gobject_instance! {
    ///Base class of everything drawn on screen.  Widgets are born floating; containers sink them.
    pub struct Widget: gtk_sys::gtk_widget_get_type;
}
crate::gobject_upcast!(Widget, unsafe InitiallyUnowned, as_initially_unowned);
crate::gobject_upcast!(Widget, unsafe Object, as_object);

crate::gobject_instance! {
    pub struct Container: gtk_sys::gtk_container_get_type;
}
crate::gobject_upcast!(Container, unsafe Widget, as_widget);
crate::gobject_upcast!(Container, unsafe Object, as_object);

crate::gobject_instance! {
    pub struct Window: gtk_sys::gtk_window_get_type;
}
crate::gobject_upcast!(Window, unsafe Container, as_container);
crate::gobject_upcast!(Window, unsafe Widget, as_widget);
crate::gobject_upcast!(Window, unsafe Object, as_object);

crate::gobject_instance! {
    pub struct Label: gtk_sys::gtk_label_get_type;
}
crate::gobject_upcast!(Label, unsafe Widget, as_widget);
crate::gobject_upcast!(Label, unsafe Object, as_object);

impl Widget {
    #[inline] fn as_raw(&self) -> *mut GtkWidget {
        self as *const Self as *mut GtkWidget
    }
    pub fn show(&self) {
        unsafe { gtk_sys::gtk_widget_show(self.as_raw()) }
    }
    ///Shows the widget and, for containers, everything inside it.
    pub fn show_all(&self) {
        unsafe { gtk_sys::gtk_widget_show_all(self.as_raw()) }
    }
    pub fn hide(&self) {
        unsafe { gtk_sys::gtk_widget_hide(self.as_raw()) }
    }
    ///Breaks references held by GTK, removing the widget from its parent (or the toplevel list).  Handles held
    ///in Rust stay valid until dropped.
    pub fn destroy(&self) {
        unsafe { gtk_sys::gtk_widget_destroy(self.as_raw()) }
    }
    pub fn is_visible(&self) -> bool {
        unsafe { gtk_sys::gtk_widget_get_visible(self.as_raw()) != glib_sys::GFALSE }
    }
    pub fn set_sensitive(&self, sensitive: bool) {
        unsafe { gtk_sys::gtk_widget_set_sensitive(self.as_raw(), sensitive as glib_sys::gboolean) }
    }
    pub fn is_sensitive(&self) -> bool {
        unsafe { gtk_sys::gtk_widget_get_sensitive(self.as_raw()) != glib_sys::GFALSE }
    }
    ///The name used by CSS.  Defaults to the type name.
    pub fn name(&self) -> String {
        unsafe { from_glib_none(gtk_sys::gtk_widget_get_name(self.as_raw())) }.unwrap_or_default()
    }
    pub fn set_name(&self, name: &str) -> Result<()> {
        let c = to_cstring(name)?;
        unsafe { gtk_sys::gtk_widget_set_name(self.as_raw(), c.as_ptr()) };
        Ok(())
    }
}

impl Container {
    #[inline] fn as_raw(&self) -> *mut GtkContainer {
        self as *const Self as *mut GtkContainer
    }
    ///Adds a child.  A floating child is sunk by the container.
    pub fn add<W: IsA<Widget>>(&self, child: &W) {
        unsafe { gtk_sys::gtk_container_add(self.as_raw(), IsA::<Widget>::upcast_ref(child).as_raw()) }
    }
    pub fn remove<W: IsA<Widget>>(&self, child: &W) {
        unsafe { gtk_sys::gtk_container_remove(self.as_raw(), IsA::<Widget>::upcast_ref(child).as_raw()) }
    }
    ///The direct children, in the order the container keeps them.
    pub fn children(&self) -> Vec<StrongCell<Widget>> {
        unsafe {
            //transfer container: the nodes are ours, the widgets are not
            let list: List<Widget> = List::from_raw_full(gtk_sys::gtk_container_get_children(self.as_raw()));
            list.to_strong()
        }
    }
}

impl Window {
    #[inline] fn as_raw(&self) -> *mut GtkWindow {
        self as *const Self as *mut GtkWindow
    }
    ///A new, hidden window.  GTK keeps toplevels alive until [Widget::destroy]; the returned handle is an
    ///additional reference.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(type_: WindowType) -> StrongCell<Window> {
        unsafe { StrongCell::retaining(&*(gtk_sys::gtk_window_new(type_.field()) as *const Window)) }
    }
    pub fn title(&self) -> Option<String> {
        unsafe { from_glib_none(gtk_sys::gtk_window_get_title(self.as_raw())) }
    }
    pub fn set_title(&self, title: &str) -> Result<()> {
        let c = to_cstring(title)?;
        unsafe { gtk_sys::gtk_window_set_title(self.as_raw(), c.as_ptr()) };
        Ok(())
    }
}

impl Label {
    #[inline] fn as_raw(&self) -> *mut GtkLabel {
        self as *const Self as *mut GtkLabel
    }
    ///The new label's floating reference is sunk into the returned handle.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(text: &str) -> Result<StrongCell<Label>> {
        let c = to_cstring(text)?;
        unsafe { StrongCell::from_raw_full(gtk_sys::gtk_label_new(c.as_ptr()) as *mut Label) }
    }
    pub fn text(&self) -> String {
        unsafe { from_glib_none(gtk_sys::gtk_label_get_text(self.as_raw())) }.unwrap_or_default()
    }
    pub fn set_text(&self, text: &str) -> Result<()> {
        let c = to_cstring(text)?;
        unsafe { gtk_sys::gtk_label_set_text(self.as_raw(), c.as_ptr()) };
        Ok(())
    }
}
