//! `GAction`, `GSimpleAction` and `GSimpleActionGroup`.

use std::ffi::c_char;
use gio_sys::{GAction, GActionGroup, GActionMap};
use crate::cast::IsA;
use crate::error::{Error, Result};
use crate::objectpointers::StrongCell;
use crate::strings::{from_glib_full_strv, from_glib_none, to_cstring};
use crate::variant::{Variant, VariantType};

crate::gobject_instance! {
    ///The `GAction` interface.
    pub struct Action: gio_sys::g_action_get_type;
}
crate::gobject_instance! {
    pub struct SimpleAction: gio_sys::g_simple_action_get_type;
}
crate::gobject_upcast!(SimpleAction, unsafe Action, as_action);
crate::gobject_instance! {
    ///A map from names to actions that can also activate them by name.
    pub struct SimpleActionGroup: gio_sys::g_simple_action_group_get_type;
}

fn parameter_ptr(parameter: Option<&Variant>) -> *mut glib_sys::GVariant {
    parameter.map_or(std::ptr::null_mut(), Variant::as_raw)
}

///GLib only logs a critical for a mismatched parameter, so reject it up front.
fn check_parameter(action: &str, expected: Option<&VariantType>, parameter: Option<&Variant>) -> Result<()> {
    match (expected, parameter) {
        (None, None) => Ok(()),
        //the parameter type may be indefinite, such as `a*`
        (Some(ty), Some(p)) if p.is_of_type(ty) => Ok(()),
        (expected, p) => Err(Error::InvalidValue(format!("action {:?} takes {} but was given {}", action,
            expected.map_or("no parameter", VariantType::as_str), p.map_or("no parameter", Variant::type_string)))),
    }
}

impl Action {
    #[inline] fn as_raw(&self) -> *mut GAction {
        self as *const Self as *mut GAction
    }
    ///Whether `name` may be used for an action: ASCII alphanumerics, `-` and `.`.
    pub fn name_is_valid(name: &str) -> bool {
        match to_cstring(name) {
            Ok(c) => unsafe { gio_sys::g_action_name_is_valid(c.as_ptr()) != glib_sys::GFALSE },
            Err(_) => false,
        }
    }
    pub fn name(&self) -> String {
        unsafe { from_glib_none(gio_sys::g_action_get_name(self.as_raw())) }.unwrap_or_default()
    }
    pub fn is_enabled(&self) -> bool {
        unsafe { gio_sys::g_action_get_enabled(self.as_raw()) != glib_sys::GFALSE }
    }
    ///The type of parameter taken by [Self::activate], if any.
    pub fn parameter_type(&self) -> Option<&VariantType> {
        unsafe {
            //fixed at construction, owned by the action
            let ty = gio_sys::g_action_get_parameter_type(self.as_raw());
            if ty.is_null() { None } else { Some(VariantType::from_raw(ty)) }
        }
    }
    ///Emits `activate` unless the action is disabled.  `parameter` must match [Self::parameter_type].
    pub fn activate(&self, parameter: Option<&Variant>) -> Result<()> {
        check_parameter(&self.name(), self.parameter_type(), parameter)?;
        unsafe { gio_sys::g_action_activate(self.as_raw(), parameter_ptr(parameter)) };
        Ok(())
    }
}

impl SimpleAction {
    #[inline] fn as_raw(&self) -> *mut gio_sys::GSimpleAction {
        self as *const Self as *mut gio_sys::GSimpleAction
    }
    ///A stateless action.  Activation requires a parameter of `parameter_type`, or none if that is `None`.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(name: &str, parameter_type: Option<&VariantType>) -> Result<StrongCell<SimpleAction>> {
        if !Action::name_is_valid(name) {
            return Err(Error::InvalidValue(format!("{:?} is not a valid action name", name)));
        }
        let c = to_cstring(name)?;
        unsafe {
            //copies the type
            let raw = gio_sys::g_simple_action_new(c.as_ptr(), parameter_type.map_or(std::ptr::null(), VariantType::as_raw));
            StrongCell::from_raw_full(raw as *mut SimpleAction)
        }
    }
    pub fn name(&self) -> String { self.as_action().name() }
    pub fn is_enabled(&self) -> bool { self.as_action().is_enabled() }
    pub fn parameter_type(&self) -> Option<&VariantType> { self.as_action().parameter_type() }
    pub fn activate(&self, parameter: Option<&Variant>) -> Result<()> { self.as_action().activate(parameter) }
    ///Disabled actions ignore activation.
    pub fn set_enabled(&self, enabled: bool) {
        unsafe { gio_sys::g_simple_action_set_enabled(self.as_raw(), enabled as glib_sys::gboolean) }
    }
}

impl SimpleActionGroup {
    #[inline] fn as_map(&self) -> *mut GActionMap {
        self as *const Self as *mut GActionMap
    }
    #[inline] fn as_group(&self) -> *mut GActionGroup {
        self as *const Self as *mut GActionGroup
    }
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> StrongCell<SimpleActionGroup> {
        unsafe { StrongCell::assume_retained(&*(gio_sys::g_simple_action_group_new() as *const SimpleActionGroup)) }
    }
    ///Adds `action`, replacing any action with the same name.  The group holds a reference.
    pub fn add_action<A: IsA<Action>>(&self, action: &A) {
        let action = IsA::<Action>::upcast_ref(action);
        unsafe { gio_sys::g_action_map_add_action(self.as_map(), action.as_raw()) }
    }
    pub fn lookup_action(&self, name: &str) -> Option<StrongCell<Action>> {
        let c = to_cstring(name).ok()?;
        unsafe { StrongCell::from_raw_none(gio_sys::g_action_map_lookup_action(self.as_map(), c.as_ptr()) as *mut Action).ok() }
    }
    pub fn remove_action(&self, name: &str) {
        if let Ok(c) = to_cstring(name) {
            unsafe { gio_sys::g_action_map_remove_action(self.as_map(), c.as_ptr()) }
        }
    }
    pub fn has_action(&self, name: &str) -> bool {
        match to_cstring(name) {
            Ok(c) => unsafe { gio_sys::g_action_group_has_action(self.as_group(), c.as_ptr()) != glib_sys::GFALSE },
            Err(_) => false,
        }
    }
    ///Activates the action called `name`.
    pub fn activate_action(&self, name: &str, parameter: Option<&Variant>) -> Result<()> {
        let action = self.lookup_action(name)
            .ok_or_else(|| Error::InvalidValue(format!("no action named {:?}", name)))?;
        check_parameter(name, action.parameter_type(), parameter)?;
        let c = to_cstring(name)?;
        unsafe { gio_sys::g_action_group_activate_action(self.as_group(), c.as_ptr(), parameter_ptr(parameter)) };
        Ok(())
    }
    pub fn list_actions(&self) -> Vec<String> {
        unsafe { from_glib_full_strv(gio_sys::g_action_group_list_actions(self.as_group()) as *mut *mut c_char) }
    }
}

#[cfg(test)] mod tests {
    use crate::bindings::*;
    use super::*;
    use std::sync::Arc;
    use parking_lot::Mutex;

    #[test] fn names() {
        assert!(Action::name_is_valid("app.quit"));
        assert!(Action::name_is_valid("zoom-in"));
        assert!(!Action::name_is_valid("two words"));
        assert!(!Action::name_is_valid(""));
        assert!(!Action::name_is_valid("nul\0"));
        assert!(matches!(SimpleAction::new("bad name", None), Err(Error::InvalidValue(_))));
    }

    #[test] fn activate() {
        let action = SimpleAction::new("greet", Some(VariantType::STRING)).unwrap();
        assert_eq!(action.name(), "greet");
        assert_eq!(action.parameter_type(), Some(VariantType::STRING));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        action.connect("activate", move |_a: StrongCell<SimpleAction>, p: Option<StrongCell<Variant>>| {
            seen2.lock().push(p.and_then(|p| p.str().map(str::to_owned)));
        }).unwrap();
        action.activate(Some(&*Variant::from_str("hello").unwrap())).unwrap();
        assert!(matches!(action.activate(None), Err(Error::InvalidValue(_))));
        assert!(matches!(action.activate(Some(&*Variant::from_i32(1))), Err(Error::InvalidValue(_))));

        action.set_enabled(false);
        assert!(!action.is_enabled());
        action.activate(Some(&*Variant::from_str("ignored").unwrap())).unwrap();
        assert_eq!(*seen.lock(), vec![Some("hello".to_owned())]);
    }

    #[test] fn group() {
        let group = SimpleActionGroup::new();
        let quit = SimpleAction::new("quit", None).unwrap();
        let count = Arc::new(Mutex::new(0));
        let count2 = count.clone();
        quit.connect("activate", move |_a: StrongCell<SimpleAction>, _p: Option<StrongCell<Variant>>| {
            *count2.lock() += 1;
        }).unwrap();
        group.add_action(&*quit);
        group.add_action(&*SimpleAction::new("open", Some(VariantType::STRING)).unwrap());
        assert!(group.has_action("quit"));
        let mut names = group.list_actions();
        names.sort();
        assert_eq!(names, vec!["open".to_owned(), "quit".to_owned()]);

        let found = group.lookup_action("quit").unwrap();
        assert_eq!(&*found as *const Action, quit.as_action() as *const Action);
        group.activate_action("quit", None).unwrap();
        assert_eq!(*count.lock(), 1);
        assert!(matches!(group.activate_action("open", None), Err(Error::InvalidValue(_))));
        assert!(matches!(group.activate_action("missing", None), Err(Error::InvalidValue(_))));

        group.remove_action("quit");
        assert!(!group.has_action("quit"));
        assert!(group.lookup_action("quit").is_none());
    }

    #[test] fn indefinite_parameter() {
        let any_array = SimpleAction::new("select", Some(VariantType::ARRAY)).unwrap();
        assert_eq!(any_array.parameter_type().map(VariantType::as_str), Some("a*"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        any_array.connect("activate", move |_a: StrongCell<SimpleAction>, p: Option<StrongCell<Variant>>| {
            seen2.lock().push(p.map(|p| p.type_string().to_owned()));
        }).unwrap();
        any_array.activate(Some(&*Variant::parse(None, "[1, 2]").unwrap())).unwrap();
        any_array.activate(Some(&*Variant::parse(None, "['a']").unwrap())).unwrap();
        assert!(matches!(any_array.activate(Some(&*Variant::from_i32(1))), Err(Error::InvalidValue(_))));
        assert_eq!(*seen.lock(), vec![Some("ai".to_owned()), Some("as".to_owned())]);

        let group = SimpleActionGroup::new();
        group.add_action(&*any_array);
        group.activate_action("select", Some(&*Variant::parse(None, "[true]").unwrap())).unwrap();
        assert_eq!(seen.lock().len(), 3);
    }
}
