//! Interned strings.

use std::ffi::CStr;
use crate::error::Result;
use crate::strings::{to_cstring, to_cstring_truncated};

///A `GQuark`: a string interned for the life of the process.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Quark(glib_sys::GQuark);

impl Quark {
    ///Interns `s`.  Fails for strings with an interior nul.
    pub fn new(s: &str) -> Result<Quark> {
        let c = to_cstring(s)?;
        Ok(Quark(unsafe { glib_sys::g_quark_from_string(c.as_ptr()) }))
    }
    ///Interns `s`.
    ///
    /// Quarks are C strings, so `s` is truncated at the first interior nul.  Use [Self::new] to reject those.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Quark {
        let c = to_cstring_truncated(s);
        Quark(unsafe { glib_sys::g_quark_from_string(c.as_ptr()) })
    }
    ///Looks up `s` without interning it.  Truncates like [Self::from_str].
    pub fn try_from_str(s: &str) -> Option<Quark> {
        let c = to_cstring_truncated(s);
        match unsafe { glib_sys::g_quark_try_string(c.as_ptr()) } {
            0 => None,
            q => Some(Quark(q)),
        }
    }
    pub fn as_str(&self) -> &'static str {
        unsafe {
            let ptr = glib_sys::g_quark_to_string(self.0);
            if ptr.is_null() {
                return "";
            }
            //quark strings are never freed
            CStr::from_ptr(ptr).to_str().unwrap_or("")
        }
    }
    #[inline] pub const fn from_raw(raw: glib_sys::GQuark) -> Quark { Quark(raw) }
    #[inline] pub const fn into_raw(self) -> glib_sys::GQuark { self.0 }
}

impl std::fmt::Display for Quark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
impl std::fmt::Debug for Quark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Quark({:?})", self.as_str())
    }
}

#[test] fn interning() {
    let a = Quark::from_str("gobr-quark-test");
    let b = Quark::from_str("gobr-quark-test");
    assert_eq!(a, b);
    assert_eq!(a.as_str(), "gobr-quark-test");
    assert_eq!(Quark::try_from_str("gobr-quark-test"), Some(a));
    assert_eq!(Quark::try_from_str("gobr-quark-never-interned-anywhere"), None);
    assert_eq!(Quark::from_str("gobr-quark\0tail").as_str(), "gobr-quark");
    assert_eq!(Quark::new("gobr-quark-test").unwrap(), a);
    assert!(matches!(Quark::new("gobr-quark\0tail"), Err(crate::Error::InteriorNul(_))));
    assert_eq!(Quark::try_from_str("gobr-quark\0other"), Quark::try_from_str("gobr-quark"));
}
