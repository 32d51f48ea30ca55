//! Conversions between Rust strings and GLib-owned C strings.
//!
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use crate::error::Result;

///Copies a borrowed (transfer none) C string.  NULL becomes `None`.
pub(crate) unsafe fn from_glib_none(ptr: *const c_char) -> Option<String> {
	if ptr.is_null() {
		None
	} else {
		Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
	}
}

///Copies an owned (transfer full) C string and frees it with `g_free`.
pub(crate) unsafe fn from_glib_full(ptr: *mut c_char) -> Option<String> {
	let r = from_glib_none(ptr);
	if !ptr.is_null() {
		glib_sys::g_free(ptr as glib_sys::gpointer);
	}
	r
}

///Copies an owned, NULL-terminated string array and frees it with `g_strfreev`.
pub(crate) unsafe fn from_glib_full_strv(strv: *mut *mut c_char) -> Vec<String> {
	let mut r = Vec::new();
	if strv.is_null() {
		return r;
	}
	let mut cursor = strv;
	while !(*cursor).is_null() {
		r.push(CStr::from_ptr(*cursor).to_string_lossy().into_owned());
		cursor = cursor.add(1);
	}
	glib_sys::g_strfreev(strv);
	r
}

///Copies `str` into a nul-terminated buffer.
pub(crate) fn to_cstring(str: &str) -> Result<CString> {
	Ok(CString::new(str)?)
}

///Copies `str` up to its first nul, for conversions that cannot fail.  Truncation is logged.
pub(crate) fn to_cstring_truncated(str: &str) -> CString {
	match CString::new(str) {
		Ok(c) => c,
		Err(e) => {
			let end = e.nul_position();
			log::debug!("truncating {:?} at the interior nul at byte {}", str, end);
			let mut bytes = e.into_vec();
			bytes.truncate(end);
			//nul-free now
			CString::new(bytes).unwrap_or_default()
		}
	}
}

///Like [to_cstring], for optional arguments where NULL is meaningful.
pub(crate) fn to_optional_cstring(str: Option<&str>) -> Result<Option<CString>> {
	str.map(to_cstring).transpose()
}

///Pointer for an optional C string, NULL for `None`.
pub(crate) fn optional_ptr(str: &Option<CString>) -> *const c_char {
	str.as_ref().map_or(std::ptr::null(), |s| s.as_ptr())
}

///An owned `argv`-style array.  The pointers stay valid while the value lives.
pub(crate) struct StrV {
	_owned: Vec<CString>,
	ptrs: Vec<*mut c_char>,
}
impl StrV {
	pub(crate) fn new(strs: &[&str]) -> Result<StrV> {
		let owned = strs.iter().map(|s| to_cstring(s)).collect::<Result<Vec<_>>>()?;
		let mut ptrs: Vec<*mut c_char> = owned.iter().map(|s| s.as_ptr() as *mut c_char).collect();
		ptrs.push(std::ptr::null_mut());
		Ok(StrV { _owned: owned, ptrs })
	}
	///Number of strings, not counting the terminator.
	pub(crate) fn len(&self) -> usize {
		self.ptrs.len() - 1
	}
	pub(crate) fn as_mut_ptr(&mut self) -> *mut *mut c_char {
		self.ptrs.as_mut_ptr()
	}
}


#[test] fn full_string_is_freed() {
	let example = "example string here";
	let c = to_cstring(example).unwrap();
	let owned = unsafe { glib_sys::g_strdup(c.as_ptr()) };
	assert_eq!(unsafe { from_glib_full(owned) }.as_deref(), Some(example));
	assert_eq!(unsafe { from_glib_none(std::ptr::null()) }, None);
}

#[test] fn interior_nul() {
	assert!(matches!(to_cstring("bad\0string"), Err(crate::Error::InteriorNul(_))));
	assert!(to_optional_cstring(None).unwrap().is_none());
}

#[test] fn strv() {
	let mut v = StrV::new(&["prog", "--flag"]).unwrap();
	assert_eq!(v.len(), 2);
	let copied = unsafe { glib_sys::g_strdupv(v.as_mut_ptr()) };
	assert_eq!(unsafe { from_glib_full_strv(copied) }, vec!["prog".to_string(), "--flag".to_string()]);
}

#[test] fn truncation() {
	assert_eq!(to_cstring_truncated("plain").to_str().unwrap(), "plain");
	assert_eq!(to_cstring_truncated("head\0tail").to_str().unwrap(), "head");
	assert_eq!(to_cstring_truncated("\0").to_str().unwrap(), "");
	assert!(to_cstring("head\0tail").is_err());
}
