//! Process-wide names and well-known directories.

use std::ffi::{c_char, CStr};
use std::path::PathBuf;
use crate::error::{Error, Result};
use crate::strings::{from_glib_none, to_cstring};

crate::glib_enum! {
    ///XDG user directories, for [user_special_dir].
    pub struct UserDirectory<i32>;
    impl UserDirectory {
        DESKTOP = 0,
        DOCUMENTS = 1,
        DOWNLOAD = 2,
        MUSIC = 3,
        PICTURES = 4,
        PUBLIC_SHARE = 5,
        TEMPLATES = 6,
        VIDEOS = 7
    }
}

unsafe fn path_from_glib(ptr: *const c_char) -> Option<PathBuf> {
    if ptr.is_null() {
        return None;
    }
    let bytes = CStr::from_ptr(ptr).to_bytes();
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        Some(PathBuf::from(std::ffi::OsStr::from_bytes(bytes)))
    }
    #[cfg(not(unix))]
    {
        Some(PathBuf::from(String::from_utf8_lossy(bytes).into_owned()))
    }
}

///The human-readable application name, falling back to the program name.
pub fn application_name() -> Option<String> {
    unsafe { from_glib_none(glib_sys::g_get_application_name()) }
}
///Sets the human-readable application name.  GLib warns if this is called more than once.
pub fn set_application_name(name: &str) -> Result<()> {
    let c = to_cstring(name)?;
    unsafe { glib_sys::g_set_application_name(c.as_ptr()) };
    Ok(())
}
pub fn prgname() -> Option<String> {
    unsafe { from_glib_none(glib_sys::g_get_prgname()) }
}
pub fn set_prgname(name: &str) -> Result<()> {
    let c = to_cstring(name)?;
    unsafe { glib_sys::g_set_prgname(c.as_ptr()) };
    Ok(())
}

///The user's directory of the given kind.  Fails with [Error::NullPointer] when it is not configured.
pub fn user_special_dir(directory: UserDirectory) -> Result<PathBuf> {
    if !(UserDirectory::DESKTOP.field()..=UserDirectory::VIDEOS.field()).contains(&directory.field()) {
        return Err(Error::InvalidValue(format!("{:?} is not a user directory", directory)));
    }
    unsafe { path_from_glib(glib_sys::g_get_user_special_dir(directory.field())) }.ok_or(Error::NullPointer)
}

pub fn home_dir() -> PathBuf {
    unsafe { path_from_glib(glib_sys::g_get_home_dir()) }.unwrap_or_default()
}
pub fn tmp_dir() -> PathBuf {
    unsafe { path_from_glib(glib_sys::g_get_tmp_dir()) }.unwrap_or_default()
}
pub fn user_cache_dir() -> PathBuf {
    unsafe { path_from_glib(glib_sys::g_get_user_cache_dir()) }.unwrap_or_default()
}
pub fn user_config_dir() -> PathBuf {
    unsafe { path_from_glib(glib_sys::g_get_user_config_dir()) }.unwrap_or_default()
}
pub fn user_data_dir() -> PathBuf {
    unsafe { path_from_glib(glib_sys::g_get_user_data_dir()) }.unwrap_or_default()
}

#[test] fn names() {
    set_application_name("gobr tests").unwrap();
    assert_eq!(application_name().as_deref(), Some("gobr tests"));
    assert!(set_prgname("bad\0name").is_err());
}

#[test] fn directories() {
    assert!(!tmp_dir().as_os_str().is_empty());
    assert!(user_config_dir().is_absolute());
    assert!(user_data_dir().is_absolute());
    assert!(user_cache_dir().is_absolute());
    match user_special_dir(UserDirectory::DOCUMENTS) {
        Ok(path) => assert!(path.is_absolute()),
        Err(e) => assert!(matches!(e, Error::NullPointer)),
    }
    assert!(matches!(user_special_dir(UserDirectory::from_field(42)), Err(Error::InvalidValue(_))));
}
