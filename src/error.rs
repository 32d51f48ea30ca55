//! Error types.
//!
//! Native failures arrive as a `GError*` out-parameter; [GlibError] copies it into Rust memory and frees it,
//! so the error can cross threads and outlive the call.

use std::ffi::CStr;
use crate::quark::Quark;
use crate::types::Type;

///Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    ///A native function returned NULL where an object was expected.
    #[error("native function returned NULL")]
    NullPointer,
    #[error(transparent)]
    Glib(#[from] GlibError),
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch { expected: Type, actual: Type },
    #[error("{type_} has no property {name:?}")]
    UnknownProperty { type_: Type, name: String },
    #[error("{type_} has no signal {name:?}")]
    UnknownSignal { type_: Type, name: String },
    #[error("signal {signal:?} takes {expected} arguments but {actual} were given")]
    SignalArity { signal: String, expected: usize, actual: usize },
    #[error("no marshaler registered for {0}")]
    MissingMarshaler(Type),
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error(transparent)]
    InteriorNul(#[from] std::ffi::NulError),
    #[error("type registration failed: {0}")]
    Registration(String),
    #[error("operation was cancelled")]
    Cancelled,
}

///A copy of a native `GError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlibError {
    pub domain: Quark,
    pub code: i32,
    pub message: String,
}

impl GlibError {
    /**
    Copies and frees a native error.

    # Safety
    `error` must be a valid, owned `GError*`.  It is freed by this call.
    */
    pub unsafe fn from_raw_full(error: *mut glib_sys::GError) -> Self {
        let message = if (*error).message.is_null() {
            String::new()
        } else {
            CStr::from_ptr((*error).message).to_string_lossy().into_owned()
        };
        let r = GlibError {
            domain: Quark::from_raw((*error).domain),
            code: (*error).code,
            message,
        };
        glib_sys::g_error_free(error);
        r
    }

    ///Whether the error belongs to `domain` with the given `code`.
    pub fn matches(&self, domain: Quark, code: i32) -> bool {
        self.domain == domain && self.code == code
    }
}

impl std::fmt::Display for GlibError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} {})", self.message, self.domain, self.code)
    }
}
impl std::error::Error for GlibError {}

///Converts the out-parameter of a native call.  A NULL error means success.
pub(crate) unsafe fn check_gerror(error: *mut glib_sys::GError) -> Result<()> {
    if error.is_null() {
        Ok(())
    } else {
        Err(Error::Glib(GlibError::from_raw_full(error)))
    }
}

pub trait ResultGlibError<T> {
    ///A friendlier unwrap that prints the native error if you encounter it.
    fn unwrap_glib(self) -> T;
}
impl<T> ResultGlibError<T> for std::result::Result<T, GlibError> {
    #[track_caller]
    fn unwrap_glib(self) -> T {
        match self {
            Ok(t) => t,
            Err(e) => panic!("{}", e),
        }
    }
}
impl<T> ResultGlibError<T> for Result<T> {
    #[track_caller]
    fn unwrap_glib(self) -> T {
        match self {
            Ok(t) => t,
            Err(e) => panic!("{}", e),
        }
    }
}

#[test] fn check_err() {
    //ensure both error types implement Error
    fn assert_err<T: std::error::Error + Send + Sync + 'static>(_t: &T) {}
    let err = unsafe {
        let domain = Quark::from_str("gobr-test-error-domain");
        let message = std::ffi::CString::new("something broke").unwrap();
        let raw = glib_sys::g_error_new_literal(domain.into_raw(), 123, message.as_ptr());
        GlibError::from_raw_full(raw)
    };
    assert_err(&err);
    assert_eq!(err.code, 123);
    assert!(err.matches(Quark::from_str("gobr-test-error-domain"), 123));
    let display = format!("{}", err);
    assert!(display.contains("something broke"));
    assert!(display.contains("gobr-test-error-domain"));

    let wrapped: Error = err.into();
    assert_err(&wrapped);
    assert!(matches!(wrapped, Error::Glib(_)));
}

#[test] fn null_error_is_ok() {
    assert!(unsafe { check_gerror(std::ptr::null_mut()) }.is_ok());
}

#[test]
#[should_panic(expected = "native function returned NULL")]
fn unwrap_glib_panics() {
    let r: Result<()> = Err(Error::NullPointer);
    r.unwrap_glib();
}
