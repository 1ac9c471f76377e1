//! Error codes and result types.

use mapkv_region::RegionError;
use std::cell::RefCell;
use std::ffi::CString;

/// Result code for FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapKvResult {
    /// Operation succeeded.
    Ok = 0,
    /// Generic error.
    Error = 1,
    /// Invalid argument.
    InvalidArgument = 2,
    /// Null pointer.
    NullPointer = 3,
    /// I/O error (open, resize, map, flush).
    IoError = 4,
    /// The platform refused an anonymous region.
    ResourceExhausted = 5,
    /// Operation on a closed region.
    InvalidState = 6,
    /// The mapping could not be re-established.
    Unavailable = 7,
    /// Feature not supported on this platform.
    NotSupported = 8,
}

impl MapKvResult {
    /// Returns true if the result indicates success.
    pub fn is_ok(self) -> bool {
        self == MapKvResult::Ok
    }

    /// Returns true if the result indicates an error.
    pub fn is_err(self) -> bool {
        self != MapKvResult::Ok
    }
}

impl From<&RegionError> for MapKvResult {
    fn from(err: &RegionError) -> Self {
        match err {
            RegionError::Io(_) => MapKvResult::IoError,
            RegionError::ResourceExhausted { .. } => MapKvResult::ResourceExhausted,
            RegionError::InvalidState { .. } => MapKvResult::InvalidState,
            RegionError::Unavailable { .. } => MapKvResult::Unavailable,
            RegionError::InvalidSize { .. } => MapKvResult::InvalidArgument,
        }
    }
}

/// Error code type for C compatibility.
pub type ErrorCode = i32;

impl From<MapKvResult> for ErrorCode {
    fn from(result: MapKvResult) -> Self {
        result as ErrorCode
    }
}

impl From<ErrorCode> for MapKvResult {
    fn from(code: ErrorCode) -> Self {
        match code {
            0 => MapKvResult::Ok,
            2 => MapKvResult::InvalidArgument,
            3 => MapKvResult::NullPointer,
            4 => MapKvResult::IoError,
            5 => MapKvResult::ResourceExhausted,
            6 => MapKvResult::InvalidState,
            7 => MapKvResult::Unavailable,
            8 => MapKvResult::NotSupported,
            _ => MapKvResult::Error,
        }
    }
}

// Thread-local storage for last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Sets the last error message.
pub fn set_last_error(message: impl Into<String>) {
    let msg = message.into();
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clears the last error.
pub fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Records `err` as the last error and returns its code.
pub(crate) fn report(err: &RegionError) -> MapKvResult {
    set_last_error(err.to_string());
    err.into()
}

/// Gets the last error message as a C string.
///
/// Returns null if no error is set.
///
/// # Safety
///
/// The returned pointer is valid until the next FFI call on this thread.
#[no_mangle]
pub extern "C" fn mapkv_get_last_error() -> *const std::ffi::c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(cstr) => cstr.as_ptr(),
        None => std::ptr::null(),
    })
}

/// Clears the last error message.
#[no_mangle]
pub extern "C" fn mapkv_clear_error() {
    clear_last_error();
}
