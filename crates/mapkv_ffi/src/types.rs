//! Type definitions for FFI.

use crate::error::MapKvResult;

/// An opaque region handle.
///
/// This is a pointer to the internal region structure.
/// Never dereference or modify directly.
#[repr(C)]
pub struct MapKvRegionHandle {
    _private: [u8; 0],
}

/// A borrowed, length-prefixed UTF-8 string.
///
/// Never relies on a NUL terminator; the bytes may contain zeros.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct MapKvStr {
    /// Pointer to the first byte. May be null only when `len` is 0.
    pub ptr: *const u8,
    /// Length in bytes.
    pub len: u64,
}

impl MapKvStr {
    /// Creates a string view over `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            ptr: bytes.as_ptr(),
            len: bytes.len() as u64,
        }
    }

    /// Returns the bytes, or `None` for a null pointer with a non-zero
    /// length.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of `len` bytes for the lifetime `'a`.
    pub unsafe fn as_bytes<'a>(&self) -> Option<&'a [u8]> {
        let len = usize::try_from(self.len).ok()?;
        if self.ptr.is_null() {
            return if len == 0 { Some(&[]) } else { None };
        }
        Some(std::slice::from_raw_parts(self.ptr, len))
    }

    /// Returns the string as UTF-8.
    ///
    /// # Safety
    ///
    /// Same as [`MapKvStr::as_bytes`].
    pub unsafe fn as_str<'a>(&self) -> Result<&'a str, MapKvResult> {
        let bytes = self.as_bytes().ok_or(MapKvResult::NullPointer)?;
        std::str::from_utf8(bytes).map_err(|_| MapKvResult::InvalidArgument)
    }
}
