//! Buffer types for FFI.

/// A byte buffer for FFI.
///
/// `owned` tells the caller whether to release it: owned buffers must be
/// passed to `mapkv_free_buffer`; borrowed ones point into region memory
/// and are only valid until the next mutating call on the region.
#[repr(C)]
#[derive(Debug)]
pub struct MapKvBuffer {
    /// Pointer to data.
    pub data: *mut u8,
    /// Length in bytes.
    pub len: usize,
    /// Capacity (for internal use).
    pub capacity: usize,
    /// Whether the caller owns the allocation.
    pub owned: bool,
}

impl MapKvBuffer {
    /// Creates an owned buffer from a Vec.
    pub fn from_vec(vec: Vec<u8>) -> Self {
        let mut vec = vec.into_boxed_slice();
        let data = vec.as_mut_ptr();
        let len = vec.len();
        std::mem::forget(vec);

        Self {
            data,
            len,
            capacity: len,
            owned: true,
        }
    }

    /// Creates a borrowed view over memory the caller must not free.
    pub fn borrowed(bytes: &mut [u8]) -> Self {
        Self {
            data: bytes.as_mut_ptr(),
            len: bytes.len(),
            capacity: bytes.len(),
            owned: false,
        }
    }

    /// Creates an empty buffer.
    pub fn empty() -> Self {
        Self {
            data: std::ptr::null_mut(),
            len: 0,
            capacity: 0,
            owned: false,
        }
    }

    /// Returns true if the buffer is null/empty.
    pub fn is_null(&self) -> bool {
        self.data.is_null()
    }

    /// Converts back to a Vec, consuming the buffer.
    ///
    /// Borrowed buffers are copied.
    ///
    /// # Safety
    ///
    /// An owned buffer must have been created by [`MapKvBuffer::from_vec`];
    /// a borrowed one must still point to valid memory.
    pub unsafe fn into_vec(self) -> Vec<u8> {
        if self.data.is_null() {
            return Vec::new();
        }
        if self.owned {
            Vec::from_raw_parts(self.data, self.len, self.capacity)
        } else {
            std::slice::from_raw_parts(self.data, self.len).to_vec()
        }
    }
}

/// Frees a buffer allocated by mapkv.
///
/// Borrowed buffers are left untouched.
///
/// # Safety
///
/// The buffer must have been returned by a mapkv FFI function and not freed
/// before.
#[no_mangle]
pub unsafe extern "C" fn mapkv_free_buffer(buffer: MapKvBuffer) {
    if buffer.owned && !buffer.data.is_null() {
        drop(Vec::from_raw_parts(buffer.data, buffer.len, buffer.capacity));
    }
}
