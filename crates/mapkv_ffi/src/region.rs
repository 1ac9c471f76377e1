//! Region FFI functions.
//!
//! Each handle owns a [`SharedRegion`], so calls from several threads of the
//! host runtime are serialized by the region lock.

use crate::buffer::MapKvBuffer;
use crate::error::{clear_last_error, report, set_last_error, MapKvResult};
use crate::types::{MapKvRegionHandle, MapKvStr};
use mapkv_region::{MappedRegion, SharedRegion, SyncMode};
use std::path::Path;

unsafe fn shared<'a>(handle: *const MapKvRegionHandle) -> Option<&'a SharedRegion> {
    (handle as *const SharedRegion).as_ref()
}

unsafe fn store_handle(region: MappedRegion, out_handle: *mut *mut MapKvRegionHandle) {
    let boxed = Box::new(SharedRegion::new(region));
    *out_handle = Box::into_raw(boxed) as *mut MapKvRegionHandle;
}

fn to_usize(value: u64) -> Result<usize, MapKvResult> {
    usize::try_from(value).map_err(|_| {
        set_last_error(format!("size {value} exceeds the address space"));
        MapKvResult::InvalidArgument
    })
}

/// Opens a file-backed region.
///
/// # Arguments
///
/// * `path` - UTF-8 path of the backing file
/// * `initial_size` - Minimum size in bytes (page-rounded)
/// * `out_handle` - Output pointer for the region handle
///
/// # Returns
///
/// `MapKvResult::Ok` on success, error code otherwise.
///
/// # Safety
///
/// - `path` must describe valid memory
/// - `out_handle` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn mapkv_region_open(
    path: MapKvStr,
    initial_size: u64,
    out_handle: *mut *mut MapKvRegionHandle,
) -> MapKvResult {
    clear_last_error();

    if out_handle.is_null() {
        set_last_error("null pointer argument");
        return MapKvResult::NullPointer;
    }

    let path = match path.as_str() {
        Ok(p) => p,
        Err(code) => {
            set_last_error("invalid path");
            return code;
        }
    };
    let initial_size = match to_usize(initial_size) {
        Ok(s) => s,
        Err(code) => return code,
    };

    match MappedRegion::open(Path::new(path), initial_size) {
        Ok(region) => {
            store_handle(region, out_handle);
            MapKvResult::Ok
        }
        Err(e) => report(&e),
    }
}

/// Creates a region over a new anonymous shared-memory segment.
///
/// Returns `MapKvResult::ResourceExhausted` when the platform refuses the
/// segment, and `MapKvResult::NotSupported` where anonymous regions do not
/// exist.
///
/// # Safety
///
/// - `name` must describe valid memory
/// - `out_handle` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn mapkv_region_open_anonymous(
    name: MapKvStr,
    size: u64,
    out_handle: *mut *mut MapKvRegionHandle,
) -> MapKvResult {
    clear_last_error();

    if out_handle.is_null() {
        set_last_error("null pointer argument");
        return MapKvResult::NullPointer;
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        let name = match name.as_str() {
            Ok(n) => n,
            Err(code) => {
                set_last_error("invalid region name");
                return code;
            }
        };
        let size = match to_usize(size) {
            Ok(s) => s,
            Err(code) => return code,
        };

        match MappedRegion::create_anonymous(name, size) {
            Ok(region) => {
                store_handle(region, out_handle);
                MapKvResult::Ok
            }
            Err(e) => report(&e),
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    {
        let _ = (name, size);
        set_last_error("anonymous regions are not supported on this platform");
        MapKvResult::NotSupported
    }
}

/// Attaches to an anonymous segment by descriptor.
///
/// The descriptor is duplicated; the caller keeps ownership of `fd`.
///
/// # Safety
///
/// - `fd` must be an open descriptor for the duration of the call
/// - `out_handle` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn mapkv_region_attach(
    fd: i32,
    out_handle: *mut *mut MapKvRegionHandle,
) -> MapKvResult {
    clear_last_error();

    if out_handle.is_null() {
        set_last_error("null pointer argument");
        return MapKvResult::NullPointer;
    }
    if fd < 0 {
        set_last_error(format!("invalid descriptor {fd}"));
        return MapKvResult::InvalidArgument;
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        let borrowed = std::os::fd::BorrowedFd::borrow_raw(fd);
        match MappedRegion::attach_anonymous(borrowed) {
            Ok(region) => {
                store_handle(region, out_handle);
                MapKvResult::Ok
            }
            Err(e) => report(&e),
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    {
        set_last_error("anonymous regions are not supported on this platform");
        MapKvResult::NotSupported
    }
}

/// Returns the region memory as a borrowed buffer.
///
/// A mapping released by `mapkv_region_clear_memory_cache` is re-established
/// first. The buffer must not be freed and is invalidated by the next grow,
/// trim, reload, clear or close on this handle.
///
/// # Safety
///
/// - `handle` must be a valid handle
/// - `out_buffer` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn mapkv_region_memory(
    handle: *mut MapKvRegionHandle,
    out_buffer: *mut MapKvBuffer,
) -> MapKvResult {
    clear_last_error();

    let Some(region) = shared(handle) else {
        set_last_error("null pointer argument");
        return MapKvResult::NullPointer;
    };
    if out_buffer.is_null() {
        set_last_error("null pointer argument");
        return MapKvResult::NullPointer;
    }

    match region.with_region(|r| r.memory().map(MapKvBuffer::borrowed)) {
        Ok(buffer) => {
            *out_buffer = buffer;
            MapKvResult::Ok
        }
        Err(e) => {
            *out_buffer = MapKvBuffer::empty();
            report(&e)
        }
    }
}

/// Returns the page-rounded logical size (`totalSize`), or 0 for a null
/// handle.
///
/// # Safety
///
/// `handle` must be a valid handle or null.
#[no_mangle]
pub unsafe extern "C" fn mapkv_region_total_size(handle: *mut MapKvRegionHandle) -> u64 {
    shared(handle).map_or(0, |r| r.logical_size() as u64)
}

/// Returns the space the backing store really occupies.
///
/// # Safety
///
/// - `handle` must be a valid handle
/// - `out_size` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn mapkv_region_actual_disk_size(
    handle: *mut MapKvRegionHandle,
    out_size: *mut u64,
) -> MapKvResult {
    clear_last_error();

    let Some(region) = shared(handle) else {
        set_last_error("null pointer argument");
        return MapKvResult::NullPointer;
    };
    if out_size.is_null() {
        set_last_error("null pointer argument");
        return MapKvResult::NullPointer;
    }

    match region.actual_disk_size() {
        Ok(size) => {
            *out_size = size;
            MapKvResult::Ok
        }
        Err(e) => report(&e),
    }
}

/// Grows the region to at least `size` bytes.
///
/// Returns false on failure; the region then keeps its previous mapping.
///
/// # Safety
///
/// `handle` must be a valid handle or null.
#[no_mangle]
pub unsafe extern "C" fn mapkv_region_grow(handle: *mut MapKvRegionHandle, size: u64) -> bool {
    clear_last_error();

    let Some(region) = shared(handle) else {
        set_last_error("null pointer argument");
        return false;
    };
    let Ok(size) = to_usize(size) else {
        return false;
    };

    match region.with_region(|r| r.try_grow(size)) {
        Ok(()) => true,
        Err(e) => {
            report(&e);
            false
        }
    }
}

/// Flushes dirty pages. `durable` blocks until the flush is acknowledged.
///
/// # Safety
///
/// `handle` must be a valid handle.
#[no_mangle]
pub unsafe extern "C" fn mapkv_region_sync(
    handle: *mut MapKvRegionHandle,
    durable: bool,
) -> MapKvResult {
    clear_last_error();

    let Some(region) = shared(handle) else {
        set_last_error("null pointer argument");
        return MapKvResult::NullPointer;
    };

    match region.sync(SyncMode::from(durable)) {
        Ok(()) => MapKvResult::Ok,
        Err(e) => report(&e),
    }
}

/// Releases the mapping in response to a low-memory notification.
///
/// # Safety
///
/// `handle` must be a valid handle.
#[no_mangle]
pub unsafe extern "C" fn mapkv_region_clear_memory_cache(
    handle: *mut MapKvRegionHandle,
) -> MapKvResult {
    clear_last_error();

    let Some(region) = shared(handle) else {
        set_last_error("null pointer argument");
        return MapKvResult::NullPointer;
    };

    region.release_mapping();
    MapKvResult::Ok
}

/// Re-establishes a released mapping. A no-op on a mapped region.
///
/// # Safety
///
/// `handle` must be a valid handle.
#[no_mangle]
pub unsafe extern "C" fn mapkv_region_reload(handle: *mut MapKvRegionHandle) -> MapKvResult {
    clear_last_error();

    let Some(region) = shared(handle) else {
        set_last_error("null pointer argument");
        return MapKvResult::NullPointer;
    };

    match region.reload() {
        Ok(()) => MapKvResult::Ok,
        Err(e) => report(&e),
    }
}

/// Shrinks (or grows) the backing store to `size` bytes, page-rounded.
///
/// The engine calls this after compaction has moved live data below `size`.
///
/// # Safety
///
/// `handle` must be a valid handle.
#[no_mangle]
pub unsafe extern "C" fn mapkv_region_trim(
    handle: *mut MapKvRegionHandle,
    size: u64,
) -> MapKvResult {
    clear_last_error();

    let Some(region) = shared(handle) else {
        set_last_error("null pointer argument");
        return MapKvResult::NullPointer;
    };
    let size = match to_usize(size) {
        Ok(s) => s,
        Err(code) => return code,
    };

    match region.truncate(size) {
        Ok(()) => MapKvResult::Ok,
        Err(e) => report(&e),
    }
}

/// Returns true if the region is open and mapped.
///
/// # Safety
///
/// `handle` must be a valid handle or null.
#[no_mangle]
pub unsafe extern "C" fn mapkv_region_is_valid(handle: *mut MapKvRegionHandle) -> bool {
    shared(handle).is_some_and(SharedRegion::is_valid)
}

/// Returns the backing descriptor, or -1 if closed or unsupported.
///
/// For anonymous regions this is the descriptor to pass to
/// `mapkv_region_attach` in another process.
///
/// # Safety
///
/// `handle` must be a valid handle or null.
#[no_mangle]
pub unsafe extern "C" fn mapkv_region_fd(handle: *mut MapKvRegionHandle) -> i32 {
    #[cfg(unix)]
    {
        shared(handle)
            .and_then(|r| r.with_region(|region| region.raw_fd()))
            .unwrap_or(-1)
    }

    #[cfg(not(unix))]
    {
        let _ = handle;
        -1
    }
}

/// Unmaps the region and closes its handle.
///
/// Idempotent: the handle stays allocated until `mapkv_region_free`.
///
/// # Safety
///
/// `handle` must be a valid handle.
#[no_mangle]
pub unsafe extern "C" fn mapkv_region_close(handle: *mut MapKvRegionHandle) -> MapKvResult {
    clear_last_error();

    let Some(region) = shared(handle) else {
        set_last_error("null pointer argument");
        return MapKvResult::NullPointer;
    };

    region.close();
    MapKvResult::Ok
}

/// Closes the region and frees the handle.
///
/// # Safety
///
/// The handle must have been returned by one of the open functions and must
/// not be used after this call.
#[no_mangle]
pub unsafe extern "C" fn mapkv_region_free(handle: *mut MapKvRegionHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle as *mut SharedRegion));
    }
}

/// Reads a whole file into a newly allocated, caller-owned buffer.
///
/// # Safety
///
/// - `path` must describe valid memory
/// - `out_buffer` must be a valid pointer
#[no_mangle]
pub unsafe extern "C" fn mapkv_read_whole_file(
    path: MapKvStr,
    out_buffer: *mut MapKvBuffer,
) -> MapKvResult {
    clear_last_error();

    if out_buffer.is_null() {
        set_last_error("null pointer argument");
        return MapKvResult::NullPointer;
    }
    let path = match path.as_str() {
        Ok(p) => p,
        Err(code) => {
            set_last_error("invalid path");
            return code;
        }
    };

    match mapkv_region::read_whole_file(Path::new(path)) {
        Ok(bytes) => {
            *out_buffer = MapKvBuffer::from_vec(bytes);
            MapKvResult::Ok
        }
        Err(e) => {
            *out_buffer = MapKvBuffer::empty();
            report(&e)
        }
    }
}

/// Returns the OS page size.
#[no_mangle]
pub extern "C" fn mapkv_page_size() -> u64 {
    mapkv_region::page_size() as u64
}
