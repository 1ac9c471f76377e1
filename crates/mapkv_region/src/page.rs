//! OS page size and page rounding.
//!
//! The page size is queried once per process and cached. Every size handed to
//! a backend or to the mapping call goes through [`checked_round_up_to_page`],
//! since remapping on page-unaligned boundaries is undefined on some platforms.

use std::sync::OnceLock;

static PAGE_SIZE: OnceLock<usize> = OnceLock::new();

/// Returns the OS memory page size in bytes.
pub fn page_size() -> usize {
    *PAGE_SIZE.get_or_init(query_page_size)
}

/// Returns the smallest multiple of [`page_size`] that is `>= size`.
///
/// Saturates to the largest representable page multiple when the rounded
/// value would overflow `usize`.
pub fn round_up_to_page(size: usize) -> usize {
    checked_round_up_to_page(size).unwrap_or(usize::MAX / page_size() * page_size())
}

/// Like [`round_up_to_page`], but returns `None` on overflow.
pub fn checked_round_up_to_page(size: usize) -> Option<usize> {
    let page = page_size();
    size.checked_add(page - 1).map(|n| n / page * page)
}

/// Returns true if `size` is a multiple of the page size.
pub fn is_page_aligned(size: usize) -> bool {
    size % page_size() == 0
}

#[cfg(unix)]
fn query_page_size() -> usize {
    rustix::param::page_size()
}

#[cfg(windows)]
fn query_page_size() -> usize {
    use std::mem::MaybeUninit;
    use windows_sys::Win32::System::SystemInformation::{GetSystemInfo, SYSTEM_INFO};

    // SAFETY: GetSystemInfo fully initializes the struct it is handed and
    // cannot fail.
    let info = unsafe {
        let mut info = MaybeUninit::<SYSTEM_INFO>::uninit();
        GetSystemInfo(info.as_mut_ptr());
        info.assume_init()
    };
    info.dwPageSize as usize
}

#[cfg(not(any(unix, windows)))]
fn query_page_size() -> usize {
    4096
}
