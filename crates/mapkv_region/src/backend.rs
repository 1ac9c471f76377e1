//! Region backend trait definition.

use crate::error::RegionResult;
use std::fmt;
use std::fs::File;

/// The kind of storage standing behind a mapped region.
///
/// Fixed when the region is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// A regular file identified by a filesystem path.
    File,
    /// An anonymous kernel-managed shared-memory segment identified by a
    /// descriptor.
    Anonymous,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => f.write_str("file"),
            Self::Anonymous => f.write_str("anonymous"),
        }
    }
}

/// The storage behind a [`crate::MappedRegion`].
///
/// Backends are **opaque byte stores** sized in bytes. They know nothing
/// about the mapping; [`crate::MappedRegion`] maps whatever
/// [`RegionBackend::file`] exposes at the size it last resized to.
///
/// # Invariants
///
/// - `size` reports the length last passed to `resize` (or found at open)
/// - bytes in `[old_size, new_size)` read back as zero after a growing `resize`
/// - a failed `resize` leaves `size` unchanged
/// - Backends must be `Send + Sync` so regions can sit behind a lock
///
/// # Implementors
///
/// - [`super::FileBackend`] - For path-identified regular files
/// - `AnonymousBackend` - For anonymous shared memory (Linux and Android)
pub trait RegionBackend: Send + Sync + fmt::Debug {
    /// Returns which kind of backend this is.
    fn kind(&self) -> BackendKind;

    /// Returns the OS handle the mapping is created from.
    fn file(&self) -> &File;

    /// Returns the logical size in bytes, as last resized to.
    fn size(&self) -> u64;

    /// Returns the space really allocated for the backend.
    ///
    /// May be smaller than [`RegionBackend::size`] on sparse filesystems.
    /// Only meant for diagnostics, never for mapping decisions.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata cannot be queried.
    fn actual_disk_size(&self) -> RegionResult<u64>;

    /// Resizes the backend to exactly `new_size` bytes.
    ///
    /// Growing guarantees the new range reads back as zero. The caller
    /// must not hold a mapping past `new_size` when shrinking.
    ///
    /// # Errors
    ///
    /// Returns an error on insufficient space or filesystem limits. The
    /// size is unchanged on error.
    fn resize(&mut self, new_size: u64) -> RegionResult<()>;
}

/// Returns the allocated size reported by the metadata of `file`.
pub(crate) fn allocated_size(file: &File) -> RegionResult<u64> {
    let metadata = file.metadata()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        // st_blocks is always counted in 512-byte units.
        Ok(metadata.blocks().saturating_mul(512))
    }

    #[cfg(not(unix))]
    {
        Ok(metadata.len())
    }
}
