//! The memory-mapped region.
//!
//! [`MappedRegion`] composes a [`RegionBackend`] with an in-process mapping
//! and owns the mapping's whole lifecycle:
//!
//! ```text
//!            open                 release_mapping
//!   (none) ────────▶  Open  ─────────────────────▶ CacheCleared
//!                      ▲  ◀───────────────────────      │
//!                      │      reload / memory()          │
//!                      │                                 │
//!                      └──── reload ◀── RemapPending     │
//!                                                        ▼
//!   any state ───────────────── close ─────────────▶  Closed
//! ```
//!
//! ## Growth
//!
//! File-backed mappings cannot be resized in place on every platform, so a
//! resize always means "resize the backend, then replace the mapping". On
//! POSIX the replacement mapping is created before the old one is dropped,
//! which keeps the old mapping usable if the new one cannot be created. On
//! Windows a live view pins the file size, so the view is released first.
//! Shrinking always releases first, since a mapping past end-of-file faults
//! on access.
//!
//! If the backend was resized but neither the new mapping nor the rollback
//! of the backend size succeeds, the region enters `RemapPending`: it never
//! claims `Open` while the mapping and the backend disagree, and the next
//! [`MappedRegion::reload`] (or [`MappedRegion::memory`]) resumes the remap.
//!
//! ## Concurrency
//!
//! Operations are not internally serialized. Mutating operations take
//! `&mut self`, so the borrow checker ensures no slice from
//! [`MappedRegion::memory`] outlives a grow, release or reload. Use
//! [`crate::SharedRegion`] to share a region between threads.

use crate::backend::{BackendKind, RegionBackend};
use crate::config::RegionConfig;
use crate::error::{RegionError, RegionResult};
use crate::file::FileBackend;
use crate::page::checked_round_up_to_page;
use memmap2::{MmapMut, MmapOptions};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[cfg(any(target_os = "linux", target_os = "android"))]
use crate::anonymous::AnonymousBackend;
#[cfg(any(target_os = "linux", target_os = "android"))]
use std::os::fd::BorrowedFd;

/// What a region is identified by. Fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionIdentity {
    /// A filesystem path.
    Path(PathBuf),
    /// An anonymous shared-memory segment. The name is known only on the
    /// side that created the segment.
    #[cfg(any(target_os = "linux", target_os = "android"))]
    Anonymous {
        /// Name the segment was created with.
        name: Option<String>,
    },
}

impl fmt::Display for RegionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            #[cfg(any(target_os = "linux", target_os = "android"))]
            Self::Anonymous { name: Some(name) } => write!(f, "anonymous:{name}"),
            #[cfg(any(target_os = "linux", target_os = "android"))]
            Self::Anonymous { name: None } => f.write_str("anonymous"),
        }
    }
}

/// Lifecycle state of a [`MappedRegion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    /// Mapped and in agreement with the backend size.
    Open,
    /// Mapping released under memory pressure; handle and size retained.
    CacheCleared,
    /// The backend was resized but the matching mapping is not in place.
    RemapPending,
    /// Mapping released and handle closed.
    Closed,
}

impl fmt::Display for RegionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::CacheCleared => f.write_str("cache-cleared"),
            Self::RemapPending => f.write_str("remap-pending"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

/// Durability of a [`MappedRegion::msync`] flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Block until the storage layer acknowledges the flush.
    Durable,
    /// Schedule the flush and return immediately.
    Async,
}

impl From<bool> for SyncMode {
    fn from(durable: bool) -> Self {
        if durable {
            Self::Durable
        } else {
            Self::Async
        }
    }
}

/// A backend mapped into the process address space.
///
/// The handle and the mapping are owned exclusively and released exactly
/// once, by [`MappedRegion::close`] or on drop.
///
/// # Example
///
/// ```no_run
/// use mapkv_region::{MappedRegion, SyncMode};
///
/// let mut region = MappedRegion::open("store.mkv", 64).unwrap();
/// region.memory().unwrap()[..5].copy_from_slice(b"hello");
/// assert!(region.grow(5000));
/// region.msync(SyncMode::Durable).unwrap();
/// region.close();
/// ```
#[derive(Debug)]
pub struct MappedRegion {
    identity: RegionIdentity,
    kind: BackendKind,
    backend: Option<Box<dyn RegionBackend>>,
    mapping: Option<MmapMut>,
    size: usize,
    pending_size: Option<usize>,
}

impl MappedRegion {
    /// Opens (creating if absent) a file-backed region of at least
    /// `initial_size` bytes.
    ///
    /// An existing larger file is mapped at its own (page-rounded) size.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created, sized or mapped. No
    /// partially constructed region is ever returned.
    pub fn open(path: impl AsRef<Path>, initial_size: usize) -> RegionResult<Self> {
        Self::open_with_config(path, &RegionConfig::new().initial_size(initial_size))
    }

    /// Opens a file-backed region with the given configuration.
    ///
    /// # Errors
    ///
    /// See [`MappedRegion::open`].
    pub fn open_with_config(path: impl AsRef<Path>, config: &RegionConfig) -> RegionResult<Self> {
        let path = path.as_ref();
        let backend = FileBackend::open_with_config(path, config)?;
        Self::from_backend(
            RegionIdentity::Path(path.to_path_buf()),
            Box::new(backend),
            config.initial_size,
        )
    }

    /// Creates a region over a new anonymous shared-memory segment.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::ResourceExhausted`] if the platform refuses
    /// the segment.
    #[cfg(any(target_os = "linux", target_os = "android"))]
    pub fn create_anonymous(name: &str, size: usize) -> RegionResult<Self> {
        let reserved = checked_round_up_to_page(size.max(1)).ok_or(RegionError::InvalidSize {
            requested: size as u64,
        })?;
        let backend = AnonymousBackend::create(name, reserved)?;
        Self::from_backend(
            RegionIdentity::Anonymous {
                name: Some(name.to_string()),
            },
            Box::new(backend),
            size,
        )
    }

    /// Attaches to an anonymous segment created elsewhere, by descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor cannot be duplicated or mapped.
    #[cfg(any(target_os = "linux", target_os = "android"))]
    pub fn attach_anonymous(fd: BorrowedFd<'_>) -> RegionResult<Self> {
        let backend = AnonymousBackend::attach(fd)?;
        Self::from_backend(RegionIdentity::Anonymous { name: None }, Box::new(backend), 0)
    }

    /// Creates an anonymous region, falling back to a file at `path` when
    /// the platform refuses the segment and `config.fallback_to_file` is
    /// set.
    ///
    /// # Errors
    ///
    /// Returns the anonymous error if fallback is disabled, or the file
    /// error if the fallback fails too.
    #[cfg(any(target_os = "linux", target_os = "android"))]
    pub fn open_anonymous_or_file(
        name: &str,
        path: impl AsRef<Path>,
        config: &RegionConfig,
    ) -> RegionResult<Self> {
        match Self::create_anonymous(name, config.initial_size) {
            Err(RegionError::ResourceExhausted { source, .. }) if config.fallback_to_file => {
                warn!(name, error = %source, "anonymous region refused, falling back to file");
                Self::open_with_config(path, config)
            }
            other => other,
        }
    }

    fn from_backend(
        identity: RegionIdentity,
        mut backend: Box<dyn RegionBackend>,
        requested: usize,
    ) -> RegionResult<Self> {
        let existing = backend.size();
        let existing = usize::try_from(existing)
            .map_err(|_| RegionError::InvalidSize { requested: existing })?;
        let size = checked_round_up_to_page(requested.max(existing).max(1)).ok_or(
            RegionError::InvalidSize {
                requested: requested as u64,
            },
        )?;

        if size != existing {
            backend.resize(size as u64)?;
        }
        let mapping = map(backend.as_ref(), size)?;

        debug!(identity = %identity, kind = %backend.kind(), size, "opened mapped region");

        Ok(Self {
            identity,
            kind: backend.kind(),
            backend: Some(backend),
            mapping: Some(mapping),
            size,
            pending_size: None,
        })
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> RegionState {
        if self.backend.is_none() {
            RegionState::Closed
        } else if self.pending_size.is_some() {
            RegionState::RemapPending
        } else if self.mapping.is_none() {
            RegionState::CacheCleared
        } else {
            RegionState::Open
        }
    }

    /// Returns the mapped bytes, re-establishing a released mapping first.
    ///
    /// This may block on I/O. The returned slice cannot outlive the next
    /// mutating call.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidState`] on a closed region and
    /// [`RegionError::Unavailable`] if the mapping cannot be re-established.
    pub fn memory(&mut self) -> RegionResult<&mut [u8]> {
        match self.state() {
            RegionState::Closed => {
                return Err(RegionError::invalid_state("access", RegionState::Closed))
            }
            RegionState::Open => {}
            RegionState::CacheCleared | RegionState::RemapPending => {
                self.reload()
                    .map_err(|e| RegionError::unavailable(e.to_string()))?;
            }
        }

        match self.mapping.as_mut() {
            Some(mapping) => Ok(&mut mapping[..]),
            None => Err(RegionError::unavailable("region is not mapped")),
        }
    }

    /// Returns the mapped bytes only if the region is [`RegionState::Open`].
    ///
    /// Never reloads and never blocks.
    pub fn mapped(&self) -> Option<&[u8]> {
        match self.state() {
            RegionState::Open => self.mapping.as_deref(),
            _ => None,
        }
    }

    /// Returns the committed size in bytes. Always a multiple of the page
    /// size.
    pub fn logical_size(&self) -> usize {
        self.size
    }

    /// Grows the region to at least `target_size` bytes.
    ///
    /// A target within the current size is a no-op. On failure the region
    /// keeps its prior, still valid mapping and `false` is returned.
    pub fn grow(&mut self, target_size: usize) -> bool {
        if self.backend.is_none() {
            return false;
        }
        match self.try_grow(target_size) {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    identity = %self.identity,
                    target_size,
                    error = %err,
                    "failed to grow region"
                );
                false
            }
        }
    }

    /// Like [`MappedRegion::grow`], but reports the failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is closed, the size cannot be
    /// addressed, or the backend cannot be extended or remapped.
    pub fn try_grow(&mut self, target_size: usize) -> RegionResult<()> {
        if self.backend.is_none() {
            return Err(RegionError::invalid_state("grow", RegionState::Closed));
        }
        if target_size <= self.size {
            return Ok(());
        }
        self.resize_to(target_size)
    }

    /// Resizes the region to `roundUpToPage(size)` in either direction.
    ///
    /// Shrinking is the backend step of compaction: the caller must already
    /// have moved live data below `size`.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is closed or the backend cannot be
    /// resized or remapped.
    pub fn truncate(&mut self, size: usize) -> RegionResult<()> {
        if self.backend.is_none() {
            return Err(RegionError::invalid_state("truncate", RegionState::Closed));
        }
        self.resize_to(size.max(1))
    }

    fn resize_to(&mut self, requested: usize) -> RegionResult<()> {
        if self.pending_size.is_some() {
            self.reload()?;
        }

        let new_size = checked_round_up_to_page(requested).ok_or(RegionError::InvalidSize {
            requested: requested as u64,
        })?;
        let old_size = self.size;
        if new_size == old_size {
            return Ok(());
        }

        let Some(backend) = self.backend.as_deref_mut() else {
            return Err(RegionError::invalid_state("resize", RegionState::Closed));
        };

        let had_mapping = self.mapping.is_some();
        if new_size < old_size || cfg!(windows) {
            self.mapping = None;
        }

        if let Err(err) = backend.resize(new_size as u64) {
            if had_mapping && self.mapping.is_none() {
                self.mapping = remap_or_release(backend, old_size, &self.identity);
            }
            return Err(err);
        }

        match map(backend, new_size) {
            Ok(mapping) => {
                self.mapping = Some(mapping);
                self.size = new_size;
                debug!(identity = %self.identity, old_size, new_size, "resized mapped region");
                Ok(())
            }
            Err(err) => {
                match backend.resize(old_size as u64) {
                    Ok(()) => {
                        if had_mapping && self.mapping.is_none() {
                            self.mapping = remap_or_release(backend, old_size, &self.identity);
                        }
                    }
                    Err(rollback) => {
                        warn!(
                            identity = %self.identity,
                            new_size,
                            error = %rollback,
                            "failed to roll back backend size, remap pending"
                        );
                        self.pending_size = Some(new_size);
                    }
                }
                Err(err)
            }
        }
    }

    /// Flushes dirty pages to the backing store.
    ///
    /// [`SyncMode::Durable`] blocks until the flush is acknowledged;
    /// [`SyncMode::Async`] only schedules it. A released mapping has nothing
    /// to flush.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is closed or the flush fails.
    pub fn msync(&self, mode: impl Into<SyncMode>) -> RegionResult<()> {
        if self.backend.is_none() {
            return Err(RegionError::invalid_state("sync", RegionState::Closed));
        }
        if let Some(mapping) = &self.mapping {
            match mode.into() {
                SyncMode::Durable => mapping.flush()?,
                SyncMode::Async => mapping.flush_async()?,
            }
        }
        Ok(())
    }

    /// Releases the mapping but keeps the handle, identity and size.
    ///
    /// Meant for memory-pressure notifications. The next
    /// [`MappedRegion::memory`] or [`MappedRegion::reload`] maps again.
    pub fn release_mapping(&mut self) {
        if self.mapping.take().is_some() {
            debug!(identity = %self.identity, size = self.size, "released region mapping");
        }
    }

    /// Re-establishes a released mapping at the recorded size, or resumes a
    /// pending remap. A no-op on an open region.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is closed or mapping fails.
    pub fn reload(&mut self) -> RegionResult<()> {
        let Some(backend) = self.backend.as_deref() else {
            return Err(RegionError::invalid_state("reload", RegionState::Closed));
        };
        if self.mapping.is_some() && self.pending_size.is_none() {
            return Ok(());
        }

        let size = self.pending_size.unwrap_or(self.size);
        if cfg!(windows) {
            self.mapping = None;
        }
        let mapping = map(backend, size)?;

        self.mapping = Some(mapping);
        self.size = size;
        self.pending_size = None;
        debug!(identity = %self.identity, size, "reloaded region mapping");
        Ok(())
    }

    /// Returns true iff the handle is open, the size is non-zero and the
    /// mapping matches the backend size.
    pub fn is_valid(&self) -> bool {
        self.state() == RegionState::Open && self.size > 0
    }

    /// Releases the mapping and closes the handle.
    ///
    /// Safe to call from any state, any number of times. Never fails.
    pub fn close(&mut self) {
        self.mapping = None;
        self.pending_size = None;
        if self.backend.take().is_some() {
            debug!(identity = %self.identity, "closed mapped region");
        }
    }

    /// Returns the space the backend really occupies.
    ///
    /// Diagnostic only; may be smaller than [`MappedRegion::logical_size`]
    /// on sparse filesystems.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is closed or the metadata query fails.
    pub fn actual_disk_size(&self) -> RegionResult<u64> {
        match self.backend.as_deref() {
            Some(backend) => backend.actual_disk_size(),
            None => Err(RegionError::invalid_state("query", RegionState::Closed)),
        }
    }

    /// Returns the identity the region was opened with.
    pub fn identity(&self) -> &RegionIdentity {
        &self.identity
    }

    /// Returns the backing file path, for file-backed regions.
    pub fn path(&self) -> Option<&Path> {
        match &self.identity {
            RegionIdentity::Path(path) => Some(path),
            #[cfg(any(target_os = "linux", target_os = "android"))]
            RegionIdentity::Anonymous { .. } => None,
        }
    }

    /// Returns the backend kind.
    pub fn backend_kind(&self) -> BackendKind {
        self.kind
    }

    /// Returns the raw descriptor of the backend, or `None` once closed.
    ///
    /// For anonymous regions this is the descriptor to hand to
    /// [`MappedRegion::attach_anonymous`] in another process.
    #[cfg(unix)]
    pub fn raw_fd(&self) -> Option<std::os::fd::RawFd> {
        use std::os::fd::AsRawFd;
        self.backend.as_deref().map(|b| b.file().as_raw_fd())
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        self.close();
    }
}

fn map(backend: &dyn RegionBackend, size: usize) -> RegionResult<MmapMut> {
    // SAFETY: the mapping is owned by the region together with the handle
    // and dropped before any shrink of the backend, so it never extends past
    // end-of-file. Concurrent modification of the shared bytes by other
    // processes is the consumer's contract to coordinate.
    let mapping = unsafe { MmapOptions::new().len(size).map_mut(backend.file())? };
    Ok(mapping)
}

fn remap_or_release(
    backend: &dyn RegionBackend,
    size: usize,
    identity: &RegionIdentity,
) -> Option<MmapMut> {
    match map(backend, size) {
        Ok(mapping) => Some(mapping),
        Err(err) => {
            warn!(identity = %identity, error = %err, "failed to restore mapping, left released");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{page_size, round_up_to_page};
    use tempfile::tempdir;

    #[test]
    fn open_rounds_to_page() {
        let dir = tempdir().unwrap();
        let region = MappedRegion::open(dir.path().join("store"), 64).unwrap();

        assert_eq!(region.logical_size(), page_size());
        assert_eq!(region.state(), RegionState::Open);
        assert!(region.is_valid());
        assert_eq!(region.backend_kind(), BackendKind::File);
    }

    #[test]
    fn open_zero_size_maps_one_page() {
        let dir = tempdir().unwrap();
        let region = MappedRegion::open(dir.path().join("store"), 0).unwrap();
        assert_eq!(region.logical_size(), page_size());
        assert!(region.is_valid());
    }

    #[test]
    fn open_adopts_larger_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store");
        std::fs::write(&path, vec![7u8; 3 * page_size() + 10]).unwrap();

        let mut region = MappedRegion::open(&path, 64).unwrap();
        assert_eq!(region.logical_size(), 4 * page_size());

        let memory = region.memory().unwrap();
        assert_eq!(memory[0], 7);
        assert_eq!(memory[3 * page_size() + 9], 7);
        assert_eq!(memory[3 * page_size() + 10], 0);
    }

    #[test]
    fn open_missing_without_create_fails() {
        let dir = tempdir().unwrap();
        let config = RegionConfig::new().create_if_missing(false);
        let result = MappedRegion::open_with_config(dir.path().join("missing"), &config);
        assert!(matches!(result, Err(RegionError::Io(_))));
    }

    #[test]
    fn grow_within_size_is_noop() {
        let dir = tempdir().unwrap();
        let mut region = MappedRegion::open(dir.path().join("store"), 64).unwrap();

        assert!(region.grow(10));
        assert!(region.grow(page_size()));
        assert_eq!(region.logical_size(), page_size());
    }

    #[test]
    fn grow_zero_fills_new_range() {
        let dir = tempdir().unwrap();
        let mut region = MappedRegion::open(dir.path().join("store"), 64).unwrap();
        region.memory().unwrap().fill(0xab);

        let page = page_size();
        assert!(region.grow(page + 1));
        assert_eq!(region.logical_size(), 2 * page);

        let memory = region.memory().unwrap();
        assert!(memory[..page].iter().all(|&b| b == 0xab));
        assert!(memory[page..].iter().all(|&b| b == 0));
    }

    #[test]
    fn release_and_reload_preserve_content() {
        let dir = tempdir().unwrap();
        let mut region = MappedRegion::open(dir.path().join("store"), 64).unwrap();
        region.memory().unwrap()[..4].copy_from_slice(b"mkv!");
        region.msync(SyncMode::Durable).unwrap();

        region.release_mapping();
        assert_eq!(region.state(), RegionState::CacheCleared);
        assert!(!region.is_valid());
        assert!(region.mapped().is_none());
        assert_eq!(region.logical_size(), page_size());

        region.reload().unwrap();
        assert_eq!(region.state(), RegionState::Open);
        assert_eq!(&region.mapped().unwrap()[..4], b"mkv!");
    }

    #[test]
    fn memory_reloads_implicitly() {
        let dir = tempdir().unwrap();
        let mut region = MappedRegion::open(dir.path().join("store"), 64).unwrap();
        region.memory().unwrap()[0] = 42;

        region.release_mapping();
        assert_eq!(region.memory().unwrap()[0], 42);
        assert!(region.is_valid());
    }

    #[test]
    fn reload_on_open_region_is_noop() {
        let dir = tempdir().unwrap();
        let mut region = MappedRegion::open(dir.path().join("store"), 64).unwrap();
        region.reload().unwrap();
        region.reload().unwrap();
        assert_eq!(region.state(), RegionState::Open);
    }

    #[test]
    fn grow_from_cache_cleared() {
        let dir = tempdir().unwrap();
        let mut region = MappedRegion::open(dir.path().join("store"), 64).unwrap();
        region.release_mapping();

        assert!(region.grow(3 * page_size()));
        assert_eq!(region.state(), RegionState::Open);
        assert_eq!(region.logical_size(), 3 * page_size());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn failed_grow_keeps_mapping() {
        let dir = tempdir().unwrap();
        let mut region = MappedRegion::open(dir.path().join("store"), 64).unwrap();
        region.memory().unwrap()[..3].copy_from_slice(b"abc");

        // Past the largest file offset the OS accepts.
        assert!(!region.grow(1usize << 63));
        assert!(matches!(region.try_grow(1usize << 63), Err(RegionError::Io(_))));
        assert_eq!(region.state(), RegionState::Open);
        assert!(region.is_valid());
        assert_eq!(region.logical_size(), page_size());
        assert_eq!(&region.mapped().unwrap()[..3], b"abc");

        assert!(!region.grow(usize::MAX));
        assert!(matches!(
            region.try_grow(usize::MAX),
            Err(RegionError::InvalidSize { .. })
        ));
        assert!(region.is_valid());
        assert_eq!(region.logical_size(), page_size());
        assert_eq!(&region.memory().unwrap()[..3], b"abc");

        assert!(region.grow(page_size() + 1));
        assert_eq!(&region.memory().unwrap()[..3], b"abc");
    }

    fn leave_remap_pending(region: &mut MappedRegion, new_size: usize) {
        region
            .backend
            .as_deref_mut()
            .unwrap()
            .resize(new_size as u64)
            .unwrap();
        region.pending_size = Some(new_size);
    }

    #[test]
    fn memory_resumes_pending_remap() {
        let dir = tempdir().unwrap();
        let page = page_size();
        let mut region = MappedRegion::open(dir.path().join("store"), 64).unwrap();
        region.memory().unwrap()[..3].copy_from_slice(b"abc");
        region.msync(SyncMode::Durable).unwrap();

        leave_remap_pending(&mut region, 2 * page);
        assert_eq!(region.state(), RegionState::RemapPending);
        assert!(region.mapped().is_none());
        assert!(!region.is_valid());

        let memory = region.memory().unwrap();
        assert_eq!(memory.len(), 2 * page);
        assert_eq!(&memory[..3], b"abc");
        assert!(memory[page..].iter().all(|&b| b == 0));

        assert_eq!(region.state(), RegionState::Open);
        assert_eq!(region.logical_size(), 2 * page);
        assert!(region.is_valid());
    }

    #[test]
    fn reload_and_resize_resume_pending_remap() {
        let dir = tempdir().unwrap();
        let page = page_size();
        let mut region = MappedRegion::open(dir.path().join("store"), 64).unwrap();

        leave_remap_pending(&mut region, 2 * page);
        region.reload().unwrap();
        assert_eq!(region.state(), RegionState::Open);
        assert_eq!(region.logical_size(), 2 * page);

        leave_remap_pending(&mut region, 3 * page);
        assert!(region.grow(4 * page));
        assert_eq!(region.state(), RegionState::Open);
        assert_eq!(region.logical_size(), 4 * page);
        assert_eq!(region.mapped().unwrap().len(), 4 * page);

        leave_remap_pending(&mut region, 5 * page);
        region.close();
        assert_eq!(region.state(), RegionState::Closed);
    }

    #[test]
    fn truncate_shrinks_and_keeps_prefix() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store");
        let mut region = MappedRegion::open(&path, 4 * page_size()).unwrap();
        region.memory().unwrap()[..3].copy_from_slice(b"abc");

        region.truncate(100).unwrap();
        assert_eq!(region.logical_size(), page_size());
        assert_eq!(&region.memory().unwrap()[..3], b"abc");
        assert_eq!(
            std::fs::metadata(&path).unwrap().len(),
            page_size() as u64
        );
    }

    #[test]
    fn close_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut region = MappedRegion::open(dir.path().join("store"), 64).unwrap();

        region.close();
        assert_eq!(region.state(), RegionState::Closed);
        assert!(!region.is_valid());

        region.close();
        assert_eq!(region.state(), RegionState::Closed);
    }

    #[test]
    fn operations_on_closed_region() {
        let dir = tempdir().unwrap();
        let mut region = MappedRegion::open(dir.path().join("store"), 64).unwrap();
        region.close();

        assert!(matches!(
            region.memory(),
            Err(RegionError::InvalidState { .. })
        ));
        assert!(!region.grow(2 * page_size()));
        assert!(!region.grow(1));
        assert!(region.reload().is_err());
        assert!(region.msync(SyncMode::Async).is_err());
        assert!(region.truncate(1).is_err());
        assert!(region.actual_disk_size().is_err());
        region.release_mapping();
        #[cfg(unix)]
        assert_eq!(region.raw_fd(), None);
    }

    #[test]
    fn grow_sequence_matches_max() {
        let dir = tempdir().unwrap();
        let mut region = MappedRegion::open(dir.path().join("store"), 100).unwrap();

        let targets = [5000, 300, 70_000, 12_000, 70_001];
        let mut previous = region.logical_size();
        for target in targets {
            assert!(region.grow(target));
            assert!(region.logical_size() >= previous);
            previous = region.logical_size();
        }
        assert_eq!(region.logical_size(), round_up_to_page(70_001));
    }

    #[test]
    fn async_sync_succeeds() {
        let dir = tempdir().unwrap();
        let mut region = MappedRegion::open(dir.path().join("store"), 64).unwrap();
        region.memory().unwrap()[0] = 1;
        region.msync(false).unwrap();
        region.msync(true).unwrap();
    }

    #[test]
    fn identity_accessors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store");
        let region = MappedRegion::open(&path, 64).unwrap();

        assert_eq!(region.identity(), &RegionIdentity::Path(path.clone()));
        assert_eq!(region.path(), Some(path.as_path()));
        #[cfg(unix)]
        assert!(region.raw_fd().is_some());
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    #[test]
    fn anonymous_region_lifecycle() {
        let mut region = MappedRegion::create_anonymous("mapkv-region", 64).unwrap();
        assert_eq!(region.backend_kind(), BackendKind::Anonymous);
        assert_eq!(region.logical_size(), page_size());
        assert_eq!(region.path(), None);
        assert_eq!(region.identity().to_string(), "anonymous:mapkv-region");

        assert!(region.grow(2 * page_size()));
        assert!(region.memory().unwrap()[page_size()..].iter().all(|&b| b == 0));
        region.close();
    }
}
