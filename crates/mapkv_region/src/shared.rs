//! Thread-safe wrapper enforcing the consumer lock discipline.
//!
//! A [`MappedRegion`] is not internally serialized. [`SharedRegion`] puts it
//! behind a single `RwLock`: anything that can change the mapping (grow,
//! truncate, release, reload, close) takes the lock exclusively, and reads
//! of the mapped bytes take it shared, so no reader ever observes a mapping
//! that is being replaced.
//!
//! Cross-process coordination is out of scope: two processes mapping the
//! same file each hold their own `SharedRegion` and must agree on writers by
//! other means.

use crate::error::RegionResult;
use crate::region::{MappedRegion, RegionState, SyncMode};
use parking_lot::RwLock;

/// A [`MappedRegion`] that can be shared between threads.
#[derive(Debug)]
pub struct SharedRegion {
    inner: RwLock<MappedRegion>,
}

impl SharedRegion {
    /// Wraps a region.
    #[must_use]
    pub fn new(region: MappedRegion) -> Self {
        Self {
            inner: RwLock::new(region),
        }
    }

    /// Runs `f` over the mapped bytes under the shared lock.
    ///
    /// A released mapping is re-established first, under the exclusive
    /// lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is closed or cannot be remapped.
    pub fn read<R>(&self, f: impl FnOnce(&[u8]) -> R) -> RegionResult<R> {
        {
            let region = self.inner.read();
            if let Some(bytes) = region.mapped() {
                return Ok(f(bytes));
            }
        }

        let mut region = self.inner.write();
        let bytes = region.memory()?;
        Ok(f(bytes))
    }

    /// Runs `f` over the mapped bytes under the exclusive lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is closed or cannot be remapped.
    pub fn write<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> RegionResult<R> {
        let mut region = self.inner.write();
        let bytes = region.memory()?;
        Ok(f(bytes))
    }

    /// Runs `f` with exclusive access to the region itself.
    pub fn with_region<R>(&self, f: impl FnOnce(&mut MappedRegion) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// See [`MappedRegion::grow`].
    pub fn grow(&self, target_size: usize) -> bool {
        self.inner.write().grow(target_size)
    }

    /// See [`MappedRegion::truncate`].
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be resized or remapped.
    pub fn truncate(&self, size: usize) -> RegionResult<()> {
        self.inner.write().truncate(size)
    }

    /// See [`MappedRegion::msync`].
    ///
    /// # Errors
    ///
    /// Returns an error if the region is closed or the flush fails.
    pub fn sync(&self, mode: impl Into<SyncMode>) -> RegionResult<()> {
        self.inner.read().msync(mode)
    }

    /// See [`MappedRegion::release_mapping`].
    pub fn release_mapping(&self) {
        self.inner.write().release_mapping();
    }

    /// See [`MappedRegion::reload`].
    ///
    /// # Errors
    ///
    /// Returns an error if the region is closed or mapping fails.
    pub fn reload(&self) -> RegionResult<()> {
        self.inner.write().reload()
    }

    /// See [`MappedRegion::close`].
    pub fn close(&self) {
        self.inner.write().close();
    }

    /// See [`MappedRegion::logical_size`].
    pub fn logical_size(&self) -> usize {
        self.inner.read().logical_size()
    }

    /// See [`MappedRegion::actual_disk_size`].
    ///
    /// # Errors
    ///
    /// Returns an error if the region is closed or the metadata query fails.
    pub fn actual_disk_size(&self) -> RegionResult<u64> {
        self.inner.read().actual_disk_size()
    }

    /// See [`MappedRegion::is_valid`].
    pub fn is_valid(&self) -> bool {
        self.inner.read().is_valid()
    }

    /// See [`MappedRegion::state`].
    pub fn state(&self) -> RegionState {
        self.inner.read().state()
    }

    /// Unwraps the region.
    #[must_use]
    pub fn into_inner(self) -> MappedRegion {
        self.inner.into_inner()
    }
}

impl From<MappedRegion> for SharedRegion {
    fn from(region: MappedRegion) -> Self {
        Self::new(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::page_size;
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn read_reloads_released_mapping() {
        let dir = tempdir().unwrap();
        let region = MappedRegion::open(dir.path().join("store"), 64).unwrap();
        let shared = SharedRegion::new(region);

        shared.write(|bytes| bytes[0] = 9).unwrap();
        shared.release_mapping();
        assert_eq!(shared.state(), RegionState::CacheCleared);

        assert_eq!(shared.read(|bytes| bytes[0]).unwrap(), 9);
        assert_eq!(shared.state(), RegionState::Open);
    }

    #[test]
    fn read_after_close_fails() {
        let dir = tempdir().unwrap();
        let shared = SharedRegion::from(MappedRegion::open(dir.path().join("store"), 64).unwrap());

        shared.close();
        assert!(shared.read(|bytes| bytes.len()).is_err());
        assert!(!shared.is_valid());
        shared.close();
    }

    #[test]
    fn concurrent_writers_and_grower() {
        let dir = tempdir().unwrap();
        let shared = Arc::new(SharedRegion::new(
            MappedRegion::open(dir.path().join("store"), 64).unwrap(),
        ));
        let page = page_size();

        let handles: Vec<_> = (0..4u8)
            .map(|i| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    for round in 1..=8 {
                        assert!(shared.grow(round * page));
                        shared.write(|bytes| bytes[usize::from(i)] = i + 1).unwrap();
                        let seen = shared.read(|bytes| bytes[usize::from(i)]).unwrap();
                        assert_eq!(seen, i + 1);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.logical_size(), 8 * page);
        shared.read(|bytes| assert_eq!(&bytes[..4], &[1, 2, 3, 4])).unwrap();
    }
}
