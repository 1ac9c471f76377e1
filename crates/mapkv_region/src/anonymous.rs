//! Anonymous shared-memory backend.
//!
//! Backs a region with a kernel-managed memory segment identified by a file
//! descriptor instead of a path. Used where filesystem sandboxing makes
//! path-based shared files unreliable for multi-process access: the owner
//! creates the segment and hands the descriptor to the other process (for
//! example over binder or a Unix socket), which attaches to it.
//!
//! Segments are created with `memfd_create`. Sizing is lazy: pages are only
//! committed when first touched, so creation cost does not depend on the
//! reserved size, and the kernel guarantees that grown ranges read as zero.

use crate::backend::{allocated_size, BackendKind, RegionBackend};
use crate::error::{RegionError, RegionResult};
use rustix::fs::{ftruncate, memfd_create, MemfdFlags};
use std::fs::File;
use std::io;
use std::os::fd::{AsFd, BorrowedFd};

/// A region backend over an anonymous shared-memory segment.
#[derive(Debug)]
pub struct AnonymousBackend {
    name: Option<String>,
    file: File,
    size: u64,
}

impl AnonymousBackend {
    /// Creates a new segment named `name`, reserving `max_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::ResourceExhausted`] if the platform refuses
    /// the segment or the reservation.
    pub fn create(name: &str, max_size: usize) -> RegionResult<Self> {
        let exhausted = |source: io::Error| RegionError::ResourceExhausted {
            name: name.to_string(),
            size: max_size,
            source,
        };

        let fd = memfd_create(name, MemfdFlags::CLOEXEC).map_err(|e| exhausted(e.into()))?;
        ftruncate(&fd, max_size as u64).map_err(|e| exhausted(e.into()))?;

        Ok(Self {
            name: Some(name.to_string()),
            file: File::from(fd),
            size: max_size as u64,
        })
    }

    /// Attaches to an existing segment by descriptor.
    ///
    /// The descriptor is duplicated; the caller keeps ownership of `fd`.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor cannot be duplicated or queried.
    pub fn attach(fd: BorrowedFd<'_>) -> RegionResult<Self> {
        let file = File::from(fd.try_clone_to_owned()?);
        let size = file.metadata()?.len();

        Ok(Self {
            name: None,
            file,
            size,
        })
    }

    /// Returns the name the segment was created with, if this side created
    /// it.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the descriptor to share with other processes.
    #[must_use]
    pub fn descriptor(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl RegionBackend for AnonymousBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Anonymous
    }

    fn file(&self) -> &File {
        &self.file
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn actual_disk_size(&self) -> RegionResult<u64> {
        allocated_size(&self.file)
    }

    fn resize(&mut self, new_size: u64) -> RegionResult<()> {
        ftruncate(&self.file, new_size).map_err(|e| RegionError::ResourceExhausted {
            name: self.name.clone().unwrap_or_default(),
            size: new_size as usize,
            source: e.into(),
        })?;
        self.size = new_size;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Seek, SeekFrom, Write};

    #[test]
    fn anonymous_create() {
        let backend = AnonymousBackend::create("mapkv-test", 8192).unwrap();
        assert_eq!(backend.size(), 8192);
        assert_eq!(backend.name(), Some("mapkv-test"));
        assert_eq!(backend.kind(), BackendKind::Anonymous);
    }

    #[test]
    fn anonymous_attach_shares_content() {
        let owner = AnonymousBackend::create("mapkv-share", 4096).unwrap();
        let mut writer = owner.file();
        writer.write_all(b"shared").unwrap();

        let attached = AnonymousBackend::attach(owner.descriptor()).unwrap();
        assert_eq!(attached.size(), 4096);
        assert_eq!(attached.name(), None);

        let mut reader = attached.file();
        reader.seek(SeekFrom::Start(0)).unwrap();
        let mut buf = [0u8; 6];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"shared");
    }

    #[test]
    fn anonymous_resize_zero_fills() {
        let mut backend = AnonymousBackend::create("mapkv-resize", 4096).unwrap();
        backend.resize(8192).unwrap();
        assert_eq!(backend.size(), 8192);

        let mut reader = backend.file();
        reader.seek(SeekFrom::Start(4096)).unwrap();
        let mut buf = vec![0xffu8; 4096];
        reader.read_exact(&mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }
}
