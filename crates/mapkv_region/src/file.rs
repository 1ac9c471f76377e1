//! File-based backend for path-identified regions.

use crate::backend::{allocated_size, BackendKind, RegionBackend};
use crate::config::RegionConfig;
use crate::error::RegionResult;
use crate::page::page_size;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// A file-based region backend.
///
/// This backend keeps region content in a regular file, so it survives
/// process restarts and can be mapped by several processes at once.
///
/// # Zero Fill
///
/// `File::set_len` already extends with zeros. When `zero_fill` is enabled
/// the new range is additionally written out with zeros, which forces the
/// filesystem to allocate it and surfaces a full disk as an error from
/// [`RegionBackend::resize`].
///
/// # Example
///
/// ```no_run
/// use mapkv_region::{FileBackend, RegionBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("store.mkv")).unwrap();
/// backend.resize(8192).unwrap();
/// assert_eq!(backend.size(), 8192);
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    file: File,
    size: u64,
    zero_fill: bool,
}

impl FileBackend {
    /// Opens or creates a file backend at the given path with default
    /// options, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created or
    /// opened.
    pub fn open(path: &Path) -> RegionResult<Self> {
        Self::open_with_config(path, &RegionConfig::default())
    }

    /// Opens a file backend honoring the file options in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, the file is
    /// missing and `create_if_missing` is off, or permissions are denied.
    pub fn open_with_config(path: &Path, config: &RegionConfig) -> RegionResult<Self> {
        if config.create_parent_dirs {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(config.create_if_missing)
            .truncate(false)
            .open(path)?;

        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            size,
            zero_fill: config.zero_fill,
        })
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn fill_zeros(&self, start: u64, end: u64) -> std::io::Result<()> {
        let chunk = vec![0u8; page_size()];
        let mut file = &self.file;
        file.seek(SeekFrom::Start(start))?;

        let mut remaining = end - start;
        while remaining > 0 {
            let n = remaining.min(chunk.len() as u64) as usize;
            file.write_all(&chunk[..n])?;
            remaining -= n as u64;
        }
        file.flush()
    }
}

impl RegionBackend for FileBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::File
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
        let old_size = self.size;
        self.file.set_len(new_size)?;

        if self.zero_fill && new_size > old_size {
            if let Err(err) = self.fill_zeros(old_size, new_size) {
                if let Err(rollback) = self.file.set_len(old_size) {
                    warn!(
                        path = %self.path.display(),
                        error = %rollback,
                        "failed to roll back file size"
                    );
                }
                return Err(err.into());
            }
        }

        self.size = new_size;
        Ok(())
    }
}

/// Reads the entire file at `path` into a freshly owned buffer.
///
/// Used by diagnostic and migration paths; hot reads go through the mapping.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_whole_file(path: &Path) -> RegionResult<Vec<u8>> {
    Ok(std::fs::read(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn file_create_new() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.mkv");

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.size(), 0);
        assert_eq!(backend.kind(), BackendKind::File);
        assert!(path.exists());
    }

    #[test]
    fn file_create_with_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("path").join("test.mkv");

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.size(), 0);
        assert!(path.exists());
    }

    #[test]
    fn file_missing_without_create_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.mkv");
        let config = RegionConfig::new().create_if_missing(false);

        assert!(FileBackend::open_with_config(&path, &config).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn file_resize_zero_fills() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.mkv");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.resize(16).unwrap();
        let mut file = backend.file();
        file.seek(SeekFrom::Start(0)).unwrap();
        file.write_all(b"sixteen bytes!!!").unwrap();

        backend.resize(8192).unwrap();
        assert_eq!(backend.size(), 8192);

        let mut content = Vec::new();
        File::open(&path).unwrap().read_to_end(&mut content).unwrap();
        assert_eq!(content.len(), 8192);
        assert_eq!(&content[..16], b"sixteen bytes!!!");
        assert!(content[16..].iter().all(|&b| b == 0));
    }

    #[test]
    fn file_resize_without_zero_fill() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.mkv");
        let config = RegionConfig::new().zero_fill(false);

        let mut backend = FileBackend::open_with_config(&path, &config).unwrap();
        backend.resize(4096).unwrap();

        let content = read_whole_file(&path).unwrap();
        assert_eq!(content, vec![0u8; 4096]);
    }

    #[test]
    fn file_failed_resize_keeps_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.mkv");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.resize(4096).unwrap();

        let err = backend.resize(u64::MAX).unwrap_err();
        assert!(matches!(err, crate::RegionError::Io(_)));
        assert_eq!(backend.size(), 4096);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 4096);

        backend.resize(8192).unwrap();
        assert_eq!(backend.size(), 8192);
    }

    #[test]
    fn file_shrink() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.mkv");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.resize(8192).unwrap();
        backend.resize(4096).unwrap();

        assert_eq!(backend.size(), 4096);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 4096);
    }

    #[test]
    fn file_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.mkv");

        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.resize(12288).unwrap();
        }

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.size(), 12288);
    }

    #[test]
    fn file_actual_disk_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.mkv");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.resize(8192).unwrap();
        backend.file().sync_all().unwrap();

        // Compressing filesystems may store the zeros in fewer blocks.
        let actual = backend.actual_disk_size().unwrap();
        assert!(actual <= 8192 + page_size() as u64 * 16);
    }

    #[test]
    fn file_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.mkv");

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.path(), path);
    }

    #[test]
    fn read_whole_missing_file_fails() {
        let dir = tempdir().unwrap();
        assert!(read_whole_file(&dir.path().join("nope")).is_err());
    }
}
