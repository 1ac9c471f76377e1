//! Grow and trim command implementations.

use mapkv_region::{MappedRegion, RegionConfig, SyncMode};
use std::path::Path;
use tracing::info;

/// Grows the region file at `path` to at least `size` bytes.
pub fn grow(path: &Path, size: usize) -> Result<(), Box<dyn std::error::Error>> {
    info!("Growing region {:?} to {} bytes", path, size);

    let mut region = open_existing(path)?;
    let before = region.logical_size();
    region.try_grow(size)?;
    region.msync(SyncMode::Durable)?;

    println!("Region size: {} -> {} bytes", before, region.logical_size());
    region.close();
    Ok(())
}

/// Shrinks the region file at `path` to `size` bytes, page-rounded.
///
/// Content past the new size is discarded.
pub fn trim(path: &Path, size: usize) -> Result<(), Box<dyn std::error::Error>> {
    info!("Trimming region {:?} to {} bytes", path, size);

    let mut region = open_existing(path)?;
    let before = region.logical_size();
    if size >= before {
        println!("Region is already {} bytes, nothing to trim", before);
        return Ok(());
    }

    region.truncate(size)?;
    region.msync(SyncMode::Durable)?;

    println!("Region size: {} -> {} bytes", before, region.logical_size());
    region.close();
    Ok(())
}

fn open_existing(path: &Path) -> Result<MappedRegion, Box<dyn std::error::Error>> {
    let config = RegionConfig::new()
        .initial_size(0)
        .create_if_missing(false)
        .create_parent_dirs(false);
    Ok(MappedRegion::open_with_config(path, &config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapkv_region::page_size;
    use tempfile::tempdir;

    #[test]
    fn grow_then_trim() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store");
        std::fs::write(&path, vec![1u8; page_size()]).unwrap();

        grow(&path, 3 * page_size()).unwrap();
        assert_eq!(
            std::fs::metadata(&path).unwrap().len(),
            3 * page_size() as u64
        );

        trim(&path, 10).unwrap();
        let content = std::fs::read(&path).unwrap();
        assert_eq!(content, vec![1u8; page_size()]);
    }

    #[test]
    fn grow_missing_file_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing");
        assert!(grow(&path, 100).is_err());
        assert!(!path.exists());
    }
}
