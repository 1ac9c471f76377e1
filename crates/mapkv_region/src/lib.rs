//! # mapkv Region
//!
//! Memory-mapped storage regions for the mapkv key-value engine.
//!
//! This crate provides the lowest-level storage primitive of mapkv: a
//! backing store mapped into the process, which the engine treats as a flat
//! byte buffer it manages itself. Regions do **not** interpret the bytes.
//!
//! ## Design Principles
//!
//! - One owned type ([`MappedRegion`]) holds the OS handle and the mapping;
//!   both are released exactly once
//! - Sizes handed to the OS are always page-rounded
//! - Growth never invalidates a working mapping on failure
//! - Newly grown space reads back as zero
//! - A released mapping is re-established lazily on the next access
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - Regular files identified by path
//! - `AnonymousBackend` - Anonymous shared memory identified by descriptor
//!   (Linux and Android)
//!
//! ## Example
//!
//! ```no_run
//! use mapkv_region::{MappedRegion, SyncMode};
//!
//! let mut region = MappedRegion::open("data/store.mkv", 64).unwrap();
//! region.memory().unwrap()[0] = 1;
//! region.msync(SyncMode::Durable).unwrap();
//!
//! region.release_mapping();
//! assert_eq!(region.memory().unwrap()[0], 1);
//! ```

#![warn(missing_docs)]

#[cfg(any(target_os = "linux", target_os = "android"))]
mod anonymous;
mod backend;
mod config;
mod error;
mod file;
mod page;
mod region;
mod shared;

#[cfg(any(target_os = "linux", target_os = "android"))]
pub use anonymous::AnonymousBackend;
pub use backend::{BackendKind, RegionBackend};
pub use config::RegionConfig;
pub use error::{RegionError, RegionResult};
pub use file::{read_whole_file, FileBackend};
pub use page::{checked_round_up_to_page, is_page_aligned, page_size, round_up_to_page};
pub use region::{MappedRegion, RegionIdentity, RegionState, SyncMode};
pub use shared::SharedRegion;
