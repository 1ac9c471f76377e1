//! # mapkv FFI
//!
//! Stable C ABI for mapkv bindings.
//!
//! This crate provides:
//! - C-compatible function exports over [`mapkv_region`]
//! - Length-prefixed UTF-8 strings that may carry embedded NUL bytes
//! - Memory ownership conventions for returned buffers
//! - Error code mapping with a per-thread last error message
//!
//! ## Ownership
//!
//! Every [`MapKvBuffer`] says who owns it. `owned == true` buffers were
//! allocated for the caller, who MUST release them with
//! [`mapkv_free_buffer`]. `owned == false` buffers point into region memory,
//! MUST NOT be freed by the caller and stay valid only until the next
//! mutating call on the same handle. Bindings whose runtime cannot hold a
//! borrowed pointer copy it immediately.

#![warn(missing_docs)]

mod buffer;
mod error;
mod region;
mod types;

pub use buffer::{mapkv_free_buffer, MapKvBuffer};
pub use error::{
    clear_last_error, mapkv_clear_error, mapkv_get_last_error, set_last_error, ErrorCode,
    MapKvResult,
};
pub use region::*;
pub use types::{MapKvRegionHandle, MapKvStr};
