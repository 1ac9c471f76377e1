//! Inspect command implementation.

use mapkv_region::{is_page_aligned, page_size, FileBackend, RegionBackend, RegionConfig};
use serde::Serialize;
use std::path::Path;

/// Region file inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Region file path.
    pub path: String,
    /// OS page size in bytes.
    pub page_size: usize,
    /// Logical file size in bytes.
    pub total_size: u64,
    /// Space allocated on disk in bytes.
    pub actual_size: u64,
    /// Whether the logical size is a whole number of pages.
    pub page_aligned: bool,
    /// Whether the file could be mapped as is.
    pub mappable: bool,
}

/// Runs the inspect command.
///
/// Opens the file without creating or resizing it.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Collects the inspection result for `path`.
pub fn inspect(path: &Path) -> Result<InspectResult, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No region file found at {:?}", path).into());
    }

    let config = RegionConfig::new()
        .create_if_missing(false)
        .create_parent_dirs(false);
    let backend = FileBackend::open_with_config(path, &config)?;

    let total_size = backend.size();
    let page_aligned = usize::try_from(total_size).is_ok_and(is_page_aligned);

    Ok(InspectResult {
        path: path.display().to_string(),
        page_size: page_size(),
        total_size,
        actual_size: backend.actual_disk_size()?,
        page_aligned,
        mappable: page_aligned && total_size > 0,
    })
}

fn print_text_output(result: &InspectResult) {
    println!("mapkv Region Inspection");
    println!("=======================");
    println!();
    println!("Path: {}", result.path);
    println!();
    println!("Storage:");
    println!("  Page size:     {} bytes", result.page_size);
    println!("  Total size:    {}", format_size(result.total_size));
    println!("  Actual size:   {}", format_size(result.actual_size));
    println!(
        "  Page aligned:  {}",
        if result.page_aligned { "yes" } else { "no" }
    );
    println!(
        "  Mappable:      {}",
        if result.mappable { "yes" } else { "no (will be extended on open)" }
    );
}

pub(crate) fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
