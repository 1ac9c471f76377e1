//! Region configuration.

use crate::page::page_size;

/// Configuration for opening a mapped region.
#[derive(Debug, Clone)]
pub struct RegionConfig {
    /// Size requested at open. Rounded up to a whole number of pages, and
    /// never below one page.
    pub initial_size: usize,

    /// Whether to create the backing file if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to create the containing directory if it doesn't exist.
    pub create_parent_dirs: bool,

    /// Whether to write zeros over newly extended file ranges.
    ///
    /// Writing the zeros allocates the blocks up front, so a full disk is
    /// reported by the resize instead of faulting on a later store through
    /// the mapping.
    pub zero_fill: bool,

    /// Whether an anonymous region refused by the platform falls back to a
    /// file-backed region.
    pub fallback_to_file: bool,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            initial_size: page_size(),
            create_if_missing: true,
            create_parent_dirs: true,
            zero_fill: true,
            fallback_to_file: true,
        }
    }
}

impl RegionConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the size requested at open.
    #[must_use]
    pub const fn initial_size(mut self, size: usize) -> Self {
        self.initial_size = size;
        self
    }

    /// Sets whether to create the backing file if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to create the containing directory.
    #[must_use]
    pub const fn create_parent_dirs(mut self, value: bool) -> Self {
        self.create_parent_dirs = value;
        self
    }

    /// Sets whether extended file ranges are explicitly zero-filled.
    #[must_use]
    pub const fn zero_fill(mut self, value: bool) -> Self {
        self.zero_fill = value;
        self
    }

    /// Sets whether a refused anonymous region falls back to a file.
    #[must_use]
    pub const fn fallback_to_file(mut self, value: bool) -> Self {
        self.fallback_to_file = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = RegionConfig::default();
        assert_eq!(config.initial_size, page_size());
        assert!(config.create_if_missing);
        assert!(config.create_parent_dirs);
        assert!(config.zero_fill);
        assert!(config.fallback_to_file);
    }

    #[test]
    fn builder_pattern() {
        let config = RegionConfig::new()
            .initial_size(64)
            .create_if_missing(false)
            .zero_fill(false);

        assert_eq!(config.initial_size, 64);
        assert!(!config.create_if_missing);
        assert!(!config.zero_fill);
        assert!(config.create_parent_dirs);
    }
}
