//! Arena configuration parameters.

use crate::error::ArenaError;

/// Configuration for the page arena.
///
/// Controls page sizing, capacity limits, and reservation alignment.
/// Validated at construction; all values are immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of a regular page in bytes.
    ///
    /// Default: 65_536. Must be a non-zero multiple of `alignment`.
    /// Reservations larger than this get a dedicated page sized to fit.
    pub page_size: u32,

    /// Maximum number of pages, regular and dedicated combined.
    ///
    /// Default: 1024, i.e. 64MB of regular pages at the default size.
    pub max_pages: u16,

    /// Alignment of every reservation in bytes.
    ///
    /// Default: 8, enough for pointers and the header codecs. Must be a
    /// power of two no larger than 4096.
    pub alignment: u32,
}

impl ArenaConfig {
    /// Default page size: 64KB.
    pub const DEFAULT_PAGE_SIZE: u32 = 65_536;

    /// Default maximum page count.
    pub const DEFAULT_MAX_PAGES: u16 = 1024;

    /// Default reservation alignment.
    pub const DEFAULT_ALIGNMENT: u32 = 8;

    /// Largest accepted alignment.
    pub const MAX_ALIGNMENT: u32 = 4096;

    /// Create a config with the given page size and defaults elsewhere.
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            max_pages: Self::DEFAULT_MAX_PAGES,
            alignment: Self::DEFAULT_ALIGNMENT,
        }
    }

    /// Check the invariants documented on each field.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if !self.alignment.is_power_of_two() || self.alignment > Self::MAX_ALIGNMENT {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "alignment {} must be a power of two <= {}",
                    self.alignment,
                    Self::MAX_ALIGNMENT
                ),
            });
        }
        if self.page_size == 0 || self.page_size % self.alignment != 0 {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "page size {} must be a non-zero multiple of alignment {}",
                    self.page_size, self.alignment
                ),
            });
        }
        if self.max_pages == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "max_pages must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Total bytes of regular-page capacity.
    pub fn capacity_bytes(&self) -> usize {
        self.page_size as usize * self.max_pages as usize
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity_is_64mb() {
        let config = ArenaConfig::default();
        assert_eq!(config.capacity_bytes(), 64 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_power_of_two_alignment() {
        let config = ArenaConfig {
            alignment: 12,
            ..ArenaConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ArenaError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn rejects_unaligned_page_size() {
        let config = ArenaConfig::new(100);
        assert!(config.validate().is_err());
        assert!(ArenaConfig::new(0).validate().is_err());
        assert!(ArenaConfig::new(128).validate().is_ok());
    }

    #[test]
    fn rejects_zero_pages() {
        let config = ArenaConfig {
            max_pages: 0,
            ..ArenaConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
