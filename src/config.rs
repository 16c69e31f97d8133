//! Engine configuration.

use std::time::Duration;

use crate::error::ConfigError;

/// Number of wizard steps.
pub const STEP_COUNT: u8 = 6;

/// Configuration for a wizard store and its persistence layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardConfig {
    /// Capacity of the selector memoization cache.
    pub cache_capacity: usize,
    /// Quiet period after the last mutation before a snapshot is written.
    pub autosave_debounce: Duration,
    /// Maximum number of product tags.
    pub max_tags: usize,
    /// Maximum number of additional gallery images.
    pub max_additional_images: usize,
    /// Key of the persisted draft blob.
    pub storage_key: String,
    /// Maximum queued writes for `BackgroundStorage`.
    pub background_queue_capacity: usize,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 50,
            autosave_debounce: Duration::from_millis(2500),
            max_tags: 10,
            max_additional_images: 8,
            storage_key: "create-product-wizard".to_string(),
            background_queue_capacity: 16,
        }
    }
}

impl WizardConfig {
    const MIN_DEBOUNCE_MS: u64 = 10;

    /// Validates the configuration, returning it unchanged on success.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::BelowMinimum` for the first numeric field under
    /// its floor, or `ConfigError::Empty` for a blank `storage_key`.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "cache_capacity",
                min: 1,
                actual: 0,
            });
        }

        let debounce_ms = u64::try_from(self.autosave_debounce.as_millis()).unwrap_or(u64::MAX);
        if debounce_ms < Self::MIN_DEBOUNCE_MS {
            return Err(ConfigError::BelowMinimum {
                field: "autosave_debounce_ms",
                min: Self::MIN_DEBOUNCE_MS,
                actual: debounce_ms,
            });
        }

        if self.max_tags == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "max_tags",
                min: 1,
                actual: 0,
            });
        }

        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Empty {
                field: "storage_key",
            });
        }

        if self.background_queue_capacity == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "background_queue_capacity",
                min: 1,
                actual: 0,
            });
        }

        Ok(self)
    }
}
