//! Configuration for the scan fan-out
//!
//! The scanner bounds how many asynchronous source operations run at once;
//! the bound is validated against a sane range at construction time. The
//! dispatch channel itself is unbounded - the semaphore is what limits
//! resource use, and completion is gated on the pending counter.

use crate::error::ConfigError;

/// Maximum reasonable concurrency for source operations
const MAX_CONCURRENT: usize = 512;

/// Default concurrent source operations
const DEFAULT_CONCURRENT: usize = 16;

/// Runtime configuration for [`TreeScanner`](crate::scan::TreeScanner)
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Maximum number of source operations (page reads, file
    /// materializations) executing at once
    pub max_concurrent: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_CONCURRENT,
        }
    }
}

impl ScanConfig {
    /// Create a validated configuration
    pub fn new(max_concurrent: usize) -> Result<Self, ConfigError> {
        let config = Self { max_concurrent };
        config.validate()?;
        Ok(config)
    }

    /// Validate the bound against the supported range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent == 0 || self.max_concurrent > MAX_CONCURRENT {
            return Err(ConfigError::InvalidConcurrency {
                count: self.max_concurrent,
                max: MAX_CONCURRENT,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ScanConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = ScanConfig::new(0).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConcurrency { count: 0, .. }));
    }

    #[test]
    fn test_excessive_concurrency_rejected() {
        assert!(ScanConfig::new(100_000).is_err());
    }
}
