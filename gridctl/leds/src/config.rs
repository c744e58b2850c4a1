//! LED driver configuration

use gridctl_core::{ErrorCode, GridResult, Severity, SeverityFilter};
use gridctl_i2c::{DEFAULT_FAILURE_THRESHOLD, DEFAULT_MAX_RETRIES};

use crate::MULTIPLEX_COLUMNS;

/// Runtime settings of the [`LedsDriver`](crate::LedsDriver)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Full refreshes of the whole matrix per second
    pub refresh_rate_hz: u32,
    /// Longest time a column may spend on the bus
    pub timeout_ms: u32,
    /// Messages below this severity are dropped
    pub log_level: Severity,
    /// Relaunches of a GPIO write after a transient bus error
    pub max_retries: u8,
    /// Failed writes in a row before the bus is declared down
    pub failure_threshold: u8,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            refresh_rate_hz: 50,
            timeout_ms: 200,
            log_level: Severity::build_default(),
            max_retries: DEFAULT_MAX_RETRIES,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }
}

impl DriverConfig {
    pub fn builder() -> DriverConfigBuilder {
        DriverConfigBuilder::default()
    }

    /// Column switches per second
    pub fn update_rate_hz(&self) -> u32 {
        self.refresh_rate_hz.saturating_mul(MULTIPLEX_COLUMNS as u32)
    }

    /// Time each column stays lit, at least one millisecond
    pub fn column_period_ms(&self) -> u32 {
        (1000 / self.update_rate_hz().max(1)).max(1)
    }

    pub fn filter(&self) -> SeverityFilter {
        SeverityFilter::new(self.log_level)
    }

    pub fn validate(&self) -> GridResult<()> {
        if self.refresh_rate_hz == 0 || self.timeout_ms == 0 {
            return Err(ErrorCode::InvalidArgument);
        }
        Ok(())
    }
}

/// Builder for [`DriverConfig`]
#[derive(Debug, Clone, Default)]
pub struct DriverConfigBuilder {
    config: DriverConfig,
}

impl DriverConfigBuilder {
    pub fn refresh_rate_hz(mut self, hz: u32) -> Self {
        self.config.refresh_rate_hz = hz;
        self
    }

    pub fn timeout_ms(mut self, ms: u32) -> Self {
        self.config.timeout_ms = ms;
        self
    }

    pub fn log_level(mut self, level: Severity) -> Self {
        self.config.log_level = level;
        self
    }

    pub fn max_retries(mut self, retries: u8) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Zero keeps the bus up whatever happens
    pub fn failure_threshold(mut self, threshold: u8) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    pub fn build(self) -> DriverConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rates() {
        let config = DriverConfig::default();
        assert_eq!(config.update_rate_hz(), 400);
        assert_eq!(config.column_period_ms(), 2);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_builder() {
        let config = DriverConfig::builder()
            .refresh_rate_hz(125)
            .timeout_ms(10)
            .log_level(Severity::Warning)
            .build();
        assert_eq!(config.column_period_ms(), 1);
        assert!(config.filter().accepts(Severity::Error));
        assert!(!config.filter().accepts(Severity::Info));
    }

    #[test]
    fn test_fast_refresh_keeps_one_ms_period() {
        for hz in [200, 1000, u32::MAX] {
            let config = DriverConfig::builder().refresh_rate_hz(hz).build();
            assert_eq!(config.column_period_ms(), 1);
        }
    }

    #[test]
    fn test_zero_rate_is_rejected() {
        let config = DriverConfig::builder().refresh_rate_hz(0).build();
        assert_eq!(config.validate(), Err(ErrorCode::InvalidArgument));
    }
}
