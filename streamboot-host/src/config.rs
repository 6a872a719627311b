// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Session configuration.
//!
//! Loaded from TOML; every field has a default, so an empty file yields a
//! usable configuration:
//!
//! ```toml
//! [targets.recovery]
//! static_address = 0x6A
//! dynamic_address = 0x62
//!
//! [timing]
//! timeout_ms = 5000
//! fifo_backoff_us = 100
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use streamboot_common::Targets;

use crate::error::ConfigError;

/// Default overall session budget.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;
/// Delay between `DEVICE_STATUS` polls while waiting for recovery mode.
pub const DEFAULT_DEVICE_POLL_US: u64 = 10;
/// Delay before re-polling a full FIFO.
pub const DEFAULT_FIFO_BACKOFF_US: u64 = 100;
/// Delay between `RECOVERY_STATUS` polls after the boot command.
pub const DEFAULT_COMPLETION_POLL_US: u64 = 100;

/// Full session configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Addresses of the primary and recovery endpoints.
    #[serde(default)]
    pub targets: Targets,

    /// Polling and timeout settings.
    #[serde(default)]
    pub timing: TimingConfig,
}

impl SessionConfig {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.targets
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.timing.validate()
    }
}

/// Polling intervals and the session deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_device_poll_us")]
    pub device_poll_us: u64,

    #[serde(default = "default_fifo_backoff_us")]
    pub fifo_backoff_us: u64,

    #[serde(default = "default_completion_poll_us")]
    pub completion_poll_us: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_device_poll_us() -> u64 {
    DEFAULT_DEVICE_POLL_US
}

fn default_fifo_backoff_us() -> u64 {
    DEFAULT_FIFO_BACKOFF_US
}

fn default_completion_poll_us() -> u64 {
    DEFAULT_COMPLETION_POLL_US
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            device_poll_us: DEFAULT_DEVICE_POLL_US,
            fifo_backoff_us: DEFAULT_FIFO_BACKOFF_US,
            completion_poll_us: DEFAULT_COMPLETION_POLL_US,
        }
    }
}

impl TimingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn device_poll_interval(&self) -> Duration {
        Duration::from_micros(self.device_poll_us)
    }

    pub fn fifo_backoff(&self) -> Duration {
        Duration::from_micros(self.fifo_backoff_us)
    }

    pub fn completion_poll_interval(&self) -> Duration {
        Duration::from_micros(self.completion_poll_us)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be non-zero".into()));
        }
        // Poll loops must never busy-spin.
        if self.device_poll_us == 0 || self.fifo_backoff_us == 0 || self.completion_poll_us == 0 {
            return Err(ConfigError::Invalid(
                "poll intervals must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
