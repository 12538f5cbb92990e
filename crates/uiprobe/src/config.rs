//! Probe configuration, loadable from YAML.
//!
//! ```yaml
//! wait:
//!   timeout_ms: 10000
//!   poll_interval_ms: 250
//!   wait_for_stability: true
//! retry:
//!   retries: 5
//! gestures:
//!   swipe_hold_ms: 400
//! screenshot_dir: artifacts/screens
//! ```
//!
//! Every section and field is optional.

use crate::gesture::GestureTimings;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{RetryOptions, WaitOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default directory for relative screenshot paths
pub const DEFAULT_SCREENSHOT_DIR: &str = "screenshots";

/// Settings shared by every command of a controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    /// Default element wait options
    pub wait: WaitOptions,
    /// Default predicate retry options
    pub retry: RetryOptions,
    /// Gesture durations
    pub gestures: GestureTimings,
    /// Directory for relative screenshot paths, relative to the working directory
    pub screenshot_dir: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            wait: WaitOptions::default(),
            retry: RetryOptions::default(),
            gestures: GestureTimings::default(),
            screenshot_dir: PathBuf::from(DEFAULT_SCREENSHOT_DIR),
        }
    }
}

impl ProbeConfig {
    /// Create a config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a YAML document
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Config`] if the document is malformed or invalid.
    pub fn from_yaml_str(yaml: &str) -> ProbeResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| ProbeError::config(format!("invalid YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Io`] if the file cannot be read, or
    /// [`ProbeError::Config`] if its content is invalid.
    pub fn load(path: impl AsRef<Path>) -> ProbeResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&yaml)?;
        tracing::debug!(path = %path.display(), "loaded probe config");
        Ok(config)
    }

    /// Check the settings for values the engine cannot honour
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Config`] naming the offending field.
    pub fn validate(&self) -> ProbeResult<()> {
        if self.wait.poll_interval_ms == 0 {
            return Err(ProbeError::config(
                "wait.poll_interval_ms must be greater than zero",
            ));
        }
        if self.retry.retries == 0 {
            return Err(ProbeError::config("retry.retries must be at least 1"));
        }
        if self.screenshot_dir.as_os_str().is_empty() {
            return Err(ProbeError::config("screenshot_dir must not be empty"));
        }
        Ok(())
    }

    /// Set default wait options
    #[must_use]
    pub fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Set default retry options
    #[must_use]
    pub fn with_retry(mut self, retry: RetryOptions) -> Self {
        self.retry = retry;
        self
    }

    /// Set gesture durations
    #[must_use]
    pub fn with_gestures(mut self, gestures: GestureTimings) -> Self {
        self.gestures = gestures;
        self
    }

    /// Set screenshot directory
    #[must_use]
    pub fn with_screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = dir.into();
        self
    }

    /// Wait options used when a command is not given any
    #[must_use]
    pub const fn default_wait(&self) -> WaitOptions {
        self.wait
    }

    /// Retry options used when a command is not given any
    #[must_use]
    pub const fn default_retry(&self) -> RetryOptions {
        self.retry
    }
}
