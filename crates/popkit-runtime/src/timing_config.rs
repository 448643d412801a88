#![forbid(unsafe_code)]

//! Latency configuration for overlays and resize observation.
//!
//! The debounce applied to "show" requests and the latency applied to resize
//! notifications and hover-out hides are independent knobs. Their defaults
//! differ (100 ms vs 120 ms) and nothing requires them to match.
//!
//! # Loading
//!
//! ```toml
//! # popkit-timing.toml
//! show_debounce_ms = 80
//! resize_latency_ms = 150
//! hover_hide_delay_ms = 200
//! ```
//!
//! ```rust,ignore
//! let timing = TimingConfig::from_toml_file("popkit-timing.toml")?;
//! ```
//!
//! Missing keys take their defaults.

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::debounce::DEFAULT_SHOW_DEBOUNCE;
use crate::resize_watcher::DEFAULT_RESIZE_LATENCY;

/// Default delay before a hover-out hides its panel.
pub const DEFAULT_HOVER_HIDE_DELAY: Duration = Duration::from_millis(120);

/// Longest latency any knob accepts.
pub const MAX_LATENCY_MS: u64 = 10_000;

/// Overlay latency knobs, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct TimingConfig {
    /// Quiet period for debounced show requests.
    pub show_debounce_ms: u64,
    /// Latency between the last resize notification and recomputation.
    pub resize_latency_ms: u64,
    /// Delay before a hover-out hide takes effect.
    pub hover_hide_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            show_debounce_ms: DEFAULT_SHOW_DEBOUNCE.as_millis() as u64,
            resize_latency_ms: DEFAULT_RESIZE_LATENCY.as_millis() as u64,
            hover_hide_delay_ms: DEFAULT_HOVER_HIDE_DELAY.as_millis() as u64,
        }
    }
}

impl TimingConfig {
    /// Show debounce as a duration.
    #[must_use]
    pub fn show_debounce(&self) -> Duration {
        Duration::from_millis(self.show_debounce_ms)
    }

    /// Resize latency as a duration.
    #[must_use]
    pub fn resize_latency(&self) -> Duration {
        Duration::from_millis(self.resize_latency_ms)
    }

    /// Hover-out hide delay as a duration.
    #[must_use]
    pub fn hover_hide_delay(&self) -> Duration {
        Duration::from_millis(self.hover_hide_delay_ms)
    }

    /// Check every knob is in range. An empty list means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (name, value) in [
            ("show_debounce_ms", self.show_debounce_ms),
            ("resize_latency_ms", self.resize_latency_ms),
            ("hover_hide_delay_ms", self.hover_hide_delay_ms),
        ] {
            if value > MAX_LATENCY_MS {
                errors.push(format!("{name} must be <= {MAX_LATENCY_MS}, got {value}"));
            }
        }
        if self.resize_latency_ms == 0 {
            errors.push("resize_latency_ms must be > 0".into());
        }
        errors
    }

    /// Return `self` if valid, otherwise every violation.
    pub fn validated(self) -> Result<Self, TimingConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(TimingConfigError::Validation(errors))
        }
    }

    /// Load and validate from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, TimingConfigError> {
        let config: Self = toml::from_str(s).map_err(TimingConfigError::Toml)?;
        config.validated()
    }

    /// Load and validate from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, TimingConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(TimingConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load and validate from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, TimingConfigError> {
        let config: Self = serde_json::from_str(s).map_err(TimingConfigError::Json)?;
        config.validated()
    }
}

/// Errors from loading a [`TimingConfig`].
#[derive(Debug)]
pub enum TimingConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    Json(serde_json::Error),
    /// Values out of range.
    Validation(Vec<String>),
}

impl std::fmt::Display for TimingConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => write!(f, "validation errors: {}", errors.join("; ")),
        }
    }
}

impl std::error::Error for TimingConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
