#![forbid(unsafe_code)]

//! Timing and stacking policy for the modal manager.
//!
//! Defaults mirror the production behaviour: a 50 ms settle delay before a
//! surface is populated, a 300 ms exit transition, a 100 ms pause before the
//! queue is drained, and a 500 ms duplicate-suppression window.
//!
//! With the `policy-config` feature, a [`ManagerConfig`] can be loaded from a
//! TOML policy file. Every key is optional; missing keys keep their default.
//!
//! ```toml
//! settle_delay_ms = 50
//! exit_transition_ms = 300
//! drain_delay_ms = 100
//! duplicate_window_ms = 500
//! stack_base = 1000
//! stack_step = 10
//! default_title = "Make a Choice"
//! ```

use std::fmt;
use std::time::Duration;

/// Default title for requests whose title is blank.
pub const DEFAULT_TITLE: &str = "Make a Choice";

/// Errors from loading a policy file.
#[derive(Debug)]
pub enum ConfigError {
    /// The policy file could not be read.
    Io(std::io::Error),
    /// The policy file is not valid TOML for this schema.
    Parse(String),
    /// A value was parsed but is unusable.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read policy file: {err}"),
            Self::Parse(msg) => write!(f, "failed to parse policy file: {msg}"),
            Self::Invalid(msg) => write!(f, "invalid policy: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Manager policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Pause between admission and populating the surface.
    pub settle_delay: Duration,
    /// Length of the exit transition before a surface is untracked.
    pub exit_transition: Duration,
    /// Pause between a dismissal completing and the queue being drained.
    pub drain_delay: Duration,
    /// Window in which a structurally identical request is suppressed.
    pub duplicate_window: Duration,
    /// Stack counter value when no modal is tracked.
    pub stack_base: u32,
    /// Amount the stack counter grows per tracked modal.
    pub stack_step: u32,
    /// Title substituted for blank titles.
    pub default_title: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(50),
            exit_transition: Duration::from_millis(300),
            drain_delay: Duration::from_millis(100),
            duplicate_window: Duration::from_millis(500),
            stack_base: 1000,
            stack_step: 10,
            default_title: DEFAULT_TITLE.to_owned(),
        }
    }
}

impl ManagerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    #[must_use]
    pub fn exit_transition(mut self, duration: Duration) -> Self {
        self.exit_transition = duration;
        self
    }

    #[must_use]
    pub fn drain_delay(mut self, delay: Duration) -> Self {
        self.drain_delay = delay;
        self
    }

    #[must_use]
    pub fn duplicate_window(mut self, window: Duration) -> Self {
        self.duplicate_window = window;
        self
    }

    /// Set the stack base and step.
    #[must_use]
    pub fn stacking(mut self, base: u32, step: u32) -> Self {
        self.stack_base = base;
        self.stack_step = step;
        self
    }

    #[must_use]
    pub fn default_title(mut self, title: impl Into<String>) -> Self {
        self.default_title = title.into();
        self
    }

    /// Check values that would break the stacking invariant.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero stack step.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stack_step == 0 {
            return Err(ConfigError::Invalid(
                "stack_step must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(feature = "policy-config")]
mod policy {
    use super::{ConfigError, ManagerConfig};
    use serde::Deserialize;
    use std::path::Path;
    use std::time::Duration;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default, deny_unknown_fields)]
    struct PolicyFile {
        settle_delay_ms: Option<u64>,
        exit_transition_ms: Option<u64>,
        drain_delay_ms: Option<u64>,
        duplicate_window_ms: Option<u64>,
        stack_base: Option<u32>,
        stack_step: Option<u32>,
        default_title: Option<String>,
    }

    impl ManagerConfig {
        /// Parse a TOML policy document.
        ///
        /// # Errors
        ///
        /// [`ConfigError::Parse`] on malformed TOML or unknown keys,
        /// [`ConfigError::Invalid`] when the result fails [`ManagerConfig::validate`].
        pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
            let file: PolicyFile =
                toml::from_str(source).map_err(|err| ConfigError::Parse(err.to_string()))?;
            let mut config = Self::default();
            if let Some(ms) = file.settle_delay_ms {
                config.settle_delay = Duration::from_millis(ms);
            }
            if let Some(ms) = file.exit_transition_ms {
                config.exit_transition = Duration::from_millis(ms);
            }
            if let Some(ms) = file.drain_delay_ms {
                config.drain_delay = Duration::from_millis(ms);
            }
            if let Some(ms) = file.duplicate_window_ms {
                config.duplicate_window = Duration::from_millis(ms);
            }
            if let Some(base) = file.stack_base {
                config.stack_base = base;
            }
            if let Some(step) = file.stack_step {
                config.stack_step = step;
            }
            if let Some(title) = file.default_title {
                config.default_title = title;
            }
            config.validate()?;
            Ok(config)
        }

        /// Read and parse a TOML policy file.
        ///
        /// # Errors
        ///
        /// [`ConfigError::Io`] if the file cannot be read, otherwise as
        /// [`ManagerConfig::from_toml_str`].
        pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
            let source = std::fs::read_to_string(path)?;
            Self::from_toml_str(&source)
        }
    }
}
