//! Adapter configuration.
//!
//! The raw TOML struct (with `Option` fields) stays private; `ShiftConfig`
//! is the resolved form with every default applied at the parse boundary.

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid shift config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// How a callback delivery is deferred past the caller's stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Deferral {
    /// Deliver from a spawned task as soon as the result settles.
    Spawn,
    /// Deliver from a spawned task, yielding to the scheduler once more
    /// after settlement.
    #[default]
    SpawnAndYield,
}

impl Deferral {
    #[must_use]
    pub fn yields(self) -> bool {
        matches!(self, Deferral::SpawnAndYield)
    }
}

/// Log level for failures that have nobody left to receive them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnobservedLevel {
    Error,
    #[default]
    Warn,
    Debug,
    Off,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawShiftConfig {
    deferral: Option<Deferral>,
    unobserved: Option<UnobservedLevel>,
}

/// Resolved adapter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "RawShiftConfig")]
pub struct ShiftConfig {
    deferral: Deferral,
    unobserved: UnobservedLevel,
}

impl From<RawShiftConfig> for ShiftConfig {
    fn from(raw: RawShiftConfig) -> Self {
        Self {
            deferral: raw.deferral.unwrap_or_default(),
            unobserved: raw.unobserved.unwrap_or_default(),
        }
    }
}

impl ShiftConfig {
    /// Parse a config from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    #[must_use]
    pub fn deferral(&self) -> Deferral {
        self.deferral
    }

    #[must_use]
    pub fn unobserved(&self) -> UnobservedLevel {
        self.unobserved
    }

    #[must_use]
    pub fn with_deferral(mut self, deferral: Deferral) -> Self {
        self.deferral = deferral;
        self
    }

    #[must_use]
    pub fn with_unobserved(mut self, level: UnobservedLevel) -> Self {
        self.unobserved = level;
        self
    }
}
