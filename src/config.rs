/// Settings for the classifier and the chat layer
///
/// Loaded from `$COACH_INTENT_CONFIG` or `~/.coach-intent/config.toml`.
/// A missing file means defaults; every field has one.

use crate::error::{IntentError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that points at an explicit settings file
pub const CONFIG_ENV: &str = "COACH_INTENT_CONFIG";

/// Top-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub matching: MatchSettings,
    pub responses: ResponseSettings,
    pub sessions: SessionSettings,
}

/// Thresholds and weights used by the matcher and composer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatchSettings {
    /// A best score must be strictly above this to count as a match
    pub acceptance_threshold: f64,
    /// Above this the match is executed without asking
    pub certain_threshold: f64,
    /// Alternatives at or below this are not worth offering
    pub alternative_threshold: f64,
    /// Similarity above which an utterance is treated as a help request
    pub help_threshold: f64,
    /// Multiplier applied when a phrase keyword appears in the input
    pub keyword_boost: f64,
    /// Phrase words must be longer than this to trigger the boost
    pub keyword_min_len: usize,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            acceptance_threshold: 0.25,
            certain_threshold: 0.4,
            alternative_threshold: 0.2,
            help_threshold: 0.7,
            keyword_boost: 1.2,
            keyword_min_len: 3,
        }
    }
}

/// Response shaping
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResponseSettings {
    /// How many commands the fallback suggests
    pub fallback_suggestions: usize,
}

impl Default for ResponseSettings {
    fn default() -> Self {
        Self {
            fallback_suggestions: 3,
        }
    }
}

/// How long session tokens and commands parked on a login live
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionSettings {
    pub token_ttl_minutes: i64,
    /// A parked command is dropped if the user doesn't log in within this
    pub pending_ttl_minutes: i64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            token_ttl_minutes: 8 * 60,
            pending_ttl_minutes: 30,
        }
    }
}

impl SessionSettings {
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.token_ttl_minutes)
    }

    pub fn pending_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.pending_ttl_minutes)
    }
}

impl Settings {
    /// Load settings from the default location
    ///
    /// `$COACH_INTENT_CONFIG` wins over `~/.coach-intent/config.toml`.
    /// Returns defaults when neither exists.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("no home directory, using default settings");
                Ok(Self::default())
            }
        }
    }

    /// Load settings from a specific file, defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading settings");
                let settings: Settings = toml::from_str(&contents)?;
                settings.validate()?;
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "settings file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn config_path() -> Option<PathBuf> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(explicit));
        }

        dirs::home_dir().map(|home| home.join(".coach-intent").join("config.toml"))
    }

    /// Reject settings that would make the decision rules contradict each other
    pub fn validate(&self) -> Result<()> {
        let m = &self.matching;

        if m.acceptance_threshold < 0.0 {
            return Err(IntentError::Config(
                "acceptance_threshold must not be negative".to_string(),
            ));
        }
        if m.certain_threshold < m.acceptance_threshold {
            return Err(IntentError::Config(format!(
                "certain_threshold ({}) is below acceptance_threshold ({})",
                m.certain_threshold, m.acceptance_threshold
            )));
        }
        if m.alternative_threshold < 0.0 || m.alternative_threshold >= m.certain_threshold {
            return Err(IntentError::Config(format!(
                "alternative_threshold ({}) must be in [0, certain_threshold)",
                m.alternative_threshold
            )));
        }
        if m.help_threshold < m.certain_threshold {
            return Err(IntentError::Config(format!(
                "help_threshold ({}) is below certain_threshold ({})",
                m.help_threshold, m.certain_threshold
            )));
        }
        if m.keyword_min_len == 0 {
            return Err(IntentError::Config(
                "keyword_min_len must be at least 1".to_string(),
            ));
        }
        if m.keyword_boost < 1.0 {
            return Err(IntentError::Config(
                "keyword_boost must be at least 1.0".to_string(),
            ));
        }
        if self.responses.fallback_suggestions == 0 {
            return Err(IntentError::Config(
                "fallback_suggestions must be at least 1".to_string(),
            ));
        }
        if self.sessions.token_ttl_minutes <= 0 || self.sessions.pending_ttl_minutes <= 0 {
            return Err(IntentError::Config(
                "token_ttl_minutes and pending_ttl_minutes must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
