//! Engine configuration.
//!
//! Settings are read once per session. The default location is
//! `~/.oxcmd/config.json`; a missing or unparseable file yields defaults.
//! Test runners that pass module arguments as string pairs can use
//! [`EngineConfig::from_args`] instead.
//!
//! # Example
//!
//! ```no_run
//! use oxcmd_core::config::EngineConfig;
//!
//! let config = EngineConfig::load();
//! println!("waiting up to {}ms", config.wait_timeout_ms);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diagnostics::ScreenshotPolicy;
use crate::locator::{LocatorContext, Platform};

const CONFIG_FILENAME: &str = "config.json";

/// Name of the native context on Appium sessions.
pub const NATIVE_CONTEXT: &str = "NATIVE_APP";

pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Errors raised while loading configuration or object repositories.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Returns `~/.oxcmd`, or `None` when no home directory is known.
pub fn oxcmd_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".oxcmd"))
}

/// Session-wide engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// When screenshots are attached to results.
    pub screenshots: ScreenshotPolicy,
    /// Collect page-load timings after action commands.
    pub fetch_stats: bool,
    /// Default timeout of waits and element lookups.
    pub wait_timeout_ms: u64,
    /// Delay between polls of a wait.
    pub poll_interval_ms: u64,
    /// Browser name, used where page handling differs per browser.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_name: Option<String>,
    pub platform: Platform,
    /// Initial mobile context (`NATIVE_APP` or a `WEBVIEW_*` name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Object repository JSON file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_repository: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            screenshots: ScreenshotPolicy::default(),
            fetch_stats: false,
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            browser_name: None,
            platform: Platform::Web,
            context: None,
            object_repository: None,
        }
    }
}

impl EngineConfig {
    /// Load config from `~/.oxcmd/config.json`.
    ///
    /// Returns [`Default`] if the file does not exist or cannot be parsed.
    pub fn load() -> Self {
        oxcmd_dir()
            .map(|dir| dir.join(CONFIG_FILENAME))
            .and_then(|path| Self::load_from(path).ok())
            .unwrap_or_default()
    }

    /// Load config from an explicit file, reporting any failure.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Build config from module arguments.
    ///
    /// Recognized keys: `screenshots` (`never`, `onError`, `onAction`,
    /// `always`), `fetchStats`, `browserName`, `platformName`, `context`,
    /// `waitTimeout`, `pollInterval` and `objectRepository`. Other keys are
    /// driver capabilities and are ignored here.
    pub fn from_args(args: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for (key, value) in args {
            match key.as_str() {
                "screenshots" => {
                    config.screenshots = value.parse().map_err(ConfigError::Invalid)?;
                }
                "fetchStats" => config.fetch_stats = parse_bool(key, value)?,
                "browserName" => config.browser_name = Some(value.clone()),
                "platformName" => {
                    config.platform = value.parse().map_err(ConfigError::Invalid)?;
                }
                "context" => config.context = Some(value.clone()),
                "waitTimeout" => config.wait_timeout_ms = parse_millis(key, value)?,
                "pollInterval" => config.poll_interval_ms = parse_millis(key, value)?,
                "objectRepository" => config.object_repository = Some(PathBuf::from(value)),
                _ => {}
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// The locator context a new session starts in.
    ///
    /// Mobile sessions start native unless a web-view context is configured.
    pub fn locator_context(&self) -> LocatorContext {
        let native = self.platform != Platform::Web
            && self
                .context
                .as_deref()
                .map_or(true, |context| context.eq_ignore_ascii_case(NATIVE_CONTEXT));
        LocatorContext { platform: self.platform, native }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll interval must be positive".to_string()));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid(format!("{} must be a boolean, got '{}'", key, value))),
    }
}

fn parse_millis(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{} must be milliseconds, got '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.screenshots, ScreenshotPolicy::OnError);
        assert!(!config.fetch_stats);
        assert_eq!(config.wait_timeout_ms, 60_000);
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.locator_context(), LocatorContext::web());
    }

    #[test]
    fn deserialize_empty_json() {
        let loaded: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(loaded, EngineConfig::default());
    }

    #[test]
    fn deserialize_partial_json() {
        let loaded: EngineConfig =
            serde_json::from_str(r#"{ "screenshots": "always", "platform": "android" }"#).unwrap();
        assert_eq!(loaded.screenshots, ScreenshotPolicy::Always);
        assert_eq!(loaded.platform, Platform::Android);
        assert_eq!(loaded.wait_timeout_ms, DEFAULT_WAIT_TIMEOUT_MS);
    }

    #[test]
    fn from_module_args() {
        let config = EngineConfig::from_args(&args(&[
            ("screenshots", "onaction"),
            ("fetchStats", "True"),
            ("browserName", "chrome"),
            ("deviceName", "ignored"),
        ]))
        .unwrap();
        assert_eq!(config.screenshots, ScreenshotPolicy::OnAction);
        assert!(config.fetch_stats);
        assert_eq!(config.browser_name.as_deref(), Some("chrome"));
    }

    #[test]
    fn from_module_args_rejects_bad_values() {
        assert!(EngineConfig::from_args(&args(&[("fetchStats", "maybe")])).is_err());
        assert!(EngineConfig::from_args(&args(&[("screenshots", "sometimes")])).is_err());
        assert!(EngineConfig::from_args(&args(&[("pollInterval", "0")])).is_err());
    }

    #[test]
    fn mobile_sessions_start_native() {
        let config = EngineConfig::from_args(&args(&[("platformName", "iOS")])).unwrap();
        assert!(config.locator_context().is_native_app());

        let config = EngineConfig::from_args(&args(&[
            ("platformName", "Android"),
            ("context", "WEBVIEW_com.example"),
        ]))
        .unwrap();
        assert!(!config.locator_context().is_native_app());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "fetch_stats": true, "wait_timeout_ms": 1500 }}"#).unwrap();
        let config = EngineConfig::load_from(file.path()).unwrap();
        assert!(config.fetch_stats);
        assert_eq!(config.wait_timeout_ms, 1500);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(EngineConfig::load_from(file.path()), Err(ConfigError::Json(_))));
    }

    #[test]
    fn load_returns_default_for_missing_file() {
        let _ = EngineConfig::load();
    }
}
