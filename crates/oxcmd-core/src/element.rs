//! Shared element and page types exchanged with automation drivers.
//!
//! These types are independent of any concrete driver implementation. Drivers
//! hand out opaque [`ElementId`] handles from element lookups and accept them
//! back for reads and interactions.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::CommandError;

/// Key identifying an element reference in WebDriver script arguments.
pub const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Opaque handle to an element previously returned by a driver lookup.
///
/// A handle may go stale when the underlying document mutates; drivers report
/// this as [`DriverError::StaleElementReference`](crate::driver::DriverError::StaleElementReference).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The handle as an argument to [`execute_script`](crate::driver::AutomationDriver::execute_script).
    pub fn to_script_arg(&self) -> Value {
        json!({ W3C_ELEMENT_KEY: self.0 })
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How an `<option>` of a drop-down is chosen by `select` / `deselect`.
///
/// Parsed from option locators: `value=STRING`, `index=N` (0-based),
/// `label=STRING`, or an unprefixed string which matches by label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionLocator {
    /// Match the option's `value` attribute.
    Value(String),
    /// Match the option by its 0-based position.
    Index(usize),
    /// Match the option's visible text.
    Label(String),
}

impl OptionLocator {
    pub fn parse(raw: &str) -> Result<Self, CommandError> {
        if let Some(value) = raw.strip_prefix("value=") {
            Ok(OptionLocator::Value(value.to_string()))
        } else if let Some(index) = raw.strip_prefix("index=") {
            index.trim().parse().map(OptionLocator::Index).map_err(|_| {
                CommandError::InvalidArgument(format!("invalid option index '{}'", index))
            })
        } else if let Some(label) = raw.strip_prefix("label=") {
            Ok(OptionLocator::Label(label.to_string()))
        } else {
            Ok(OptionLocator::Label(raw.to_string()))
        }
    }
}

impl std::fmt::Display for OptionLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionLocator::Value(v) => write!(f, "value={}", v),
            OptionLocator::Index(i) => write!(f, "index={}", i),
            OptionLocator::Label(l) => write!(f, "label={}", l),
        }
    }
}

/// Page-load timing markers in milliseconds.
///
/// `dom_content_loaded` and `load` are durations relative to
/// `navigation_start`, which is an absolute epoch timestamp identifying the
/// navigation the values belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceTiming {
    pub dom_content_loaded: i64,
    pub load: i64,
    pub navigation_start: i64,
}

impl PerformanceTiming {
    /// Builds timings from the raw `window.performance.timing` object.
    ///
    /// Returns `None` if any of the required markers is missing.
    pub fn from_navigation_timing(raw: &serde_json::Value) -> Option<Self> {
        let marker = |name: &str| raw.get(name).and_then(serde_json::Value::as_i64);
        let navigation_start = marker("navigationStart")?;
        let dom_content_loaded = marker("domContentLoadedEventEnd")?;
        let load = marker("loadEventEnd")?;
        Some(Self {
            dom_content_loaded: (dom_content_loaded - navigation_start).max(0),
            load: (load - navigation_start).max(0),
            navigation_start,
        })
    }
}

/// A browser window as reported by `getWindowHandles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub handle: String,
    pub title: String,
    pub url: String,
}
