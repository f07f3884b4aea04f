//! Screenshots and page-load timing attached to command results.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::driver::AutomationDriver;
use crate::status::Status;

/// When a screenshot is attached to a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScreenshotPolicy {
    Never,
    /// Only after failures that a screenshot helps explain.
    #[default]
    OnError,
    /// After successful actions, and after failures like [`OnError`](Self::OnError).
    OnAction,
    /// After every successful command, and after failures like
    /// [`OnError`](Self::OnError).
    Always,
}

impl ScreenshotPolicy {
    /// Whether a successful command gets a screenshot.
    pub fn on_success(&self, is_action: bool) -> bool {
        match self {
            ScreenshotPolicy::OnAction => is_action,
            ScreenshotPolicy::Always => true,
            ScreenshotPolicy::Never | ScreenshotPolicy::OnError => false,
        }
    }

    /// Whether a failure with `status` gets a screenshot.
    pub fn on_failure(&self, status: Status) -> bool {
        *self != ScreenshotPolicy::Never && status.is_visual()
    }
}

impl FromStr for ScreenshotPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "never" => Ok(ScreenshotPolicy::Never),
            "onerror" => Ok(ScreenshotPolicy::OnError),
            "onaction" => Ok(ScreenshotPolicy::OnAction),
            "always" => Ok(ScreenshotPolicy::Always),
            other => Err(format!(
                "unknown screenshot policy '{}' (expected never, onError, onAction or always)",
                other
            )),
        }
    }
}

impl fmt::Display for ScreenshotPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScreenshotPolicy::Never => "never",
            ScreenshotPolicy::OnError => "onError",
            ScreenshotPolicy::OnAction => "onAction",
            ScreenshotPolicy::Always => "always",
        })
    }
}

/// Captures a screenshot as base64-encoded PNG.
///
/// A failed capture is logged and yields `None`; it never fails the command.
pub async fn capture_screenshot(driver: &dyn AutomationDriver) -> Option<String> {
    match driver.screenshot().await {
        Ok(bytes) => Some(base64::engine::general_purpose::STANDARD.encode(&bytes)),
        Err(e) => {
            warn!(error = %e, "screenshot capture failed");
            None
        }
    }
}

/// Page-load timing sampler that reports each navigation only once.
///
/// The timer remembers the `navigationStart` marker of the last sample. When a
/// later sample carries the same marker the page has not navigated since, and
/// both durations are reported as zero so one page load is not counted by
/// several commands.
#[derive(Debug, Clone, Default)]
pub struct NavigationTimer {
    baseline: Option<i64>,
}

impl NavigationTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `navigationStart` of the last reported navigation.
    pub fn baseline(&self) -> Option<i64> {
        self.baseline
    }

    /// Returns `(dom_content_loaded_ms, load_event_ms)` for the current page.
    ///
    /// A failed read is logged and reported as zeros without touching the
    /// baseline.
    pub async fn sample(&mut self, driver: &dyn AutomationDriver) -> (i64, i64) {
        match driver.performance_timing().await {
            Ok(timing) if self.baseline == Some(timing.navigation_start) => (0, 0),
            Ok(timing) => {
                self.baseline = Some(timing.navigation_start);
                (timing.dom_content_loaded, timing.load)
            }
            Err(e) => {
                warn!(error = %e, "failed to read navigation timing");
                (0, 0)
            }
        }
    }
}
