//! Automation driver trait for backend-agnostic UI automation.
//!
//! This module defines the [`AutomationDriver`] trait: the narrow capability
//! surface the command engine needs from an underlying WebDriver or Appium
//! session. The engine never speaks a wire protocol itself; a concrete adapter
//! implements this trait on top of whatever client it wraps and reports
//! failures as typed [`DriverError`] kinds so they can be classified without
//! string matching.
//!
//! The [`CaptureProxy`] trait is the equivalent seam for the network-capture
//! proxy that records HAR logs per transaction.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::element::{ElementId, OptionLocator, PerformanceTiming};
use crate::locator::Selector;

/// Errors reported by automation drivers.
///
/// Each variant is a distinct failure kind the classifier maps to a status.
/// Adapters should translate their client's error codes into the most
/// specific variant available and fall back to [`DriverError::Other`].
#[derive(Error, Debug)]
pub enum DriverError {
    /// No element matched the selector.
    #[error("No such element: {0}")]
    NoSuchElement(String),

    /// The element exists but is not displayed.
    #[error("Element is not visible: {0}")]
    ElementNotVisible(String),

    /// The element cannot be interacted with in its current state.
    #[error("Invalid element state: {0}")]
    InvalidElementState(String),

    /// The frame to switch to does not exist.
    #[error("No such frame: {0}")]
    NoSuchFrame(String),

    /// The window to switch to does not exist.
    #[error("No such window: {0}")]
    NoSuchWindow(String),

    /// A previously obtained element handle no longer refers to a live node.
    #[error("Stale element reference")]
    StaleElementReference,

    /// A native alert is open and blocks the command.
    #[error("Unexpected alert open")]
    UnhandledAlert,

    /// An alert operation was requested but no alert is open.
    #[error("No alert present")]
    NoAlertPresent,

    /// A driver-side wait (page load, script) timed out.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The transport to the driver failed. `timed_out` is set when the
    /// failure was a lower-level request timeout.
    #[error("Transport error: {message}")]
    Transport { message: String, timed_out: bool },

    /// In-page script execution failed.
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    /// The backend does not support the requested operation.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// The backend is not available or not connected.
    #[error("Not connected to automation backend")]
    NotConnected,

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse JSON data.
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Any other driver failure, with the backend's own error kind name.
    #[error("{kind}: {message}")]
    Other { kind: String, message: String },
}

impl DriverError {
    /// Returns the short kind name used in unclassified error reports.
    pub fn kind_name(&self) -> &str {
        match self {
            DriverError::NoSuchElement(_) => "NoSuchElement",
            DriverError::ElementNotVisible(_) => "ElementNotVisible",
            DriverError::InvalidElementState(_) => "InvalidElementState",
            DriverError::NoSuchFrame(_) => "NoSuchFrame",
            DriverError::NoSuchWindow(_) => "NoSuchWindow",
            DriverError::StaleElementReference => "StaleElementReference",
            DriverError::UnhandledAlert => "UnhandledAlert",
            DriverError::NoAlertPresent => "NoAlertPresent",
            DriverError::Timeout(_) => "Timeout",
            DriverError::Transport { .. } => "Transport",
            DriverError::JavaScript(_) => "JavaScript",
            DriverError::Unsupported(_) => "Unsupported",
            DriverError::NotConnected => "NotConnected",
            DriverError::Io(_) => "Io",
            DriverError::JsonParse(_) => "JsonParse",
            DriverError::Other { kind, .. } => kind,
        }
    }
}

/// Target of a frame switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameTarget {
    /// The top-level browsing context.
    Top,
    /// The parent of the current frame.
    Parent,
    /// A frame by its 0-based index on the current page.
    Index(u16),
    /// A frame or iframe element.
    Element(ElementId),
}

/// Trait for backend-agnostic browser and mobile UI automation.
///
/// Implementors wrap a concrete WebDriver/Appium client. All element
/// operations take an [`ElementId`] obtained from
/// [`find_element`](AutomationDriver::find_element) or
/// [`find_elements`](AutomationDriver::find_elements); a handle that went stale
/// must be reported as [`DriverError::StaleElementReference`] so the engine can
/// retry.
///
/// Mobile-only and optional capabilities have default implementations that
/// return [`DriverError::Unsupported`].
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    /// Navigate the current window to `url` and wait for the page to load.
    async fn open(&self, url: &str) -> Result<(), DriverError>;

    /// Find the first element matching `selector`.
    ///
    /// Returns [`DriverError::NoSuchElement`] when nothing matches.
    async fn find_element(&self, selector: &Selector) -> Result<ElementId, DriverError>;

    /// Find all elements matching `selector`. An empty list is not an error.
    async fn find_elements(&self, selector: &Selector) -> Result<Vec<ElementId>, DriverError>;

    /// Whether the element is rendered and visible.
    async fn is_displayed(&self, element: &ElementId) -> Result<bool, DriverError>;

    /// Click the element.
    async fn click(&self, element: &ElementId) -> Result<(), DriverError>;

    /// Double-click the element.
    async fn double_click(&self, element: &ElementId) -> Result<(), DriverError>;

    /// Clear the contents of an editable element.
    async fn clear(&self, element: &ElementId) -> Result<(), DriverError>;

    /// Type `text` into the element.
    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<(), DriverError>;

    /// Select an option of a `<select>` element.
    async fn select_option(
        &self,
        element: &ElementId,
        option: &OptionLocator,
    ) -> Result<(), DriverError>;

    /// Deselect an option of a multi-select element.
    async fn deselect_option(
        &self,
        element: &ElementId,
        option: &OptionLocator,
    ) -> Result<(), DriverError>;

    /// Read an attribute; `Ok(None)` when the element has no such attribute.
    async fn get_attribute(
        &self,
        element: &ElementId,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    /// Read the rendered text of the element.
    async fn get_text(&self, element: &ElementId) -> Result<String, DriverError>;

    /// Whether a checkbox, radio button or option is selected/checked.
    async fn is_selected(&self, element: &ElementId) -> Result<bool, DriverError>;

    /// Execute synchronous JavaScript in the page and return its result.
    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value, DriverError>;

    /// The current page source.
    async fn page_source(&self) -> Result<String, DriverError>;

    /// The current page title.
    async fn title(&self) -> Result<String, DriverError>;

    /// The current page URL.
    async fn current_url(&self) -> Result<String, DriverError>;

    /// Handle of the current window.
    async fn current_window(&self) -> Result<String, DriverError>;

    /// Handles of all open windows.
    async fn window_handles(&self) -> Result<Vec<String>, DriverError>;

    /// Switch the session to the window with the given handle.
    async fn switch_to_window(&self, handle: &str) -> Result<(), DriverError>;

    /// Close the current window.
    async fn close_window(&self) -> Result<(), DriverError>;

    /// Switch to a frame.
    async fn switch_to_frame(&self, target: &FrameTarget) -> Result<(), DriverError>;

    /// Text of the currently open alert.
    ///
    /// Returns [`DriverError::NoAlertPresent`] when no alert is open.
    async fn alert_text(&self) -> Result<String, DriverError>;

    /// Accept the currently open alert.
    async fn accept_alert(&self) -> Result<(), DriverError>;

    /// Dismiss the currently open alert.
    async fn dismiss_alert(&self) -> Result<(), DriverError>;

    /// Capture a screenshot of the current page or screen.
    ///
    /// # Returns
    ///
    /// Raw PNG image bytes.
    async fn screenshot(&self) -> Result<Vec<u8>, DriverError>;

    /// Resize the current window.
    async fn set_window_size(&self, width: u32, height: u32) -> Result<(), DriverError>;

    /// Page-load timing markers of the current document.
    ///
    /// The default implementation reads `window.performance.timing` through
    /// [`execute_script`](Self::execute_script). Backends with a native timing
    /// API can override it.
    async fn performance_timing(&self) -> Result<PerformanceTiming, DriverError> {
        let raw = self
            .execute_script("return window.performance.timing.toJSON();", Vec::new())
            .await?;
        PerformanceTiming::from_navigation_timing(&raw).ok_or_else(|| {
            DriverError::JsonParse("navigation timing markers missing".to_string())
        })
    }

    /// Apply the page-load timeout used by navigation commands.
    ///
    /// The default implementation ignores the timeout.
    async fn set_page_load_timeout(&self, timeout_ms: u64) -> Result<(), DriverError> {
        let _ = timeout_ms;
        Ok(())
    }

    /// Browser name reported by the session capabilities, if known.
    fn browser_name(&self) -> Option<String> {
        None
    }

    /// Switch between native and web-view contexts (mobile only).
    async fn set_context(&self, _context: &str) -> Result<(), DriverError> {
        Err(DriverError::Unsupported("set_context not supported by this backend".to_string()))
    }

    /// Name of the current context (mobile only).
    async fn current_context(&self) -> Result<String, DriverError> {
        Err(DriverError::Unsupported("current_context not supported by this backend".to_string()))
    }

    /// Tap at screen coordinates (mobile only).
    async fn tap(&self, _x: i32, _y: i32) -> Result<(), DriverError> {
        Err(DriverError::Unsupported("tap not supported by this backend".to_string()))
    }

    /// Long-press an element for `duration_ms` (mobile only).
    async fn long_press(&self, _element: &ElementId, _duration_ms: u64) -> Result<(), DriverError> {
        Err(DriverError::Unsupported("long_press not supported by this backend".to_string()))
    }
}

/// Network-capture proxy that records traffic for the current transaction.
#[async_trait]
pub trait CaptureProxy: Send + Sync {
    /// Fetch the capture artifact (HAR JSON) recorded since the last reset.
    async fn fetch_capture(&self) -> Result<String, DriverError>;

    /// Discard everything recorded so far and start a new capture.
    async fn reset_capture(&self) -> Result<(), DriverError>;
}
