//! Status codes and failure classification.
//!
//! Every dispatched command ends in exactly one [`Status`]. Failures are
//! mapped by [`classify`], a pure function over the failure kind, so the
//! taxonomy can be tested without a driver. The only status whose detail needs
//! the driver is [`Status::UnhandledAlert`]; the executor fills in the alert
//! text after classification.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::driver::DriverError;
use crate::error::CommandError;

/// Outcome of a dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    Assert,
    Verification,
    NoElement,
    ElementNotVisible,
    FrameNotFound,
    StaleElement,
    UnhandledAlert,
    ScriptTimeout,
    NavigateTimeout,
    VariableNotDefined,
    UnknownPageObject,
    CommandNotImplemented,
    InvalidOperation,
    XmlError,
    NoAlertPresent,
    BrowserJsExecuteError,
    DuplicateTransaction,
    UnknownError,
}

impl Status {
    /// Every status, in declaration order.
    pub const ALL: [Status; 19] = [
        Status::Success,
        Status::Assert,
        Status::Verification,
        Status::NoElement,
        Status::ElementNotVisible,
        Status::FrameNotFound,
        Status::StaleElement,
        Status::UnhandledAlert,
        Status::ScriptTimeout,
        Status::NavigateTimeout,
        Status::VariableNotDefined,
        Status::UnknownPageObject,
        Status::CommandNotImplemented,
        Status::InvalidOperation,
        Status::XmlError,
        Status::NoAlertPresent,
        Status::BrowserJsExecuteError,
        Status::DuplicateTransaction,
        Status::UnknownError,
    ];

    /// The wire name, e.g. `NO_ELEMENT`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::Assert => "ASSERT",
            Status::Verification => "VERIFICATION",
            Status::NoElement => "NO_ELEMENT",
            Status::ElementNotVisible => "ELEMENT_NOT_VISIBLE",
            Status::FrameNotFound => "FRAME_NOT_FOUND",
            Status::StaleElement => "STALE_ELEMENT",
            Status::UnhandledAlert => "UNHANDLED_ALERT",
            Status::ScriptTimeout => "SCRIPT_TIMEOUT",
            Status::NavigateTimeout => "NAVIGATE_TIMEOUT",
            Status::VariableNotDefined => "VARIABLE_NOT_DEFINED",
            Status::UnknownPageObject => "UNKNOWN_PAGE_OBJECT",
            Status::CommandNotImplemented => "COMMAND_NOT_IMPLEMENTED",
            Status::InvalidOperation => "INVALID_OPERATION",
            Status::XmlError => "XML_ERROR",
            Status::NoAlertPresent => "NO_ALERT_PRESENT",
            Status::BrowserJsExecuteError => "BROWSER_JS_EXECUTE_ERROR",
            Status::DuplicateTransaction => "DUPLICATE_TRANSACTION",
            Status::UnknownError => "UNKNOWN_ERROR",
        }
    }

    pub fn is_success(&self) -> bool {
        *self == Status::Success
    }

    /// Failures for which a screenshot of the page helps diagnosis.
    ///
    /// `UNHANDLED_ALERT` is deliberately absent: screenshots cannot be taken
    /// while a native alert is open.
    pub fn is_visual(&self) -> bool {
        matches!(
            self,
            Status::Assert
                | Status::Verification
                | Status::ScriptTimeout
                | Status::NoElement
                | Status::ElementNotVisible
                | Status::InvalidOperation
                | Status::NoAlertPresent
        )
    }

    /// Configuration errors that should end the test case instead of being
    /// retried or reported as a regular failure.
    pub fn is_fatal(&self) -> bool {
        *self == Status::CommandNotImplemented
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure mapped onto the status taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: Status,
    pub detail: Option<String>,
}

impl Classification {
    fn bare(status: Status) -> Self {
        Self { status, detail: None }
    }

    fn with_detail(status: Status, detail: impl Into<String>) -> Self {
        Self { status, detail: Some(detail.into()) }
    }
}

/// Maps a command failure to its status and optional detail text.
pub fn classify(error: &CommandError) -> Classification {
    match error {
        CommandError::Assertion(msg) => Classification::with_detail(Status::Assert, msg),
        CommandError::Verification(msg) => Classification::with_detail(Status::Verification, msg),
        CommandError::ElementNotFound(_) => Classification::bare(Status::NoElement),
        CommandError::ElementNotVisible(_) => Classification::bare(Status::ElementNotVisible),
        CommandError::WaitTimeout { .. } => Classification::bare(Status::ScriptTimeout),
        CommandError::VariableUndefined(_) => {
            Classification::with_detail(Status::VariableNotDefined, error.to_string())
        }
        CommandError::LocatorUndefined(_) => {
            Classification::with_detail(Status::UnknownPageObject, error.to_string())
        }
        CommandError::CommandNotImplemented(_) => {
            Classification::with_detail(Status::CommandNotImplemented, error.to_string())
        }
        CommandError::Operation(_) | CommandError::ElementHasNoValue(_) => {
            Classification::with_detail(Status::InvalidOperation, error.to_string())
        }
        CommandError::XmlExtract(_) | CommandError::XmlToJson(_) => {
            Classification::with_detail(Status::XmlError, error.to_string())
        }
        CommandError::BrowserJsExecution(_) => {
            Classification::with_detail(Status::BrowserJsExecuteError, error.to_string())
        }
        CommandError::DuplicateTransaction(_) => {
            Classification::with_detail(Status::DuplicateTransaction, error.to_string())
        }
        CommandError::NoSuchWindow(_) | CommandError::InvalidArgument(_) => {
            Classification::with_detail(Status::UnknownError, error.to_string())
        }
        CommandError::Driver(driver) => classify_driver(driver),
    }
}

fn classify_driver(error: &DriverError) -> Classification {
    match error {
        DriverError::NoSuchElement(_) => Classification::bare(Status::NoElement),
        DriverError::ElementNotVisible(_) => Classification::bare(Status::ElementNotVisible),
        DriverError::NoSuchFrame(_) => Classification::bare(Status::FrameNotFound),
        DriverError::StaleElementReference => Classification::bare(Status::StaleElement),
        DriverError::UnhandledAlert => Classification::bare(Status::UnhandledAlert),
        DriverError::NoAlertPresent => Classification::bare(Status::NoAlertPresent),
        DriverError::Timeout(_) => Classification::bare(Status::ScriptTimeout),
        DriverError::Transport { timed_out: true, .. } => {
            Classification::bare(Status::NavigateTimeout)
        }
        DriverError::InvalidElementState(_) => {
            Classification::with_detail(Status::InvalidOperation, error.to_string())
        }
        DriverError::JavaScript(_) => {
            Classification::with_detail(Status::BrowserJsExecuteError, error.to_string())
        }
        DriverError::Transport { timed_out: false, .. }
        | DriverError::NoSuchWindow(_)
        | DriverError::Unsupported(_)
        | DriverError::NotConnected
        | DriverError::Io(_)
        | DriverError::JsonParse(_)
        | DriverError::Other { .. } => {
            Classification::with_detail(Status::UnknownError, error.to_string())
        }
    }
}
