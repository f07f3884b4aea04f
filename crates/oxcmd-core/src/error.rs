//! Failure kinds raised while executing a command.
//!
//! [`CommandError`] is what command handlers return. It wraps every
//! [`DriverError`] and adds the failures the engine raises itself (assertion
//! mismatches, wait timeouts, unknown page objects, …). The classifier in
//! [`status`](crate::status) maps each kind to exactly one status code.

use thiserror::Error;

use crate::driver::DriverError;

/// Errors that can occur while executing a command.
#[derive(Error, Debug)]
pub enum CommandError {
    /// A hard assertion did not hold.
    #[error("{0}")]
    Assertion(String),

    /// A soft verification did not hold.
    #[error("{0}")]
    Verification(String),

    /// No element matched the locator within the wait timeout.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The element exists but did not become visible within the wait timeout.
    #[error("Element not visible: {0}")]
    ElementNotVisible(String),

    /// `getValue`/`storeValue` on an element without a value.
    #[error("Element has no value: {0}")]
    ElementHasNoValue(String),

    /// The operation is not valid for the element or page.
    #[error("{0}")]
    Operation(String),

    /// A `waitFor*` style command ran out of time.
    #[error("Timed out after {timeout_ms}ms waiting for {what}")]
    WaitTimeout { what: String, timeout_ms: u64 },

    /// A symbolic locator has no object-repository entry.
    #[error("Locator undefined: {0}")]
    LocatorUndefined(String),

    /// A `${name}` reference to an unset variable.
    #[error("Variable undefined: {0}")]
    VariableUndefined(String),

    /// No command with this name is registered.
    #[error("Command not implemented: {0}")]
    CommandNotImplemented(String),

    /// XML could not be extracted from the page.
    #[error("{0}")]
    XmlExtract(String),

    /// Extracted XML could not be converted to JSON.
    #[error("{0}")]
    XmlToJson(String),

    /// An in-page script raised an error.
    #[error("{0}")]
    BrowserJsExecution(String),

    /// A transaction name was opened twice in one run.
    #[error("Duplicate transaction found: \"{0}\". Transactions must be unique.")]
    DuplicateTransaction(String),

    /// No window matched a window locator.
    #[error("No window found matching: {0}")]
    NoSuchWindow(String),

    /// A command argument was missing or had the wrong type.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A failure reported by the automation driver.
    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl CommandError {
    /// Returns the short kind name used in unclassified error reports.
    pub fn kind_name(&self) -> &str {
        match self {
            CommandError::Assertion(_) => "Assertion",
            CommandError::Verification(_) => "Verification",
            CommandError::ElementNotFound(_) => "ElementNotFound",
            CommandError::ElementNotVisible(_) => "ElementNotVisible",
            CommandError::ElementHasNoValue(_) => "ElementHasNoValue",
            CommandError::Operation(_) => "Operation",
            CommandError::WaitTimeout { .. } => "WaitTimeout",
            CommandError::LocatorUndefined(_) => "LocatorUndefined",
            CommandError::VariableUndefined(_) => "VariableUndefined",
            CommandError::CommandNotImplemented(_) => "CommandNotImplemented",
            CommandError::XmlExtract(_) => "XmlExtract",
            CommandError::XmlToJson(_) => "XmlToJson",
            CommandError::BrowserJsExecution(_) => "BrowserJsExecution",
            CommandError::DuplicateTransaction(_) => "DuplicateTransaction",
            CommandError::NoSuchWindow(_) => "NoSuchWindow",
            CommandError::InvalidArgument(_) => "InvalidArgument",
            CommandError::Driver(e) => e.kind_name(),
        }
    }

    /// Debug rendering of the error and its source chain.
    ///
    /// This is the closest equivalent of a stack trace that survives a
    /// `Result` round-trip, and is what unclassified failures report as
    /// their details.
    pub fn details(&self) -> String {
        let mut details = format!("{:?}", self);
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            details.push_str("\ncaused by: ");
            details.push_str(&cause.to_string());
            source = cause.source();
        }
        details
    }
}
