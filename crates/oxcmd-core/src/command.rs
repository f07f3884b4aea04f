//! Command registry and typed argument access.
//!
//! Commands are addressed by name, case-insensitively. Every registered name
//! maps to a [`CommandKind`]; the executor matches on the kind to reach the
//! handler, so adding a command means adding a variant, a name and a match
//! arm.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::CommandError;

/// Every command the executor can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    // Navigation and windows
    Open,
    SetWindowSize,
    GetWindowHandles,
    SelectWindow,
    WaitForWindow,
    CloseWindow,
    SelectFrame,
    GetTitle,
    GetPageSource,
    GetXmlPageSource,
    GetXmlPageSourceAsJson,
    SetTimeout,
    Pause,
    Transaction,

    // Element actions
    Click,
    ClickHidden,
    DoubleClick,
    Type,
    Clear,
    Select,
    Deselect,

    // Element reads
    GetText,
    GetAttribute,
    GetValue,
    GetElementCount,
    IsElementPresent,
    IsElementVisible,
    IsSelected,

    // Waits
    WaitForVisible,
    WaitForExist,
    WaitForText,
    WaitForNotText,
    WaitForValue,
    WaitForNotValue,

    // Assertions and verifications
    AssertText,
    AssertValue,
    AssertTitle,
    AssertTextPresent,
    AssertElementPresent,
    AssertAlert,
    AssertSelectedLabel,
    AssertSelectedValue,
    VerifyText,
    VerifyTitle,
    VerifyValue,

    // Scripts and variables
    ExecuteScript,
    StoreText,
    StoreValue,
    StoreAttribute,

    // Alerts
    AlertAccept,
    AlertDismiss,
    GetAlertText,
    IsAlertPresent,

    // Mobile
    Tap,
    ClickLong,
    SetContext,
    IsWebViewContext,
}

/// Alternative names accepted for some commands.
const ALIASES: &[(&str, CommandKind)] = &[("waitForElementPresent", CommandKind::WaitForExist)];

static REGISTRY: Lazy<HashMap<String, CommandKind>> = Lazy::new(|| {
    let mut map = HashMap::with_capacity(CommandKind::ALL.len() + ALIASES.len());
    for kind in CommandKind::ALL {
        map.insert(kind.name().to_ascii_lowercase(), kind);
    }
    for (alias, kind) in ALIASES {
        map.insert(alias.to_ascii_lowercase(), *kind);
    }
    map
});

impl CommandKind {
    pub const ALL: [CommandKind; 57] = [
        CommandKind::Open,
        CommandKind::SetWindowSize,
        CommandKind::GetWindowHandles,
        CommandKind::SelectWindow,
        CommandKind::WaitForWindow,
        CommandKind::CloseWindow,
        CommandKind::SelectFrame,
        CommandKind::GetTitle,
        CommandKind::GetPageSource,
        CommandKind::GetXmlPageSource,
        CommandKind::GetXmlPageSourceAsJson,
        CommandKind::SetTimeout,
        CommandKind::Pause,
        CommandKind::Transaction,
        CommandKind::Click,
        CommandKind::ClickHidden,
        CommandKind::DoubleClick,
        CommandKind::Type,
        CommandKind::Clear,
        CommandKind::Select,
        CommandKind::Deselect,
        CommandKind::GetText,
        CommandKind::GetAttribute,
        CommandKind::GetValue,
        CommandKind::GetElementCount,
        CommandKind::IsElementPresent,
        CommandKind::IsElementVisible,
        CommandKind::IsSelected,
        CommandKind::WaitForVisible,
        CommandKind::WaitForExist,
        CommandKind::WaitForText,
        CommandKind::WaitForNotText,
        CommandKind::WaitForValue,
        CommandKind::WaitForNotValue,
        CommandKind::AssertText,
        CommandKind::AssertValue,
        CommandKind::AssertTitle,
        CommandKind::AssertTextPresent,
        CommandKind::AssertElementPresent,
        CommandKind::AssertAlert,
        CommandKind::AssertSelectedLabel,
        CommandKind::AssertSelectedValue,
        CommandKind::VerifyText,
        CommandKind::VerifyTitle,
        CommandKind::VerifyValue,
        CommandKind::ExecuteScript,
        CommandKind::StoreText,
        CommandKind::StoreValue,
        CommandKind::StoreAttribute,
        CommandKind::AlertAccept,
        CommandKind::AlertDismiss,
        CommandKind::GetAlertText,
        CommandKind::IsAlertPresent,
        CommandKind::Tap,
        CommandKind::ClickLong,
        CommandKind::SetContext,
        CommandKind::IsWebViewContext,
    ];

    /// Canonical command name.
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Open => "open",
            CommandKind::SetWindowSize => "setWindowSize",
            CommandKind::GetWindowHandles => "getWindowHandles",
            CommandKind::SelectWindow => "selectWindow",
            CommandKind::WaitForWindow => "waitForWindow",
            CommandKind::CloseWindow => "closeWindow",
            CommandKind::SelectFrame => "selectFrame",
            CommandKind::GetTitle => "getTitle",
            CommandKind::GetPageSource => "getPageSource",
            CommandKind::GetXmlPageSource => "getXMLPageSource",
            CommandKind::GetXmlPageSourceAsJson => "getXMLPageSourceAsJSON",
            CommandKind::SetTimeout => "setTimeout",
            CommandKind::Pause => "pause",
            CommandKind::Transaction => "transaction",
            CommandKind::Click => "click",
            CommandKind::ClickHidden => "clickHidden",
            CommandKind::DoubleClick => "doubleClick",
            CommandKind::Type => "type",
            CommandKind::Clear => "clear",
            CommandKind::Select => "select",
            CommandKind::Deselect => "deselect",
            CommandKind::GetText => "getText",
            CommandKind::GetAttribute => "getAttribute",
            CommandKind::GetValue => "getValue",
            CommandKind::GetElementCount => "getElementCount",
            CommandKind::IsElementPresent => "isElementPresent",
            CommandKind::IsElementVisible => "isElementVisible",
            CommandKind::IsSelected => "isSelected",
            CommandKind::WaitForVisible => "waitForVisible",
            CommandKind::WaitForExist => "waitForExist",
            CommandKind::WaitForText => "waitForText",
            CommandKind::WaitForNotText => "waitForNotText",
            CommandKind::WaitForValue => "waitForValue",
            CommandKind::WaitForNotValue => "waitForNotValue",
            CommandKind::AssertText => "assertText",
            CommandKind::AssertValue => "assertValue",
            CommandKind::AssertTitle => "assertTitle",
            CommandKind::AssertTextPresent => "assertTextPresent",
            CommandKind::AssertElementPresent => "assertElementPresent",
            CommandKind::AssertAlert => "assertAlert",
            CommandKind::AssertSelectedLabel => "assertSelectedLabel",
            CommandKind::AssertSelectedValue => "assertSelectedValue",
            CommandKind::VerifyText => "verifyText",
            CommandKind::VerifyTitle => "verifyTitle",
            CommandKind::VerifyValue => "verifyValue",
            CommandKind::ExecuteScript => "executeScript",
            CommandKind::StoreText => "storeText",
            CommandKind::StoreValue => "storeValue",
            CommandKind::StoreAttribute => "storeAttribute",
            CommandKind::AlertAccept => "alertAccept",
            CommandKind::AlertDismiss => "alertDismiss",
            CommandKind::GetAlertText => "getAlertText",
            CommandKind::IsAlertPresent => "isAlertPresent",
            CommandKind::Tap => "tap",
            CommandKind::ClickLong => "clickLong",
            CommandKind::SetContext => "setContext",
            CommandKind::IsWebViewContext => "isWebViewContext",
        }
    }

    /// Looks up a command by name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        REGISTRY.get(&name.trim().to_ascii_lowercase()).copied()
    }

    /// Whether the command changes page or application state.
    ///
    /// Actions are the commands eligible for `onAction` screenshots and
    /// navigation timing.
    pub fn is_action(&self) -> bool {
        matches!(
            self,
            CommandKind::Open
                | CommandKind::Click
                | CommandKind::ClickHidden
                | CommandKind::DoubleClick
                | CommandKind::Type
                | CommandKind::Clear
                | CommandKind::Select
                | CommandKind::Deselect
                | CommandKind::Tap
                | CommandKind::ClickLong
                | CommandKind::AlertAccept
                | CommandKind::AlertDismiss
                | CommandKind::SelectWindow
                | CommandKind::CloseWindow
        )
    }

    /// Group the command is listed under.
    pub fn category(&self) -> &'static str {
        use CommandKind::*;
        match self {
            Open | SetWindowSize | GetWindowHandles | SelectWindow | WaitForWindow
            | CloseWindow | SelectFrame | GetTitle | GetPageSource | GetXmlPageSource
            | GetXmlPageSourceAsJson | SetTimeout | Pause | Transaction => "navigation",
            Click | ClickHidden | DoubleClick | Type | Clear | Select | Deselect => "action",
            GetText | GetAttribute | GetValue | GetElementCount | IsElementPresent
            | IsElementVisible | IsSelected => "read",
            WaitForVisible | WaitForExist | WaitForText | WaitForNotText | WaitForValue
            | WaitForNotValue => "wait",
            AssertText | AssertValue | AssertTitle | AssertTextPresent | AssertElementPresent
            | AssertAlert | AssertSelectedLabel | AssertSelectedValue | VerifyText
            | VerifyTitle | VerifyValue => "assert",
            ExecuteScript | StoreText | StoreValue | StoreAttribute => "script",
            AlertAccept | AlertDismiss | GetAlertText | IsAlertPresent => "alert",
            Tap | ClickLong | SetContext | IsWebViewContext => "mobile",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named command with its raw arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub kind: CommandKind,
    pub args: Vec<Value>,
}

impl Command {
    /// Looks up `name` in the registry.
    pub fn new(name: &str, args: Vec<Value>) -> Result<Self, CommandError> {
        let kind = CommandKind::from_name(name)
            .ok_or_else(|| CommandError::CommandNotImplemented(name.to_string()))?;
        Ok(Self { kind, args })
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn is_action(&self) -> bool {
        self.kind.is_action()
    }
}

/// Positional argument accessor.
///
/// Missing or mistyped arguments are reported as
/// [`CommandError::InvalidArgument`]. JSON `null` counts as missing.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    command: &'static str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn new(command: &'static str, values: &'a [Value]) -> Self {
        Self { command, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn get(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index).filter(|v| !v.is_null())
    }

    fn missing(&self, index: usize, what: &str) -> CommandError {
        CommandError::InvalidArgument(format!(
            "{}: missing {} (argument {})",
            self.command,
            what,
            index + 1
        ))
    }

    fn mistyped(&self, index: usize, what: &str, value: &Value) -> CommandError {
        CommandError::InvalidArgument(format!(
            "{}: argument {} must be {}, got {}",
            self.command,
            index + 1,
            what,
            value
        ))
    }

    /// Raw JSON value, if present.
    pub fn value(&self, index: usize) -> Option<&'a Value> {
        self.get(index)
    }

    /// Arguments from `index` on, unconverted.
    pub fn rest(&self, index: usize) -> &'a [Value] {
        self.values.get(index..).unwrap_or(&[])
    }

    /// A string argument. Numbers and booleans are converted.
    pub fn string(&self, index: usize) -> Result<String, CommandError> {
        self.opt_string(index)?.ok_or_else(|| self.missing(index, "string"))
    }

    pub fn opt_string(&self, index: usize) -> Result<Option<String>, CommandError> {
        match self.get(index) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(other) => Err(self.mistyped(index, "a string", other)),
        }
    }

    /// A locator argument.
    pub fn locator(&self, index: usize) -> Result<String, CommandError> {
        match self.get(index) {
            None => Err(self.missing(index, "locator")),
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
            Some(other) => Err(self.mistyped(index, "a locator string", other)),
        }
    }

    /// A non-negative integer. Numeric strings are accepted.
    pub fn u64(&self, index: usize) -> Result<u64, CommandError> {
        self.opt_u64(index)?.ok_or_else(|| self.missing(index, "number"))
    }

    pub fn opt_u64(&self, index: usize) -> Result<Option<u64>, CommandError> {
        match self.get(index) {
            None => Ok(None),
            Some(v) => v
                .as_u64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
                .map(Some)
                .ok_or_else(|| self.mistyped(index, "a non-negative integer", v)),
        }
    }

    /// A signed integer. Numeric strings are accepted.
    pub fn i64(&self, index: usize) -> Result<i64, CommandError> {
        match self.get(index) {
            None => Err(self.missing(index, "number")),
            Some(v) => v
                .as_i64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
                .ok_or_else(|| self.mistyped(index, "an integer", v)),
        }
    }
}
