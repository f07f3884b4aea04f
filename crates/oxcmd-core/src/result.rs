//! Normalized command results.
//!
//! Every dispatch produces exactly one [`CommandResult`], whichever driver
//! was used and whatever went wrong. Results are built through
//! [`CommandResult::success`] and [`CommandResult::failure`], which keep the
//! status, the success flag and the error fields consistent with each other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CommandError;
use crate::status::{Classification, Status};

/// Outcome of one dispatched command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    /// Canonical name of the command, or the name as given if it is unknown.
    pub command: String,
    pub is_action: bool,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<String>,
    /// Always `status == Status::Success`.
    pub is_success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_value: Option<Value>,
    /// Base64-encoded PNG.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    /// Set only for [`Status::UnknownError`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Set only for [`Status::UnknownError`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Set only for [`Status::UnknownError`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dom_content_loaded_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_event_ms: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: f64,
}

impl CommandResult {
    /// A successful result carrying the command's return value.
    pub fn success(command: impl Into<String>, is_action: bool, return_value: Option<Value>) -> Self {
        let now = Utc::now();
        Self {
            command: command.into(),
            is_action,
            status: Status::Success,
            status_detail: None,
            is_success: true,
            return_value,
            screenshot: None,
            error_type: None,
            error_message: None,
            error_details: None,
            dom_content_loaded_ms: None,
            load_event_ms: None,
            start_time: now,
            end_time: now,
            duration_seconds: 0.0,
        }
    }

    /// A failed result for `error`, already classified.
    ///
    /// Unclassified failures ([`Status::UnknownError`]) keep the error's kind
    /// name, message and details so nothing is lost.
    pub fn failure(
        command: impl Into<String>,
        is_action: bool,
        error: &CommandError,
        classification: Classification,
    ) -> Self {
        let mut result = Self::success(command, is_action, None);
        result.status = classification.status;
        result.status_detail = classification.detail;
        result.is_success = classification.status.is_success();
        if classification.status == Status::UnknownError {
            result.error_type = Some(error.kind_name().to_string());
            result.error_message = Some(error.to_string());
            result.error_details = Some(error.details());
        }
        result
    }

    /// Sets start and end timestamps and the derived duration.
    pub fn with_timing(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start_time = start;
        self.end_time = end;
        self.duration_seconds = (end - start)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        self
    }

    pub fn with_screenshot(mut self, screenshot: String) -> Self {
        self.screenshot = Some(screenshot);
        self
    }

    /// Attaches page-load timings in milliseconds.
    pub fn with_navigation_timing(mut self, dom_content_loaded_ms: i64, load_event_ms: i64) -> Self {
        self.dom_content_loaded_ms = Some(dom_content_loaded_ms);
        self.load_event_ms = Some(load_event_ms);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverError;
    use crate::status::classify;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_success_invariants() {
        let result = CommandResult::success("getText", false, Some(json!("Hello")));
        assert!(result.is_success);
        assert_eq!(result.status, Status::Success);
        assert!(result.error_type.is_none());
        assert_eq!(result.return_value, Some(json!("Hello")));
    }

    #[test]
    fn test_classified_failure_has_no_error_fields() {
        let err = CommandError::Assertion("expected 'a' got 'b'".into());
        let result = CommandResult::failure("assertText", false, &err, classify(&err));
        assert!(!result.is_success);
        assert_eq!(result.status, Status::Assert);
        assert_eq!(result.status_detail.as_deref(), Some("expected 'a' got 'b'"));
        assert!(result.error_type.is_none());
        assert!(result.error_message.is_none());
        assert!(result.error_details.is_none());
    }

    #[test]
    fn test_unknown_error_keeps_diagnostics() {
        let err = CommandError::Driver(DriverError::Other {
            kind: "SessionNotCreated".into(),
            message: "chrome crashed".into(),
        });
        let result = CommandResult::failure("click", true, &err, classify(&err));
        assert_eq!(result.status, Status::UnknownError);
        assert_eq!(result.error_type.as_deref(), Some("SessionNotCreated"));
        assert_eq!(result.error_message.as_deref(), Some("SessionNotCreated: chrome crashed"));
        assert!(result.error_details.unwrap().contains("Other"));
    }

    #[test]
    fn test_timing() {
        let start = Utc::now();
        let end = start + Duration::milliseconds(1500);
        let result = CommandResult::success("open", true, None).with_timing(start, end);
        assert!((result.duration_seconds - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_serializes_camel_case() {
        let result = CommandResult::success("getValue", false, Some(json!("on")))
            .with_navigation_timing(120, 480);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "SUCCESS");
        assert_eq!(json["isSuccess"], true);
        assert_eq!(json["returnValue"], "on");
        assert_eq!(json["domContentLoadedMs"], 120);
        assert_eq!(json["loadEventMs"], 480);
        assert!(json.get("durationSeconds").is_some());
        assert!(json.get("errorType").is_none());
    }
}
