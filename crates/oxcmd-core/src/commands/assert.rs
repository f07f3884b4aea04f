//! Assertions and verifications.
//!
//! `assert*` failures stop a test; `verify*` failures are reported and the
//! test continues. Both compare with a [`Pattern`].

use serde_json::Value;

use crate::command::Args;
use crate::error::CommandError;
use crate::executor::{CommandExecutor, SelectedPart, Severity};
use crate::locator::{Locator, Strategy};
use crate::pattern::Pattern;

const SELECTED_LABEL_SCRIPT: &str =
    "var s = arguments[0]; var o = s.options[s.selectedIndex]; return o ? o.text : null;";
const SELECTED_VALUE_SCRIPT: &str =
    "var s = arguments[0]; var o = s.options[s.selectedIndex]; return o ? o.value : null;";

impl CommandExecutor {
    pub(crate) async fn check_text(
        &self,
        args: Args<'_>,
        severity: Severity,
    ) -> Result<Option<Value>, CommandError> {
        let locator = self.parse_locator(&args.locator(0)?);
        let pattern = Pattern::parse(&args.string(1)?)?;
        let actual = self.visible_text(&locator).await?;
        if !pattern.is_match(&actual) {
            return Err(severity.fail(mismatch("text", &pattern, &actual)));
        }
        Ok(None)
    }

    pub(crate) async fn check_value(
        &self,
        args: Args<'_>,
        severity: Severity,
    ) -> Result<Option<Value>, CommandError> {
        let locator = self.parse_locator(&args.locator(0)?);
        let pattern = Pattern::parse(&args.string(1)?)?;
        let actual = self.element_value(&locator).await?;
        if !pattern.is_match(&actual) {
            return Err(severity.fail(mismatch("value", &pattern, &actual)));
        }
        Ok(None)
    }

    pub(crate) async fn check_title(
        &self,
        args: Args<'_>,
        severity: Severity,
    ) -> Result<Option<Value>, CommandError> {
        let pattern = Pattern::parse(&args.string(0)?)?;
        let actual = self.driver.title().await?;
        if !pattern.is_match(&actual) {
            return Err(severity.fail(mismatch("title", &pattern, &actual)));
        }
        Ok(None)
    }

    /// Asserts that the pattern occurs somewhere in the page body text.
    pub(crate) async fn assert_text_present(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let pattern = Pattern::parse(&args.string(0)?)?;
        let body = self.visible_text(&Locator::new(Strategy::Css, "body")).await?;
        if !pattern.is_found_in(&body) {
            return Err(CommandError::Assertion(format!(
                "Text {} is not present on the page",
                pattern
            )));
        }
        Ok(None)
    }

    pub(crate) async fn assert_element_present(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let locator = self.parse_locator(&args.locator(0)?);
        if self.poll_first(&locator, self.wait_timeout).await?.is_none() {
            return Err(CommandError::Assertion(format!(
                "Element {} is not present",
                locator
            )));
        }
        Ok(None)
    }

    /// Asserts the text of the open alert. The alert stays open.
    pub(crate) async fn assert_alert(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let pattern = Pattern::parse(&args.string(0)?)?;
        let actual = self.driver.alert_text().await?;
        if !pattern.is_match(&actual) {
            return Err(CommandError::Assertion(mismatch("alert text", &pattern, &actual)));
        }
        Ok(None)
    }

    /// Asserts the label or value of the selected option of a `<select>`.
    pub(crate) async fn assert_selected(
        &self,
        args: Args<'_>,
        part: SelectedPart,
    ) -> Result<Option<Value>, CommandError> {
        let locator = &self.parse_locator(&args.locator(0)?);
        let pattern = Pattern::parse(&args.string(1)?)?;
        let (script, what) = match part {
            SelectedPart::Label => (SELECTED_LABEL_SCRIPT, "selected label"),
            SelectedPart::Value => (SELECTED_VALUE_SCRIPT, "selected value"),
        };
        let timeout = self.wait_timeout;

        let selected = self
            .retry
            .run(|| async move {
                let element = self.find(locator, timeout).await?;
                let value = self
                    .driver
                    .execute_script(script, vec![element.to_script_arg()])
                    .await?;
                Ok::<_, CommandError>(value)
            })
            .await?;

        match selected {
            Value::String(actual) if pattern.is_match(&actual) => Ok(None),
            Value::String(actual) => Err(CommandError::Assertion(mismatch(what, &pattern, &actual))),
            _ => Err(CommandError::Assertion(format!(
                "No option is selected in {}",
                locator
            ))),
        }
    }
}

fn mismatch(what: &str, expected: &Pattern, actual: &str) -> String {
    format!("Expected {} {} but found '{}'", what, expected, actual)
}
