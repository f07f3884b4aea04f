//! Command handlers.
//!
//! Each submodule adds handler methods to [`CommandExecutor`] for one group
//! of commands. Handlers return `Ok(Some(value))` for commands with a return
//! value and `Ok(None)` otherwise; every failure is a [`CommandError`] that
//! the executor classifies.
//!
//! The element lookups shared by the handlers live here. Lookups wait for the
//! element up to the command's timeout, polling at the configured interval.

mod alert;
mod assert;
mod element;
mod mobile;
mod navigation;
mod script;
mod wait;

use std::time::Duration;

use tokio::time::Instant;

use crate::element::ElementId;
use crate::error::CommandError;
use crate::executor::{is_absent, CommandExecutor};
use crate::locator::Locator;
use crate::wait::poll_until;

/// Trims the text and collapses runs of whitespace to one space.
pub(crate) fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl CommandExecutor {
    pub(crate) fn parse_locator(&self, raw: &str) -> Locator {
        Locator::parse(raw, &self.context)
    }

    /// Splits `locator@attribute` and resolves the locator half, which may
    /// name a page object.
    pub(crate) fn parse_attribute_locator(
        &self,
        command: &str,
        raw: &str,
    ) -> Result<(Locator, String), CommandError> {
        self.resolver
            .resolve_attribute(raw, &self.context)
            .map_err(|e| match e {
                CommandError::InvalidArgument(message) => {
                    CommandError::InvalidArgument(format!("{}: {}", command, message))
                }
                other => other,
            })
    }

    /// Finds the first element matching `locator`, waiting up to `timeout`.
    pub(crate) async fn find(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<ElementId, CommandError> {
        let found = self.poll_first(locator, timeout).await?;
        found.ok_or_else(|| CommandError::ElementNotFound(locator.to_string()))
    }

    /// Polls for the first element matching `locator`; `None` on timeout.
    pub(crate) async fn poll_first(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Option<ElementId>, CommandError> {
        let driver = self.driver.as_ref();
        let selector = &locator.to_selector(&self.context);
        poll_until(timeout, self.poll_interval(), || async move {
            match driver.find_elements(selector).await {
                Ok(elements) => Ok(elements.into_iter().next()),
                Err(e) if is_absent(&e) => Ok(None),
                Err(e) => Err(CommandError::from(e)),
            }
        })
        .await
    }

    /// Finds an element and waits until it is displayed, both within one
    /// `timeout`.
    pub(crate) async fn find_visible(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<ElementId, CommandError> {
        let deadline = Instant::now() + timeout;
        let element = self.find(locator, timeout).await?;

        let driver = self.driver.as_ref();
        let target = &element;
        let remaining = deadline.saturating_duration_since(Instant::now());
        let visible = poll_until(remaining, self.poll_interval(), || async move {
            Ok::<_, CommandError>(driver.is_displayed(target).await?.then_some(()))
        })
        .await?;

        match visible {
            Some(()) => Ok(element),
            None => Err(CommandError::ElementNotVisible(locator.to_string())),
        }
    }

    /// Value of a form element.
    ///
    /// Checkboxes and radio buttons report `"on"` or `"off"`; other elements
    /// report their `value` attribute. Elements without a `type` or `value`
    /// have no value.
    pub(crate) async fn read_value(
        &self,
        element: &ElementId,
        locator: &Locator,
    ) -> Result<String, CommandError> {
        let no_value = || CommandError::ElementHasNoValue(locator.to_string());
        let kind = self
            .driver
            .get_attribute(element, "type")
            .await?
            .ok_or_else(no_value)?;

        match kind.trim().to_ascii_lowercase().as_str() {
            "checkbox" | "radio" => {
                let checked = self.driver.is_selected(element).await?;
                Ok(if checked { "on" } else { "off" }.to_string())
            }
            _ => self
                .driver
                .get_attribute(element, "value")
                .await?
                .ok_or_else(no_value),
        }
    }

    /// Normalized text of the first element matching `locator`, without
    /// waiting. `None` when nothing matches.
    pub(crate) async fn current_text(&self, locator: &Locator) -> Result<Option<String>, CommandError> {
        match self.poll_first(locator, Duration::ZERO).await? {
            Some(element) => Ok(Some(normalize_text(&self.driver.get_text(&element).await?))),
            None => Ok(None),
        }
    }

    /// Value of the first element matching `locator`, without waiting.
    /// `None` when nothing matches.
    pub(crate) async fn current_value(
        &self,
        locator: &Locator,
    ) -> Result<Option<String>, CommandError> {
        match self.poll_first(locator, Duration::ZERO).await? {
            Some(element) => Ok(Some(self.read_value(&element, locator).await?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Hello \n\t  world  "), "Hello world");
        assert_eq!(normalize_text(""), "");
    }
}
