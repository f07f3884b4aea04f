//! Element actions and reads.
//!
//! Every handler here runs its lookup and driver calls inside the stale
//! element retry policy, so a handle that goes stale between lookup and use
//! is looked up again.

use serde_json::Value;

use crate::command::Args;
use crate::element::OptionLocator;
use crate::error::CommandError;
use crate::executor::{is_absent, CommandExecutor};
use crate::locator::Locator;

use super::normalize_text;

const CLICK_SCRIPT: &str = "arguments[0].click();";

impl CommandExecutor {
    pub(crate) async fn click(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let locator = &self.parse_locator(&args.locator(0)?);
        let timeout = self.wait_timeout;
        self.retry
            .run(|| async move {
                let element = self.find_visible(locator, timeout).await?;
                self.driver.click(&element).await?;
                Ok::<_, CommandError>(None)
            })
            .await
    }

    /// Clicks through a script, so hidden elements can be clicked too.
    pub(crate) async fn click_hidden(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let locator = &self.parse_locator(&args.locator(0)?);
        let timeout = self.wait_timeout;
        self.retry
            .run(|| async move {
                let element = self.find(locator, timeout).await?;
                self.driver
                    .execute_script(CLICK_SCRIPT, vec![element.to_script_arg()])
                    .await?;
                Ok::<_, CommandError>(None)
            })
            .await
    }

    pub(crate) async fn double_click(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let locator = &self.parse_locator(&args.locator(0)?);
        let timeout = self.wait_timeout;
        self.retry
            .run(|| async move {
                let element = self.find_visible(locator, timeout).await?;
                self.driver.double_click(&element).await?;
                Ok::<_, CommandError>(None)
            })
            .await
    }

    /// Replaces the contents of an editable element.
    pub(crate) async fn type_text(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let locator = &self.parse_locator(&args.locator(0)?);
        let text = &args.string(1)?;
        let timeout = self.wait_timeout;
        self.retry
            .run(|| async move {
                let element = self.find_visible(locator, timeout).await?;
                self.driver.clear(&element).await?;
                self.driver.send_keys(&element, text).await?;
                Ok::<_, CommandError>(None)
            })
            .await
    }

    pub(crate) async fn clear(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let locator = &self.parse_locator(&args.locator(0)?);
        let timeout = self.wait_timeout;
        self.retry
            .run(|| async move {
                let element = self.find_visible(locator, timeout).await?;
                self.driver.clear(&element).await?;
                Ok::<_, CommandError>(None)
            })
            .await
    }

    /// `select` when `select` is true, `deselect` otherwise.
    pub(crate) async fn select(
        &self,
        args: Args<'_>,
        select: bool,
    ) -> Result<Option<Value>, CommandError> {
        let locator = &self.parse_locator(&args.locator(0)?);
        let option = &OptionLocator::parse(&args.string(1)?)?;
        let timeout = self.wait_timeout;
        self.retry
            .run(|| async move {
                let element = self.find(locator, timeout).await?;
                if select {
                    self.driver.select_option(&element, option).await?;
                } else {
                    self.driver.deselect_option(&element, option).await?;
                }
                Ok::<_, CommandError>(None)
            })
            .await
    }

    /// Visible text with whitespace collapsed.
    pub(crate) async fn get_text(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let locator = &self.parse_locator(&args.locator(0)?);
        let text = self.visible_text(locator).await?;
        Ok(Some(Value::String(text)))
    }

    /// `getAttribute(locator, name)` or `getAttribute("locator@name")`.
    ///
    /// A missing attribute returns `null`.
    pub(crate) async fn get_attribute(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let raw = args.locator(0)?;
        let (locator, name) = match args.opt_string(1)? {
            Some(name) => (self.parse_locator(&raw), name),
            None => self.parse_attribute_locator("getAttribute", &raw)?,
        };
        let value = self.attribute(&locator, &name).await?;
        Ok(Some(value.map_or(Value::Null, Value::String)))
    }

    pub(crate) async fn get_value(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let locator = &self.parse_locator(&args.locator(0)?);
        let value = self.element_value(locator).await?;
        Ok(Some(Value::String(value)))
    }

    /// Number of matching elements right now; zero when none match.
    pub(crate) async fn get_element_count(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let selector = &self
            .parse_locator(&args.locator(0)?)
            .to_selector(&self.context);
        let count = self
            .retry
            .run(|| async move {
                match self.driver.find_elements(selector).await {
                    Ok(elements) => Ok(elements.len()),
                    Err(e) if is_absent(&e) => Ok(0),
                    Err(e) => Err(CommandError::from(e)),
                }
            })
            .await?;
        Ok(Some(Value::from(count)))
    }

    pub(crate) async fn is_element_present(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let locator = self.parse_locator(&args.locator(0)?);
        let timeout = self.timeout(args.opt_u64(1)?);
        let found = self.poll_first(&locator, timeout).await?;
        Ok(Some(Value::Bool(found.is_some())))
    }

    pub(crate) async fn is_element_visible(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let locator = self.parse_locator(&args.locator(0)?);
        let timeout = self.timeout(args.opt_u64(1)?);
        match self.find_visible(&locator, timeout).await {
            Ok(_) => Ok(Some(Value::Bool(true))),
            Err(CommandError::ElementNotFound(_) | CommandError::ElementNotVisible(_)) => {
                Ok(Some(Value::Bool(false)))
            }
            Err(e) => Err(e),
        }
    }

    /// Whether a checkbox, radio button or option is selected.
    ///
    /// Native mobile elements expose this as their `selected` attribute.
    pub(crate) async fn is_selected(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let locator = &self.parse_locator(&args.locator(0)?);
        let timeout = self.wait_timeout;
        let native = self.context.is_native_app();
        let selected = self
            .retry
            .run(|| async move {
                let element = self.find(locator, timeout).await?;
                if native {
                    let attr = self.driver.get_attribute(&element, "selected").await?;
                    Ok::<_, CommandError>(attr.as_deref() == Some("true"))
                } else {
                    Ok(self.driver.is_selected(&element).await?)
                }
            })
            .await?;
        Ok(Some(Value::Bool(selected)))
    }

    /// Normalized text of a visible element.
    pub(crate) async fn visible_text(
        &self,
        locator: &Locator,
    ) -> Result<String, CommandError> {
        let timeout = self.wait_timeout;
        self.retry
            .run(|| async move {
                let element = self.find_visible(locator, timeout).await?;
                let text = self.driver.get_text(&element).await?;
                Ok::<_, CommandError>(normalize_text(&text))
            })
            .await
    }

    /// Value of an element as reported by `getValue`.
    pub(crate) async fn element_value(
        &self,
        locator: &Locator,
    ) -> Result<String, CommandError> {
        let timeout = self.wait_timeout;
        self.retry
            .run(|| async move {
                let element = self.find(locator, timeout).await?;
                self.read_value(&element, locator).await
            })
            .await
    }

    /// An attribute of an element; `None` when the element lacks it.
    pub(crate) async fn attribute(
        &self,
        locator: &Locator,
        name: &str,
    ) -> Result<Option<String>, CommandError> {
        let timeout = self.wait_timeout;
        self.retry
            .run(|| async move {
                let element = self.find(locator, timeout).await?;
                Ok::<_, CommandError>(self.driver.get_attribute(&element, name).await?)
            })
            .await
    }
}
