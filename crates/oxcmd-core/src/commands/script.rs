//! In-page scripts and `store*` commands.

use serde_json::Value;
use tracing::debug;

use crate::command::Args;
use crate::driver::DriverError;
use crate::error::CommandError;
use crate::executor::CommandExecutor;

impl CommandExecutor {
    /// Runs a script; arguments after the script are passed through as
    /// `arguments[0..]`.
    pub(crate) async fn execute_script(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let script = args.string(0)?;
        let value = self
            .driver
            .execute_script(&script, args.rest(1).to_vec())
            .await
            .map_err(|e| match e {
                DriverError::JavaScript(message) => CommandError::BrowserJsExecution(format!(
                    "Failed to execute script: {}",
                    message
                )),
                other => other.into(),
            })?;
        Ok(Some(value))
    }

    pub(crate) async fn store_text(&mut self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let locator = self.parse_locator(&args.locator(0)?);
        let name = args.string(1)?;
        let text = self.visible_text(&locator).await?;
        Ok(Some(self.store(&name, text)))
    }

    pub(crate) async fn store_value(&mut self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let locator = self.parse_locator(&args.locator(0)?);
        let name = args.string(1)?;
        let value = self.element_value(&locator).await?;
        Ok(Some(self.store(&name, value)))
    }

    /// `storeAttribute("locator@attr", name)`.
    pub(crate) async fn store_attribute(&mut self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let raw = args.locator(0)?;
        let name = args.string(1)?;
        let (locator, attribute) = self.parse_attribute_locator("storeAttribute", &raw)?;
        let value = self.attribute(&locator, &attribute).await?.ok_or_else(|| {
            CommandError::Operation(format!(
                "Element {} has no attribute '{}'",
                locator, attribute
            ))
        })?;
        Ok(Some(self.store(&name, value)))
    }

    fn store(&mut self, name: &str, value: String) -> Value {
        debug!(variable = name.trim(), "variable stored");
        self.variables.set(name, value.clone());
        Value::String(value)
    }
}
