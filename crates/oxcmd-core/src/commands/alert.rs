//! Native alert commands.

use serde_json::Value;

use crate::command::Args;
use crate::driver::DriverError;
use crate::error::CommandError;
use crate::executor::CommandExecutor;
use crate::pattern::Pattern;
use crate::wait::poll_until;

impl CommandExecutor {
    pub(crate) async fn alert_accept(&self) -> Result<Option<Value>, CommandError> {
        self.driver.accept_alert().await?;
        Ok(None)
    }

    pub(crate) async fn alert_dismiss(&self) -> Result<Option<Value>, CommandError> {
        self.driver.dismiss_alert().await?;
        Ok(None)
    }

    pub(crate) async fn get_alert_text(&self) -> Result<Option<Value>, CommandError> {
        Ok(Some(Value::String(self.driver.alert_text().await?)))
    }

    /// `isAlertPresent(text?, timeout?)`.
    ///
    /// Waits for an alert, optionally one whose text matches. Returns `false`
    /// instead of failing when none shows up in time.
    pub(crate) async fn is_alert_present(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let pattern = match args.opt_string(0)? {
            Some(raw) if !raw.is_empty() => Some(Pattern::parse(&raw)?),
            _ => None,
        };
        let pattern = pattern.as_ref();
        let timeout = self.timeout(args.opt_u64(1)?);

        let present = poll_until(timeout, self.poll_interval(), || async move {
            match self.driver.alert_text().await {
                Ok(text) => Ok(pattern.map_or(true, |p| p.is_match(&text)).then_some(())),
                Err(DriverError::NoAlertPresent) => Ok(None),
                Err(e) => Err(CommandError::from(e)),
            }
        })
        .await?;
        Ok(Some(Value::Bool(present.is_some())))
    }
}
