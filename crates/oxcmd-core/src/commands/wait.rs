//! `waitFor*` commands.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use crate::command::Args;
use crate::error::CommandError;
use crate::executor::CommandExecutor;
use crate::pattern::Pattern;
use crate::retry::Transient;
use crate::wait::poll_until;

impl CommandExecutor {
    pub(crate) async fn wait_for_visible(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let locator = self.parse_locator(&args.locator(0)?);
        let timeout = self.timeout(args.opt_u64(1)?);
        match self.find_visible(&locator, timeout).await {
            Ok(_) => Ok(None),
            Err(CommandError::ElementNotFound(_) | CommandError::ElementNotVisible(_)) => {
                Err(wait_timeout(format!("{} to be visible", locator), timeout))
            }
            Err(e) => Err(e),
        }
    }

    /// Waits for an element to exist; timing out is a missing element.
    pub(crate) async fn wait_for_exist(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let locator = self.parse_locator(&args.locator(0)?);
        let timeout = self.timeout(args.opt_u64(1)?);
        self.find(&locator, timeout).await?;
        Ok(None)
    }

    /// `waitForText` when `expect` is true, `waitForNotText` otherwise.
    pub(crate) async fn wait_for_text(
        &self,
        args: Args<'_>,
        expect: bool,
    ) -> Result<Option<Value>, CommandError> {
        let locator = &self.parse_locator(&args.locator(0)?);
        let pattern = &Pattern::parse(&args.string(1)?)?;
        let timeout = self.timeout(args.opt_u64(2)?);

        let matched = self
            .poll_pattern(timeout, pattern, expect, || self.current_text(locator))
            .await?;
        if matched {
            return Ok(None);
        }
        let what = if expect {
            format!("text of {} to match {}", locator, pattern)
        } else {
            format!("text of {} to stop matching {}", locator, pattern)
        };
        Err(wait_timeout(what, timeout))
    }

    /// `waitForValue` when `expect` is true, `waitForNotValue` otherwise.
    pub(crate) async fn wait_for_value(
        &self,
        args: Args<'_>,
        expect: bool,
    ) -> Result<Option<Value>, CommandError> {
        let locator = &self.parse_locator(&args.locator(0)?);
        let pattern = &Pattern::parse(&args.string(1)?)?;
        let timeout = self.timeout(args.opt_u64(2)?);

        let matched = self
            .poll_pattern(timeout, pattern, expect, || self.current_value(locator))
            .await?;
        if matched {
            return Ok(None);
        }
        let what = if expect {
            format!("value of {} to match {}", locator, pattern)
        } else {
            format!("value of {} to stop matching {}", locator, pattern)
        };
        Err(wait_timeout(what, timeout))
    }

    /// Polls `read` until its result matches `pattern` (or stops matching,
    /// when `expect` is false).
    ///
    /// A missing element or a stale handle keeps the wait going. Returns
    /// `false` on timeout.
    async fn poll_pattern<F, Fut>(
        &self,
        timeout: Duration,
        pattern: &Pattern,
        expect: bool,
        mut read: F,
    ) -> Result<bool, CommandError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<String>, CommandError>>,
    {
        let done = poll_until(timeout, self.poll_interval(), || {
            let current = read();
            async move {
                match current.await {
                    Ok(Some(actual)) => Ok((pattern.is_match(&actual) == expect).then_some(())),
                    Ok(None) => Ok(None),
                    Err(e) if e.is_stale() => Ok(None),
                    Err(e) => Err(e),
                }
            }
        })
        .await?;
        Ok(done.is_some())
    }
}

fn wait_timeout(what: String, timeout: Duration) -> CommandError {
    CommandError::WaitTimeout {
        what,
        timeout_ms: timeout.as_millis() as u64,
    }
}
