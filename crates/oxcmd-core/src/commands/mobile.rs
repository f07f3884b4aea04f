//! Mobile-only commands.

use serde_json::Value;
use tracing::info;

use crate::command::Args;
use crate::config::NATIVE_CONTEXT;
use crate::error::CommandError;
use crate::executor::CommandExecutor;

const WEB_VIEW_MARKERS: [&str; 2] = ["WEBVIEW", "CHROMIUM"];

impl CommandExecutor {
    /// Taps at screen coordinates.
    pub(crate) async fn tap(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let x = coordinate(&args, 0)?;
        let y = coordinate(&args, 1)?;
        self.driver.tap(x, y).await?;
        Ok(None)
    }

    /// Long-presses an element for `duration` milliseconds.
    pub(crate) async fn click_long(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let locator = &self.parse_locator(&args.locator(0)?);
        let duration_ms = args.u64(1)?;
        let timeout = self.wait_timeout;
        self.retry
            .run(|| async move {
                let element = self.find_visible(locator, timeout).await?;
                self.driver.long_press(&element, duration_ms).await?;
                Ok::<_, CommandError>(None)
            })
            .await
    }

    /// Switches between the native and web-view contexts.
    ///
    /// Native-only locator prefixes apply only while in `NATIVE_APP`.
    pub(crate) async fn set_context(&mut self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let name = args.string(0)?;
        self.driver.set_context(&name).await?;
        self.context.native = name.eq_ignore_ascii_case(NATIVE_CONTEXT);
        info!(context = %name, native = self.context.native, "context switched");
        Ok(None)
    }

    pub(crate) async fn is_web_view_context(&self) -> Result<Option<Value>, CommandError> {
        let context = self.driver.current_context().await?.to_ascii_uppercase();
        let web_view = WEB_VIEW_MARKERS.iter().any(|marker| context.contains(marker));
        Ok(Some(Value::Bool(web_view)))
    }
}

fn coordinate(args: &Args<'_>, index: usize) -> Result<i32, CommandError> {
    let value = args.i64(index)?;
    if value < 0 {
        return Err(CommandError::InvalidArgument(format!(
            "tap: coordinates must be non-negative, got {}",
            value
        )));
    }
    i32::try_from(value)
        .map_err(|_| CommandError::InvalidArgument(format!("tap: coordinate {} is too large", value)))
}
