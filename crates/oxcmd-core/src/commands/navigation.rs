//! Navigation, windows, frames and page-level reads.

use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::command::Args;
use crate::driver::FrameTarget;
use crate::element::WindowInfo;
use crate::error::CommandError;
use crate::executor::CommandExecutor;
use crate::pattern::Pattern;
use crate::wait::poll_until;
use crate::xml;

const CHROME_XML_SCRIPT: &str =
    r#"return document.getElementById("webkit-xml-viewer-source-xml").innerHTML;"#;

/// Markup the Internet Explorer XML viewer wraps around a document, removed
/// in order.
const IE_XML_VIEWER_MARKUP: &[(&str, &str)] = &[
    (r"(?s)<head>.*?</head>", ""),
    (r"<a\s*.*?>&lt;.*?</a>", ""),
    (r"<div\s*.*?>.*?</div>", ""),
    (r"<style\s*.*?>.*?</style>", ""),
    (r">\n", ">"),
    (r"<span\s*.*?>.*?<span\s*.*?>.*?</span>.*?</span>", ""),
];

const TITLE_PREFIX: &str = "title=";

impl CommandExecutor {
    pub(crate) async fn open(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let url = args.string(0)?;
        self.driver.open(&url).await?;
        Ok(None)
    }

    pub(crate) async fn set_window_size(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let width = dimension(&args, 0)?;
        let height = dimension(&args, 1)?;
        self.driver.set_window_size(width, height).await?;
        Ok(None)
    }

    /// Handle, title and URL of every open window.
    ///
    /// Visits each window to read its title and returns to the current one.
    pub(crate) async fn get_window_handles(&self) -> Result<Option<Value>, CommandError> {
        let original = self.driver.current_window().await?;
        let mut windows = Vec::new();
        for handle in self.driver.window_handles().await? {
            self.driver.switch_to_window(&handle).await?;
            windows.push(WindowInfo {
                title: self.driver.title().await?,
                url: self.driver.current_url().await?,
                handle,
            });
        }
        self.driver.switch_to_window(&original).await?;
        serde_json::to_value(windows)
            .map(Some)
            .map_err(|e| CommandError::Operation(format!("failed to serialize windows: {}", e)))
    }

    /// Switches to a window by handle, or by `title=PATTERN`.
    ///
    /// Without a locator the first window is selected.
    pub(crate) async fn select_window(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let locator = args.opt_string(0)?.unwrap_or_default();
        let handles = self.driver.window_handles().await?;

        if locator.is_empty() || locator == "null" {
            let first = handles
                .first()
                .ok_or_else(|| CommandError::NoSuchWindow("no open windows".to_string()))?;
            self.driver.switch_to_window(first).await?;
            return Ok(None);
        }

        match locator.strip_prefix(TITLE_PREFIX) {
            Some(title) => {
                let pattern = Pattern::parse(title)?;
                if self.switch_to_titled_window(&pattern, &handles).await?.is_none() {
                    return Err(CommandError::NoSuchWindow(locator));
                }
            }
            None => {
                if !handles.contains(&locator) {
                    return Err(CommandError::NoSuchWindow(locator));
                }
                self.driver.switch_to_window(&locator).await?;
            }
        }
        Ok(None)
    }

    /// Waits until a window whose title matches `title=PATTERN` is open.
    ///
    /// The current window stays selected.
    pub(crate) async fn wait_for_window(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let locator = args.string(0)?;
        let timeout = self.timeout(args.opt_u64(1)?);
        let title = locator.strip_prefix(TITLE_PREFIX).ok_or_else(|| {
            CommandError::InvalidArgument(format!(
                "waitForWindow: unsupported window locator '{}' (expected title=PATTERN)",
                locator
            ))
        })?;
        let pattern = &Pattern::parse(title)?;

        let original = match self.driver.current_window().await {
            Ok(handle) => handle,
            Err(_) => {
                // The current window may have been closed; fall back to the newest one.
                let handles = self.driver.window_handles().await?;
                let last = handles
                    .last()
                    .ok_or_else(|| CommandError::NoSuchWindow("no open windows".to_string()))?;
                self.driver.switch_to_window(last).await?;
                last.clone()
            }
        };

        let found = poll_until(timeout, self.window_poll_interval(), || async move {
            let handles = self.driver.window_handles().await?;
            self.switch_to_titled_window(pattern, &handles).await
        })
        .await;

        // Polling leaves an arbitrary window selected, also when it failed.
        if let Err(e) = self.driver.switch_to_window(&original).await {
            warn!(error = %e, "original window is gone, selecting the newest window");
            if let Some(last) = self.driver.window_handles().await?.last() {
                self.driver.switch_to_window(last).await?;
            }
        }

        match found? {
            Some(handle) => {
                debug!(handle = %handle, "window found");
                Ok(None)
            }
            None => Err(CommandError::NoSuchWindow(locator)),
        }
    }

    pub(crate) async fn close_window(&self) -> Result<Option<Value>, CommandError> {
        self.driver.close_window().await?;
        Ok(None)
    }

    /// Switches frames by index (`3` or `index=3`), `relative=top`,
    /// `relative=parent`, or a frame element locator.
    pub(crate) async fn select_frame(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let target = match args.value(0) {
            Some(Value::Number(_)) => FrameTarget::Index(frame_index(&args.string(0)?)?),
            Some(_) => {
                let raw = args.string(0)?;
                match raw.as_str() {
                    "relative=top" => FrameTarget::Top,
                    "relative=parent" => FrameTarget::Parent,
                    _ => match raw.strip_prefix("index=") {
                        Some(index) => FrameTarget::Index(frame_index(index)?),
                        None => {
                            let locator = self.parse_locator(&raw);
                            FrameTarget::Element(self.find(&locator, self.wait_timeout).await?)
                        }
                    },
                }
            }
            None => FrameTarget::Top,
        };
        self.driver.switch_to_frame(&target).await?;
        Ok(None)
    }

    pub(crate) async fn get_title(&self) -> Result<Option<Value>, CommandError> {
        Ok(Some(Value::String(self.driver.title().await?)))
    }

    pub(crate) async fn get_page_source(&self) -> Result<Option<Value>, CommandError> {
        Ok(Some(Value::String(self.driver.page_source().await?)))
    }

    pub(crate) async fn get_xml_page_source(&self) -> Result<Option<Value>, CommandError> {
        Ok(Some(Value::String(self.xml_page_source().await?)))
    }

    pub(crate) async fn get_xml_page_source_as_json(&self) -> Result<Option<Value>, CommandError> {
        let source = self.xml_page_source().await?;
        let json = xml::to_json(&source).map_err(|e| {
            CommandError::XmlToJson(format!("Unable to convert XML to JSON: {}", e))
        })?;
        Ok(Some(json))
    }

    /// Sets the default wait timeout and the page-load timeout.
    pub(crate) async fn set_timeout(&mut self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let timeout_ms = args.u64(0)?;
        self.driver.set_page_load_timeout(timeout_ms).await?;
        self.wait_timeout = Duration::from_millis(timeout_ms);
        Ok(None)
    }

    pub(crate) async fn pause(&self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        tokio::time::sleep(Duration::from_millis(args.u64(0)?)).await;
        Ok(None)
    }

    pub(crate) async fn transaction(&mut self, args: Args<'_>) -> Result<Option<Value>, CommandError> {
        let name = args.string(0)?;
        let proxy = self.proxy.clone();
        self.transactions.open(&name, proxy.as_deref()).await?;
        Ok(None)
    }

    /// Switches through `handles` until a window title matches.
    ///
    /// Windows that close while being visited are skipped. Returns the handle
    /// of the matching window, which is left selected.
    async fn switch_to_titled_window(
        &self,
        pattern: &Pattern,
        handles: &[String],
    ) -> Result<Option<String>, CommandError> {
        for handle in handles {
            if self.driver.switch_to_window(handle).await.is_err() {
                continue;
            }
            let title = self.driver.title().await?;
            if pattern.is_match(&title) {
                return Ok(Some(handle.clone()));
            }
        }
        Ok(None)
    }

    fn window_poll_interval(&self) -> Duration {
        self.poll_interval().max(Duration::from_millis(500))
    }

    /// Extracts the XML document shown by the browser's XML viewer.
    async fn xml_page_source(&self) -> Result<String, CommandError> {
        let browser = self
            .config
            .browser_name
            .clone()
            .or_else(|| self.driver.browser_name())
            .unwrap_or_default();

        match browser.to_ascii_lowercase().as_str() {
            "chrome" => match self.driver.execute_script(CHROME_XML_SCRIPT, Vec::new()).await {
                Ok(Value::String(xml)) => Ok(xml),
                _ => {
                    let source = self.driver.page_source().await.unwrap_or_default();
                    Err(CommandError::XmlExtract(format!(
                        "Unable to extract XML from: {}",
                        source
                    )))
                }
            },
            "ie" | "internet explorer" => {
                let mut source = self.driver.page_source().await?;
                for (pattern, replacement) in IE_XML_VIEWER_MARKUP {
                    let re = Regex::new(pattern)
                        .map_err(|e| CommandError::XmlExtract(e.to_string()))?;
                    source = re.replace_all(&source, *replacement).into_owned();
                }
                Ok(source)
            }
            _ => Err(CommandError::XmlExtract(format!(
                "This command is not supported on {} yet.",
                browser
            ))),
        }
    }
}

fn dimension(args: &Args<'_>, index: usize) -> Result<u32, CommandError> {
    let value = args.u64(index)?;
    u32::try_from(value)
        .map_err(|_| CommandError::InvalidArgument(format!("window dimension {} is too large", value)))
}

fn frame_index(raw: &str) -> Result<u16, CommandError> {
    raw.trim()
        .parse()
        .map_err(|_| CommandError::InvalidArgument(format!("invalid frame index '{}'", raw)))
}
