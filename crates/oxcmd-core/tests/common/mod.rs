//! Shared test helpers for oxcmd-core integration tests.
//!
//! This module provides an in-memory [`AutomationDriver`] whose page is
//! scripted by the test, and a [`CaptureProxy`] that hands out numbered
//! captures.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use oxcmd_core::config::EngineConfig;
use oxcmd_core::diagnostics::ScreenshotPolicy;
use oxcmd_core::driver::{AutomationDriver, CaptureProxy, DriverError, FrameTarget};
use oxcmd_core::element::{ElementId, OptionLocator, PerformanceTiming};
use oxcmd_core::executor::CommandExecutor;
use oxcmd_core::locator::{Locator, LocatorContext, Selector};

/// PNG bytes every mock screenshot returns.
pub const SCREENSHOT_BYTES: &[u8] = b"\x89PNG-mock";

// ---------------------------------------------------------------------------
// Scripted page elements
// ---------------------------------------------------------------------------

/// An element on the mock page.
#[derive(Debug, Clone)]
pub struct MockElement {
    pub text: String,
    pub attributes: HashMap<String, String>,
    pub displayed: bool,
    pub selected: bool,
}

impl MockElement {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            attributes: HashMap::new(),
            displayed: true,
            selected: false,
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }
}

#[derive(Debug, Clone)]
struct MockWindow {
    handle: String,
    title: String,
    url: String,
}

#[derive(Default)]
struct PageState {
    /// Selector key -> element ids, in document order.
    lookups: HashMap<String, Vec<String>>,
    nodes: HashMap<String, MockElement>,
    /// Element id -> remaining operations that report a stale handle.
    stale: HashMap<String, u32>,
    next_id: u32,
    alert: Option<String>,
    unhandled_alert: bool,
    timing: Option<PerformanceTiming>,
    windows: Vec<MockWindow>,
    current_window: usize,
    scripts: HashMap<String, Value>,
    script_log: Vec<(String, Vec<Value>)>,
    calls: Vec<String>,
    context: String,
    page_source: String,
    browser_name: Option<String>,
    screenshot_fails: bool,
    /// Script -> error message raised by the page.
    script_errors: HashMap<String, String>,
    alert_text_fails: bool,
    /// Windows whose title cannot be read.
    broken_titles: Vec<String>,
}

impl PageState {
    fn element(&mut self, id: &ElementId, op: &str) -> Result<&mut MockElement, DriverError> {
        self.calls.push(format!("{}:{}", op, id));
        if self.unhandled_alert {
            return Err(DriverError::UnhandledAlert);
        }
        if let Some(remaining) = self.stale.get_mut(id.as_str()) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(DriverError::StaleElementReference);
            }
        }
        self.nodes
            .get_mut(id.as_str())
            .ok_or(DriverError::StaleElementReference)
    }

    fn window(&self) -> Result<&MockWindow, DriverError> {
        self.windows
            .get(self.current_window)
            .ok_or_else(|| DriverError::NoSuchWindow("current window is closed".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Mock driver
// ---------------------------------------------------------------------------

/// In-memory driver for a single web page with optional extra windows.
pub struct MockDriver {
    state: Mutex<PageState>,
}

impl MockDriver {
    pub fn new() -> Self {
        let state = PageState {
            windows: vec![MockWindow {
                handle: "main".to_string(),
                title: "Home".to_string(),
                url: "https://shop.test/".to_string(),
            }],
            context: "NATIVE_APP".to_string(),
            ..PageState::default()
        };
        Self { state: Mutex::new(state) }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, PageState> {
        self.state.lock().unwrap()
    }

    /// Places an element findable by a web locator such as `id=submit`.
    /// Returns its element id.
    pub fn add(&self, locator: &str, element: MockElement) -> String {
        let ctx = LocatorContext::web();
        self.add_selector(&Locator::parse(locator, &ctx).to_selector(&ctx), element)
    }

    /// Places an element findable by an exact driver selector.
    pub fn add_selector(&self, selector: &Selector, element: MockElement) -> String {
        let mut state = self.state();
        state.next_id += 1;
        let id = format!("el-{}", state.next_id);
        state.nodes.insert(id.clone(), element);
        state
            .lookups
            .entry(selector.to_string())
            .or_default()
            .push(id.clone());
        id
    }

    pub fn update(&self, id: &str, f: impl FnOnce(&mut MockElement)) {
        if let Some(element) = self.state().nodes.get_mut(id) {
            f(element);
        }
    }

    /// Makes the next `times` operations on the element report a stale handle.
    pub fn make_stale(&self, id: &str, times: u32) {
        self.state().stale.insert(id.to_string(), times);
    }

    pub fn set_alert(&self, text: Option<&str>) {
        self.state().alert = text.map(str::to_string);
    }

    /// Makes every element operation fail with an unexpected alert.
    pub fn block_with_alert(&self, text: &str) {
        let mut state = self.state();
        state.alert = Some(text.to_string());
        state.unhandled_alert = true;
    }

    pub fn set_timing(&self, navigation_start: i64, dom_content_loaded: i64, load: i64) {
        self.state().timing = Some(PerformanceTiming {
            dom_content_loaded,
            load,
            navigation_start,
        });
    }

    pub fn add_window(&self, handle: &str, title: &str, url: &str) {
        self.state().windows.push(MockWindow {
            handle: handle.to_string(),
            title: title.to_string(),
            url: url.to_string(),
        });
    }

    pub fn set_script_result(&self, script: &str, result: Value) {
        self.state().scripts.insert(script.to_string(), result);
    }

    /// Makes `script` throw `message` in the page.
    pub fn fail_script(&self, script: &str, message: &str) {
        self.state()
            .script_errors
            .insert(script.to_string(), message.to_string());
    }

    /// Makes reading the alert text fail, even while an alert is open.
    pub fn fail_alert_text(&self) {
        self.state().alert_text_fails = true;
    }

    /// Makes reading the title of window `handle` fail.
    pub fn fail_title(&self, handle: &str) {
        self.state().broken_titles.push(handle.to_string());
    }

    pub fn set_page_source(&self, source: &str) {
        self.state().page_source = source.to_string();
    }

    pub fn set_browser_name(&self, name: &str) {
        self.state().browser_name = Some(name.to_string());
    }

    pub fn fail_screenshots(&self) {
        self.state().screenshot_fails = true;
    }

    /// Every element operation performed, as `op:element-id`.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn scripts(&self) -> Vec<(String, Vec<Value>)> {
        self.state().script_log.clone()
    }

    pub fn current_window_handle(&self) -> String {
        let state = self.state();
        state
            .windows
            .get(state.current_window)
            .map(|w| w.handle.clone())
            .unwrap_or_default()
    }

    pub fn context(&self) -> String {
        self.state().context.clone()
    }
}

#[async_trait]
impl AutomationDriver for MockDriver {
    async fn open(&self, url: &str) -> Result<(), DriverError> {
        let mut state = self.state();
        state.calls.push(format!("open:{}", url));
        let index = state.current_window;
        if let Some(window) = state.windows.get_mut(index) {
            window.url = url.to_string();
        }
        Ok(())
    }

    async fn find_element(&self, selector: &Selector) -> Result<ElementId, DriverError> {
        self.find_elements(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::NoSuchElement(selector.to_string()))
    }

    async fn find_elements(&self, selector: &Selector) -> Result<Vec<ElementId>, DriverError> {
        let state = self.state();
        if state.unhandled_alert {
            return Err(DriverError::UnhandledAlert);
        }
        Ok(state
            .lookups
            .get(&selector.to_string())
            .map(|ids| ids.iter().map(ElementId::new).collect())
            .unwrap_or_default())
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool, DriverError> {
        Ok(self.state().element(element, "is_displayed")?.displayed)
    }

    async fn click(&self, element: &ElementId) -> Result<(), DriverError> {
        self.state().element(element, "click")?;
        Ok(())
    }

    async fn double_click(&self, element: &ElementId) -> Result<(), DriverError> {
        self.state().element(element, "double_click")?;
        Ok(())
    }

    async fn clear(&self, element: &ElementId) -> Result<(), DriverError> {
        self.state()
            .element(element, "clear")?
            .attributes
            .insert("value".to_string(), String::new());
        Ok(())
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<(), DriverError> {
        let mut state = self.state();
        let node = state.element(element, "send_keys")?;
        let value = node.attributes.entry("value".to_string()).or_default();
        value.push_str(text);
        Ok(())
    }

    async fn select_option(
        &self,
        element: &ElementId,
        option: &OptionLocator,
    ) -> Result<(), DriverError> {
        self.state().element(element, &format!("select[{}]", option))?;
        Ok(())
    }

    async fn deselect_option(
        &self,
        element: &ElementId,
        option: &OptionLocator,
    ) -> Result<(), DriverError> {
        self.state().element(element, &format!("deselect[{}]", option))?;
        Ok(())
    }

    async fn get_attribute(
        &self,
        element: &ElementId,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        Ok(self
            .state()
            .element(element, "get_attribute")?
            .attributes
            .get(name)
            .cloned())
    }

    async fn get_text(&self, element: &ElementId) -> Result<String, DriverError> {
        Ok(self.state().element(element, "get_text")?.text.clone())
    }

    async fn is_selected(&self, element: &ElementId) -> Result<bool, DriverError> {
        Ok(self.state().element(element, "is_selected")?.selected)
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value, DriverError> {
        let mut state = self.state();
        state.script_log.push((script.to_string(), args));
        if let Some(message) = state.script_errors.get(script) {
            return Err(DriverError::JavaScript(message.clone()));
        }
        Ok(state.scripts.get(script).cloned().unwrap_or(Value::Null))
    }

    async fn page_source(&self) -> Result<String, DriverError> {
        Ok(self.state().page_source.clone())
    }

    async fn title(&self) -> Result<String, DriverError> {
        let state = self.state();
        let window = state.window()?;
        if state.broken_titles.contains(&window.handle) {
            return Err(DriverError::Other {
                kind: "WebDriverException".to_string(),
                message: format!("cannot read title of {}", window.handle),
            });
        }
        Ok(window.title.clone())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.state().window()?.url.clone())
    }

    async fn current_window(&self) -> Result<String, DriverError> {
        Ok(self.state().window()?.handle.clone())
    }

    async fn window_handles(&self) -> Result<Vec<String>, DriverError> {
        Ok(self.state().windows.iter().map(|w| w.handle.clone()).collect())
    }

    async fn switch_to_window(&self, handle: &str) -> Result<(), DriverError> {
        let mut state = self.state();
        let index = state
            .windows
            .iter()
            .position(|w| w.handle == handle)
            .ok_or_else(|| DriverError::NoSuchWindow(handle.to_string()))?;
        state.current_window = index;
        Ok(())
    }

    async fn close_window(&self) -> Result<(), DriverError> {
        let mut state = self.state();
        let index = state.current_window;
        if index < state.windows.len() {
            state.windows.remove(index);
        }
        state.current_window = usize::MAX;
        Ok(())
    }

    async fn switch_to_frame(&self, target: &FrameTarget) -> Result<(), DriverError> {
        let call = match target {
            FrameTarget::Top => "frame:top".to_string(),
            FrameTarget::Parent => "frame:parent".to_string(),
            FrameTarget::Index(i) => format!("frame:index={}", i),
            FrameTarget::Element(id) => format!("frame:{}", id),
        };
        self.state().calls.push(call);
        Ok(())
    }

    async fn alert_text(&self) -> Result<String, DriverError> {
        let state = self.state();
        if state.alert_text_fails {
            return Err(DriverError::Other {
                kind: "WebDriverException".to_string(),
                message: "alert text unavailable".to_string(),
            });
        }
        state.alert.clone().ok_or(DriverError::NoAlertPresent)
    }

    async fn accept_alert(&self) -> Result<(), DriverError> {
        let mut state = self.state();
        state.alert.take().ok_or(DriverError::NoAlertPresent)?;
        state.unhandled_alert = false;
        state.calls.push("accept_alert".to_string());
        Ok(())
    }

    async fn dismiss_alert(&self) -> Result<(), DriverError> {
        let mut state = self.state();
        state.alert.take().ok_or(DriverError::NoAlertPresent)?;
        state.unhandled_alert = false;
        state.calls.push("dismiss_alert".to_string());
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        if self.state().screenshot_fails {
            return Err(DriverError::Unsupported("screenshots disabled".to_string()));
        }
        Ok(SCREENSHOT_BYTES.to_vec())
    }

    async fn set_window_size(&self, width: u32, height: u32) -> Result<(), DriverError> {
        self.state().calls.push(format!("window_size:{}x{}", width, height));
        Ok(())
    }

    async fn performance_timing(&self) -> Result<PerformanceTiming, DriverError> {
        self.state()
            .timing
            .ok_or_else(|| DriverError::JavaScript("performance is not defined".to_string()))
    }

    async fn set_page_load_timeout(&self, timeout_ms: u64) -> Result<(), DriverError> {
        self.state().calls.push(format!("page_load_timeout:{}", timeout_ms));
        Ok(())
    }

    fn browser_name(&self) -> Option<String> {
        self.state().browser_name.clone()
    }

    async fn set_context(&self, context: &str) -> Result<(), DriverError> {
        self.state().context = context.to_string();
        Ok(())
    }

    async fn current_context(&self) -> Result<String, DriverError> {
        Ok(self.state().context.clone())
    }

    async fn tap(&self, x: i32, y: i32) -> Result<(), DriverError> {
        self.state().calls.push(format!("tap:{},{}", x, y));
        Ok(())
    }

    async fn long_press(&self, element: &ElementId, duration_ms: u64) -> Result<(), DriverError> {
        self.state()
            .element(element, &format!("long_press[{}]", duration_ms))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Mock capture proxy
// ---------------------------------------------------------------------------

/// Proxy whose captures are `har-1`, `har-2`, … in fetch order.
#[derive(Default)]
pub struct MockProxy {
    fetches: AtomicU32,
    resets: AtomicU32,
}

impl MockProxy {
    pub fn fetches(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> u32 {
        self.resets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureProxy for MockProxy {
    async fn fetch_capture(&self) -> Result<String, DriverError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("har-{}", n))
    }

    async fn reset_capture(&self) -> Result<(), DriverError> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Executor construction
// ---------------------------------------------------------------------------

/// Config with short waits, for tests that run on paused time.
pub fn test_config() -> EngineConfig {
    EngineConfig {
        screenshots: ScreenshotPolicy::OnError,
        wait_timeout_ms: 2_000,
        poll_interval_ms: 100,
        ..EngineConfig::default()
    }
}

/// A fresh mock page and an executor driving it.
pub fn executor() -> (Arc<MockDriver>, CommandExecutor) {
    executor_with(test_config())
}

pub fn executor_with(config: EngineConfig) -> (Arc<MockDriver>, CommandExecutor) {
    let driver = Arc::new(MockDriver::new());
    let executor = CommandExecutor::new(driver.clone(), config);
    (driver, executor)
}
