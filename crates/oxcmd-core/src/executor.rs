//! Command execution against an automation session.
//!
//! This module provides the [`CommandExecutor`] type, which turns a command
//! name and its arguments into driver calls and normalizes whatever happens
//! into a [`CommandResult`]. The executor owns all per-session state:
//! variables, the transaction log, the page-load baseline and the current
//! locator context.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use oxcmd_core::config::EngineConfig;
//! use oxcmd_core::driver::AutomationDriver;
//! use oxcmd_core::executor::CommandExecutor;
//! use serde_json::json;
//!
//! async fn login(driver: Arc<dyn AutomationDriver>) {
//!     let mut executor = CommandExecutor::new(driver, EngineConfig::default());
//!
//!     let result = executor.execute("click", vec![json!("id=submit")]).await;
//!     if !result.is_success {
//!         eprintln!("click failed: {}", result.status);
//!     }
//! }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info_span, warn, Instrument};

use crate::command::{Args, Command, CommandKind};
use crate::config::{ConfigError, EngineConfig};
use crate::diagnostics::{capture_screenshot, NavigationTimer};
use crate::driver::{AutomationDriver, CaptureProxy, DriverError};
use crate::error::CommandError;
use crate::locator::{LocatorContext, LocatorResolver};
use crate::repository::{MapRepository, ObjectRepository};
use crate::result::CommandResult;
use crate::retry::RetryPolicy;
use crate::status::{classify, Status};
use crate::transaction::{Transaction, TransactionLog};
use crate::variables::Variables;

/// Executes commands against one automation session.
///
/// Takes `&mut self` for every command: a session runs one command at a time.
pub struct CommandExecutor {
    pub(crate) driver: Arc<dyn AutomationDriver>,
    pub(crate) resolver: LocatorResolver,
    pub(crate) proxy: Option<Arc<dyn CaptureProxy>>,
    pub(crate) config: EngineConfig,
    pub(crate) retry: RetryPolicy,
    pub(crate) context: LocatorContext,
    pub(crate) wait_timeout: Duration,
    pub(crate) variables: Variables,
    pub(crate) transactions: TransactionLog,
    pub(crate) timer: NavigationTimer,
}

impl CommandExecutor {
    /// Creates an executor for `driver`.
    pub fn new(driver: Arc<dyn AutomationDriver>, config: EngineConfig) -> Self {
        Self {
            driver,
            resolver: LocatorResolver::default(),
            proxy: None,
            context: config.locator_context(),
            wait_timeout: Duration::from_millis(config.wait_timeout_ms),
            config,
            retry: RetryPolicy::default(),
            variables: Variables::new(),
            transactions: TransactionLog::new(),
            timer: NavigationTimer::new(),
        }
    }

    /// Creates an executor and loads the object repository the config names.
    ///
    /// Fails when the repository file cannot be read or parsed.
    pub fn from_config(
        driver: Arc<dyn AutomationDriver>,
        config: EngineConfig,
    ) -> Result<Self, ConfigError> {
        let repository = match &config.object_repository {
            Some(path) => {
                let repository = MapRepository::load_from(path)?;
                debug!(entries = repository.len(), path = %path.display(), "object repository loaded");
                Some(repository)
            }
            None => None,
        };
        let executor = Self::new(driver, config);
        Ok(match repository {
            Some(repository) => executor.with_repository(Arc::new(repository)),
            None => executor,
        })
    }

    /// Attaches an object repository for symbolic locators.
    pub fn with_repository(mut self, repository: Arc<dyn ObjectRepository>) -> Self {
        self.resolver = LocatorResolver::new(Some(repository));
        self
    }

    /// Attaches a network-capture proxy for per-transaction HAR logs.
    pub fn with_proxy(mut self, proxy: Arc<dyn CaptureProxy>) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Replaces the stale-element retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns a reference to the underlying driver.
    pub fn driver(&self) -> &Arc<dyn AutomationDriver> {
        &self.driver
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn locator_context(&self) -> LocatorContext {
        self.context
    }

    /// The timeout waits use when a command does not pass its own.
    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut Variables {
        &mut self.variables
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.transactions.transactions()
    }

    /// Ends an iteration of the test.
    ///
    /// Collects the network capture of the last open transaction and returns
    /// all transactions of the iteration.
    pub async fn end_iteration(&mut self) -> Vec<Transaction> {
        let proxy = self.proxy.clone();
        self.transactions.close_run(proxy.as_deref()).await
    }

    /// Executes a command and returns its normalized result.
    ///
    /// Never fails: unknown commands, bad arguments and driver failures all
    /// come back as a non-success [`CommandResult`].
    pub async fn execute(&mut self, name: &str, args: Vec<Value>) -> CommandResult {
        let span = info_span!("execute_command", command = name);
        async {
            let start_time = Utc::now();
            let start = Instant::now();

            let (command_name, is_action, outcome) = match Command::new(name, args) {
                Ok(command) => {
                    let outcome = self.run(&command).await;
                    (command.name().to_string(), command.is_action(), outcome)
                }
                Err(e) => (name.to_string(), false, Err(e)),
            };

            let mut result = match outcome {
                Ok(value) => {
                    let mut result = CommandResult::success(&command_name, is_action, value);
                    if self.config.screenshots.on_success(is_action) {
                        if let Some(png) = capture_screenshot(self.driver.as_ref()).await {
                            result = result.with_screenshot(png);
                        }
                    }
                    result
                }
                Err(e) => self.failure_result(&command_name, is_action, &e).await,
            };

            if self.config.fetch_stats && is_action {
                let (dom_content_loaded, load) = self.timer.sample(self.driver.as_ref()).await;
                result = result.with_navigation_timing(dom_content_loaded, load);
            }

            let result = result.with_timing(start_time, Utc::now());
            debug!(
                elapsed_ms = start.elapsed().as_millis() as u64,
                status = %result.status,
                "command complete"
            );
            result
        }
        .instrument(span)
        .await
    }

    async fn failure_result(
        &self,
        command: &str,
        is_action: bool,
        error: &CommandError,
    ) -> CommandResult {
        let mut classification = classify(error);
        if classification.status == Status::UnhandledAlert {
            classification.detail = match self.driver.alert_text().await {
                Ok(text) => Some(format!("Alert text: {}", text)),
                Err(e) => {
                    warn!(error = %e, "failed to read text of unhandled alert");
                    None
                }
            };
        }
        let status = classification.status;
        let mut result = CommandResult::failure(command, is_action, error, classification);
        if self.config.screenshots.on_failure(status) {
            if let Some(png) = capture_screenshot(self.driver.as_ref()).await {
                result = result.with_screenshot(png);
            }
        }
        result
    }

    /// Substitutes arguments and invokes the handler for the command.
    async fn run(&mut self, command: &Command) -> Result<Option<Value>, CommandError> {
        let values = self.substitute_args(&command.args)?;
        let args = Args::new(command.name(), &values);

        match command.kind {
            CommandKind::Open => self.open(args).await,
            CommandKind::SetWindowSize => self.set_window_size(args).await,
            CommandKind::GetWindowHandles => self.get_window_handles().await,
            CommandKind::SelectWindow => self.select_window(args).await,
            CommandKind::WaitForWindow => self.wait_for_window(args).await,
            CommandKind::CloseWindow => self.close_window().await,
            CommandKind::SelectFrame => self.select_frame(args).await,
            CommandKind::GetTitle => self.get_title().await,
            CommandKind::GetPageSource => self.get_page_source().await,
            CommandKind::GetXmlPageSource => self.get_xml_page_source().await,
            CommandKind::GetXmlPageSourceAsJson => self.get_xml_page_source_as_json().await,
            CommandKind::SetTimeout => self.set_timeout(args).await,
            CommandKind::Pause => self.pause(args).await,
            CommandKind::Transaction => self.transaction(args).await,

            CommandKind::Click => self.click(args).await,
            CommandKind::ClickHidden => self.click_hidden(args).await,
            CommandKind::DoubleClick => self.double_click(args).await,
            CommandKind::Type => self.type_text(args).await,
            CommandKind::Clear => self.clear(args).await,
            CommandKind::Select => self.select(args, true).await,
            CommandKind::Deselect => self.select(args, false).await,

            CommandKind::GetText => self.get_text(args).await,
            CommandKind::GetAttribute => self.get_attribute(args).await,
            CommandKind::GetValue => self.get_value(args).await,
            CommandKind::GetElementCount => self.get_element_count(args).await,
            CommandKind::IsElementPresent => self.is_element_present(args).await,
            CommandKind::IsElementVisible => self.is_element_visible(args).await,
            CommandKind::IsSelected => self.is_selected(args).await,

            CommandKind::WaitForVisible => self.wait_for_visible(args).await,
            CommandKind::WaitForExist => self.wait_for_exist(args).await,
            CommandKind::WaitForText => self.wait_for_text(args, true).await,
            CommandKind::WaitForNotText => self.wait_for_text(args, false).await,
            CommandKind::WaitForValue => self.wait_for_value(args, true).await,
            CommandKind::WaitForNotValue => self.wait_for_value(args, false).await,

            CommandKind::AssertText => self.check_text(args, Severity::Assert).await,
            CommandKind::VerifyText => self.check_text(args, Severity::Verify).await,
            CommandKind::AssertValue => self.check_value(args, Severity::Assert).await,
            CommandKind::VerifyValue => self.check_value(args, Severity::Verify).await,
            CommandKind::AssertTitle => self.check_title(args, Severity::Assert).await,
            CommandKind::VerifyTitle => self.check_title(args, Severity::Verify).await,
            CommandKind::AssertTextPresent => self.assert_text_present(args).await,
            CommandKind::AssertElementPresent => self.assert_element_present(args).await,
            CommandKind::AssertAlert => self.assert_alert(args).await,
            CommandKind::AssertSelectedLabel => self.assert_selected(args, SelectedPart::Label).await,
            CommandKind::AssertSelectedValue => self.assert_selected(args, SelectedPart::Value).await,

            CommandKind::ExecuteScript => self.execute_script(args).await,
            CommandKind::StoreText => self.store_text(args).await,
            CommandKind::StoreValue => self.store_value(args).await,
            CommandKind::StoreAttribute => self.store_attribute(args).await,

            CommandKind::AlertAccept => self.alert_accept().await,
            CommandKind::AlertDismiss => self.alert_dismiss().await,
            CommandKind::GetAlertText => self.get_alert_text().await,
            CommandKind::IsAlertPresent => self.is_alert_present(args).await,

            CommandKind::Tap => self.tap(args).await,
            CommandKind::ClickLong => self.click_long(args).await,
            CommandKind::SetContext => self.set_context(args).await,
            CommandKind::IsWebViewContext => self.is_web_view_context().await,
        }
    }

    /// Interpolates variables into string arguments, then substitutes
    /// object-repository entries.
    fn substitute_args(&self, args: &[Value]) -> Result<Vec<Value>, CommandError> {
        args.iter()
            .map(|arg| match arg {
                Value::String(raw) => {
                    let interpolated = self.variables.interpolate(raw)?;
                    Ok(Value::String(self.resolver.substitute(&interpolated)?))
                }
                other => Ok(other.clone()),
            })
            .collect()
    }

    /// Timeout for a wait: the command's own, or the session default.
    pub(crate) fn timeout(&self, override_ms: Option<u64>) -> Duration {
        override_ms.map_or(self.wait_timeout, Duration::from_millis)
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.poll_interval_ms)
    }
}

/// Whether a failed check is an assertion or a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Severity {
    Assert,
    Verify,
}

impl Severity {
    pub(crate) fn fail(self, message: String) -> CommandError {
        match self {
            Severity::Assert => CommandError::Assertion(message),
            Severity::Verify => CommandError::Verification(message),
        }
    }
}

/// Which part of the selected `<option>` an assertion compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SelectedPart {
    Label,
    Value,
}

/// Driver errors that mean "not there (yet)" while polling.
pub(crate) fn is_absent(error: &DriverError) -> bool {
    matches!(error, DriverError::NoSuchElement(_))
}
