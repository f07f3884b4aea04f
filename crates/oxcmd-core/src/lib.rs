//! # oxcmd-core
//!
//! Command execution and result-normalization engine for browser and mobile
//! UI automation.
//!
//! A test script issues named commands (`click`, `type`, `assertText`,
//! `waitForVisible`, …) with positional arguments. The engine resolves element
//! locators, drives an automation backend through the [`driver`] seam, retries
//! operations that hit stale element handles, and turns every outcome into a
//! uniform [`result::CommandResult`] carrying a status code, timing data and
//! optional diagnostics.
//!
//! ## Modules
//!
//! - [`executor`] - Command dispatch, result normalization and session state
//! - [`command`] - Command registry and positional argument access
//! - [`locator`] - Locator grammar, selector rendering and object-repository lookup
//! - [`status`] - Status taxonomy and error classification
//! - [`driver`] - Backend traits for the automation driver and capture proxy
//! - [`diagnostics`] - Screenshot policy and page-load timing
//! - [`transaction`] - Named transactions and per-transaction network captures
//! - [`config`] - Engine configuration from file or module arguments
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use oxcmd_core::config::EngineConfig;
//! use oxcmd_core::driver::AutomationDriver;
//! use oxcmd_core::executor::CommandExecutor;
//! use oxcmd_core::status::Status;
//! use serde_json::json;
//!
//! async fn run(driver: Arc<dyn AutomationDriver>) {
//!     let mut executor = CommandExecutor::new(driver, EngineConfig::load());
//!
//!     executor.execute("open", vec![json!("https://example.com/login")]).await;
//!     executor.execute("type", vec![json!("id=user"), json!("alice")]).await;
//!     let result = executor.execute("click", vec![json!("id=submit")]).await;
//!     assert_eq!(result.status, Status::Success);
//! }
//! ```

pub mod command;
mod commands;
pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod element;
pub mod error;
pub mod executor;
pub mod locator;
pub mod pattern;
pub mod repository;
pub mod result;
pub mod retry;
pub mod status;
pub mod transaction;
pub mod variables;
pub mod wait;
pub mod xml;
