//! Bounded retry of element operations that hit a stale element handle.
//!
//! Pages re-render between lookup and use; a handle obtained a moment ago can
//! already point at a detached node. Element commands therefore run their whole
//! lookup-and-operate sequence inside [`RetryPolicy::run`], which re-runs it a
//! fixed number of times while the failure is a stale reference.

use std::future::Future;

use tracing::debug;

use crate::driver::DriverError;
use crate::error::CommandError;

/// Attempts made for every locator-dependent element operation.
pub const STALE_ELEMENT_ATTEMPTS: u32 = 3;

/// Failures that may succeed when the operation is repeated.
pub trait Transient {
    /// Whether the failure was caused by a stale element handle.
    fn is_stale(&self) -> bool;
}

impl Transient for DriverError {
    fn is_stale(&self) -> bool {
        matches!(self, DriverError::StaleElementReference)
    }
}

impl Transient for CommandError {
    fn is_stale(&self) -> bool {
        matches!(self, CommandError::Driver(e) if e.is_stale())
    }
}

/// Retry policy for stale element references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { attempts: STALE_ELEMENT_ATTEMPTS }
    }
}

impl RetryPolicy {
    /// A policy with a custom attempt budget. Zero is treated as one.
    pub fn with_attempts(attempts: u32) -> Self {
        Self { attempts: attempts.max(1) }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Runs `op` until it succeeds, fails with a non-stale error, or the
    /// attempt budget is spent.
    ///
    /// Retries happen immediately. When every attempt went stale the last
    /// stale failure is returned.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Err(e) if e.is_stale() && attempt < self.attempts => {
                    debug!(attempt, "stale element reference, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
