//! Deadline-bounded polling.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

/// Polls `check` until it yields a value or `timeout` elapses.
///
/// `check` returns `Ok(Some(v))` when the condition holds, `Ok(None)` to keep
/// polling, and `Err` to abort immediately. The condition is always checked
/// at least once, even with a zero timeout. Returns `Ok(None)` on timeout.
pub async fn poll_until<T, E, F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut check: F,
) -> Result<Option<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(value) = check().await? {
            return Ok(Some(value));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn returns_once_condition_holds() {
        let polls = AtomicU32::new(0);
        let result: Result<Option<u32>, ()> = poll_until(
            Duration::from_secs(5),
            Duration::from_millis(100),
            || async {
                let n = polls.fetch_add(1, Ordering::SeqCst) + 1;
                Ok((n == 4).then_some(n))
            },
        )
        .await;
        assert_eq!(result, Ok(Some(4)));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_with_none() {
        let polls = AtomicU32::new(0);
        let start = Instant::now();
        let result: Result<Option<()>, ()> = poll_until(
            Duration::from_millis(1000),
            Duration::from_millis(250),
            || async {
                polls.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            },
        )
        .await;
        assert_eq!(result, Ok(None));
        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert_eq!(polls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn zero_timeout_checks_once() {
        let polls = AtomicU32::new(0);
        let result: Result<Option<()>, ()> =
            poll_until(Duration::ZERO, Duration::from_millis(10), || async {
                polls.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            })
            .await;
        assert_eq!(result, Ok(None));
        assert_eq!(polls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_abort_polling() {
        let result: Result<Option<()>, &str> =
            poll_until(Duration::from_secs(60), Duration::from_millis(10), || async {
                Err("driver gone")
            })
            .await;
        assert_eq!(result, Err("driver gone"));
    }
}
