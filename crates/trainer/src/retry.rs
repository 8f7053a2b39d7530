//! Bounded polling with fixed backoff.
//!
//! Shared by anything that waits on storage being populated from another
//! context (e.g. the corpus still loading right after install), instead of
//! duplicating ad-hoc retry loops per call site.

use std::future::Future;
use std::time::Duration;

/// Run `attempt` up to `max_attempts` times, sleeping `delay` before each
/// retry, until it yields `Some`. Returns `None` if every attempt came up
/// empty.
pub async fn poll<T, F, Fut>(max_attempts: u32, delay: Duration, mut attempt: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for tries in 0..max_attempts {
        if tries > 0 {
            tokio::time::sleep(delay).await;
        }
        if let Some(value) = attempt().await {
            return Some(value);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_returns_first_success() {
        let calls = AtomicU32::new(0);
        let result = poll(3, Duration::from_millis(500), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { (n == 1).then_some("ready") }
        })
        .await;

        assert_eq!(result, Some("ready"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Option<()> = poll(3, Duration::from_millis(500), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { None }
        })
        .await;

        assert_eq!(result, None);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
