//! Bounded retry for journal calls.
//!
//! Failed calls are re-issued immediately, with no backoff or jitter. Only
//! transient errors (see [`JournalError::is_transient`]) are retried.

use crate::constants::DEFAULT_MAX_RETRIES;
use crate::errors::JournalError;
use std::future::Future;
use tracing::{debug, warn};

/// How many times a failed call is re-issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// A policy that issues each call exactly once.
    pub fn none() -> Self {
        Self { max_retries: 0 }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

/// Runs `call` until it succeeds, fails permanently, or the retries run out.
///
/// The final error is returned unchanged.
///
/// # Examples
///
/// ```
/// use moodlog::errors::JournalError;
/// use moodlog::retry::{with_retry, RetryPolicy};
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let attempts = AtomicU32::new(0);
/// let counter = &attempts;
/// let result: Result<(), _> = with_retry(RetryPolicy::default(), "fetch", move || async move {
///     counter.fetch_add(1, Ordering::SeqCst);
///     Err(JournalError::NetworkError)
/// })
/// .await;
///
/// assert_eq!(result, Err(JournalError::NetworkError));
/// assert_eq!(attempts.load(Ordering::SeqCst), 3);
/// # });
/// ```
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    operation: &str,
    mut call: F,
) -> Result<T, JournalError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, JournalError>>,
{
    let mut retries = 0;
    loop {
        match call().await {
            Ok(value) => {
                if retries > 0 {
                    debug!("{} succeeded after {} retries", operation, retries);
                }
                return Ok(value);
            }
            Err(err) if err.is_transient() && retries < policy.max_retries => {
                retries += 1;
                warn!(
                    "{} failed ({}), retrying {}/{}",
                    operation, err, retries, policy.max_retries
                );
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let attempts = AtomicU32::new(0);
        let counter = &attempts;
        let result = with_retry(RetryPolicy::default(), "op", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, JournalError>(7)
        })
        .await;
        assert_eq!(result, Ok(7));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_from_transient_failure() {
        let attempts = AtomicU32::new(0);
        let counter = &attempts;
        let result = with_retry(RetryPolicy::default(), "op", move || async move {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(JournalError::DatabaseError("unavailable".to_string()))
            } else {
                Ok("done")
            }
        })
        .await;
        assert_eq!(result, Ok("done"));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let attempts = AtomicU32::new(0);
        let counter = &attempts;
        let result: Result<(), _> = with_retry(RetryPolicy::new(4), "op", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(JournalError::NetworkError)
        })
        .await;
        assert_eq!(result, Err(JournalError::NetworkError));
        assert_eq!(attempts.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let attempts = AtomicU32::new(0);
        let counter = &attempts;
        let result: Result<(), _> = with_retry(RetryPolicy::default(), "op", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(JournalError::NotFound)
        })
        .await;
        assert_eq!(result, Err(JournalError::NotFound));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_retry_policy() {
        let attempts = AtomicU32::new(0);
        let counter = &attempts;
        let _: Result<(), _> = with_retry(RetryPolicy::none(), "op", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(JournalError::NetworkError)
        })
        .await;
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
