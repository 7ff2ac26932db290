//! Bounded polling
//!
//! All waiting in the harness goes through [`WaitBudget::poll`]. A probe is run
//! repeatedly until it reports [`Probe::Ready`], the budget runs out, or the
//! driver fails with a non-transient error.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout, Instant};

use crate::driver::{DriverError, DriverResult};

/// Outcome of one probe
#[derive(Debug)]
pub enum Probe<T> {
    Ready(T),
    /// Not there yet; carries a description of what was observed
    Waiting(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitBudget {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitBudget {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(100),
        }
    }
}

#[derive(Debug)]
pub enum WaitError {
    Elapsed { waited: Duration, last_observed: String },
    Driver(DriverError),
}

impl WaitBudget {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    /// Run `probe` until it is ready or the budget is spent.
    ///
    /// The probe always runs at least once. A probe that hangs is cut off at
    /// the deadline.
    pub async fn poll<T, F, Fut>(&self, mut probe: F) -> Result<T, WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DriverResult<Probe<T>>>,
    {
        let started = Instant::now();
        let deadline = started + self.timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let observed = match timeout(remaining.max(self.poll_interval), probe()).await {
                Ok(Ok(Probe::Ready(value))) => return Ok(value),
                Ok(Ok(Probe::Waiting(observed))) => observed,
                Ok(Err(err)) if err.is_transient() => err.to_string(),
                Ok(Err(err)) => return Err(WaitError::Driver(err)),
                Err(_) => "probe did not answer in time".to_string(),
            };

            if Instant::now() >= deadline {
                return Err(WaitError::Elapsed {
                    waited: started.elapsed(),
                    last_observed: observed,
                });
            }
            sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn budget(timeout_ms: u64) -> WaitBudget {
        WaitBudget::new(Duration::from_millis(timeout_ms), Duration::from_millis(5))
    }

    #[tokio::test]
    async fn returns_once_ready() {
        let calls = &AtomicUsize::new(0);
        let value = budget(1_000)
            .poll(move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Ok(if n >= 3 {
                    Probe::Ready(n)
                } else {
                    Probe::Waiting(format!("attempt {}", n))
                })
            })
            .await
            .unwrap();
        assert_eq!(value, 3);
    }

    #[tokio::test]
    async fn elapsed_reports_last_observation() {
        let err = budget(30)
            .poll(|| async { Ok::<_, DriverError>(Probe::<()>::Waiting("spinner".into())) })
            .await
            .unwrap_err();
        match err {
            WaitError::Elapsed {
                waited,
                last_observed,
            } => {
                assert!(waited >= Duration::from_millis(30));
                assert_eq!(last_observed, "spinner");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn transient_errors_keep_polling() {
        let calls = &AtomicUsize::new(0);
        let value = budget(1_000)
            .poll(move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(DriverError::Stale("row".into()))
                } else {
                    Ok(Probe::Ready("settled"))
                }
            })
            .await
            .unwrap();
        assert_eq!(value, "settled");
    }

    #[tokio::test]
    async fn fatal_errors_abort_immediately() {
        let calls = &AtomicUsize::new(0);
        let err = budget(1_000)
            .poll(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<Probe<()>, _>(DriverError::Closed)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WaitError::Driver(DriverError::Closed)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_budget_still_reports_what_it_saw() {
        let calls = &AtomicUsize::new(0);
        let err = WaitBudget::new(Duration::ZERO, Duration::from_millis(1))
            .poll(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<Probe<()>, _>(DriverError::NoSuchElement {
                    locator: "cart badge".into(),
                    index: 0,
                })
            })
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        match err {
            WaitError::Elapsed { last_observed, .. } => assert!(last_observed.contains("cart badge")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
