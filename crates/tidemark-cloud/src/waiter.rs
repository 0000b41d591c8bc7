//! State waiter
//!
//! Polls a remote resource through a caller-supplied refresh function until
//! its status reaches one of the target states. Pending states keep the loop
//! going; anything else stops it. The refresh function is the only I/O the
//! waiter performs, and it is never called concurrently with itself.
//!
//! ```ignore
//! let policy = PollPolicy::new(["creating", "modifying"], ["active"])
//!     .with_timeout(Duration::from_secs(300))
//!     .with_delay(Duration::from_secs(30));
//!
//! let outcome = wait_for_state("user group ug-1", &policy, &cancel, || async {
//!     api.describe("ug-1").await
//! })
//! .await?;
//! ```

use crate::error::{BoxError, WaitError};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep_until, timeout_at};
use tokio_util::sync::CancellationToken;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20 * 60);
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_NOT_FOUND_CHECKS: u32 = 20;

/// One successful observation of a remote resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot<T> {
    /// Current attributes of the resource
    pub value: T,
    /// Status label reported by the remote API
    pub status: String,
}

/// Result of a single refresh call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refreshed<T> {
    Found(StatusSnapshot<T>),
    /// The lookup reported that the resource does not exist
    NotFound,
}

impl<T> Refreshed<T> {
    pub fn found(value: T, status: impl Into<String>) -> Self {
        Refreshed::Found(StatusSnapshot {
            value,
            status: status.into(),
        })
    }
}

/// Successful end of a wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The resource reached a target status
    Reached(StatusSnapshot<T>),
    /// The resource disappeared and the policy accepts absence
    Gone,
}

impl<T> PollOutcome<T> {
    pub fn is_gone(&self) -> bool {
        matches!(self, PollOutcome::Gone)
    }

    pub fn status(&self) -> Option<&str> {
        match self {
            PollOutcome::Reached(snapshot) => Some(&snapshot.status),
            PollOutcome::Gone => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            PollOutcome::Reached(snapshot) => Some(snapshot.value),
            PollOutcome::Gone => None,
        }
    }
}

/// Classification of an observed status label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Target,
    Pending,
    Unexpected,
}

/// How a single wait classifies statuses and paces itself
///
/// Built fresh for each create/update/delete call and dropped afterwards.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Statuses meaning the remote operation is still in progress
    pub pending: Vec<String>,
    /// Statuses meaning the operation completed
    pub target: Vec<String>,
    /// Overall wall-clock budget, initial delay included
    pub timeout: Duration,
    /// First sleep between refreshes and the floor for every later one
    pub min_interval: Duration,
    /// Ceiling for the sleep between refreshes
    pub max_interval: Duration,
    /// Growth factor applied to the sleep after each refresh
    pub backoff_multiplier: f64,
    /// Sleep before the first refresh
    pub delay: Duration,
    /// Treat a not-found refresh as success (delete confirmation)
    pub absent_is_success: bool,
    /// Consecutive not-found refreshes tolerated when absence is not success
    pub not_found_checks: u32,
    /// Consecutive target observations required before succeeding
    pub target_occurrence: u32,
}

impl PollPolicy {
    pub fn new<P, T>(pending: P, target: T) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        Self {
            pending: pending.into_iter().map(Into::into).collect(),
            target: target.into_iter().map(Into::into).collect(),
            timeout: DEFAULT_TIMEOUT,
            min_interval: DEFAULT_MIN_INTERVAL,
            max_interval: DEFAULT_MAX_INTERVAL,
            backoff_multiplier: 2.0,
            delay: Duration::ZERO,
            absent_is_success: false,
            not_found_checks: DEFAULT_NOT_FOUND_CHECKS,
            target_occurrence: 1,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn absent_is_success(mut self) -> Self {
        self.absent_is_success = true;
        self
    }

    pub fn with_not_found_checks(mut self, checks: u32) -> Self {
        self.not_found_checks = checks;
        self
    }

    pub fn with_target_occurrence(mut self, occurrences: u32) -> Self {
        self.target_occurrence = occurrences;
        self
    }

    /// Exact, case-sensitive classification. Target wins over pending.
    pub fn classify(&self, status: &str) -> StatusClass {
        if self.target.iter().any(|s| s == status) {
            StatusClass::Target
        } else if self.pending.iter().any(|s| s == status) {
            StatusClass::Pending
        } else {
            StatusClass::Unexpected
        }
    }

    /// Sleep before refresh number `attempt + 2`
    pub fn interval_for(&self, attempt: u32) -> Duration {
        let min = self.min_interval;
        let max = self.max_interval.max(min);
        let factor = self
            .backoff_multiplier
            .max(1.0)
            .powi(attempt.min(i32::MAX as u32) as i32);
        let secs = min.as_secs_f64() * factor;

        if !secs.is_finite() || secs >= max.as_secs_f64() {
            max
        } else {
            Duration::from_secs_f64(secs).max(min)
        }
    }
}

/// Poll `refresh` until the resource reaches a target status
///
/// `resource` names the remote instance in logs and errors. Refresh errors,
/// unexpected statuses, the policy timeout and `cancel` all end the wait
/// immediately; only pending statuses (and tolerated not-found results) are
/// retried. Durations cannot be negative, so the shortest budget is a zero
/// timeout, which fails before the first refresh.
pub async fn wait_for_state<T, E, F, Fut>(
    resource: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
    mut refresh: F,
) -> Result<PollOutcome<T>, WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Refreshed<T>, E>>,
    E: Into<BoxError>,
{
    let start = Instant::now();
    let deadline = start
        .checked_add(policy.timeout)
        .unwrap_or_else(|| start + Duration::from_secs(u32::MAX as u64));

    let mut last_status: Option<String> = None;
    let mut not_found = 0u32;
    let mut target_seen = 0u32;
    let mut attempt = 0u32;

    let timed_out = |last_status: Option<String>| WaitError::Timeout {
        resource: resource.to_string(),
        last_status,
        target: policy.target.clone(),
        timeout: policy.timeout,
    };
    let cancelled = |last_status: Option<String>| WaitError::Cancelled {
        resource: resource.to_string(),
        last_status,
    };

    tracing::info!(
        "Waiting for {} to reach {:?} (timeout {:?})",
        resource,
        policy.target,
        policy.timeout
    );

    if !policy.delay.is_zero() {
        let wake = start.checked_add(policy.delay).unwrap_or(deadline).min(deadline);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(last_status)),
            _ = sleep_until(wake) => {}
        }
    }

    loop {
        if Instant::now() >= deadline {
            return Err(timed_out(last_status));
        }

        let refreshed = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(last_status)),
            result = timeout_at(deadline, refresh()) => match result {
                Err(_) => return Err(timed_out(last_status)),
                Ok(Err(source)) => {
                    return Err(WaitError::Refresh {
                        resource: resource.to_string(),
                        last_status,
                        source: source.into(),
                    });
                }
                Ok(Ok(refreshed)) => refreshed,
            },
        };

        match refreshed {
            Refreshed::NotFound => {
                if policy.absent_is_success {
                    tracing::debug!("{} no longer exists", resource);
                    return Ok(PollOutcome::Gone);
                }

                not_found += 1;
                target_seen = 0;
                if not_found > policy.not_found_checks {
                    return Err(WaitError::NotFound {
                        resource: resource.to_string(),
                        checks: not_found,
                        last_status,
                    });
                }
                tracing::debug!("{} not found yet ({} checks)", resource, not_found);
            }
            Refreshed::Found(snapshot) => {
                not_found = 0;
                tracing::debug!("{} status: {}", resource, snapshot.status);

                match policy.classify(&snapshot.status) {
                    StatusClass::Target => {
                        target_seen += 1;
                        if target_seen >= policy.target_occurrence.max(1) {
                            return Ok(PollOutcome::Reached(snapshot));
                        }
                    }
                    StatusClass::Pending => target_seen = 0,
                    StatusClass::Unexpected => {
                        return Err(WaitError::UnexpectedState {
                            resource: resource.to_string(),
                            status: snapshot.status,
                            target: policy.target.clone(),
                        });
                    }
                }
                last_status = Some(snapshot.status);
            }
        }

        let interval = policy.interval_for(attempt);
        attempt = attempt.saturating_add(1);
        let wake = Instant::now()
            .checked_add(interval)
            .unwrap_or(deadline)
            .min(deadline);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(cancelled(last_status)),
            _ = sleep_until(wake) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_is_exact() {
        let policy = PollPolicy::new(["creating", "modifying"], ["active"]);

        assert_eq!(policy.classify("active"), StatusClass::Target);
        assert_eq!(policy.classify("creating"), StatusClass::Pending);
        assert_eq!(policy.classify("Active"), StatusClass::Unexpected);
        assert_eq!(policy.classify("creat"), StatusClass::Unexpected);
        assert_eq!(policy.classify("failed"), StatusClass::Unexpected);
    }

    #[test]
    fn test_target_wins_over_pending() {
        let policy = PollPolicy::new(["available"], ["available"]);
        assert_eq!(policy.classify("available"), StatusClass::Target);
    }

    #[test]
    fn test_interval_growth() {
        let policy = PollPolicy::new(["pending"], ["done"])
            .with_min_interval(Duration::from_secs(1))
            .with_max_interval(Duration::from_secs(10))
            .with_backoff_multiplier(2.0);

        assert_eq!(policy.interval_for(0), Duration::from_secs(1));
        assert_eq!(policy.interval_for(1), Duration::from_secs(2));
        assert_eq!(policy.interval_for(2), Duration::from_secs(4));
        assert_eq!(policy.interval_for(3), Duration::from_secs(8));
        assert_eq!(policy.interval_for(4), Duration::from_secs(10)); // capped at max
        assert_eq!(policy.interval_for(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_interval_never_below_min() {
        let policy = PollPolicy::new(["pending"], ["done"])
            .with_min_interval(Duration::from_secs(10))
            .with_max_interval(Duration::from_secs(5))
            .with_backoff_multiplier(0.5);

        assert_eq!(policy.interval_for(0), Duration::from_secs(10));
        assert_eq!(policy.interval_for(3), Duration::from_secs(10));
    }

    #[test]
    fn test_defaults() {
        let policy = PollPolicy::new(Vec::<String>::new(), ["active"]);

        assert_eq!(policy.timeout, Duration::from_secs(1200));
        assert_eq!(policy.min_interval, Duration::from_secs(10));
        assert_eq!(policy.delay, Duration::ZERO);
        assert_eq!(policy.not_found_checks, 20);
        assert_eq!(policy.target_occurrence, 1);
        assert!(!policy.absent_is_success);
    }

    #[test]
    fn test_outcome_accessors() {
        let reached: PollOutcome<u32> = PollOutcome::Reached(StatusSnapshot {
            value: 7,
            status: "active".to_string(),
        });
        assert_eq!(reached.status(), Some("active"));
        assert!(!reached.is_gone());
        assert_eq!(reached.into_value(), Some(7));

        let gone: PollOutcome<u32> = PollOutcome::Gone;
        assert!(gone.is_gone());
        assert_eq!(gone.into_value(), None);
    }
}
