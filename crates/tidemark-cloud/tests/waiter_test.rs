//! State waiter behavior under a paused clock

use std::future::{Ready, ready};
use std::time::Duration;
use tidemark_cloud::{
    CancellationToken, PollOutcome, PollPolicy, Refreshed, WaitError, wait_for_state,
};
use tokio::time::Instant;

/// Scripted refresh: `Some(status)` is found with that status, `None` is
/// not found. The last step repeats once the script runs out.
struct Script {
    steps: Vec<Option<&'static str>>,
    calls: Vec<Instant>,
}

impl Script {
    fn new(steps: &[Option<&'static str>]) -> Self {
        Self {
            steps: steps.to_vec(),
            calls: Vec::new(),
        }
    }

    fn statuses(statuses: &[&'static str]) -> Self {
        Self::new(&statuses.iter().map(|s| Some(*s)).collect::<Vec<_>>())
    }

    fn next(&mut self) -> Ready<Result<Refreshed<usize>, String>> {
        self.calls.push(Instant::now());
        let idx = (self.calls.len() - 1).min(self.steps.len() - 1);
        ready(Ok(match self.steps[idx] {
            Some(status) => Refreshed::found(self.calls.len(), status),
            None => Refreshed::NotFound,
        }))
    }

    fn offsets(&self, start: Instant) -> Vec<Duration> {
        self.calls.iter().map(|t| t.duration_since(start)).collect()
    }
}

fn user_group_policy() -> PollPolicy {
    PollPolicy::new(["creating", "modifying"], ["active"])
        .with_timeout(Duration::from_secs(5 * 60))
        .with_min_interval(Duration::from_secs(10))
        .with_delay(Duration::from_secs(30))
}

#[tokio::test(start_paused = true)]
async fn test_pending_then_active_after_three_calls() {
    let policy = user_group_policy();
    let cancel = CancellationToken::new();
    let mut script = Script::statuses(&["creating", "creating", "active"]);
    let start = Instant::now();

    let outcome = wait_for_state("ElastiCache User Group (ug-1)", &policy, &cancel, || {
        script.next()
    })
    .await
    .unwrap();

    match outcome {
        PollOutcome::Reached(snapshot) => {
            assert_eq!(snapshot.status, "active");
            assert_eq!(snapshot.value, 3);
        }
        PollOutcome::Gone => panic!("Expected `Reached` outcome"),
    }
    assert_eq!(
        script.offsets(start),
        vec![
            Duration::from_secs(30),
            Duration::from_secs(40),
            Duration::from_secs(50)
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_no_refresh_before_initial_delay() {
    let policy = PollPolicy::new(["creating"], ["active"]).with_delay(Duration::from_secs(45));
    let cancel = CancellationToken::new();
    let mut script = Script::statuses(&["active"]);
    let start = Instant::now();

    wait_for_state("ug-1", &policy, &cancel, || script.next())
        .await
        .unwrap();

    assert_eq!(script.calls.len(), 1);
    assert!(script.offsets(start)[0] >= Duration::from_secs(45));
}

#[tokio::test(start_paused = true)]
async fn test_unexpected_state_aborts_immediately() {
    let policy = user_group_policy();
    let cancel = CancellationToken::new();
    let mut script = Script::statuses(&["creating", "failed", "active"]);

    let err = wait_for_state("ug-1", &policy, &cancel, || script.next())
        .await
        .unwrap_err();

    match &err {
        WaitError::UnexpectedState { status, target, .. } => {
            assert_eq!(status, "failed");
            assert_eq!(target, &vec!["active".to_string()]);
        }
        other => panic!("Expected `UnexpectedState` error, got {other:?}"),
    }
    assert_eq!(script.calls.len(), 2);
    assert!(err.to_string().contains("ug-1"));
}

#[tokio::test(start_paused = true)]
async fn test_status_match_is_case_sensitive() {
    let policy = user_group_policy().with_delay(Duration::ZERO);
    let cancel = CancellationToken::new();
    let mut script = Script::statuses(&["ACTIVE"]);

    let err = wait_for_state("ug-1", &policy, &cancel, || script.next())
        .await
        .unwrap_err();

    assert!(matches!(err, WaitError::UnexpectedState { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_always_pending_times_out() {
    let policy = PollPolicy::new(["modifying"], ["active"])
        .with_timeout(Duration::from_secs(60))
        .with_min_interval(Duration::from_secs(10))
        .with_max_interval(Duration::from_secs(10));
    let cancel = CancellationToken::new();
    let mut script = Script::statuses(&["modifying"]);
    let start = Instant::now();

    let err = wait_for_state("ug-1", &policy, &cancel, || script.next())
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.last_status(), Some("modifying"));
    assert!(start.elapsed() >= Duration::from_secs(60));
    // refreshes at 0, 10, ..., 50; the deadline hits during the last sleep
    assert_eq!(script.calls.len(), 6);
    assert!(script.offsets(start).iter().all(|t| *t < Duration::from_secs(60)));
}

#[tokio::test(start_paused = true)]
async fn test_zero_timeout_fails_before_refresh() {
    let policy = PollPolicy::new(["creating"], ["active"]).with_timeout(Duration::ZERO);
    let cancel = CancellationToken::new();
    let mut script = Script::statuses(&["active"]);

    let err = wait_for_state("ug-1", &policy, &cancel, || script.next())
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(script.calls.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_hanging_refresh_is_bounded_by_timeout() {
    let policy = PollPolicy::new(["creating"], ["active"]).with_timeout(Duration::from_secs(30));
    let cancel = CancellationToken::new();
    let start = Instant::now();

    let err = wait_for_state("ug-1", &policy, &cancel, || {
        std::future::pending::<Result<Refreshed<()>, String>>()
    })
    .await
    .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(start.elapsed(), Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn test_absence_is_success_on_first_call() {
    let policy = PollPolicy::new(["deleting"], Vec::<String>::new()).absent_is_success();
    let cancel = CancellationToken::new();
    let mut script = Script::new(&[None]);

    let outcome = wait_for_state("ug-1", &policy, &cancel, || script.next())
        .await
        .unwrap();

    assert!(outcome.is_gone());
    assert_eq!(script.calls.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_deleting_then_gone() {
    let policy = PollPolicy::new(["deleting"], Vec::<String>::new())
        .absent_is_success()
        .with_min_interval(Duration::from_secs(5));
    let cancel = CancellationToken::new();
    let mut script = Script::new(&[Some("deleting"), Some("deleting"), None]);

    let outcome = wait_for_state("ug-1", &policy, &cancel, || script.next())
        .await
        .unwrap();

    assert!(outcome.is_gone());
    assert_eq!(script.calls.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_absence_tolerated_until_visible() {
    let policy = user_group_policy().with_delay(Duration::ZERO);
    let cancel = CancellationToken::new();
    let mut script = Script::new(&[None, None, Some("creating"), Some("active")]);

    let outcome = wait_for_state("ug-1", &policy, &cancel, || script.next())
        .await
        .unwrap();

    assert_eq!(outcome.status(), Some("active"));
    assert_eq!(script.calls.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_absence_not_found_after_checks() {
    let policy = user_group_policy()
        .with_delay(Duration::ZERO)
        .with_not_found_checks(2);
    let cancel = CancellationToken::new();
    let mut script = Script::new(&[None]);

    let err = wait_for_state("ug-1", &policy, &cancel, || script.next())
        .await
        .unwrap_err();

    match err {
        WaitError::NotFound { checks, .. } => assert_eq!(checks, 3),
        other => panic!("Expected `NotFound` error, got {other:?}"),
    }
    assert_eq!(script.calls.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_error_is_not_retried() {
    let policy = user_group_policy();
    let cancel = CancellationToken::new();
    let mut calls = 0;

    let err = wait_for_state("ElastiCache User Group (ug-1)", &policy, &cancel, || {
        calls += 1;
        ready(Err::<Refreshed<()>, _>("ThrottlingException".to_string()))
    })
    .await
    .unwrap_err();

    assert_eq!(calls, 1);
    assert!(matches!(err, WaitError::Refresh { .. }));
    let msg = err.to_string();
    assert!(msg.contains("ug-1"));
    assert!(msg.contains("ThrottlingException"));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_sleep() {
    let policy = PollPolicy::new(["creating"], ["active"])
        .with_timeout(Duration::from_secs(3600))
        .with_min_interval(Duration::from_secs(60))
        .with_max_interval(Duration::from_secs(60));
    let cancel = CancellationToken::new();
    let mut script = Script::statuses(&["creating"]);
    let start = Instant::now();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(15)).await;
        canceller.cancel();
    });

    let err = wait_for_state("ug-1", &policy, &cancel, || script.next())
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(!err.is_timeout());
    assert_eq!(err.last_status(), Some("creating"));
    assert_eq!(script.calls.len(), 1);
    assert!(start.elapsed() < Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_initial_delay() {
    let policy = user_group_policy();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut script = Script::statuses(&["active"]);

    let err = wait_for_state("ug-1", &policy, &cancel, || script.next())
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(script.calls.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_backoff_between_refreshes() {
    let policy = PollPolicy::new(["creating"], ["active"])
        .with_min_interval(Duration::from_secs(1))
        .with_max_interval(Duration::from_secs(4))
        .with_backoff_multiplier(2.0);
    let cancel = CancellationToken::new();
    let mut script = Script::statuses(&["creating", "creating", "creating", "creating", "active"]);
    let start = Instant::now();

    wait_for_state("ug-1", &policy, &cancel, || script.next())
        .await
        .unwrap();

    let secs: Vec<u64> = script.offsets(start).iter().map(|d| d.as_secs()).collect();
    assert_eq!(secs, vec![0, 1, 3, 7, 11]);
}

#[tokio::test(start_paused = true)]
async fn test_target_must_repeat() {
    let policy = PollPolicy::new(["creating"], ["active"])
        .with_min_interval(Duration::from_secs(1))
        .with_target_occurrence(2);
    let cancel = CancellationToken::new();
    let mut script = Script::statuses(&["active", "creating", "active", "active"]);

    let outcome = wait_for_state("ug-1", &policy, &cancel, || script.next())
        .await
        .unwrap();

    assert_eq!(outcome.status(), Some("active"));
    assert_eq!(script.calls.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_independent_waits_run_concurrently() {
    let policy = PollPolicy::new(["creating"], ["active"])
        .with_min_interval(Duration::from_secs(10))
        .with_max_interval(Duration::from_secs(10));
    let cancel = CancellationToken::new();
    let mut first = Script::statuses(&["creating", "active"]);
    let mut second = Script::statuses(&["creating", "creating", "active"]);
    let start = Instant::now();

    let (a, b) = tokio::join!(
        wait_for_state("ug-1", &policy, &cancel, || first.next()),
        wait_for_state("ug-2", &policy, &cancel, || second.next()),
    );

    assert_eq!(a.unwrap().status(), Some("active"));
    assert_eq!(b.unwrap().status(), Some("active"));
    assert_eq!(start.elapsed(), Duration::from_secs(20));
}
