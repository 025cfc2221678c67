//! Behavioural tests for `with_retry`: attempt counting, backoff schedule and
//! error propagation. Time is paused so delays are measured exactly.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mfc_client::{with_retry, MediaApiError, RetryPolicy};
use tokio::time::Instant;

/// Records the instant of every invocation.
#[derive(Default)]
struct Recorder(Mutex<Vec<Instant>>);

impl Recorder {
    fn hit(&self) -> usize {
        let mut calls = self.0.lock().unwrap();
        calls.push(Instant::now());
        calls.len()
    }

    fn gaps(&self) -> Vec<Duration> {
        let calls = self.0.lock().unwrap();
        calls.windows(2).map(|w| w[1] - w[0]).collect()
    }

    fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

/// Paused time lands on whole-millisecond ticks; allow one tick of slack.
fn assert_backoff(gaps: &[Duration], expected: &[Duration]) {
    assert_eq!(gaps.len(), expected.len(), "gaps: {gaps:?}");
    for (gap, want) in gaps.iter().zip(expected) {
        assert!(
            *gap >= *want && *gap <= *want + Duration::from_millis(1),
            "gap {gap:?} should be {want:?}"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn succeeds_on_third_attempt_after_backoff() {
    let recorder = Arc::new(Recorder::default());
    let started = Instant::now();

    let r = recorder.clone();
    let result: Result<&str, String> = with_retry(
        &RetryPolicy::new(3, Duration::from_millis(100)),
        || {
            let r = r.clone();
            async move {
                match r.hit() {
                    1 | 2 => Err("transient".to_string()),
                    _ => Ok("third"),
                }
            }
        },
    )
    .await;

    assert_eq!(result, Ok("third"));
    assert_eq!(recorder.count(), 3);
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_backoff(
        &recorder.gaps(),
        &[Duration::from_millis(100), Duration::from_millis(200)],
    );
}

#[tokio::test(start_paused = true)]
async fn always_failing_operation_runs_exactly_n_times_and_returns_last_error() {
    for n in 1..=5u32 {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: Result<(), String> =
            with_retry(&RetryPolicy::new(n, Duration::from_millis(10)), || {
                let c = c.clone();
                async move {
                    let k = c.fetch_add(1, Ordering::SeqCst) + 1;
                    Err(format!("failure #{k}"))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), n);
        assert_eq!(result, Err(format!("failure #{n}")));
    }
}

#[tokio::test(start_paused = true)]
async fn backoff_doubles_between_every_attempt() {
    let recorder = Arc::new(Recorder::default());
    let r = recorder.clone();
    let _: Result<(), &str> = with_retry(&RetryPolicy::new(5, Duration::from_millis(50)), || {
        let r = r.clone();
        async move {
            r.hit();
            Err("down")
        }
    })
    .await;

    let expected: Vec<_> = (1..5u32)
        .map(|k| Duration::from_millis(50) * 2u32.pow(k - 1))
        .collect();
    assert_backoff(&recorder.gaps(), &expected);
}

#[tokio::test(start_paused = true)]
async fn media_errors_surface_unwrapped() {
    let result: Result<(), MediaApiError> =
        with_retry(&RetryPolicy::new(2, Duration::from_millis(1)), || async {
            Err(MediaApiError::ApiError {
                endpoint: "DELETE /file".into(),
                status: 404,
                body: "gone".into(),
            })
        })
        .await;

    match result {
        Err(MediaApiError::ApiError { status: 404, body, .. }) => assert_eq!(body, "gone"),
        other => panic!("expected the original ApiError, got: {other:?}"),
    }
}
