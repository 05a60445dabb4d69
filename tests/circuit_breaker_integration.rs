//! Circuit breaker behaviour under concurrent use
//!
//! Exercises the breaker directly from many tasks at once, without the HTTP
//! layer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use todo_service::resilience::{
    BreakerRejection, CircuitBreaker, CircuitBreakerConfig, CircuitState, TripPolicy,
};
use todo_service::todo::StoreError;

fn breaker(timeout: Duration, max_requests: u32) -> Arc<CircuitBreaker> {
    Arc::new(CircuitBreaker::with_config(CircuitBreakerConfig {
        name: "concurrency".to_string(),
        max_requests,
        interval: Duration::from_secs(60),
        timeout,
        trip: TripPolicy {
            min_requests: 3,
            failure_ratio: 0.6,
        },
    }))
}

#[tokio::test]
async fn test_concurrent_successes_never_open() {
    let cb = breaker(Duration::from_secs(30), 1);

    let mut handles = Vec::new();
    for i in 0..64 {
        let cb = cb.clone();
        handles.push(tokio::spawn(async move {
            cb.execute(|| async move {
                tokio::task::yield_now().await;
                Ok::<_, StoreError>(i)
            })
            .await
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    let stats = cb.stats();
    assert_eq!(stats.state, CircuitState::Closed);
    assert_eq!(stats.counts.requests, 64);
    assert_eq!(stats.counts.total_successes, 64);
    assert_eq!(stats.counts.total_failures, 0);
}

#[tokio::test]
async fn test_open_circuit_skips_operation() {
    let cb = breaker(Duration::from_secs(30), 1);
    let invoked = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let invoked = invoked.clone();
        let result: Result<(), StoreError> = cb
            .execute(|| async move {
                invoked.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::Unavailable("down".to_string()))
            })
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
    assert_eq!(cb.state(), CircuitState::Open);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let cb = cb.clone();
        let invoked = invoked.clone();
        handles.push(tokio::spawn(async move {
            cb.execute(|| async move {
                invoked.fetch_add(1, Ordering::SeqCst);
                Ok::<_, StoreError>(())
            })
            .await
        }));
    }

    for handle in handles {
        let result = handle.await.unwrap();
        assert!(matches!(
            result,
            Err(StoreError::Rejected(BreakerRejection::Open))
        ));
    }
    assert_eq!(invoked.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_half_open_admits_limited_trials() {
    let cb = breaker(Duration::from_millis(30), 1);

    for _ in 0..3 {
        let _: Result<(), StoreError> = cb
            .execute(|| async { Err(StoreError::Unavailable("down".to_string())) })
            .await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(cb.state(), CircuitState::HalfOpen);

    // Hold the single trial slot open while a second caller arrives
    let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
    let trial = {
        let cb = cb.clone();
        tokio::spawn(async move {
            cb.execute(|| async move {
                let _ = release_rx.await;
                Ok::<_, StoreError>(())
            })
            .await
        })
    };

    // Wait until the trial has been admitted
    while cb.stats().counts.requests == 0 {
        tokio::task::yield_now().await;
    }

    let second: Result<(), StoreError> = cb.execute(|| async { Ok(()) }).await;
    assert!(matches!(
        second,
        Err(StoreError::Rejected(BreakerRejection::TooManyRequests))
    ));

    let _ = release_tx.send(());
    assert!(trial.await.unwrap().is_ok());
    assert_eq!(cb.state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_aborted_trial_does_not_wedge_half_open() {
    let cb = breaker(Duration::from_millis(30), 1);

    for _ in 0..3 {
        let _: Result<(), StoreError> = cb
            .execute(|| async { Err(StoreError::Unavailable("down".to_string())) })
            .await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(cb.state(), CircuitState::HalfOpen);

    // The only trial hangs, then its task is torn down mid-call
    let trial = {
        let cb = cb.clone();
        tokio::spawn(async move {
            cb.execute(|| std::future::pending::<Result<(), StoreError>>())
                .await
        })
    };
    while cb.stats().counts.requests == 0 {
        tokio::task::yield_now().await;
    }
    trial.abort();
    assert!(trial.await.unwrap_err().is_cancelled());

    assert_eq!(cb.state(), CircuitState::Open);

    // After the next cooldown a fresh trial is admitted and closes the circuit
    tokio::time::sleep(Duration::from_millis(50)).await;
    let result: Result<(), StoreError> = cb.execute(|| async { Ok(()) }).await;
    assert!(result.is_ok());
    assert_eq!(cb.state(), CircuitState::Closed);
}
