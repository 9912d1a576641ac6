mod common;

use common::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storefront_db::{CircuitState, DatabaseClient, ErrorCategory};
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_recovers_after_two_connection_resets() {
    let client = Arc::new(MockDatabaseClient::new());
    client.push_error("read ECONNRESET");
    client.push_error("read ECONNRESET");
    client.set_default_response(Ok(Some("42".to_string())));
    let access = data_access_with(Arc::clone(&client));

    let result = access
        .with_retry_named(|| client.execute_query("SELECT count(*) FROM orders"), 3, "test")
        .await;

    assert_eq!(result.unwrap(), Some("42".to_string()));
    assert_eq!(client.query_count(), 3);
    assert_eq!(access.connection_diagnostics().consecutive_failures, 0);

    let metrics = access.pool_metrics();
    assert_eq!(metrics.successes, 1);
    assert_eq!(metrics.failures, 2);
    assert_eq!(metrics.total_attempts, 3);
}

#[tokio::test(start_paused = true)]
async fn test_auth_failure_invokes_operation_once() {
    let calls = AtomicU32::new(0);
    let client = Arc::new(MockDatabaseClient::new());
    let access = data_access_with(client);

    let result: Result<(), _> = access
        .with_retry(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("FATAL: password authentication failed for user \"storefront\"")
        })
        .await;

    let error = result.unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(error.category(), Some(ErrorCategory::PermanentAuth));
    assert_eq!(error.attempts(), 1);
    assert!(!error.is_connection_related());

    // Counted as an infrastructure failure
    assert_eq!(access.connection_diagnostics().consecutive_failures, 1);
    assert_eq!(access.circuit_breaker_snapshot().consecutive_failures, 1);
}

#[tokio::test(start_paused = true)]
async fn test_tenant_not_found_exhausts_retry_budget() {
    let calls = AtomicU32::new(0);
    let access = data_access_with_retries(Arc::new(MockDatabaseClient::new()), 2);

    let result: Result<(), _> = access
        .with_retry(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("FATAL: Tenant or user not found".to_string())
        })
        .await;

    let error = result.unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(error.category(), Some(ErrorCategory::TransientPooler));
    assert_eq!(error.attempts(), 3);
    assert_eq!(
        error.into_inner(),
        Some("FATAL: Tenant or user not found".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_business_errors_leave_counters_untouched() {
    let access = data_access_with(Arc::new(MockDatabaseClient::new()));

    for message in [
        "Unique constraint violated",
        "Foreign key constraint failed",
        "Record not found",
        "Validation failed",
    ] {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = access
            .with_retry(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(message)
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1, "{message}");
        assert_eq!(result.unwrap_err().category(), Some(ErrorCategory::NonRetryable));
    }

    assert_eq!(access.connection_diagnostics().consecutive_failures, 0);
    assert_eq!(access.circuit_breaker_snapshot().consecutive_failures, 0);
    assert_eq!(access.pool_metrics().total_attempts, 0);
}

#[tokio::test(start_paused = true)]
async fn test_default_budget_follows_backoff_schedule() {
    let calls = AtomicU32::new(0);
    let access = data_access_with(Arc::new(MockDatabaseClient::new()));
    let started = Instant::now();

    let result: Result<(), _> = access
        .with_retry(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("Can't reach database server at `db:5432`")
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 5);

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(2_000 + 4_000 + 8_000 + 16_000));
    assert!(elapsed < Duration::from_millis(30_000 + 4 * 500));
}

#[tokio::test(start_paused = true)]
async fn test_breaker_trips_after_five_failed_operations() {
    let calls = AtomicU32::new(0);
    let access = data_access_with(Arc::new(MockDatabaseClient::new()));
    let failing = || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>("connect ECONNREFUSED 10.0.0.4:5432")
    };

    for _ in 0..5 {
        let error = access.with_retry_named(failing, 0, "load_cart").await.unwrap_err();
        assert!(!error.is_circuit_open());
    }

    let snapshot = access.circuit_breaker_snapshot();
    assert_eq!(snapshot.state, CircuitState::Open);
    assert_eq!(snapshot.total_trips, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 5);

    let error = access.with_retry_named(failing, 4, "load_cart").await.unwrap_err();
    assert!(error.is_circuit_open());
    assert!(error.is_connection_related());
    assert_eq!(error.attempts(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 5, "operation must not run while open");

    match error {
        storefront_db::ResilienceError::CircuitOpen {
            component,
            retry_after_ms,
        } => {
            assert_eq!(component, "database");
            assert_eq!(retry_after_ms, 30_000);
        }
        other => panic!("expected circuit open, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_breaker_recovers_through_half_open() {
    let access = data_access_with(Arc::new(MockDatabaseClient::new()));

    for _ in 0..5 {
        let _ = access
            .with_retry_named(|| async { Err::<(), _>("read ECONNRESET") }, 0, "probe")
            .await;
    }
    assert_eq!(access.circuit_breaker_snapshot().state, CircuitState::Open);

    tokio::time::advance(Duration::from_secs(30)).await;

    access
        .with_retry(|| async { Ok::<_, &str>(()) })
        .await
        .unwrap();
    assert_eq!(access.circuit_breaker_snapshot().state, CircuitState::HalfOpen);

    access
        .with_retry(|| async { Ok::<_, &str>(()) })
        .await
        .unwrap();

    let snapshot = access.circuit_breaker_snapshot();
    assert_eq!(snapshot.state, CircuitState::Closed);
    assert_eq!(snapshot.consecutive_failures, 0);
    assert_eq!(snapshot.total_trips, 1);
    assert_eq!(access.connection_diagnostics().consecutive_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn test_single_success_resets_breaker_failures() {
    let access = data_access_with(Arc::new(MockDatabaseClient::new()));
    let fail = || async { Err::<(), _>("Connection terminated unexpectedly") };

    for _ in 0..4 {
        let _ = access.with_retry_named(fail, 0, "fail").await;
    }
    access.with_retry(|| async { Ok::<_, &str>(()) }).await.unwrap();
    for _ in 0..4 {
        let _ = access.with_retry_named(fail, 0, "fail").await;
    }

    let snapshot = access.circuit_breaker_snapshot();
    assert_eq!(snapshot.state, CircuitState::Closed);
    assert_eq!(snapshot.consecutive_failures, 4);
    assert_eq!(snapshot.total_trips, 0);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_failures_trip_after_more_calls_than_threshold() {
    let calls = Arc::new(AtomicU32::new(0));
    let access = data_access_with(Arc::new(MockDatabaseClient::new()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let access = access.clone();
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                access
                    .with_retry_named(
                        || {
                            let calls = Arc::clone(&calls);
                            async move {
                                calls.fetch_add(1, Ordering::SeqCst);
                                tokio::time::sleep(Duration::from_millis(10)).await;
                                Err::<(), _>("read ECONNRESET".to_string())
                            }
                        },
                        0,
                        "concurrent_read",
                    )
                    .await
            })
        })
        .collect();

    for result in futures::future::join_all(handles).await {
        assert!(result.unwrap().is_err());
    }

    // Every call was admitted before any failure was recorded
    assert_eq!(calls.load(Ordering::SeqCst), 8);
    let snapshot = access.circuit_breaker_snapshot();
    assert_eq!(snapshot.state, CircuitState::Open);
    assert_eq!(snapshot.total_trips, 1);
    assert_eq!(access.connection_diagnostics().consecutive_failures, 8);
}

#[tokio::test(start_paused = true)]
async fn test_failure_ceiling_abandons_remaining_retries() {
    let access = data_access_with(Arc::new(MockDatabaseClient::new()));
    for _ in 0..4 {
        let _ = access
            .with_retry_named(|| async { Err::<(), _>("read ECONNRESET") }, 0, "warm_up")
            .await;
    }
    assert!(!access.connection_diagnostics().at_failure_ceiling);

    // A concurrent caller trips the breaker mid-retry
    let calls = AtomicU32::new(0);
    let observer = access.clone();
    let result: Result<(), _> = access
        .with_retry_named(
            || async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    let _ = observer
                        .with_retry_named(|| async { Err::<(), _>("read ECONNRESET") }, 0, "other")
                        .await;
                }
                Err("read ECONNRESET")
            },
            4,
            "suspended",
        )
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(access.connection_diagnostics().at_failure_ceiling);
}

#[tokio::test(start_paused = true)]
async fn test_half_open_admits_bounded_trials_under_burst() {
    let calls = Arc::new(AtomicU32::new(0));
    let access = data_access_with(Arc::new(MockDatabaseClient::new()));

    for _ in 0..5 {
        let _ = access
            .with_retry_named(|| async { Err::<(), _>("read ECONNRESET") }, 0, "fail")
            .await;
    }
    tokio::time::advance(Duration::from_secs(30)).await;

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let access = access.clone();
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                access
                    .with_retry_named(
                        || {
                            let calls = Arc::clone(&calls);
                            async move {
                                calls.fetch_add(1, Ordering::SeqCst);
                                tokio::time::sleep(Duration::from_millis(100)).await;
                                Err::<(), _>("read ECONNRESET".to_string())
                            }
                        },
                        0,
                        "burst",
                    )
                    .await
            })
        })
        .collect();

    let mut rejected = 0;
    for result in futures::future::join_all(handles).await {
        if result.unwrap().unwrap_err().is_circuit_open() {
            rejected += 1;
        }
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(rejected, 48);
    assert_eq!(access.circuit_breaker_snapshot().state, CircuitState::Open);
}
