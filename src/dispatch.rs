//! Concurrent execution of outbound calls with a per-call timeout.
//!
//! Every call runs in its own tokio task and gets its own timer, so a slow
//! call never shortens the budget of another one.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::errors::{Result, SilenceError};

/// Run `call` in a spawned task and wait at most `budget` for its outcome
///
/// When the budget elapses first, [`SilenceError::Timeout`] is returned and
/// the task keeps running detached; its eventual outcome is discarded.
pub async fn dispatch<F, T>(budget: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::spawn(call);

    match timeout(budget, handle).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_err)) => Err(SilenceError::Task(join_err)),
        Err(_) => {
            warn!(?budget, "Call timed out");
            Err(SilenceError::Timeout(budget))
        }
    }
}

/// Run all `calls` concurrently, each against its own `budget`
///
/// Outcomes are returned in completion order, exactly one per call. A call
/// that exceeds its budget is cancelled and yields one
/// [`SilenceError::Timeout`].
pub async fn fan_out<I, F, T>(budget: Duration, calls: I) -> Vec<Result<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let mut set = JoinSet::new();
    for call in calls {
        set.spawn(async move {
            match timeout(budget, call).await {
                Ok(outcome) => outcome,
                Err(_) => Err(SilenceError::Timeout(budget)),
            }
        });
    }

    debug!(calls = set.len(), ?budget, "Dispatched concurrent calls");

    let mut outcomes = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        outcomes.push(joined.unwrap_or_else(|e| Err(SilenceError::Task(e))));
    }
    outcomes
}

/// Fold per-call outcomes into a single result
///
/// Returns the number of successful calls, or an
/// [`SilenceError::Aggregate`] holding every failure.
pub fn aggregate<T>(outcomes: Vec<Result<T>>) -> Result<usize> {
    let mut succeeded = 0;
    let mut errors = Vec::new();

    for outcome in outcomes {
        match outcome {
            Ok(_) => succeeded += 1,
            Err(err) => errors.push(err),
        }
    }

    if errors.is_empty() {
        Ok(succeeded)
    } else {
        Err(SilenceError::Aggregate(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_dispatch_returns_outcome() {
        let result = dispatch(Duration::from_secs(1), async { Ok::<_, SilenceError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_dispatch_passes_error_through() {
        let result = dispatch(Duration::from_secs(1), async {
            Err::<(), _>(SilenceError::Api {
                status: 500,
                message: "boom".to_string(),
            })
        })
        .await;
        assert!(matches!(result, Err(SilenceError::Api { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_dispatch_times_out() {
        let result: Result<()> = dispatch(Duration::from_millis(20), std::future::pending()).await;
        assert!(result.unwrap_err().is_timeout());
    }

    #[tokio::test]
    async fn test_dispatch_reports_panicked_task() {
        let result: Result<()> = dispatch(Duration::from_secs(1), async {
            if true {
                panic!("call blew up");
            }
            Ok::<(), SilenceError>(())
        })
        .await;
        assert!(matches!(result, Err(SilenceError::Task(_))));
    }

    #[tokio::test]
    async fn test_fan_out_timeouts_are_independent() {
        let started = Instant::now();

        let fast = Box::pin(async {
            sleep(Duration::from_millis(10)).await;
            Ok::<(), SilenceError>(())
        }) as std::pin::Pin<Box<dyn Future<Output = Result<()>> + Send>>;
        let hung = Box::pin(std::future::pending::<Result<()>>())
            as std::pin::Pin<Box<dyn Future<Output = Result<()>> + Send>>;

        let outcomes = fan_out(Duration::from_millis(50), vec![fast, hung]).await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
        assert_eq!(
            outcomes
                .iter()
                .filter(|o| matches!(o, Err(e) if e.is_timeout()))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_fan_out_each_call_gets_full_budget() {
        let calls = (0..3u64).map(|i| async move {
            sleep(Duration::from_millis(30 + i * 10)).await;
            Ok::<_, SilenceError>(i)
        });

        let outcomes = fan_out(Duration::from_millis(200), calls).await;
        assert_eq!(aggregate(outcomes).unwrap(), 3);
    }

    #[test]
    fn test_aggregate_collects_every_error() {
        let outcomes: Vec<Result<()>> = vec![
            Ok(()),
            Err(SilenceError::Timeout(Duration::from_millis(50))),
            Err(SilenceError::Timeout(Duration::from_millis(50))),
            Err(SilenceError::Api {
                status: 500,
                message: "boom".to_string(),
            }),
        ];

        match aggregate(outcomes) {
            Err(SilenceError::Aggregate(errors)) => {
                assert_eq!(errors.len(), 3);
                assert_eq!(errors.iter().filter(|e| e.is_timeout()).count(), 2);
            }
            other => panic!("Expected Aggregate error, got {other:?}"),
        }
    }

    #[test]
    fn test_aggregate_empty_is_success() {
        assert_eq!(aggregate::<()>(Vec::new()).unwrap(), 0);
    }
}
