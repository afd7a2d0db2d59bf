//! Periodic "still working" signals while a long operation is in flight.

use std::future::Future;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// How often the typing indicator is refreshed. Telegram shows it for about
/// five seconds.
pub const LIVENESS_INTERVAL: Duration = Duration::from_secs(4);

/// Drive `operation` to completion while calling `signal` every `interval`.
///
/// The first signal fires one `interval` after the start, so an operation
/// taking `d` gets `floor(d / interval)` signals. A tick due at the same
/// moment the operation finishes is still signalled. Nothing runs after the
/// returned future completes or is dropped.
pub async fn with_liveness<F, S, SF>(
    interval: Duration,
    mut signal: S,
    operation: F,
) -> F::Output
where
    F: Future,
    S: FnMut() -> SF,
    SF: Future<Output = ()>,
{
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(operation);

    loop {
        tokio::select! {
            biased;
            _ = ticker.tick() => signal().await,
            output = &mut operation => break output,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::time::sleep;

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() -> futures::future::Ready<()> + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let signal_count = Arc::clone(&count);
        let signal = move || {
            signal_count.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(())
        };
        (count, signal)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_per_interval_until_done() {
        let (count, signal) = counter();
        let output = with_liveness(LIVENESS_INTERVAL, signal, async {
            sleep(Duration::from_secs(10)).await;
            42
        })
        .await;
        assert_eq!(output, 42);
        assert_eq!(count.load(Ordering::SeqCst), 2);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_at_completion_is_counted() {
        for _ in 0..20 {
            let (count, signal) = counter();
            with_liveness(LIVENESS_INTERVAL, signal, sleep(Duration::from_secs(8)))
                .await;
            assert_eq!(count.load(Ordering::SeqCst), 2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn quick_operation_sends_nothing() {
        let (count, signal) = counter();
        let output: Result<(), &str> =
            with_liveness(LIVENESS_INTERVAL, signal, async {
                sleep(Duration::from_secs(1)).await;
                Err("failed")
            })
            .await;
        assert_eq!(output, Err("failed"));

        sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_dropped_by_timeout() {
        let (count, signal) = counter();
        let result = tokio::time::timeout(
            Duration::from_secs(13),
            with_liveness(LIVENESS_INTERVAL, signal, sleep(Duration::from_secs(100))),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(count.load(Ordering::SeqCst), 3);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}
