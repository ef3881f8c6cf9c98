use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Single-slot cancellable timer. Scheduling always cancels the previously
/// pending invocation first, so at most one firing is ever outstanding,
/// which is what makes it usable for debouncing and render coalescing.
#[derive(Default)]
pub struct CancellableTimer {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl CancellableTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn schedule<F>(&self, delay: Duration, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut guard = self.handle.lock().await;
        if let Some(previous) = guard.take() {
            previous.abort();
        }
        *guard = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fut.await;
        }));
    }

    pub async fn cancel(&self) {
        if let Some(handle) = self.handle.lock().await.take() {
            handle.abort();
        }
    }

    pub async fn is_pending(&self) -> bool {
        self.handle
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_timer_fires_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let timer = CancellableTimer::new();

        let counter = Arc::clone(&fired);
        timer
            .schedule(Duration::from_millis(10), async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reschedule_coalesces() {
        let fired = Arc::new(AtomicUsize::new(0));
        let timer = CancellableTimer::new();

        for _ in 0..5 {
            let counter = Arc::clone(&fired);
            timer
                .schedule(Duration::from_millis(20), async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .await;
        }

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_prevents_firing() {
        let fired = Arc::new(AtomicUsize::new(0));
        let timer = CancellableTimer::new();

        let counter = Arc::clone(&fired);
        timer
            .schedule(Duration::from_millis(20), async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        timer.cancel().await;

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
