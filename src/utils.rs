//! Miscellaneous helper utilities.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// How long `stop()` waits for a task to wind down before aborting it.
pub const STOP_GRACE: Duration = Duration::from_secs(2);

/// Initialize `tracing` subscriber with env-based filter.
///
/// If `RUST_LOG` is not set, defaults to `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// A spawned background loop together with the token that stops it.
#[derive(Debug)]
pub struct Worker {
    name: &'static str,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Worker {
    /// Spawn `body` with a fresh cancellation token.
    pub fn spawn<F, Fut>(name: &'static str, body: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(body(cancel.clone()));
        Self {
            name,
            cancel,
            handle,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel, wait up to `grace`, then abort whatever is left.
    /// Never blocks longer than `grace`.
    pub async fn stop(self, grace: Duration) {
        self.cancel.cancel();
        let mut handle = self.handle;
        if tokio::time::timeout(grace, &mut handle).await.is_err() {
            warn!(task = self.name, "task did not exit in time, aborting");
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn stop_cancels_cooperative_task() {
        let exited = Arc::new(AtomicBool::new(false));
        let flag = exited.clone();
        let worker = Worker::spawn("test", move |cancel| async move {
            cancel.cancelled().await;
            flag.store(true, Ordering::SeqCst);
        });
        worker.stop(Duration::from_secs(1)).await;
        assert!(exited.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn stop_returns_even_if_task_ignores_cancel() {
        let worker = Worker::spawn("stuck", |_cancel| async move {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        });
        let started = std::time::Instant::now();
        worker.stop(Duration::from_millis(50)).await;
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
