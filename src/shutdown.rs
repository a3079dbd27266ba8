//! Teardown of the background tasks that forward D-Bus signals.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns the forwarding tasks of one command invocation
pub struct ShutdownManager {
    /// Token to signal shutdown to all tasks
    cancel_token: CancellationToken,
    /// Handles to all spawned tasks
    task_handles: Vec<JoinHandle<()>>,
}

impl ShutdownManager {
    pub fn new() -> Self {
        Self {
            cancel_token: CancellationToken::new(),
            task_handles: Vec::new(),
        }
    }

    /// Get a clone of the cancellation token for spawning tasks
    pub fn token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Register a task handle for shutdown coordination
    pub fn register_task(&mut self, handle: JoinHandle<()>) {
        self.task_handles.retain(|h| !h.is_finished());
        self.task_handles.push(handle);
    }

    pub fn task_count(&self) -> usize {
        self.task_handles.len()
    }

    /// Cancel every task and wait for them, giving up after a timeout
    pub async fn shutdown(mut self) {
        self.cancel_token.cancel();

        let handles: Vec<_> = self.task_handles.drain(..).collect();
        let count = handles.len();
        let shutdown_tasks = std::pin::pin!(async {
            for handle in handles {
                let _ = handle.await;
            }
        });

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, shutdown_tasks).await {
            Ok(_) => {
                tracing::debug!(tasks = count, "All tasks shut down");
            }
            Err(_) => {
                tracing::warn!("Shutdown timeout: some tasks did not complete");
            }
        }
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves when the user presses Ctrl-C. Failing to install the handler
/// means waiting forever, which leaves other exit paths intact.
pub async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for interrupt signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_cancels_registered_tasks() {
        let mut manager = ShutdownManager::new();
        let token = manager.token();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        manager.register_task(tokio::spawn(async move {
            token.cancelled().await;
            let _ = tx.send("stopped");
        }));
        assert_eq!(manager.task_count(), 1);

        manager.shutdown().await;
        assert_eq!(rx.recv().await, Some("stopped"));
    }
}
