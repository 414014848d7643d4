//! Cancellable periodic background tasks.

use std::future::Future;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, info};

/// Handle to a running periodic task.
///
/// The task stops when [`stop`](Self::stop) is called or when the handle is
/// dropped; the stop channel closes either way.
pub struct PeriodicTask {
    name: String,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Name the task was spawned with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signal the task to stop and wait for it to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}

/// Spawn a task that runs `tick` every `period` until stopped.
///
/// The first tick fires after one full period, not immediately. A tick in
/// progress finishes before a stop signal is observed.
pub fn spawn_periodic<F, Fut>(name: &str, period: Duration, mut tick: F) -> PeriodicTask
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let name = name.to_string();
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

    let task_name = name.clone();
    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    info!(task = %task_name, "Periodic task received stop signal");
                    break;
                }
                _ = sleep(period) => {
                    tick().await;
                }
            }
        }

        debug!(task = %task_name, "Periodic task stopped");
    });

    PeriodicTask {
        name,
        shutdown: shutdown_tx,
        handle,
    }
}
