use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Semaphore, oneshot};
use tracing::{debug, error};
use uuid::Uuid;

use crate::runtime::error::Error;
use crate::runtime::handle::TaskHandle;
use crate::runtime::task::Task;

pub trait Scheduler: Send + Sync {
    fn submit<T>(&self, task: T) -> TaskHandle<T::Output>
    where
        T: Task;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Tasks allowed to run at once. `None` means one.
    pub workers: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { workers: None }
    }
}

/// Runs tasks on tokio's blocking pool, at most `workers` at a time.
/// Must be used from within a tokio runtime.
#[derive(Clone)]
pub struct BlockingScheduler {
    permits: Arc<Semaphore>,
}

impl BlockingScheduler {
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(config.workers.unwrap_or(1).max(1))),
        }
    }
}

impl Scheduler for BlockingScheduler {
    fn submit<T>(&self, task: T) -> TaskHandle<T::Output>
    where
        T: Task,
    {
        let task_id = Uuid::new_v4();
        let (sender, receiver) = oneshot::channel();
        let permits = self.permits.clone();

        tokio::spawn(async move {
            // Returning drops the sender: the handle resolves as canceled.
            let Ok(permit) = permits.acquire_owned().await else {
                return;
            };
            debug!(%task_id, "task started");
            let joined = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                task.call()
            })
            .await;

            let result = joined.map_err(|err| {
                error!(%task_id, %err, "task failed");
                Error::Panicked(err.to_string())
            });
            let _ = sender.send(result);
        });

        TaskHandle::new(task_id, receiver)
    }
}
