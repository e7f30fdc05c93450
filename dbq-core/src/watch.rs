//! Poll-based completion detection for dispatched tasks.
//!
//! The store offers no push notification to this core, so completion is
//! detected by re-reading the task until the background controller marks it
//! `Processed` or a deadline elapses. A fetch failure and a task that is
//! still `Submitted` are treated the same way: not yet known, keep polling.
//! Only deadline expiry turns into an error.

use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::crd::DbTask;
use crate::error::{Error, Result};
use crate::store::ResourceStore;

/// Default interval between completion polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default deadline for lightweight tasks.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// Waits for tasks to be processed. Read-only: never writes to the store.
pub struct CompletionWatcher<S> {
    tasks: S,
    poll_interval: Duration,
    deadline: Duration,
}

impl<S> CompletionWatcher<S>
where
    S: ResourceStore<DbTask>,
{
    /// Watcher with the default 100 ms poll interval and 10 s deadline.
    pub fn new(tasks: S) -> Self {
        Self {
            tasks,
            poll_interval: DEFAULT_POLL_INTERVAL,
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Override poll interval and deadline.
    #[must_use]
    pub fn with_timing(mut self, poll_interval: Duration, deadline: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.deadline = deadline;
        self
    }

    /// Block the calling task until the named task reaches `Processed` or
    /// the deadline elapses.
    ///
    /// The wait is bounded: it suspends the caller for at most the deadline,
    /// never indefinitely. There is no cancellation beyond the deadline;
    /// callers wanting to give up earlier race this future against their own
    /// timeout and drop it.
    pub async fn await_processed(&self, name: &str) -> Result<()> {
        let deadline = Instant::now() + self.deadline;
        loop {
            match self.tasks.get(name).await {
                Ok(Some(task)) if task.is_processed() => {
                    tracing::debug!(task = %name, "task processed");
                    return Ok(());
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!(task = %name, error = %err, "transient fetch failure while awaiting task");
                }
            }

            if Instant::now() >= deadline {
                return Err(Error::Timeout {
                    what: format!("task {} to be processed", name),
                    after: self.deadline,
                });
            }
            sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{DbTaskSpec, DbTaskStatus, TaskKind, TaskState};
    use crate::store::memory::MemoryStore;

    const POLL: Duration = Duration::from_millis(5);
    const DEADLINE: Duration = Duration::from_millis(100);

    fn task(name: &str, state: Option<TaskState>) -> DbTask {
        let mut task = DbTask::new(
            name,
            DbTaskSpec {
                task_type: TaskKind::Failover,
                parameters: "mycluster".to_string(),
            },
        );
        task.status = state.map(|state| DbTaskStatus { state });
        task
    }

    fn watcher(store: &MemoryStore<DbTask>) -> CompletionWatcher<MemoryStore<DbTask>> {
        CompletionWatcher::new(store.clone()).with_timing(POLL, DEADLINE)
    }

    #[tokio::test]
    async fn returns_immediately_when_already_processed() {
        let store = MemoryStore::new();
        store.upsert(task("mycluster-failover", Some(TaskState::Processed)));

        watcher(&store)
            .await_processed("mycluster-failover")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn succeeds_when_controller_processes_mid_poll() {
        let store = MemoryStore::new();
        store.upsert(task("mycluster-failover", Some(TaskState::Submitted)));

        let controller = store.clone();
        let writer = tokio::spawn(async move {
            sleep(Duration::from_millis(20)).await;
            controller.upsert(task("mycluster-failover", Some(TaskState::Processed)));
        });

        watcher(&store)
            .await_processed("mycluster-failover")
            .await
            .unwrap();
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn times_out_while_task_stays_submitted() {
        let store = MemoryStore::new();
        store.upsert(task("mycluster-failover", Some(TaskState::Submitted)));

        let err = watcher(&store)
            .await_processed("mycluster-failover")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }), "got {err}");
    }

    #[tokio::test]
    async fn timeout_consumes_the_full_deadline() {
        let store = MemoryStore::new();
        store.upsert(task("mycluster-failover", Some(TaskState::Submitted)));

        let start = Instant::now();
        let err = watcher(&store)
            .await_processed("mycluster-failover")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert!(start.elapsed() >= DEADLINE);
    }

    #[tokio::test]
    async fn missing_task_only_times_out() {
        let store = MemoryStore::new();

        let err = watcher(&store).await_processed("no-such-task").await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }), "got {err}");
    }

    #[tokio::test]
    async fn transient_fetch_failures_do_not_abort_the_wait() {
        let store = MemoryStore::new();
        store.upsert(task("mycluster-failover", Some(TaskState::Processed)));
        store.fail_next_gets(2);

        // Two failed polls consume budget; the third sees Processed.
        watcher(&store)
            .await_processed("mycluster-failover")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn status_without_processed_state_keeps_waiting() {
        let store = MemoryStore::new();
        store.upsert(task("mycluster-failover", None));

        let err = watcher(&store)
            .await_processed("mycluster-failover")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }
}
