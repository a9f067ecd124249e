//! Bounded Task Pools
//!
//! The framework runs caller-visible work on three dedicated pools: one for
//! server-side dispatches, one for outbound calls, one for callback delivery.
//! A pool is a concurrency bound (semaphore permits) plus enough tracking to
//! drain on shutdown: intake stops, in-flight tasks get a grace period, and
//! stragglers are aborted with an error log.
//!
//! Tasks waiting for a permit form the queue; when the wait line grows past
//! the configured queue capacity the pool logs saturation warnings instead of
//! rejecting work.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Semaphore;
use tokio::task::AbortHandle;
use tracing::{error, info, warn};

use crate::config::RpcConfig;
use crate::error::RpcError;

/// Increments on creation, decrements on drop, so gauges stay correct even
/// when a task is aborted mid-await.
struct GaugeGuard {
    gauge: Arc<AtomicUsize>,
}

impl GaugeGuard {
    fn new(gauge: Arc<AtomicUsize>) -> Self {
        gauge.fetch_add(1, Ordering::SeqCst);
        Self { gauge }
    }
}

impl Drop for GaugeGuard {
    fn drop(&mut self) {
        self.gauge.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct TaskPool {
    name: &'static str,
    semaphore: Arc<Semaphore>,
    active: Arc<AtomicUsize>,
    queued: Arc<AtomicUsize>,
    queue_capacity: usize,
    closed: AtomicBool,
    next_task_id: AtomicU64,
    tracked: Arc<DashMap<u64, AbortHandle>>,
}

impl TaskPool {
    pub fn new(name: &'static str, size: usize, queue_capacity: usize) -> Self {
        Self {
            name,
            semaphore: Arc::new(Semaphore::new(size.max(1))),
            active: Arc::new(AtomicUsize::new(0)),
            queued: Arc::new(AtomicUsize::new(0)),
            queue_capacity,
            closed: AtomicBool::new(false),
            next_task_id: AtomicU64::new(0),
            tracked: Arc::new(DashMap::new()),
        }
    }

    /// Detached execution under the pool's concurrency bound.
    ///
    /// Returns `false` when the pool is shutting down; the task (and anything
    /// it owns, like cleanup guards) is dropped unrun in that case.
    pub fn spawn<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.closed.load(Ordering::SeqCst) {
            warn!(pool = self.name, "task refused, pool is shutting down");
            return false;
        }

        let waiting = self.queued.load(Ordering::SeqCst);
        if waiting >= self.queue_capacity {
            warn!(
                pool = self.name,
                waiting,
                capacity = self.queue_capacity,
                "pool saturated, tasks are piling up"
            );
        }

        let task_id = self.next_task_id.fetch_add(1, Ordering::Relaxed);
        let semaphore = self.semaphore.clone();
        let active = self.active.clone();
        let queued = self.queued.clone();
        let tracked = self.tracked.clone();

        let handle = tokio::spawn(async move {
            let _waiting = GaugeGuard::new(queued);
            let permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                // Semaphore closed: shutdown won the race.
                Err(_) => return,
            };
            drop(_waiting);

            let _permit = permit;
            let _running = GaugeGuard::new(active);
            task.await;
            tracked.remove(&task_id);
        });

        self.tracked.insert(task_id, handle.abort_handle());
        // The task may have finished before the insert; sweep it right away.
        if let Some(entry) = self.tracked.get(&task_id) {
            if entry.value().is_finished() {
                drop(entry);
                self.tracked.remove(&task_id);
            }
        }
        true
    }

    /// Inline execution under the pool's concurrency bound: waits for a
    /// permit, runs the future on the calling task, hands back its result.
    pub async fn run<T, F>(&self, task: F) -> Result<T, RpcError>
    where
        F: Future<Output = Result<T, RpcError>>,
    {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| RpcError::Internal(format!("pool '{}' is shut down", self.name)))?;
        let _running = GaugeGuard::new(self.active.clone());
        task.await
    }

    /// Tasks currently executing.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Tasks waiting for a permit.
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    /// Stops intake, waits up to `grace` for the pool to drain, then aborts
    /// whatever is left.
    pub async fn shutdown(&self, grace: Duration) {
        self.closed.store(true, Ordering::SeqCst);
        info!(pool = self.name, "pool draining");

        let deadline = Instant::now() + grace;
        while (self.active() > 0 || self.queued() > 0) && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(25)).await;
        }

        self.semaphore.close();
        let leftover = self.active() + self.queued();
        if leftover > 0 {
            error!(
                pool = self.name,
                leftover, "grace period expired, aborting remaining tasks"
            );
            for entry in self.tracked.iter() {
                entry.value().abort();
            }
        }
        self.tracked.clear();
        info!(pool = self.name, "pool stopped");
    }
}

/// The three pools every context owns, shut down in a fixed order.
pub struct PoolManager {
    pub server: Arc<TaskPool>,
    pub client: Arc<TaskPool>,
    pub callback: Arc<TaskPool>,
    shutdown_grace: Duration,
}

impl PoolManager {
    pub fn new(config: &RpcConfig) -> Self {
        Self {
            server: Arc::new(TaskPool::new(
                "server",
                config.server_pool_size,
                config.queue_capacity,
            )),
            client: Arc::new(TaskPool::new(
                "client",
                config.client_pool_size,
                config.queue_capacity,
            )),
            callback: Arc::new(TaskPool::new(
                "callback",
                config.callback_pool_size,
                config.queue_capacity,
            )),
            shutdown_grace: config.shutdown_grace,
        }
    }

    /// Server first so no new dispatches start, then outbound calls, then the
    /// callbacks those calls may still produce.
    pub async fn shutdown_all(&self) {
        self.server.shutdown(self.shutdown_grace).await;
        self.client.shutdown(self.shutdown_grace).await;
        self.callback.shutdown(self.shutdown_grace).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    async fn wait_until(mut check: impl FnMut() -> bool) {
        for _ in 0..200 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached within 2s");
    }

    #[tokio::test]
    async fn test_spawn_runs_every_task() {
        let pool = TaskPool::new("test", 4, 100);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..50 {
            let counter = counter.clone();
            assert!(pool.spawn(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }

        wait_until(|| counter.load(Ordering::SeqCst) == 50).await;
    }

    #[tokio::test]
    async fn test_concurrency_stays_within_the_bound() {
        let pool = TaskPool::new("test", 2, 100);
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let current = current.clone();
            let peak = peak.clone();
            let done = done.clone();
            pool.spawn(async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(30)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        wait_until(|| done.load(Ordering::SeqCst) == 10).await;
        assert!(
            peak.load(Ordering::SeqCst) <= 2,
            "pool of 2 ran {} tasks at once",
            peak.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn test_run_hands_back_the_result() {
        let pool = TaskPool::new("test", 1, 100);
        let value = pool.run(async { Ok::<_, RpcError>(42) }).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_shutdown_drains_then_refuses() {
        let pool = TaskPool::new("test", 2, 100);
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..4 {
            let done = done.clone();
            pool.spawn(async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        pool.shutdown(Duration::from_secs(2)).await;
        assert_eq!(done.load(Ordering::SeqCst), 4, "grace let everything finish");

        assert!(
            !pool.spawn(async {}),
            "a drained pool refuses new tasks"
        );
    }

    #[tokio::test]
    async fn test_shutdown_aborts_after_grace() {
        let pool = TaskPool::new("test", 1, 100);
        let finished = Arc::new(AtomicUsize::new(0));

        let marker = finished.clone();
        pool.spawn(async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            marker.fetch_add(1, Ordering::SeqCst);
        });

        // Let the task actually start before draining.
        wait_until(|| pool.active() == 1).await;
        pool.shutdown(Duration::from_millis(50)).await;

        // Cancellation lands at the task's next yield point.
        wait_until(|| pool.active() == 0).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0, "straggler was aborted");
    }
}
