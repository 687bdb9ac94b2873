//! In-process prioritized notification queue with bounded concurrent
//! dispatch.
//!
//! Producers enqueue synchronously; a periodic dispatch loop pulls jobs up
//! to the concurrency ceiling and spawns each delivery without awaiting it.
//! The queue is bounded: enqueue rejects with `AppError::QueueFull` when the
//! capacity is reached, which is the system's backpressure mechanism.

mod job;
mod processor;

pub use job::{NotificationJob, NotificationRequest, Priority};
pub use processor::DeliveryProcessor;

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::QueueConfig;
use crate::error::{AppError, AppResult};
use crate::models::NotificationKind;

/// Processes one job to a terminal outcome.
///
/// Handlers are registered per notification kind; jobs of a kind with no
/// registered handler fall through to the queue's default handler, so no
/// job type silently drops.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, job: &NotificationJob) -> AppResult<()>;
}

/// Queue statistics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub queue_size: usize,
    pub is_processing: bool,
    pub concurrent_jobs: usize,
}

/// Two-tier priority queue: high jobs ahead of the normal tier, FIFO within
/// each tier.
#[derive(Default)]
struct JobQueue {
    high: VecDeque<NotificationJob>,
    normal: VecDeque<NotificationJob>,
}

impl JobQueue {
    fn len(&self) -> usize {
        self.high.len() + self.normal.len()
    }

    fn push(&mut self, job: NotificationJob) {
        if job.priority.is_high() {
            self.high.push_back(job);
        } else {
            self.normal.push_back(job);
        }
    }

    fn pop(&mut self) -> Option<NotificationJob> {
        self.high.pop_front().or_else(|| self.normal.pop_front())
    }
}

struct QueueCore {
    jobs: Mutex<JobQueue>,
    running: AtomicBool,
    concurrent: AtomicUsize,
    handlers: RwLock<HashMap<NotificationKind, Arc<dyn JobHandler>>>,
    default_handler: Arc<dyn JobHandler>,
    capacity: usize,
}

impl QueueCore {
    fn handler_for(&self, kind: NotificationKind) -> Arc<dyn JobHandler> {
        let handlers = self.handlers.read().expect("handler registry lock poisoned");
        handlers
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.default_handler))
    }
}

/// Prioritized notification queue with bounded concurrent consumers.
///
/// Constructed by the host's composition root and shared by cloning; all
/// state lives behind `Arc`.
#[derive(Clone)]
pub struct NotificationQueue {
    core: Arc<QueueCore>,
    config: QueueConfig,
    runtime: Arc<Mutex<Option<CancellationToken>>>,
}

impl NotificationQueue {
    pub fn new(config: QueueConfig, default_handler: Arc<dyn JobHandler>) -> Self {
        Self {
            core: Arc::new(QueueCore {
                jobs: Mutex::new(JobQueue::default()),
                running: AtomicBool::new(false),
                concurrent: AtomicUsize::new(0),
                handlers: RwLock::new(HashMap::new()),
                default_handler,
                capacity: config.capacity,
            }),
            config,
            runtime: Arc::new(Mutex::new(None)),
        }
    }

    /// Registers a handler for one notification kind.
    pub fn register_handler(&self, kind: NotificationKind, handler: Arc<dyn JobHandler>) {
        let mut handlers = self
            .core
            .handlers
            .write()
            .expect("handler registry lock poisoned");
        handlers.insert(kind, handler);
        tracing::info!(kind = %kind, "NotificationQueue: handler registered");
    }

    /// Adds a notification to the queue. Synchronous and non-blocking.
    ///
    /// Rejects with `AppError::QueueFull` once the configured capacity is
    /// reached instead of growing without bound.
    pub fn enqueue(&self, request: NotificationRequest) -> AppResult<uuid::Uuid> {
        let job = NotificationJob::from_request(request);
        let job_id = job.id;

        let queue_size = {
            let mut jobs = self.core.jobs.lock().expect("job queue lock poisoned");
            if jobs.len() >= self.core.capacity {
                return Err(AppError::QueueFull {
                    capacity: self.core.capacity,
                });
            }
            jobs.push(job);
            jobs.len()
        };

        tracing::info!(
            notification_id = %job_id,
            queue_size,
            "NotificationQueue: notification enqueued"
        );

        Ok(job_id)
    }

    /// Starts the dispatch loop. Idempotent: a second start is a warning, not
    /// a second loop.
    pub fn start(&self) {
        if self.core.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("NotificationQueue: already processing, ignoring start request");
            return;
        }

        let token = CancellationToken::new();
        *self.runtime.lock().expect("runtime lock poisoned") = Some(token.clone());

        let core = Arc::clone(&self.core);
        let max_concurrency = self.config.max_concurrent_deliveries;
        let tick = Duration::from_secs(self.config.dispatch_interval_seconds);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {}
                }
                Self::dispatch_tick(&core, max_concurrency);
            }
            tracing::debug!("NotificationQueue: dispatch loop exited");
        });

        tracing::info!(
            max_concurrency,
            tick_seconds = self.config.dispatch_interval_seconds,
            "NotificationQueue: started processing"
        );
    }

    /// Stops scheduling new dispatches immediately. In-flight deliveries run
    /// to completion.
    pub fn stop(&self) {
        if !self.core.running.swap(false, Ordering::SeqCst) {
            tracing::warn!("NotificationQueue: not processing, ignoring stop request");
            return;
        }

        if let Some(token) = self.runtime.lock().expect("runtime lock poisoned").take() {
            token.cancel();
        }

        tracing::info!("NotificationQueue: stopped processing");
    }

    /// Current queue statistics.
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            queue_size: self.core.jobs.lock().expect("job queue lock poisoned").len(),
            is_processing: self.core.running.load(Ordering::SeqCst),
            concurrent_jobs: self.core.concurrent.load(Ordering::SeqCst),
        }
    }

    /// Pulls jobs while concurrency slots are free and spawns each delivery
    /// without awaiting it.
    fn dispatch_tick(core: &Arc<QueueCore>, max_concurrency: usize) {
        loop {
            if core.concurrent.load(Ordering::SeqCst) >= max_concurrency {
                return;
            }

            let job = {
                let mut jobs = core.jobs.lock().expect("job queue lock poisoned");
                match jobs.pop() {
                    Some(job) => job,
                    None => return,
                }
            };

            core.concurrent.fetch_add(1, Ordering::SeqCst);
            let core = Arc::clone(core);
            tokio::spawn(async move {
                Self::process_job(&core, job).await;
                core.concurrent.fetch_sub(1, Ordering::SeqCst);
            });
        }
    }

    /// Runs one job through its handler. Failures are logged, never
    /// propagated; a bad job must not take down the dispatch loop.
    async fn process_job(core: &QueueCore, job: NotificationJob) {
        let started = std::time::Instant::now();
        let handler = core.handler_for(job.kind);

        match handler.handle(&job).await {
            Ok(()) => {
                tracing::info!(
                    notification_id = %job.id,
                    kind = %job.kind,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "NotificationQueue: notification processed"
                );
            }
            Err(e) => {
                tracing::error!(
                    notification_id = %job.id,
                    kind = %job.kind,
                    error = %e,
                    "NotificationQueue: failed to process notification"
                );
            }
        }
    }
}
