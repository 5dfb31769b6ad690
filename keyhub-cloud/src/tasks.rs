//! Cache refresh scheduling
//!
//! Each [`RefreshJob`] runs as its own task on its own interval: a tick
//! invalidates the job's keys, then runs its warmer so the next reader hits
//! a warm cache. Ticks of one job never overlap. A failed or panicking tick
//! is logged and the loop waits for the next tick.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::cache::CacheAside;
use crate::error::BoxError;

type Warmer = Arc<dyn Fn() -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

/// Periodic invalidate-then-repopulate job
#[derive(Clone)]
pub struct RefreshJob {
    name: &'static str,
    every: Duration,
    keys: Vec<String>,
    warm: Warmer,
}

impl fmt::Debug for RefreshJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshJob")
            .field("name", &self.name)
            .field("every", &self.every)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

impl RefreshJob {
    pub fn new<F, Fut>(name: &'static str, every: Duration, keys: Vec<String>, warm: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Self {
            name,
            every,
            keys,
            warm: Arc::new(move || warm().boxed()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn every(&self) -> Duration {
        self.every
    }
}

/// Registered job, as reported by [`RefreshScheduler::jobs`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobInfo {
    pub name: &'static str,
    pub schedule: String,
    pub keys: Vec<String>,
}

/// Lifecycle-managed owner of the refresh tasks
pub struct RefreshScheduler {
    cache: CacheAside,
    jobs: Vec<RefreshJob>,
    running: Vec<(&'static str, JoinHandle<()>)>,
    shutdown: CancellationToken,
}

impl RefreshScheduler {
    pub fn new(cache: CacheAside) -> Self {
        Self {
            cache,
            jobs: Vec::new(),
            running: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Add a job. Takes effect on the next [`Self::start`].
    pub fn register(&mut self, job: RefreshJob) {
        tracing::debug!(job = job.name, every_secs = job.every.as_secs(), "Registered refresh job");
        self.jobs.push(job);
    }

    pub fn jobs(&self) -> Vec<JobInfo> {
        self.jobs
            .iter()
            .map(|job| JobInfo {
                name: job.name,
                schedule: describe_interval(job.every),
                keys: job.keys.clone(),
            })
            .collect()
    }

    pub fn is_running(&self) -> bool {
        !self.running.is_empty()
    }

    /// Spawn one task per job. The first tick of each job fires immediately.
    pub fn start(&mut self) {
        if self.is_running() {
            tracing::warn!("Refresh scheduler already running");
            return;
        }
        self.shutdown = CancellationToken::new();

        for job in &self.jobs {
            let handle = tokio::spawn(run_job(
                job.clone(),
                self.cache.clone(),
                self.shutdown.clone(),
            ));
            self.running.push((job.name, handle));
        }
        tracing::info!(jobs = self.running.len(), "Refresh scheduler started");
    }

    /// Cancel every job and wait for its task to finish
    pub async fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.shutdown.cancel();

        for (name, handle) in self.running.drain(..) {
            match handle.await {
                Ok(()) => tracing::debug!(job = name, "Refresh job stopped"),
                Err(e) => tracing::error!(job = name, error = ?e, "Refresh job ended abnormally"),
            }
        }
        tracing::info!("Refresh scheduler stopped");
    }
}

async fn run_job(job: RefreshJob, cache: CacheAside, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(job.every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let tick = AssertUnwindSafe(refresh(&job, &cache)).catch_unwind();
        let outcome = tokio::select! {
            _ = shutdown.cancelled() => break,
            outcome = tick => outcome,
        };

        match outcome {
            Ok(Ok(())) => tracing::debug!(job = job.name, "Cache refreshed"),
            Ok(Err(e)) => tracing::warn!(job = job.name, error = %e, "Cache refresh failed"),
            Err(panic_info) => {
                let panic_msg: String = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                tracing::error!(job = job.name, panic = %panic_msg, "Cache refresh panicked");
            }
        }
    }
}

async fn refresh(job: &RefreshJob, cache: &CacheAside) -> Result<(), BoxError> {
    for key in &job.keys {
        cache.invalidate(key).await;
    }
    (job.warm)().await
}

fn describe_interval(every: Duration) -> String {
    let secs = every.as_secs();
    match secs {
        s if s > 0 && s % 86_400 == 0 => format!("every {}d", s / 86_400),
        s if s > 0 && s % 3_600 == 0 => format!("every {}h", s / 3_600),
        s if s > 0 && s % 60 == 0 => format!("every {}m", s / 60),
        s if s > 0 => format!("every {s}s"),
        _ => format!("every {}ms", every.as_millis()),
    }
}
