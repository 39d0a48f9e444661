//! Background coaching worker.
//!
//! Architecture:
//! - Bounded channel (`queue_capacity`, default 2) for backpressure
//! - Non-blocking submit; a full queue drops the request with visibility
//! - Stop flag plus completion signal for bounded shutdown
//! - Atomic metrics for observability

use crate::service::{Announcer, CoachRequest, CoachingService};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use repcount_core::CoachConfig;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Worker metrics tracked atomically
#[derive(Debug, Default)]
pub struct WorkerMetrics {
    pub submitted: AtomicU64,
    pub announced: AtomicU64,
    pub requests_failed: AtomicU64,
    pub channel_full_drops: AtomicU64,
    /// Queued requests thrown away once shutdown began
    pub discarded_at_shutdown: AtomicU64,
}

impl WorkerMetrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            announced: self.announced.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            channel_full_drops: self.channel_full_drops.load(Ordering::Relaxed),
            discarded_at_shutdown: self.discarded_at_shutdown.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub submitted: u64,
    pub announced: u64,
    pub requests_failed: u64,
    pub channel_full_drops: u64,
    pub discarded_at_shutdown: u64,
}

/// Commands sent to worker thread
#[derive(Debug)]
pub enum WorkerCmd {
    Analyze(CoachRequest),
    Shutdown,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    #[error("coach queue full, request dropped")]
    QueueFull,

    #[error("coach worker stopped")]
    Stopped,
}

/// How shutdown ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Worker finished and was joined
    Clean,
    /// Worker did not finish in time and was detached
    TimedOut,
}

/// Coaching worker handle
pub struct CoachWorker {
    tx: Option<Sender<WorkerCmd>>,
    stop: Arc<AtomicBool>,
    done_rx: Receiver<()>,
    metrics: Arc<WorkerMetrics>,
    worker_thread: Option<thread::JoinHandle<()>>,
    shutdown_timeout: Duration,
}

impl CoachWorker {
    /// Create and start the worker thread
    pub fn start(
        service: Arc<dyn CoachingService>,
        announcer: Arc<dyn Announcer>,
        config: &CoachConfig,
    ) -> Self {
        let (tx, rx) = bounded(config.queue_capacity.max(1));
        let (done_tx, done_rx) = bounded(1);
        let stop = Arc::new(AtomicBool::new(false));
        let metrics = Arc::new(WorkerMetrics::default());

        let stop_clone = Arc::clone(&stop);
        let metrics_clone = Arc::clone(&metrics);
        let worker_thread = thread::spawn(move || {
            Self::loop_until_stopped(service, announcer, rx, stop_clone, metrics_clone);
            let _ = done_tx.send(());
        });

        CoachWorker {
            tx: Some(tx),
            stop,
            done_rx,
            metrics,
            worker_thread: Some(worker_thread),
            shutdown_timeout: Duration::from_millis(config.shutdown_timeout_ms),
        }
    }

    /// Queue a request without blocking. A full queue drops it.
    pub fn submit(&self, request: CoachRequest) -> Result<(), SubmitError> {
        let tx = self.tx.as_ref().ok_or(SubmitError::Stopped)?;
        if self.stop.load(Ordering::Acquire) {
            return Err(SubmitError::Stopped);
        }

        match tx.try_send(WorkerCmd::Analyze(request)) {
            Ok(()) => {
                self.metrics.submitted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.metrics.channel_full_drops.fetch_add(1, Ordering::Relaxed);
                log::warn!("coach queue full, dropping snapshot");
                Err(SubmitError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => Err(SubmitError::Stopped),
        }
    }

    /// Get current metrics snapshot
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Shared counters that outlive the handle
    pub fn metrics_handle(&self) -> Arc<WorkerMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn is_running(&self) -> bool {
        self.worker_thread.is_some()
    }

    /// Stop the worker, waiting at most the configured shutdown timeout.
    ///
    /// Requests still queued are discarded. An analysis already in flight
    /// is allowed to finish only if it does so within the timeout.
    pub fn shutdown(mut self) -> ShutdownOutcome {
        self.stop_and_wait()
    }

    fn stop_and_wait(&mut self) -> ShutdownOutcome {
        let Some(handle) = self.worker_thread.take() else {
            return ShutdownOutcome::Clean;
        };

        self.stop.store(true, Ordering::Release);
        if let Some(tx) = self.tx.take() {
            // A full queue still ends the loop once the sender is gone
            let _ = tx.try_send(WorkerCmd::Shutdown);
        }

        match self.done_rx.recv_timeout(self.shutdown_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    log::error!("coach worker panicked");
                }
                ShutdownOutcome::Clean
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "coach worker still busy after {}ms, detaching",
                    self.shutdown_timeout.as_millis()
                );
                ShutdownOutcome::TimedOut
            }
        }
    }

    /// Main worker loop
    fn loop_until_stopped(
        service: Arc<dyn CoachingService>,
        announcer: Arc<dyn Announcer>,
        rx: Receiver<WorkerCmd>,
        stop: Arc<AtomicBool>,
        metrics: Arc<WorkerMetrics>,
    ) {
        // recv keeps yielding queued commands after the sender is dropped
        while let Ok(cmd) = rx.recv() {
            match cmd {
                WorkerCmd::Analyze(_) if stop.load(Ordering::Acquire) => {
                    metrics.discarded_at_shutdown.fetch_add(1, Ordering::Relaxed);
                }
                WorkerCmd::Analyze(request) => {
                    Self::handle(&*service, &*announcer, &request, &metrics);
                }
                WorkerCmd::Shutdown => break,
            }
        }

        let leftover = rx
            .try_iter()
            .filter(|cmd| matches!(cmd, WorkerCmd::Analyze(_)))
            .count() as u64;
        metrics
            .discarded_at_shutdown
            .fetch_add(leftover, Ordering::Relaxed);

        log::debug!("coach worker exiting");
    }

    fn handle(
        service: &dyn CoachingService,
        announcer: &dyn Announcer,
        request: &CoachRequest,
        metrics: &WorkerMetrics,
    ) {
        match service.analyze(request) {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    metrics.requests_failed.fetch_add(1, Ordering::Relaxed);
                    log::warn!("coach {} returned empty advice", service.name());
                    return;
                }
                announcer.announce(text);
                metrics.announced.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                metrics.requests_failed.fetch_add(1, Ordering::Relaxed);
                log::warn!("coach {} failed: {}", service.name(), e);
            }
        }
    }
}

impl Drop for CoachWorker {
    fn drop(&mut self) {
        self.stop_and_wait();
    }
}
