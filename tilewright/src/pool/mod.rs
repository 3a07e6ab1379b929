//! Bounded-concurrency worker pool.
//!
//! Every pipeline stage funnels its pre-enumerated jobs through a
//! [`WorkerPool`]: a fixed number of workers drain one shared queue, apply
//! the stage's processing function, and emit one [`ResultMessage`] per job
//! on a completion channel.
//!
//! # Architecture
//!
//! ```text
//! jobs (VecDeque) ──► worker 0 ─┐
//!                 ──► worker 1 ─┼──► mpsc ──► drained by the driver
//!                 ──► worker W ─┘
//! ```
//!
//! Workers run on blocking threads because every stage function blocks
//! (file I/O, subprocess, network fetch). Contracts:
//!
//! - every job is handed to exactly one worker, exactly once
//! - no ordering guarantee between jobs or between result messages
//! - a stage failure is encoded into the message text; it is never retried
//!   and never aborts the pool
//! - the pool resolves once the queue is drained and all workers have exited
//!
//! Cancellation is cooperative: a triggered [`CancellationToken`] stops
//! workers from dequeuing further jobs but never interrupts the job in
//! flight.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Capacity of the result channel; workers park once the driver falls this
/// far behind.
const RESULT_CHANNEL_CAPACITY: usize = 64;

/// Human-readable outcome of one processed job.
///
/// Ordering across messages is not guaranteed. Failures are reported in the
/// message text; they carry no dedicated variant so that a stage can only
/// ever fail a single job, never the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultMessage {
    /// What was processed, usually a tile path or coordinate.
    pub subject: String,
    /// Outcome text, either a status or an error rendering.
    pub message: String,
}

impl ResultMessage {
    /// Creates a result message.
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ResultMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

/// Errors that can occur when configuring a worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The pool needs at least one worker.
    #[error("worker pool requires at least one worker")]
    NoWorkers,
}

/// Fixed-width pool of blocking workers over a shared job queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    width: usize,
}

impl WorkerPool {
    /// Creates a pool with `width` concurrent workers.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::NoWorkers` when `width` is zero.
    pub fn new(width: usize) -> Result<Self, PoolError> {
        if width == 0 {
            return Err(PoolError::NoWorkers);
        }
        Ok(Self { width })
    }

    /// Number of concurrent workers.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Runs every job to completion and collects the result messages.
    ///
    /// Convenience wrapper over [`WorkerPool::run_until_cancelled`] with a
    /// token that never fires.
    pub async fn run<J, F>(&self, jobs: Vec<J>, process: F) -> Vec<ResultMessage>
    where
        J: Send + 'static,
        F: Fn(J) -> ResultMessage + Send + Sync + 'static,
    {
        self
            .run_until_cancelled(jobs, process, CancellationToken::new())
            .await
    }

    /// Runs jobs until the queue is empty or `shutdown` is triggered.
    ///
    /// Each worker loops: pop a job, apply `process`, send the result.
    /// `process` must map its own failures into the returned message; a
    /// panicking stage function loses that job's message and is logged.
    ///
    /// # Returns
    ///
    /// One message per processed job, in completion order.
    pub async fn run_until_cancelled<J, F>(
        &self,
        jobs: Vec<J>,
        process: F,
        shutdown: CancellationToken,
    ) -> Vec<ResultMessage>
    where
        J: Send + 'static,
        F: Fn(J) -> ResultMessage + Send + Sync + 'static,
    {
        let total = jobs.len();
        let queue = Arc::new(Mutex::new(VecDeque::from(jobs)));
        let process = Arc::new(process);
        let (result_tx, mut result_rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);

        let mut workers = Vec::with_capacity(self.width);
        for worker_id in 0..self.width {
            let queue = Arc::clone(&queue);
            let process = Arc::clone(&process);
            let result_tx = result_tx.clone();
            let shutdown = shutdown.clone();

            workers.push(tokio::task::spawn_blocking(move || {
                loop {
                    if shutdown.is_cancelled() {
                        debug!(worker_id, "worker stopping: cancellation requested");
                        break;
                    }
                    let Some(job) = queue.lock().pop_front() else {
                        break;
                    };
                    let result = process(job);
                    if result_tx.blocking_send(result).is_err() {
                        // Driver dropped the receiver; nothing left to report to.
                        break;
                    }
                }
            }));
        }
        // Workers hold the remaining senders; the channel closes when the
        // last worker exits.
        drop(result_tx);

        let mut results = Vec::with_capacity(total);
        while let Some(message) = result_rx.recv().await {
            debug!(%message, "job finished");
            results.push(message);
        }

        for worker in workers {
            if let Err(join_error) = worker.await {
                error!(%join_error, "worker terminated abnormally");
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_every_job_yields_one_message() {
        let pool = WorkerPool::new(4).unwrap();
        let jobs: Vec<u32> = (0..100).collect();

        let results = pool
            .run(jobs, |job| ResultMessage::new(job.to_string(), "done"))
            .await;

        assert_eq!(results.len(), 100);
        let subjects: HashSet<_> = results.iter().map(|r| r.subject.clone()).collect();
        assert_eq!(subjects.len(), 100, "each message maps to a distinct job");
    }

    #[tokio::test]
    async fn test_single_worker_processes_everything() {
        let pool = WorkerPool::new(1).unwrap();
        let results = pool
            .run((0..17).collect(), |job: u32| {
                ResultMessage::new(job.to_string(), "done")
            })
            .await;
        assert_eq!(results.len(), 17);
    }

    #[tokio::test]
    async fn test_more_workers_than_jobs() {
        let pool = WorkerPool::new(16).unwrap();
        let results = pool
            .run(vec![1u32, 2, 3], |job| {
                ResultMessage::new(job.to_string(), "done")
            })
            .await;
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_jobs_processed_exactly_once() {
        let pool = WorkerPool::new(8).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);

        let results = pool
            .run((0..250).collect(), move |job: u32| {
                counter_clone.fetch_add(1, Ordering::SeqCst);
                ResultMessage::new(job.to_string(), "done")
            })
            .await;

        assert_eq!(counter.load(Ordering::SeqCst), 250);
        assert_eq!(results.len(), 250);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_run() {
        let pool = WorkerPool::new(3).unwrap();
        let results = pool
            .run((0..20).collect(), |job: u32| {
                if job % 2 == 0 {
                    ResultMessage::new(job.to_string(), "simulated failure")
                } else {
                    ResultMessage::new(job.to_string(), "done")
                }
            })
            .await;

        assert_eq!(results.len(), 20);
        let failures = results
            .iter()
            .filter(|r| r.message.contains("failure"))
            .count();
        assert_eq!(failures, 10);
    }

    #[tokio::test]
    async fn test_cancellation_stops_dequeuing() {
        let pool = WorkerPool::new(1).unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let results = pool
            .run_until_cancelled(
                (0..1000).collect(),
                |job: u32| {
                    std::thread::sleep(Duration::from_millis(1));
                    ResultMessage::new(job.to_string(), "done")
                },
                token,
            )
            .await;

        // Already-cancelled token: no job is ever dequeued.
        assert!(results.is_empty());
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert_eq!(WorkerPool::new(0), Err(PoolError::NoWorkers));
        assert_eq!(WorkerPool::new(2).unwrap().width(), 2);
    }

    #[test]
    fn test_result_message_display() {
        let msg = ResultMessage::new("18/1/2", "done");
        assert_eq!(msg.to_string(), "18/1/2: done");
    }
}
