//! Shutdown coordination for the signer.
//!
//! Two things have to stop in order: the HTTP listener, then any signing job
//! that outlived its caller. A job that has reached the node keeps running
//! after its HTTP request is gone, so the process waits for [`InFlight`] to
//! reach zero (bounded by a grace period) before exiting.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};

/// Coordinator for graceful shutdown.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the stop signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Tell every subscriber to stop accepting work.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Wait for detached signing jobs, at most `grace`.
    ///
    /// Returns `false` when jobs were still running at the deadline.
    pub async fn drain(&self, jobs: &InFlight, grace: Duration) -> bool {
        let pending = jobs.count();
        if pending == 0 {
            return true;
        }
        tracing::info!(pending, grace_secs = grace.as_secs(), "Waiting for in-flight signing jobs");

        match tokio::time::timeout(grace, jobs.wait_idle()).await {
            Ok(()) => {
                tracing::info!("In-flight signing jobs finished");
                true
            }
            Err(_) => {
                tracing::error!(
                    pending = jobs.count(),
                    "Grace period elapsed with signing jobs still running; their outcome is unknown"
                );
                false
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Count of signing jobs currently running.
#[derive(Debug, Clone)]
pub struct InFlight {
    count: Arc<watch::Sender<usize>>,
}

impl InFlight {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { count: Arc::new(tx) }
    }

    /// Register a job; it counts until the guard drops.
    pub fn start(&self) -> JobGuard {
        self.count.send_modify(|n| *n += 1);
        JobGuard {
            count: self.count.clone(),
        }
    }

    pub fn count(&self) -> usize {
        *self.count.borrow()
    }

    /// Resolves once no job is running.
    pub async fn wait_idle(&self) {
        let mut rx = self.count.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for InFlight {
    fn default() -> Self {
        Self::new()
    }
}

/// Marks one running job.
#[derive(Debug)]
pub struct JobGuard {
    count: Arc<watch::Sender<usize>>,
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        self.count.send_modify(|n| *n = n.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_subscribers() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.subscribe();

        shutdown.trigger();
        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }

    #[test]
    fn test_job_guard_counts() {
        let jobs = InFlight::new();
        let first = jobs.start();
        let second = jobs.start();
        assert_eq!(jobs.count(), 2);
        drop(first);
        assert_eq!(jobs.count(), 1);
        drop(second);
        assert_eq!(jobs.count(), 0);
    }

    #[tokio::test]
    async fn test_drain_waits_for_running_job() {
        let jobs = InFlight::new();
        let guard = jobs.start();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(guard);
        });

        assert!(Shutdown::new().drain(&jobs, Duration::from_secs(5)).await);
        assert_eq!(jobs.count(), 0);
    }

    #[tokio::test]
    async fn test_drain_gives_up_after_grace() {
        let jobs = InFlight::new();
        let _stuck = jobs.start();
        assert!(!Shutdown::new().drain(&jobs, Duration::from_millis(20)).await);
        assert_eq!(jobs.count(), 1);
    }

    #[tokio::test]
    async fn test_drain_with_nothing_running() {
        assert!(Shutdown::new().drain(&InFlight::new(), Duration::ZERO).await);
    }
}
