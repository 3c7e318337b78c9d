//! Scan-phase submission pool.
//!
//! Nodes arriving from the upstream parser are fanned out to a small, bounded,
//! thread-based pool whose workers call `submit` on every resolver of a
//! [`ResolverSet`]. This is the multi-producer side of the two-phase protocol:
//! once `finish` returns, every node has been submitted and `resolve` may run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::error::{ReconError, ReconResult};
use crate::resolver::ResolverSet;
use crate::value::PropertyValues;

/// Scan pool configuration.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Number of submitting workers.
    pub workers: usize,
    /// Maximum queued nodes before `submit` blocks.
    pub queue_capacity: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1024,
        }
    }
}

/// Counts gathered by a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Nodes handed to the resolvers.
    pub nodes: u64,
    /// Nodes at least one resolver accepted.
    pub accepted: u64,
}

#[derive(Debug, Default)]
struct Counts {
    nodes: AtomicU64,
    accepted: AtomicU64,
}

/// Worker pool submitting nodes to a resolver set.
pub struct ScanPool {
    tx: Option<Sender<PropertyValues>>,
    workers: Vec<JoinHandle<()>>,
    counts: Arc<Counts>,
}

impl ScanPool {
    /// Starts the workers.
    ///
    /// # Errors
    /// Fails if a worker thread cannot be spawned.
    pub fn start(resolvers: ResolverSet, config: &ScanConfig) -> ReconResult<Self> {
        let workers = config.workers.max(1);
        let queue_capacity = config.queue_capacity.max(1);
        let (tx, rx) = bounded::<PropertyValues>(queue_capacity);
        let counts = Arc::new(Counts::default());

        let mut pool = Self {
            tx: Some(tx),
            workers: Vec::with_capacity(workers),
            counts: Arc::clone(&counts),
        };

        for idx in 0..workers {
            let rx: Receiver<PropertyValues> = rx.clone();
            let resolvers = resolvers.clone();
            let counts = Arc::clone(&counts);
            let handle = thread::Builder::new()
                .name(format!("graph-recon-scan-{idx}"))
                .spawn(move || {
                    while let Ok(node) = rx.recv() {
                        counts.nodes.fetch_add(1, Ordering::Relaxed);
                        if resolvers.submit(&node) {
                            counts.accepted.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                })
                .map_err(|e| ReconError::internal(format!("failed to spawn scan worker: {e}")))?;
            pool.workers.push(handle);
        }

        tracing::debug!(workers, queue_capacity, resolvers = resolvers.len(), "scan pool started");
        Ok(pool)
    }

    /// Queues a node, blocking while the queue is full.
    ///
    /// # Errors
    /// Fails if the workers are gone.
    pub fn submit(&self, node: PropertyValues) -> ReconResult<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| ReconError::internal("scan pool already finished"))?;
        tx.send(node)
            .map_err(|_| ReconError::internal("scan workers disconnected"))
    }

    /// Closes the queue, waits for queued nodes to be submitted, and returns the counts.
    pub fn finish(mut self) -> ScanSummary {
        self.shutdown();
        let summary = ScanSummary {
            nodes: self.counts.nodes.load(Ordering::Relaxed),
            accepted: self.counts.accepted.load(Ordering::Relaxed),
        };
        tracing::info!(nodes = summary.nodes, accepted = summary.accepted, "scan finished");
        summary
    }

    fn shutdown(&mut self) {
        // Workers drain queued nodes, then exit once the channel is closed.
        drop(self.tx.take());
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("scan worker panicked");
            }
        }
    }
}

impl Drop for ScanPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
