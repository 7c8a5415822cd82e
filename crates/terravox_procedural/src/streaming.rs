//! # Chunk Streamer
//!
//! Fixed worker pool fed by a bounded request queue.
//!
//! ## Threading Model
//!
//! ```text
//! submit() ──► [request queue] ──► worker 0 ─┐
//!                                 worker 1 ─┼─► [outcome queue] ──► caller
//!                                 worker N ─┘
//! ```
//!
//! Workers populate their own buffers with no locking. Only the commit and
//! the vegetation pass take the shared world's mutex. A fill that has
//! started always runs to completion; shutdown drains the queue first.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::chunk::{ChunkFillRequest, ChunkId};
use crate::error::{GenError, GenResult};
use crate::generator::{FillSummary, WorldGenerator};
use crate::world::VoxelWorld;

/// Worker pool sizing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Worker threads.
    pub workers: usize,
    /// Pending requests before `submit` blocks.
    pub queue_capacity: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 256,
        }
    }
}

/// Outcome of one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FillOutcome {
    /// Request id.
    pub id: ChunkId,
    /// Commit summary or the reason nothing was committed.
    pub result: GenResult<FillSummary>,
}

/// Lock-free counters.
#[derive(Debug, Default)]
pub struct StreamStats {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    trees: AtomicU64,
}

/// Point-in-time copy of [`StreamStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStatsSnapshot {
    /// Requests accepted by `submit`.
    pub submitted: u64,
    /// Requests committed.
    pub completed: u64,
    /// Requests rejected.
    pub failed: u64,
    /// Trees grown across all chunks.
    pub trees: u64,
}

impl StreamStats {
    /// Copies the counters.
    #[must_use]
    pub fn snapshot(&self) -> StreamStatsSnapshot {
        StreamStatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            trees: self.trees.load(Ordering::Relaxed),
        }
    }

    fn record(&self, result: &GenResult<FillSummary>) {
        match result {
            Ok(summary) => {
                self.completed.fetch_add(1, Ordering::Relaxed);
                let trees = summary.vegetation.as_ref().map_or(0, |v| v.trees.len());
                self.trees.fetch_add(trees as u64, Ordering::Relaxed);
            }
            Err(_) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Concurrent chunk filler over a shared world.
pub struct ChunkStreamer<W: VoxelWorld + Send + 'static> {
    requests: Option<Sender<ChunkFillRequest>>,
    outcomes: Receiver<FillOutcome>,
    workers: Vec<JoinHandle<()>>,
    stats: Arc<StreamStats>,
    world: Arc<Mutex<W>>,
}

impl<W: VoxelWorld + Send + 'static> ChunkStreamer<W> {
    /// Starts the worker pool.
    #[must_use]
    pub fn spawn(
        generator: Arc<WorldGenerator>,
        world: Arc<Mutex<W>>,
        config: &StreamingConfig,
    ) -> Self {
        let (request_tx, request_rx) = bounded::<ChunkFillRequest>(config.queue_capacity.max(1));
        let (outcome_tx, outcome_rx) = unbounded::<FillOutcome>();
        let stats = Arc::new(StreamStats::default());

        let worker_count = config.workers.max(1);
        let workers = (0..worker_count)
            .map(|index| {
                let requests = request_rx.clone();
                let outcomes = outcome_tx.clone();
                let generator = Arc::clone(&generator);
                let world = Arc::clone(&world);
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    Self::worker_loop(index, &requests, &outcomes, &generator, &world, &stats);
                })
            })
            .collect();

        tracing::info!("chunk streamer started with {} workers", worker_count);

        Self {
            requests: Some(request_tx),
            outcomes: outcome_rx,
            workers,
            stats,
            world,
        }
    }

    fn worker_loop(
        index: usize,
        requests: &Receiver<ChunkFillRequest>,
        outcomes: &Sender<FillOutcome>,
        generator: &WorldGenerator,
        world: &Mutex<W>,
        stats: &StreamStats,
    ) {
        for request in requests {
            let result = generator.fill_chunk_shared(&request, world);
            if let Err(err) = &result {
                tracing::warn!("worker {} rejected chunk {:?}: {}", index, request.id, err);
            }
            stats.record(&result);

            // Nobody listening is fine; the world already has the chunk
            let _ = outcomes.send(FillOutcome {
                id: request.id,
                result,
            });
        }
        tracing::debug!("worker {} exiting", index);
    }

    /// Queues a request, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::StreamerClosed`] after shutdown.
    pub fn submit(&self, request: ChunkFillRequest) -> GenResult<()> {
        let sender = self.requests.as_ref().ok_or(GenError::StreamerClosed)?;
        sender.send(request).map_err(|_| GenError::StreamerClosed)?;
        self.stats.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Outcome queue, for callers that want to select over it.
    #[must_use]
    pub fn outcomes(&self) -> &Receiver<FillOutcome> {
        &self.outcomes
    }

    /// Blocks for the next outcome. `None` once every worker has exited
    /// and the queue is empty.
    #[must_use]
    pub fn recv(&self) -> Option<FillOutcome> {
        self.outcomes.recv().ok()
    }

    /// Counters.
    #[must_use]
    pub fn stats(&self) -> StreamStatsSnapshot {
        self.stats.snapshot()
    }

    /// The shared world.
    #[must_use]
    pub fn world(&self) -> &Arc<Mutex<W>> {
        &self.world
    }

    fn stop(&mut self) {
        // Closing the queue lets workers finish what is queued, then exit
        self.requests.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("chunk worker panicked");
            }
        }
    }

    /// Finishes queued work, stops the workers and returns unread outcomes.
    #[must_use]
    pub fn shutdown(mut self) -> Vec<FillOutcome> {
        self.stop();
        let remaining: Vec<_> = self.outcomes.try_iter().collect();
        tracing::info!(
            "chunk streamer stopped: {:?}, {} outcomes unread",
            self.stats.snapshot(),
            remaining.len()
        );
        remaining
    }
}

impl<W: VoxelWorld + Send + 'static> Drop for ChunkStreamer<W> {
    fn drop(&mut self) {
        self.stop();
    }
}
