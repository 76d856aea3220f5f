//! Process-wide table from compilation identity to its skeleton build.
//!
//! Many per-unit caches can point at the same compilation object: forks of a
//! unit that did not change semantics keep the same compilation, and several
//! downstream units can reference one upstream unit. The table makes sure the
//! expensive emission runs at most once per compilation no matter how many of
//! them ask, and that concurrent askers all wait on the same build.
//!
//! Entries hold the compilation weakly. Once nothing else holds the compilation
//! the entry is purged by the next insert, `len` or `purge`, dropping the
//! table's share of the artifact.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::artifact::SkeletonArtifact;
use crate::compilation::{identity_of, Compilation};
use crate::error::{CacheError, CacheResult};

/// Result of one build attempt, as observed by every waiter.
#[derive(Clone)]
enum BuildOutcome {
    Built(Option<Arc<SkeletonArtifact>>),
    Cancelled,
}

type SharedBuild = Shared<BoxFuture<'static, BuildOutcome>>;

enum SlotState {
    Idle,
    Building {
        generation: u64,
        task: SharedBuild,
        cancel: CancellationToken,
        waiters: usize,
    },
    Done(Option<Arc<SkeletonArtifact>>),
}

struct SlotInner {
    state: SlotState,
    next_generation: u64,
}

/// The memoized build for one compilation.
struct BuildSlot {
    inner: Mutex<SlotInner>,
}

impl BuildSlot {
    fn new() -> Self {
        Self {
            inner: Mutex::new(SlotInner {
                state: SlotState::Idle,
                next_generation: 0,
            }),
        }
    }

    /// Waits for this slot's build, starting one if none is running.
    async fn join<F>(
        &self,
        compilation: &Arc<dyn Compilation>,
        build: F,
        cancel: &CancellationToken,
    ) -> CacheResult<Option<Arc<SkeletonArtifact>>>
    where
        F: Fn(Arc<dyn Compilation>, CancellationToken) -> CacheResult<Option<Arc<SkeletonArtifact>>>
            + Clone
            + Send
            + 'static,
    {
        loop {
            if cancel.is_cancelled() {
                return Err(CacheError::Cancelled);
            }

            let (generation, task) = {
                let mut guard = self.inner.lock();
                let inner = &mut *guard;
                match &mut inner.state {
                    SlotState::Done(artifact) => return Ok(artifact.clone()),
                    SlotState::Building {
                        generation,
                        task,
                        waiters,
                        ..
                    } => {
                        *waiters += 1;
                        (*generation, task.clone())
                    }
                    SlotState::Idle => {
                        let generation = inner.next_generation;
                        inner.next_generation += 1;
                        let token = CancellationToken::new();
                        let task = spawn_build(Arc::clone(compilation), build.clone(), token.clone());
                        inner.state = SlotState::Building {
                            generation,
                            task: task.clone(),
                            cancel: token,
                            waiters: 1,
                        };
                        (generation, task)
                    }
                }
            };

            let mut waiter = Waiter {
                slot: self,
                generation,
                finished: false,
            };
            let outcome = tokio::select! {
                biased;
                outcome = task => outcome,
                _ = cancel.cancelled() => return Err(CacheError::Cancelled),
            };
            waiter.finished = true;
            self.complete(generation, &outcome);

            match outcome {
                BuildOutcome::Built(artifact) => return Ok(artifact),
                // Every earlier waiter left and the build honored its token.
                // Start over; the slot is idle again.
                BuildOutcome::Cancelled => continue,
            }
        }
    }

    fn complete(&self, generation: u64, outcome: &BuildOutcome) {
        let mut inner = self.inner.lock();
        let current = match &inner.state {
            SlotState::Building { generation, .. } => *generation,
            _ => return,
        };
        if current != generation {
            return;
        }
        inner.state = match outcome {
            BuildOutcome::Built(artifact) => SlotState::Done(artifact.clone()),
            BuildOutcome::Cancelled => SlotState::Idle,
        };
    }

    /// Drops one waiter. When the last one leaves, the build is asked to stop,
    /// but the slot keeps it: a build that finishes anyway is still adopted by
    /// the next caller, and one that stops resets the slot through `complete`.
    fn detach(&self, generation: u64) {
        let mut inner = self.inner.lock();
        if let SlotState::Building {
            generation: current,
            task,
            cancel,
            waiters,
        } = &mut inner.state
        {
            if *current != generation {
                return;
            }
            *waiters -= 1;
            if *waiters > 0 {
                return;
            }
            let next = match task.peek() {
                Some(BuildOutcome::Built(artifact)) => SlotState::Done(artifact.clone()),
                Some(BuildOutcome::Cancelled) => SlotState::Idle,
                None => {
                    debug!(generation, "last waiter left, cancelling skeleton build");
                    cancel.cancel();
                    return;
                }
            };
            inner.state = next;
        }
    }

    fn is_done(&self) -> bool {
        matches!(self.inner.lock().state, SlotState::Done(_))
    }
}

/// Registration of one waiter on an in-flight build. Dropping it before the
/// build finishes detaches the waiter.
struct Waiter<'a> {
    slot: &'a BuildSlot,
    generation: u64,
    finished: bool,
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.slot.detach(self.generation);
        }
    }
}

/// Runs `build` on the blocking pool and exposes its outcome to any number of
/// waiters.
fn spawn_build<F>(compilation: Arc<dyn Compilation>, build: F, cancel: CancellationToken) -> SharedBuild
where
    F: FnOnce(Arc<dyn Compilation>, CancellationToken) -> CacheResult<Option<Arc<SkeletonArtifact>>>
        + Send
        + 'static,
{
    let handle = tokio::task::spawn_blocking(move || build(compilation, cancel));
    async move {
        match handle.await {
            Ok(Ok(artifact)) => BuildOutcome::Built(artifact),
            Ok(Err(CacheError::Cancelled)) => BuildOutcome::Cancelled,
            Ok(Err(err)) => {
                warn!(%err, "skeleton build failed");
                BuildOutcome::Built(None)
            }
            Err(err) => {
                error!(%err, "skeleton build panicked");
                BuildOutcome::Built(None)
            }
        }
    }
    .boxed()
    .shared()
}

struct TableEntry {
    key: Weak<dyn Compilation>,
    slot: Arc<BuildSlot>,
}

/// Identity-keyed, weakly-held map from compilation to skeleton build.
///
/// The allocation behind a purged-but-not-yet-removed key cannot be reused by
/// another compilation while the entry's `Weak` still points at it, so an
/// address never aliases two compilations.
#[derive(Default)]
pub struct SkeletonTable {
    entries: Mutex<HashMap<usize, TableEntry>>,
}

impl SkeletonTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide table shared by every service that does not bring its own.
    pub fn global() -> Arc<SkeletonTable> {
        static GLOBAL: OnceLock<Arc<SkeletonTable>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(SkeletonTable::new())))
    }

    /// Returns the skeleton for `compilation`, running `build` if no build for
    /// this compilation has completed or is in flight.
    ///
    /// `build` runs on tokio's blocking pool. Cancelling `cancel` detaches this
    /// caller only; the build itself is cancelled once every caller waiting on
    /// it has detached, after which a later call starts a fresh one.
    pub async fn get_or_create<F>(
        &self,
        compilation: &Arc<dyn Compilation>,
        build: F,
        cancel: &CancellationToken,
    ) -> CacheResult<Option<Arc<SkeletonArtifact>>>
    where
        F: Fn(Arc<dyn Compilation>, CancellationToken) -> CacheResult<Option<Arc<SkeletonArtifact>>>
            + Clone
            + Send
            + 'static,
    {
        let slot = self.slot_for(compilation);
        slot.join(compilation, build, cancel).await
    }

    fn slot_for(&self, compilation: &Arc<dyn Compilation>) -> Arc<BuildSlot> {
        let id = identity_of(compilation);
        let mut entries = self.entries.lock();
        // A live entry at this address is this compilation: the entry's `Weak`
        // pins the allocation.
        if let Some(entry) = entries.get(&id) {
            if entry.key.strong_count() > 0 {
                return Arc::clone(&entry.slot);
            }
        }
        // Only inserts pay for the sweep.
        purge_collected(&mut entries);
        let slot = Arc::new(BuildSlot::new());
        entries.insert(
            id,
            TableEntry {
                key: Arc::downgrade(compilation),
                slot: Arc::clone(&slot),
            },
        );
        slot
    }

    /// Removes entries whose compilation is gone. Returns how many were removed.
    pub fn purge(&self) -> usize {
        purge_collected(&mut self.entries.lock())
    }

    /// Number of entries for live compilations.
    pub fn len(&self) -> usize {
        let mut entries = self.entries.lock();
        purge_collected(&mut entries);
        entries.len()
    }

    /// Returns `true` if no live compilation has an entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `compilation` has a finished build in the table.
    pub fn contains(&self, compilation: &Arc<dyn Compilation>) -> bool {
        self.entries
            .lock()
            .get(&identity_of(compilation))
            .is_some_and(|entry| entry.key.strong_count() > 0 && entry.slot.is_done())
    }
}

fn purge_collected(entries: &mut HashMap<usize, TableEntry>) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| entry.key.strong_count() > 0);
    let removed = before - entries.len();
    if removed > 0 {
        debug!(removed, "purged skeleton entries for collected compilations");
    }
    removed
}
