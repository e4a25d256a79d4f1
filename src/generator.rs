use crate::{CUSTOM_EPOCH, CheckpointStore, PermafrostId, Result, TimeSource, WallClock};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};
use tracing::{debug, instrument, trace};

/// The node-id field in its packed position within the register word.
const NODE_FIELD_MASK: u64 = PermafrostId::NODE_ID_MASK << PermafrostId::NODE_ID_SHIFT;

/// How often the time advancer re-checks the wall clock. The timestamp
/// field has millisecond granularity, so ticking faster is wasted work.
const TICK_INTERVAL: Duration = Duration::from_millis(1);

/// A crash-safe, lock-free unique identifier generator.
///
/// The generator keeps its entire state in one [`AtomicU64`] register whose
/// bits follow the [`PermafrostId`] layout. Issuing an identifier is a
/// single `fetch_add(1)`: because the sequence occupies the least
/// significant bits, the increment walks the sequence within the current
/// millisecond and every fetched value is distinct under any number of
/// concurrent callers.
///
/// Two collaborators complete the picture:
///
/// - A **time advancer** thread, spawned at construction and one per
///   generator, periodically rewrites the register's timestamp bits when
///   the wall clock has moved, resetting the sequence for the new
///   millisecond. It is stopped by [`close`](Self::close) or by dropping
///   the generator.
/// - A [`CheckpointStore`], which durably records every issued value
///   before `next_id` returns it. After an unclean restart, a new
///   generator over the same store resumes one past the checkpoint and
///   never reissues an identifier.
///
/// Cross-instance uniqueness rests solely on the 10-bit node id: instances
/// sharing an identifier space must be configured with distinct node ids.
///
/// # Capacity
///
/// The 8-bit sequence allows 256 identifiers per millisecond per node.
/// Beyond that, the increment carries into the node-id bits and the
/// uniqueness guarantee is lost. This is a documented throughput ceiling,
/// not a detected error.
///
/// # Example
///
/// ```
/// use permafrost::{CheckpointedGenerator, MemoryCheckpointStore};
///
/// let store = MemoryCheckpointStore::new();
/// let generator = CheckpointedGenerator::with_wall_clock(store, 0).unwrap();
/// let id = generator.next_id().unwrap();
/// assert_eq!(id.node_id(), 0);
/// ```
pub struct CheckpointedGenerator<S> {
    register: Arc<AtomicU64>,
    store: S,
    stop: Arc<AtomicBool>,
    advancer: Option<JoinHandle<()>>,
}

impl<S> CheckpointedGenerator<S>
where
    S: CheckpointStore,
{
    /// Creates a generator over the system wall clock.
    pub fn with_wall_clock(store: S, node_id: u64) -> Result<Self> {
        Self::new(WallClock, store, node_id)
    }

    /// Creates a generator from a clock source, a checkpoint store, and a
    /// node identifier.
    ///
    /// The node id is masked to 10 bits; any higher bits are silently
    /// discarded. If the store holds a checkpoint, the register resumes at
    /// `checkpoint + 1` — the raw counter simply continues, so the
    /// embedded timestamp and node-id bits come from the old value and may
    /// be stale until the advancer's next tick. Otherwise the register
    /// starts fresh from the current time with sequence 0.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`](crate::Error::Persistence) if
    /// loading the checkpoint fails. "Never written" is not a failure.
    pub fn new<T>(clock: T, store: S, node_id: u64) -> Result<Self>
    where
        T: TimeSource + Send + 'static,
    {
        let node_id = node_id & PermafrostId::NODE_ID_MASK;

        let initial = match store.load()? {
            Some(checkpoint) => {
                let resumed = checkpoint.wrapping_add(1);
                debug!(checkpoint, resumed, "resuming register from checkpoint");
                resumed
            }
            None => {
                let timestamp = since_custom_epoch(clock.current_millis());
                let fresh = PermafrostId::from_parts(timestamp, node_id, 0);
                debug!(timestamp, node_id, "initializing fresh register");
                fresh.to_raw()
            }
        };

        let register = Arc::new(AtomicU64::new(initial));
        let stop = Arc::new(AtomicBool::new(false));
        let advancer = spawn_advancer(clock, Arc::clone(&register), Arc::clone(&stop));

        Ok(Self {
            register,
            store,
            stop,
            advancer: Some(advancer),
        })
    }

    /// Issues the next identifier.
    ///
    /// Atomically increments the register by exactly one and returns the
    /// fetched value; the register afterwards holds `issued + 1`, which is
    /// also why a resumed register seeded at `checkpoint + 1` hands out
    /// `checkpoint + 1` first. Before returning, the issued value is
    /// synchronously persisted so the caller never observes an identifier
    /// that could be reissued after a crash.
    ///
    /// # Errors
    ///
    /// Propagates a persistence failure from the checkpoint store. The
    /// in-memory register has already advanced by then: the identifier is
    /// burned, never reissued, and never returned. Calling again issues
    /// the next value.
    #[instrument(level = "trace", skip(self))]
    pub fn next_id(&self) -> Result<PermafrostId> {
        let issued = self.register.fetch_add(1, Ordering::Relaxed);
        self.store.persist(issued)?;
        Ok(PermafrostId::from_raw(issued))
    }
}

impl<S> CheckpointedGenerator<S> {
    /// Stops the time advancer and waits for it to finish.
    ///
    /// Idempotent, and also run on drop so the thread stops on every exit
    /// path. In-flight `next_id` calls on other threads are not cancelled;
    /// issuing new identifiers after `close` is unsupported.
    pub fn close(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.advancer.take() {
            let _ = handle.join();
            debug!("time advancer stopped");
        }
    }
}

impl<S> Drop for CheckpointedGenerator<S> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Converts wall-clock Unix milliseconds to the identifier's epoch.
///
/// A clock before the custom epoch clamps to 0; that is a misconfigured
/// deployment, not an error the generator detects.
fn since_custom_epoch(unix_millis: u64) -> u64 {
    unix_millis.saturating_sub(CUSTOM_EPOCH.as_millis() as u64)
}

/// Spawns the time advancer: a periodic task tied to the generator's
/// lifetime that keeps the register's timestamp fresh.
///
/// On each tick it reads the clock and, only if time moved strictly
/// forward, rewrites the register in a single atomic read-modify-write:
/// the node-id bits of the old word are kept, the new timestamp is
/// installed, and the sequence implicitly resets to 0 because no old
/// sequence bits are merged. Racing `next_id` calls linearize before or
/// after the rewrite; either way the register holds exactly one winner,
/// never a torn mix.
///
/// A backward clock jump trips a `debug_assert` in debug builds; release
/// builds ignore it and resume advancing once real time catches back up.
fn spawn_advancer<T>(clock: T, register: Arc<AtomicU64>, stop: Arc<AtomicBool>) -> JoinHandle<()>
where
    T: TimeSource + Send + 'static,
{
    thread::spawn(move || {
        let mut last_known = clock.current_millis();

        while !stop.load(Ordering::Acquire) {
            let now = clock.current_millis();
            debug_assert!(last_known <= now, "wall clock moved backwards");
            if now > last_known {
                let timestamp_bits = PermafrostId::from_parts(since_custom_epoch(now), 0, 0);
                let _ = register.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |old| {
                    Some((old & NODE_FIELD_MASK) | timestamp_bits.to_raw())
                });
                trace!(now, "register timestamp advanced");
                last_known = now;
            }
            thread::sleep(TICK_INTERVAL);
        }
    })
}
