use crate::Result;
use parking_lot::Mutex;
use std::{
    fs::{File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::Path,
    sync::Arc,
};
use tracing::trace;

/// Durable storage for the last issued identifier.
///
/// The store holds a single overwritable 64-bit slot. The generator writes
/// to it on every issued identifier and reads it once at construction to
/// find its resume point after a restart.
///
/// Implementations must be safe to call from multiple threads without
/// corrupting the slot, must report failures rather than swallow them, and
/// must never retry internally. One store instance belongs to exactly one
/// generator; two generators sharing a slot would trample each other's
/// checkpoints.
pub trait CheckpointStore {
    /// Durably overwrites the slot with `checkpoint`.
    ///
    /// Overwrite semantics, not append: after a successful call, only
    /// `checkpoint` is recoverable.
    fn persist(&self, checkpoint: u64) -> Result<()>;

    /// Returns the last successfully persisted value, or `None` if the
    /// slot was never written.
    ///
    /// A read failure is an `Err`, distinct from `None`.
    fn load(&self) -> Result<Option<u64>>;
}

/// A [`CheckpointStore`] backed by a single file.
///
/// The slot is one big-endian `u64` at offset 0, rewritten in place and
/// flushed to disk before [`persist`](CheckpointStore::persist) returns.
/// The file handle is closed when the store is dropped.
pub struct FileCheckpointStore {
    file: Mutex<File>,
}

impl FileCheckpointStore {
    /// Opens (or creates) the checkpoint file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn persist(&self, checkpoint: u64) -> Result<()> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&checkpoint.to_be_bytes())?;
        // Flush file contents so the checkpoint survives a crash that
        // happens right after `next_id` returns.
        file.sync_data()?;
        trace!(checkpoint, "checkpoint persisted");
        Ok(())
    }

    fn load(&self) -> Result<Option<u64>> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(0))?;
        let mut buf = [0u8; 8];
        match file.read_exact(&mut buf) {
            Ok(()) => Ok(Some(u64::from_be_bytes(buf))),
            // A short or empty file means no checkpoint was ever written.
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// An in-memory [`CheckpointStore`] with no durability.
///
/// Clones share the same slot, which makes restart scenarios easy to model
/// in tests: hand a clone to the first generator, drop it, and construct a
/// second generator over another clone. Also useful for benchmarks and for
/// callers that explicitly opt out of crash recovery.
#[derive(Clone, Default)]
pub struct MemoryCheckpointStore {
    slot: Arc<Mutex<Option<u64>>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn persist(&self, checkpoint: u64) -> Result<()> {
        *self.slot.lock() = Some(checkpoint);
        Ok(())
    }

    fn load(&self) -> Result<Option<u64>> {
        Ok(*self.slot.lock())
    }
}
