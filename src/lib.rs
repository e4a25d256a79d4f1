//! Crash-safe Snowflake-style 64-bit identifier generation.
//!
//! A [`CheckpointedGenerator`] packs a timestamp, a node id, and a
//! per-millisecond sequence into a single atomic 64-bit register and issues
//! identifiers with one lock-free fetch-and-add. Every issued value is
//! synchronously written to a [`CheckpointStore`] so that a restarted
//! instance resumes just past the last identifier it handed out, never
//! reissuing one. A background time-advancer thread keeps the timestamp
//! field aligned with the wall clock and resets the sequence each
//! millisecond.

mod error;
mod generator;
mod id;
mod store;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::store::*;
pub use crate::time::*;
