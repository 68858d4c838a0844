//! # Memory: checkpointing
//!
//! [`Checkpointer`] persists opaque per-thread state snapshots keyed by a
//! monotonically increasing sequence number. The agent runner owns
//! serialization: it writes [`crate::state::ThreadState`] as JSON bytes
//! after every turn and reads the latest bytes back before the next one.
//!
//! | Type            | Persistence | Use case                |
//! |-----------------|-------------|--------------------------|
//! | [`MemorySaver`]  | In-memory   | Dev, tests               |
//! | [`SqliteSaver`]  | SQLite file | Single-node, production  |

mod checkpointer;
mod memory_saver;
mod sqlite_saver;

pub use checkpointer::{CheckpointError, CheckpointRecord, Checkpointer};
pub use memory_saver::MemorySaver;
pub use sqlite_saver::SqliteSaver;
