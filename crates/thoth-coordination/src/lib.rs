//! thoth-coordination — the agent message queue (spec §4.7), a
//! shared, lock-serialized inbox agents use to hand off work. Grounded
//! directly on `message_queue.py`: the same five-line record grammar,
//! the same block-splitting-on-`---` parse, the same placeholder and
//! compaction behavior. The file-locking discipline is borrowed from
//! the file-tracking ledger's `with_lock`/temp-file-then-rename
//! pattern, behind a `StorageBackend` seam so a non-file-backed queue
//! could be substituted later without touching [`MessageQueue`].

pub mod error;
pub mod queue;
pub mod record;
pub mod storage;

pub use error::{CoordinationError, Result};
pub use queue::MessageQueue;
pub use record::{Message, Priority, Status};
pub use storage::{FileBackend, StorageBackend};
