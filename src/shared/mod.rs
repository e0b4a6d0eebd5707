/// Shared utilities and types used across all layers
///
/// This module contains:
/// - Wire protocol (FIX-style tag=value framing, checksum, decode)
/// - Active object lifecycle (named worker thread + cooperative shutdown)
/// - Common data structures (bounded blocking queue)

pub mod active_object;
pub mod collections;
pub mod protocol;

// Re-export commonly used types
pub use active_object::{ActiveObject, ShutdownSignal};
pub use collections::BoundedQueue;
pub use protocol::{FixCodec, FixError, FixFields, Side};
