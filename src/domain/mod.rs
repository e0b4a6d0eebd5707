/// Domain Layer - Core Business Logic
///
/// The heart of the feed generator: order lifecycle and event sequencing,
/// free of threads and I/O. Everything here runs single-threaded inside
/// the producer worker and can be tested in isolation.
///
/// ## Modules
/// - `order`: the open-order entity and its five lifecycle transitions
/// - `generator`: the stateful sequencer deciding which event comes next
///
/// ## Principles
/// 1. **Pure Business Logic**: no I/O, no threads, no framework types
/// 2. **Deterministic**: seeded randomness, replayable event streams
/// 3. **Loud Failures**: contract violations panic instead of clamping

pub mod generator;
pub mod order;

// Re-export key types
pub use generator::{EventKind, FeedEvent, GeneratorConfig, GeneratorState};
pub use order::OpenOrder;
