/// Application Layer - Feed Production and Processing Strategies
///
/// This layer orchestrates domain logic into the running benchmark: a
/// producer thread drives the event sequencer and hands message batches
/// to a pluggable processing strategy. It depends on the domain layer
/// but knows nothing about the CLI surface.
///
/// ## Modules
/// - `producer`: Batching feed producer (owns the sequencer thread)
/// - `strategies`: The `ProcessingStrategy` contract and its implementations

pub mod producer;
pub mod strategies;

// Re-export key types
pub use producer::{FeedProducer, ProducerStats, DEFAULT_BATCH_SIZE};
pub use strategies::{NaiveStrategy, PoolConfig, PooledStrategy, ProcessingStrategy};
