/// Concurrency-safe collections for the feed pipeline
///
/// - BoundedQueue: condition-variable bounded FIFO carrying producer backpressure

pub mod bounded_queue;

pub use bounded_queue::BoundedQueue;
