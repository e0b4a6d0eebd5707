/// Processing Strategy Contract
///
/// Every consumer of the generated feed implements this trait; the producer
/// only ever sees `dyn ProcessingStrategy`. Swapping implementations under
/// an identical workload is the comparison this crate exists to run.
///
/// ## Contract
/// - `on_data_available` accepts one ordered batch and may block while the
///   strategy is behind — blocking is the backpressure offered to the
///   producer, not an error. Payloads within one call are never lost or
///   reordered.
/// - `running_information` is a cheap status snapshot, safe to call from
///   any observer thread at any cadence, never blocking the processing path.
/// - `shutdown_and_join` signals the strategy's worker(s) and waits for
///   them; a second call is lifecycle misuse and panics.

pub mod naive;
pub mod pooled;

pub use naive::NaiveStrategy;
pub use pooled::{PoolConfig, PooledStrategy};

/// Contract between the feed producer and any processing strategy.
pub trait ProcessingStrategy: Send + Sync {
    /// Hands one ordered batch of encoded messages to the strategy.
    ///
    /// May block while the strategy's intake is at capacity. Safe for
    /// concurrent callers, though ordering across callers is unspecified;
    /// a single caller is the supported mode when order matters.
    fn on_data_available(&self, batch: Vec<String>);

    /// Human-readable status snapshot for display.
    fn running_information(&self) -> String;

    /// Signals the strategy's worker(s) and waits for them to exit.
    ///
    /// # Panics
    /// Panics if called twice.
    fn shutdown_and_join(&self);
}
