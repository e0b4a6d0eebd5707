/// Interfaces Layer - External Entry Points
///
/// This layer contains the external interfaces to the benchmark.
///
/// ## Modules
/// - `cli`: Command-line interface (main.rs logic)

pub mod cli;
