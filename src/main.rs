/// Main entry point for the feed benchmark application
///
/// This serves as a thin wrapper that delegates to the interfaces layer.
/// The actual application logic is implemented in `interfaces::cli`.

use feed_generator::interfaces::cli;

fn main() {
    cli::run();
}
