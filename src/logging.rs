use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install the global tracing subscriber: INFO by default, DEBUG when
/// `--verbose` is set.
pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok(); // Ignore err when already set
}
