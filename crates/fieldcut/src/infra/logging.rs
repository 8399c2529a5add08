//! Tracing subscriber setup. Diagnostics always go to stderr so stdout carries only cut output.

use tracing::Level;

/// Map the number of `-v` flags to a maximum log level, starting at warn.
pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(verbosity: u8) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level_for(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
