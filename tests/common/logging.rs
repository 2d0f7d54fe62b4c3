use std::sync::Once;

use log::LevelFilter;

static LOGGER_INIT: Once = Once::new();

// Set up a logger that logs all log messages with level Trace and above.
pub(crate) fn setup_logger(level: LevelFilter) {
    LOGGER_INIT.call_once(|| {
        // Another test binary's logger can't clash with ours, but ignore the error all the same.
        let _ = shard_pbft::logging::setup_logger(level, None);
    })
}
