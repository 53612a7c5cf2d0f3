//! Log output setup for the binaries.

use chrono::Local;
use log::LevelFilter;
use std::io::Write;

/// Initialise `env_logger`. An explicit `level` wins over `RUST_LOG`;
/// the default is `info`.
pub fn init_logging(level: Option<&str>) {
    let log_level = level
        .and_then(|l| l.parse::<LevelFilter>().ok())
        .or_else(|| std::env::var("RUST_LOG").ok().and_then(|v| v.parse().ok()))
        .unwrap_or(LevelFilter::Info);

    let result = env_logger::Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(buf, "[{} {:5}] {}", Local::now().format("%H:%M:%S"), record.level(), record.args())
        })
        .try_init();

    // A logger may already be installed (e.g. when called twice in tests).
    if result.is_ok() {
        log::debug!("Logger initialized (level: {})", log_level);
    }
}
