//! Logging helpers
//!
//! The logger is installed once, before configuration is loaded, so warnings
//! raised while loading are not lost. The level can be changed afterwards with
//! [`set_log_level`]. `RUST_LOG` wins over both when it is set.

use std::env;

use log::LevelFilter;

/// Initialize the global logger
///
/// # Parameters
///
/// * `level` - Log level used when `RUST_LOG` is not set
pub fn init_logger(level: LevelFilter) {
    // Admit everything here; the effective level is the global max level
    let env = env_logger::Env::default().filter_or("RUST_LOG", "trace");

    // A second initialisation (tests, embedding) is not an error for us
    let _ = env_logger::Builder::from_env(env).try_init();

    set_log_level(level);
}

/// Change the log level of an initialized logger
///
/// Does nothing when `RUST_LOG` is set.
pub fn set_log_level(level: LevelFilter) {
    if env::var_os("RUST_LOG").is_some() {
        return;
    }

    log::set_max_level(level);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_init_logger_twice() {
        init_logger(LevelFilter::Debug);
        init_logger(LevelFilter::Info);
    }

    #[test]
    #[serial]
    fn test_set_log_level() {
        init_logger(LevelFilter::Debug);

        if env::var_os("RUST_LOG").is_none() {
            set_log_level(LevelFilter::Warn);
            assert_eq!(log::max_level(), LevelFilter::Warn);
            set_log_level(LevelFilter::Trace);
            assert_eq!(log::max_level(), LevelFilter::Trace);
        }
    }
}
