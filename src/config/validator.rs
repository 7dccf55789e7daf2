//! Configuration validator

use log::LevelFilter;

use crate::config::defaults::{LOG_LEVEL_STR, LOG_LEVELS};
use crate::config::error::{ConfigError, Result};
use crate::config::types::RelayConfig;

/// Validate the configuration
pub fn validate_config(config: &RelayConfig) -> Result<()> {
    validate_network_settings(config)?;
    validate_general_settings(config)?;
    Ok(())
}

fn validate_network_settings(config: &RelayConfig) -> Result<()> {
    // Dialing our own listener would loop every byte back to us
    if config.listen() == config.upstream() {
        return Err(ConfigError::InvalidCombination(
            "Listen and upstream addresses must be different".to_string(),
        ));
    }

    Ok(())
}

fn validate_general_settings(config: &RelayConfig) -> Result<()> {
    if config.buffer_size() == 0 {
        return Err(ConfigError::InvalidValue(
            "buffer_size".to_string(),
            "Buffer size must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Collect non-fatal configuration warnings
pub fn check_warnings(config: &RelayConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !LOG_LEVELS.contains(&config.log_level()) {
        warnings.push(format!(
            "Invalid log level '{}', using default '{}'",
            config.log_level(),
            LOG_LEVEL_STR
        ));
    }

    warnings
}

/// Level filter to run the logger with
///
/// Names outside the known set fall back to the default level, so a typo
/// never turns into an `env_logger` module filter that silences everything.
pub fn log_level_filter(level: &str) -> LevelFilter {
    let level = if LOG_LEVELS.contains(&level) { level } else { LOG_LEVEL_STR };
    level.parse().unwrap_or(LevelFilter::Debug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&RelayConfig::default()).is_ok());
        assert!(check_warnings(&RelayConfig::default()).is_empty());
    }

    #[test]
    fn test_same_listen_and_upstream() {
        let mut config = RelayConfig::default();
        config.values.upstream = config.values.listen;

        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidCombination(_))
        ));
    }

    #[test]
    fn test_zero_buffer_size() {
        let mut config = RelayConfig::default();
        config.values.buffer_size = Some(0);

        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidValue(name, _)) if name == "buffer_size"
        ));
    }

    #[test]
    fn test_unknown_log_level_only_warns() {
        let mut config = RelayConfig::default();
        config.values.log_level = Some("chatty".to_string());

        assert!(validate_config(&config).is_ok());

        let warnings = check_warnings(&config);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("using default 'debug'"));
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(log_level_filter("warn"), LevelFilter::Warn);
        assert_eq!(log_level_filter("trace"), LevelFilter::Trace);
        assert_eq!(log_level_filter("chatty"), LevelFilter::Debug);
        assert_eq!(log_level_filter("broadcast_relay=off"), LevelFilter::Debug);
        assert_eq!(log_level_filter(""), LevelFilter::Debug);
    }
}
