use super::{types::Config, ConfigError};
use crate::pipeline::parse_schedule;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Schedule expression parses
/// - Trim offset is positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Schedule validation
    if config.schedule.enabled {
        parse_schedule(&config.schedule.expression).map_err(|e| {
            ConfigError::ValidationError(format!("schedule.expression is invalid: {}", e))
        })?;
    }

    // Editor validation
    if config.editor.trim_secs <= 0.0 {
        return Err(ConfigError::ValidationError(
            "editor.trim_secs must be positive".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_bad_schedule_fails() {
        let mut config = Config::default();
        config.schedule.expression = "every tuesday".to_string();
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_bad_schedule_ok_when_disabled() {
        let mut config = Config::default();
        config.schedule.expression = "every tuesday".to_string();
        config.schedule.enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_non_positive_trim_fails() {
        let mut config = Config::default();
        config.editor.trim_secs = 0.0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
