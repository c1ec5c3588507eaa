use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variable prefix for config overrides, e.g.
/// `CLIPRELAY_SERVER_PORT=9000` overrides `[server] port`.
const ENV_PREFIX: &str = "CLIPRELAY_";

/// Load configuration from a TOML file, with `CLIPRELAY_`-prefixed
/// environment variables taking precedence over file values.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    figment(path)
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_from_str_valid() {
        let config = load_config_from_str(
            r#"
[server]
port = 9000

[staging]
url = "http://stage.internal:9100"
"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.staging.url, "http://stage.internal:9100");
    }

    #[test]
    fn test_load_config_from_str_invalid() {
        let result = load_config_from_str("schedule = 12\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
host = "127.0.0.1"
port = 3000

[schedule]
expression = "*/15 * * * *"
enabled = false
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.schedule.expression, "*/15 * * * *");
        assert!(!config.schedule.enabled);
        // Sections not present in the file fall back to defaults.
        assert_eq!(config.database.path.to_string_lossy(), "cliprelay.db");
    }
}
