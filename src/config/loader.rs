// Configuration loader
// Loads a logger config from a TOML file, with the API key falling back to
// the environment

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::constants::API_KEY_ENV;
use super::settings::LoggerConfig;

/// Load and validate a logger config from a TOML file.
pub fn load_config(path: impl AsRef<Path>) -> Result<LoggerConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read logger config: {}", path.display()))?;

    parse_config(&contents)
        .with_context(|| format!("Invalid logger config: {}", path.display()))
}

/// Parse and validate a logger config from TOML text.
pub fn parse_config(contents: &str) -> Result<LoggerConfig> {
    let mut config: LoggerConfig =
        toml::from_str(contents).context("Failed to parse logger config TOML")?;

    if config.remote.api_key.is_none() {
        if let Ok(api_key) = std::env::var(API_KEY_ENV) {
            if !api_key.is_empty() {
                config.remote.api_key = Some(api_key);
            }
        }
    }

    config
        .validate()
        .context("Configuration validation failed")?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BinSize, LogMode, RemoteMode};
    use crate::LoggerError;

    #[test]
    fn test_parse_minimal() {
        let config = parse_config(
            r#"
            mode = "local"
            name = "run-1"

            [metrics.train]
            step = "step"
            metrics = ["loss"]
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, LogMode::Local);
        assert_eq!(config.name, "run-1");
        assert_eq!(config.metrics["train"].metrics, vec!["loss".to_string()]);
        assert!(config.reinit);
        assert!(config.bin_size.is_none());
    }

    #[test]
    fn test_parse_full() {
        let config = parse_config(
            r#"
            mode = "remote"
            name = "ppo"
            project = "bench"
            group = "sweep-1"
            tags = ["ppo", "cartpole"]
            bin_size = { train = 4, eval = 1 }

            [config]
            lr = 0.001
            layers = [64, 64]

            [remote]
            endpoint = "http://localhost:8080"
            api_key = "secret"
            mode = "local-only"

            [metrics.train]
            step = "step"
            metrics = ["loss", "reward"]

            [metrics.eval]
            step = "episode"
            metrics = ["return"]
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, LogMode::Remote);
        assert_eq!(config.group.as_deref(), Some("sweep-1"));
        assert_eq!(config.remote.mode, RemoteMode::LocalOnly);
        assert_eq!(config.remote.api_key.as_deref(), Some("secret"));
        assert_eq!(config.config["layers"][1], 64);
        assert!(matches!(config.bin_size, Some(BinSize::PerGroup(_))));
    }

    #[test]
    fn test_invalid_mode_is_configuration_error() {
        let err = parse_config(
            r#"
            mode = "wandb"
            name = "x"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("parse"));
        assert!(format!("{:#}", err).contains("invalid log mode"));
    }

    #[test]
    fn test_bin_size_wrong_type() {
        let err = parse_config(
            r#"
            mode = "local"
            name = "x"
            bin_size = "three"

            [metrics.train]
            step = "step"
            metrics = ["loss"]
            "#,
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("bin_size"));
    }

    #[test]
    fn test_mismatched_bin_keys_fail_validation() {
        let err = parse_config(
            r#"
            mode = "local"
            name = "x"
            bin_size = { eval = 2 }

            [metrics.train]
            step = "step"
            metrics = ["loss"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LoggerError>(),
            Some(LoggerError::Configuration(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read logger config"));
    }
}
