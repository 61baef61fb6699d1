//! Configuration validation utilities.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{ChimeConfig, LogFormat, LogOutput, OperatorConfig, StorageBackend};

/// Validates the entire configuration.
pub fn validate_config(config: &ChimeConfig) -> ConfigResult<()> {
    validate_logging(config)?;
    config
        .prefixes
        .to_defaults()
        .map_err(|e| ConfigError::validation(format!("prefixes: {e}")))?;
    validate_operators(&config.operators)?;
    validate_storage(config)?;

    if config.pipeline.event_buffer == 0 {
        return Err(ConfigError::validation(
            "pipeline.event_buffer must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_logging(config: &ChimeConfig) -> ConfigResult<()> {
    let logging = &config.logging;

    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.output is \"file\" but logging.file_path is not set",
        ));
    }

    if logging.format == LogFormat::Json && !cfg!(feature = "json-log") {
        return Err(ConfigError::validation(
            "logging.format \"json\" requires the json-log feature",
        ));
    }

    Ok(())
}

fn validate_operators(operators: &[OperatorConfig]) -> ConfigResult<()> {
    let mut seen = HashSet::new();

    for op in operators {
        if op.frontend.is_empty() || op.id.is_empty() {
            return Err(ConfigError::validation(
                "operators need both a frontend and an id",
            ));
        }
        if !seen.insert((&op.frontend, &op.id)) {
            return Err(ConfigError::validation(format!(
                "duplicate operator {}/{}",
                op.frontend, op.id
            )));
        }
    }

    Ok(())
}

fn validate_storage(config: &ChimeConfig) -> ConfigResult<()> {
    if config.storage.backend == StorageBackend::Sqlite && config.storage.path.trim().is_empty() {
        return Err(ConfigError::validation(
            "storage.path must be set for the sqlite backend",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ChimeConfig::default()).is_ok());
    }

    #[test]
    fn test_shared_prefix_rejected() {
        let mut config = ChimeConfig::default();
        config.prefixes.advanced = vec!["!".into()];

        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
        assert!(err.to_string().contains("prefixes"));
    }

    #[test]
    fn test_empty_prefix_list_rejected() {
        let mut config = ChimeConfig::default();
        config.prefixes.normal.clear();
        assert!(validate_config(&config).is_err());

        let mut config = ChimeConfig::default();
        config.prefixes.admin = vec![String::new()];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = ChimeConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("chime.log".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_duplicate_operator_rejected() {
        let op = OperatorConfig {
            frontend: "console".into(),
            id: "me".into(),
        };
        let mut config = ChimeConfig::default();
        config.operators = vec![op.clone(), op];
        assert!(validate_config(&config).is_err());
    }
}
