//! Configuration validation utilities.

use autobind_framework::check_namespaces;

use super::error::{ConfigError, ConfigResult};
use super::schema::{AutobindConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &AutobindConfig) -> ConfigResult<()> {
    validate_namespaces(&config.auto_config.namespaces)?;
    validate_logging(&config.logging)?;
    Ok(())
}

/// Each namespace must be a `::`-separated module path. An empty list
/// leaves auto config disabled.
fn validate_namespaces(namespaces: &[String]) -> ConfigResult<()> {
    if namespaces.is_empty() {
        return Ok(());
    }
    check_namespaces(namespaces).map_err(|err| ConfigError::validation(format!("auto_config.{err}")))
}

fn validate_logging(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.output is \"file\" but logging.file_path is not set",
        ));
    }
    if logging.filters.keys().any(|module| module.trim().is_empty()) {
        return Err(ConfigError::validation(
            "logging.filters contains an empty module name",
        ));
    }
    Ok(())
}
