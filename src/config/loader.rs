//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Listen port, applied as `0.0.0.0:<PORT>`.
pub const ENV_PORT: &str = "PORT";
/// Base URL of the suggestions service.
pub const ENV_SUGGESTIONS_HOST: &str = "SUGGESTIONS_SERVICE_HOST";
/// Path of the article snapshot.
pub const ENV_DATA_SOURCE: &str = "DATA_SOURCE_FILENAME";
/// Tracing backend endpoint.
pub const ENV_TRACING_BACKEND: &str = "TRACING_BACKEND_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load the optional file, apply process environment overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => ServiceConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overwrite config fields from the variables `lookup` resolves.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup(ENV_PORT).filter(|p| !p.is_empty()) {
        config.listener.bind_address = format!("0.0.0.0:{}", port);
    }
    if let Some(host) = lookup(ENV_SUGGESTIONS_HOST).filter(|h| !h.is_empty()) {
        config.suggestions.host = host;
    }
    if let Some(path) = lookup(ENV_DATA_SOURCE).filter(|p| !p.is_empty()) {
        config.data_source.articles_path = PathBuf::from(path);
    }
    if let Some(url) = lookup(ENV_TRACING_BACKEND).filter(|u| !u.is_empty()) {
        config.tracing.backend_url = Some(url);
    }
}
