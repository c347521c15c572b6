//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::Path;

/// File name of the project configuration.
pub const CONFIG_FILE: &str = "hotload.toml";

/// Loads and validates `hotload.toml` from a project directory.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let path = project_dir.join(CONFIG_FILE);
    let content =
        std::fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source })?;
    load_config_from_str(&content)
}

/// Parses and validates a `hotload.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name"));
    }
    if config.paths.search.is_empty() {
        return Err(ConfigError::MissingField("paths.search"));
    }
    if let Some(index) = config.paths.search.iter().position(|root| root.trim().is_empty()) {
        return Err(ConfigError::EmptySearchRoot { index });
    }
    for (field, ext) in [
        ("paths.source_extension", &config.paths.source_extension),
        ("paths.precompiled_extension", &config.paths.precompiled_extension),
    ] {
        if ext.is_empty() || ext.contains(['.', '/', '\\']) {
            return Err(ConfigError::InvalidExtension {
                field,
                value: ext.clone(),
            });
        }
    }
    Ok(())
}
