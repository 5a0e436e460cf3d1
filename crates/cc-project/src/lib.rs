//! cc-project: scenario file format, presets and validation.

pub mod migrate;
pub mod presets;
pub mod schema;
pub mod validate;

pub use migrate::{LATEST_VERSION, migrate_to_latest};
pub use schema::*;
pub use validate::{ValidationError, validate_config};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Migration error: {what}")]
    Migration { what: String },

    #[error("Unknown preset: {name}")]
    UnknownPreset { name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Preset by name, or `UnknownPreset`.
pub fn preset(name: &str) -> ProjectResult<ScenarioConfig> {
    presets::by_name(name).ok_or_else(|| ProjectError::UnknownPreset {
        name: name.to_string(),
    })
}

pub fn from_yaml_str(content: &str) -> ProjectResult<ScenarioConfig> {
    let mut config: ScenarioConfig = serde_yaml::from_str(content)?;
    config = migrate_to_latest(config)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<ScenarioConfig> {
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

pub fn save_yaml(path: &std::path::Path, config: &ScenarioConfig) -> ProjectResult<()> {
    validate_config(config)?;
    let content = serde_yaml::to_string(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &std::path::Path) -> ProjectResult<ScenarioConfig> {
    let content = std::fs::read_to_string(path)?;
    let mut config: ScenarioConfig = serde_json::from_str(&content)?;
    config = migrate_to_latest(config)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn save_json(path: &std::path::Path, config: &ScenarioConfig) -> ProjectResult<()> {
    validate_config(config)?;
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load by extension: `.json` as JSON, anything else as YAML.
pub fn load_config(path: &std::path::Path) -> ProjectResult<ScenarioConfig> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_json(path),
        _ => load_yaml(path),
    }
}
