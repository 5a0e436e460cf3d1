//! Scenario loading, saving and validation.

use std::path::Path;

use cc_project::{ScenarioConfig, presets};

use crate::error::{AppError, AppResult};

/// Name and description of a built-in scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetSummary {
    pub name: &'static str,
    pub description: &'static str,
}

pub fn list_presets() -> Vec<PresetSummary> {
    presets::PRESETS
        .iter()
        .map(|&(name, description)| PresetSummary { name, description })
        .collect()
}

/// Load a scenario file (YAML or JSON by extension), migrating and
/// validating it.
pub fn load_scenario(path: &Path) -> AppResult<ScenarioConfig> {
    if !path.exists() {
        return Err(AppError::ScenarioFileRead {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
    }
    Ok(cc_project::load_config(path)?)
}

pub fn save_scenario(path: &Path, config: &ScenarioConfig) -> AppResult<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => cc_project::save_json(path, config)?,
        _ => cc_project::save_yaml(path, config)?,
    }
    Ok(())
}

/// A scenario file path when one exists, otherwise a preset name.
pub fn resolve_scenario(name_or_path: &str) -> AppResult<ScenarioConfig> {
    let path = Path::new(name_or_path);
    if path.exists() {
        return load_scenario(path);
    }
    presets::by_name(name_or_path).ok_or_else(|| {
        AppError::InvalidInput(format!(
            "'{name_or_path}' is neither a scenario file nor a preset ({})",
            presets::names().collect::<Vec<_>>().join(", ")
        ))
    })
}

pub fn validate_scenario(config: &ScenarioConfig) -> AppResult<()> {
    cc_project::validate_config(config)?;
    Ok(())
}
