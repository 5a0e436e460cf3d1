//! Content-based hashing for run ids.

use crate::ResultsResult;
use cc_project::ScenarioConfig;
use sha2::{Digest, Sha256};

/// SHA-256 over the serialized scenario and the engine version.
///
/// Identical inputs always map to the same id, so a stored run can stand in
/// for a fresh one.
pub fn compute_run_id(config: &ScenarioConfig, engine_version: &str) -> ResultsResult<String> {
    let mut hasher = Sha256::new();
    let config_json = serde_json::to_string(config)?;
    hasher.update(config_json.as_bytes());
    hasher.update(engine_version.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_project::presets;

    #[test]
    fn hash_stability() {
        let config = presets::tactical();
        let a = compute_run_id(&config, "0.1.0").unwrap();
        let b = compute_run_id(&config, "0.1.0").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let tactical = presets::tactical();
        let mut hotter = presets::tactical();
        hotter.thermal.initial_c = 30.0;

        let base = compute_run_id(&tactical, "0.1.0").unwrap();
        assert_ne!(base, compute_run_id(&hotter, "0.1.0").unwrap());
        assert_ne!(base, compute_run_id(&tactical, "0.2.0").unwrap());
    }
}
