//! Schema migration.

use crate::ProjectError;
use crate::schema::{GasDef, MAX_CANISTERS, ScenarioConfig};

pub const LATEST_VERSION: u32 = 2;

pub fn migrate_to_latest(mut config: ScenarioConfig) -> Result<ScenarioConfig, ProjectError> {
    while config.version < LATEST_VERSION {
        config = migrate_one_version(config)?;
    }
    Ok(config)
}

fn migrate_one_version(config: ScenarioConfig) -> Result<ScenarioConfig, ProjectError> {
    match config.version {
        1 => migrate_v1_to_v2(config),
        v => Err(ProjectError::Migration {
            what: format!("No migration path from version {}", v),
        }),
    }
}

/// Version 1 described identical canisters by count and capacity.
fn migrate_v1_to_v2(mut config: ScenarioConfig) -> Result<ScenarioConfig, ProjectError> {
    let gas = &mut config.gas;
    match (gas.canister_count.take(), gas.canister_capacity_j.take()) {
        (Some(count), Some(capacity_j)) => {
            if count as usize > MAX_CANISTERS {
                return Err(ProjectError::Migration {
                    what: format!("canister_count {count} exceeds {MAX_CANISTERS}"),
                });
            }
            if gas.canisters.is_empty() {
                gas.canisters = GasDef::uniform_canisters(count as usize, capacity_j);
            } else {
                return Err(ProjectError::Migration {
                    what: "gas lists canisters and a canister_count at the same time".to_string(),
                });
            }
        }
        (None, None) => {}
        _ => {
            return Err(ProjectError::Migration {
                what: "canister_count and canister_capacity_j must be given together".to_string(),
            });
        }
    }
    config.version = 2;
    Ok(config)
}
