use cc_project::presets;
use cc_project::schema::*;
use cc_project::{ProjectError, ValidationError, from_yaml_str, load_json, load_yaml, save_json, save_yaml};

#[test]
fn roundtrip_yaml_every_preset() {
    let temp_dir = std::env::temp_dir();
    for name in presets::names() {
        let config = presets::by_name(name).unwrap();
        let path = temp_dir.join(format!("cc_project_roundtrip_{name}.yaml"));

        save_yaml(&path, &config).unwrap();
        let loaded = load_yaml(&path).unwrap();

        assert_eq!(config, loaded);
    }
}

#[test]
fn roundtrip_json_tactical() {
    let config = presets::tactical();
    let path = std::env::temp_dir().join("cc_project_roundtrip_tactical.json");

    save_json(&path, &config).unwrap();
    let loaded = load_json(&path).unwrap();

    assert_eq!(config, loaded);
}

#[test]
fn save_refuses_invalid_config() {
    let mut config = presets::tactical();
    config.mission.dt_s = 0.0;
    let path = std::env::temp_dir().join("cc_project_invalid.yaml");
    let err = save_yaml(&path, &config).unwrap_err();
    assert!(matches!(err, ProjectError::Validation(_)));
}

const V1_SCENARIO: &str = r#"
version: 1
name: legacy
mission:
  duration_s: 600
  dt_s: 5
  critical_c: 90
thermal:
  capacitance_j_per_c: 300
  initial_c: 25
workload:
  rated_w: 18.5
  base_fraction: 0.85
  variation_fraction: 0.15
  variation_period_s: 600
passive:
  type: Constant
  watts: 1.5
gas:
  canister_count: 3
  canister_capacity_j: 2900
  burst_rate_w: 0.5
  purge_efficiency: 0.85
  afterglow_w: 2.2
  afterglow_s: 180
tec:
  max_cooling_w: 15
  draw_w: 30
  base_efficiency: 0.6
  min_efficiency: 0.1
  derate_span_c: 70
  derate_hot_c: 85
  derate_factor: 0.5
  max_runtime_s: 120
  cooldown_s: 5
  shutdown_hot_c: 95
  resume_hot_c: 90
  hot_side_capacitance_j_per_c: 300
  reject_w: 0.75
  recovery_c_per_s: 0.1
fan:
  draw_w: 0.25
  multiplier_base: 1.3
  speed_gain: 0.7
  multiplier_min: 1.0
  multiplier_max: 2.5
  purge_boost: 0.5
  boost_window_s: 180
  ramp_up_s: 50
  ramp_down_s: 100
battery:
  capacity_wh: 60
"#;

#[test]
fn version_one_file_migrates_on_load() {
    let config = from_yaml_str(V1_SCENARIO).unwrap();
    assert_eq!(config.version, cc_project::LATEST_VERSION);
    assert_eq!(config.gas.canisters.len(), 3);
    assert_eq!(config.mission.record_every, 1);
    assert_eq!(config.mission.max_step_delta_c, 30.0);
    assert_eq!(config.policy, cc_controls::PolicyConfig::default());
    assert!(config.phases.is_empty());
    assert_eq!(config.passive, PassiveDef::Constant { watts: 1.5 });
    assert_eq!(config.gas.burst_schedule, BurstSchedule::Continuous);
    assert_eq!((config.tec.reserve_on_wh, config.tec.reserve_off_wh), (5.0, 3.0));
    assert_eq!(config.policy.thresholds.emergency_actuation_c, 75.0);
}

#[test]
fn oversized_version_one_loadout_is_refused() {
    let yaml = V1_SCENARIO.replace("canister_count: 3", "canister_count: 4000000000");
    assert!(matches!(
        from_yaml_str(&yaml),
        Err(ProjectError::Migration { .. })
    ));
}

#[test]
fn missing_canisters_is_reported() {
    let yaml = V1_SCENARIO
        .replace("version: 1", "version: 2")
        .replace("  canister_count: 3\n  canister_capacity_j: 2900\n", "");
    let err = from_yaml_str(&yaml).unwrap_err();
    match err {
        ProjectError::Validation(ValidationError::Missing { field, .. }) => {
            assert_eq!(field, "gas.canisters")
        }
        other => panic!("unexpected error: {other}"),
    }
}
