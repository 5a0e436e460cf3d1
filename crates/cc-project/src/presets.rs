//! Named scenario presets.
//!
//! Every preset shares the tactical hardware description and differs only in
//! mission length, loadout or mechanism gating.

use crate::schema::*;
use cc_controls::PolicyConfig;

/// Preset name and a one-line description.
pub const PRESETS: &[(&str, &str)] = &[
    (
        "tactical",
        "60 min at 18.5 W with two 2900 J canisters, TEC and fan",
    ),
    (
        "passive-only",
        "tactical workload with gas, TEC and fan disabled",
    ),
    (
        "endurance-day",
        "24 h on ambient conduction with a field battery and six canisters",
    ),
    (
        "mars-crater",
        "one sol at a crater base, ambient swinging between -60 and 0 C",
    ),
    (
        "bench-protocol",
        "five-phase bench test: baseline, fan only, gas + fan, adaptive, cooldown",
    ),
];

pub fn names() -> impl Iterator<Item = &'static str> {
    PRESETS.iter().map(|(name, _)| *name)
}

pub fn by_name(name: &str) -> Option<ScenarioConfig> {
    match name {
        "tactical" => Some(tactical()),
        "passive-only" => Some(passive_only()),
        "endurance-day" => Some(endurance_day()),
        "mars-crater" => Some(mars_crater()),
        "bench-protocol" => Some(bench_protocol()),
        _ => None,
    }
}

/// Reference tactical mission.
pub fn tactical() -> ScenarioConfig {
    ScenarioConfig {
        version: crate::migrate::LATEST_VERSION,
        name: "tactical".to_string(),
        description: "Tactical protocol reference mission".to_string(),
        mission: MissionDef {
            duration_s: 3600.0,
            dt_s: 5.0,
            critical_c: 90.0,
            max_step_delta_c: 30.0,
            record_every: 1,
        },
        thermal: ThermalDef {
            capacitance_j_per_c: 300.0,
            initial_c: 25.0,
        },
        workload: WorkloadDef {
            rated_w: 18.5,
            base_fraction: 0.85,
            variation_fraction: 0.15,
            variation_period_s: 600.0,
            stress_windows: vec![
                StressWindowDef {
                    start_s: 900.0,
                    end_s: 1100.0,
                    level_fraction: 1.1,
                },
                StressWindowDef {
                    start_s: 2400.0,
                    end_s: 2700.0,
                    level_fraction: 1.1,
                },
            ],
        },
        passive: PassiveDef::Constant { watts: 1.5 },
        gas: GasDef {
            canisters: GasDef::uniform_canisters(2, 2900.0),
            canister_count: None,
            canister_capacity_j: None,
            burst_rate_w: 3.0,
            burst_schedule: BurstSchedule::TickAligned,
            purge_efficiency: 0.85,
            afterglow_w: 2.2,
            afterglow_s: 180.0,
            microburst_afterglow_s: 0.0,
        },
        tec: TecDef {
            max_cooling_w: 15.0,
            draw_w: 30.0,
            base_efficiency: 0.6,
            min_efficiency: 0.1,
            derate_span_c: 70.0,
            derate_hot_c: 85.0,
            derate_factor: 0.5,
            max_runtime_s: 120.0,
            cooldown_s: 5.0,
            shutdown_hot_c: 95.0,
            resume_hot_c: 90.0,
            hot_side_capacitance_j_per_c: 300.0,
            reject_w: 0.75,
            recovery_c_per_s: 0.1,
            assist_after_purge_s: 60.0,
            reserve_on_wh: 5.0,
            reserve_off_wh: 3.0,
        },
        fan: FanDef {
            draw_w: 0.25,
            multiplier_base: 1.3,
            speed_gain: 0.7,
            multiplier_min: 1.0,
            multiplier_max: 2.5,
            purge_boost: 0.5,
            boost_window_s: 180.0,
            purge_duty_pct: 0.0,
            ramp_up_s: 50.0,
            ramp_down_s: 100.0,
        },
        battery: BatteryDef {
            capacity_wh: 60.0,
            initial_wh: None,
        },
        policy: PolicyConfig::default(),
        phases: Vec::new(),
    }
}

/// Tactical workload with every active mechanism disabled.
pub fn passive_only() -> ScenarioConfig {
    let mut config = tactical();
    config.name = "passive-only".to_string();
    config.description = "Tactical workload, passive dissipation only".to_string();
    config.phases = vec![PhaseDef {
        name: "passive".to_string(),
        duration_s: config.mission.duration_s,
        gas: false,
        tec: false,
        fan: false,
    }];
    config
}

/// Day-long deployment with ambient-coupled passive cooling.
pub fn endurance_day() -> ScenarioConfig {
    let mut config = tactical();
    config.name = "endurance-day".to_string();
    config.description = "24 h deployment on ambient conduction".to_string();
    config.mission.duration_s = 86_400.0;
    config.mission.record_every = 12;
    config.passive = PassiveDef::Ambient {
        w_per_c: 0.15,
        ambient_c: 25.0,
        swing: None,
    };
    config.gas.canisters = GasDef::uniform_canisters(6, 2900.0);
    config.battery.capacity_wh = 500.0;
    config.workload.stress_windows = vec![StressWindowDef {
        start_s: 43_200.0,
        end_s: 46_800.0,
        level_fraction: 1.1,
    }];
    config
}

/// Day-long deployment under a Martian diurnal cycle. Thin CO2 atmosphere
/// couples weakly, so conduction is small even with a cold ambient.
pub fn mars_crater() -> ScenarioConfig {
    let mut config = endurance_day();
    config.name = "mars-crater".to_string();
    config.description = "One sol at a crater base".to_string();
    config.passive = PassiveDef::Ambient {
        w_per_c: 0.02,
        ambient_c: -30.0,
        swing: Some(AmbientSwing {
            amplitude_c: 30.0,
            period_s: 86_400.0,
        }),
    };
    config
}

/// Bench test protocol used on the hardware prototype.
pub fn bench_protocol() -> ScenarioConfig {
    let mut config = tactical();
    config.name = "bench-protocol".to_string();
    config.description = "Five-phase bench protocol".to_string();
    let phase = |name: &str, duration_s: f64, gas: bool, tec: bool, fan: bool| PhaseDef {
        name: name.to_string(),
        duration_s,
        gas,
        tec,
        fan,
    };
    config.phases = vec![
        phase("baseline", 300.0, false, false, false),
        phase("fan-only", 300.0, false, false, true),
        phase("gas-fan", 600.0, true, false, true),
        phase("adaptive", 300.0, true, true, true),
        phase("cooldown", 300.0, false, false, false),
    ];
    config.mission.duration_s = config.phases.iter().map(|p| p.duration_s).sum();
    config.workload.stress_windows.clear();
    config
}
