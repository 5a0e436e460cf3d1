//! Scenario validation.
//!
//! Reports the first invalid field. Runs before any tick.

use crate::schema::*;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing value: {field} ({reason})")]
    Missing { field: String, reason: String },

    #[error("Invalid control policy: {reason}")]
    Policy { reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

impl From<cc_controls::ControlError> for ValidationError {
    fn from(e: cc_controls::ControlError) -> Self {
        ValidationError::Policy {
            reason: e.to_string(),
        }
    }
}

type VResult = Result<(), ValidationError>;

fn invalid(field: &str, value: f64, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: &str, v: f64) -> VResult {
    if !v.is_finite() || v <= 0.0 {
        return Err(invalid(field, v, "must be positive and finite"));
    }
    Ok(())
}

fn non_negative(field: &str, v: f64) -> VResult {
    if !v.is_finite() || v < 0.0 {
        return Err(invalid(field, v, "must be non-negative and finite"));
    }
    Ok(())
}

fn finite(field: &str, v: f64) -> VResult {
    if !v.is_finite() {
        return Err(invalid(field, v, "must be finite"));
    }
    Ok(())
}

fn within(field: &str, v: f64, lo: f64, hi: f64) -> VResult {
    if !v.is_finite() || v < lo || v > hi {
        return Err(invalid(field, v, &format!("must be within [{lo}, {hi}]")));
    }
    Ok(())
}

pub fn validate_config(config: &ScenarioConfig) -> VResult {
    if config.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: config.version,
        });
    }
    validate_mission(&config.mission)?;
    validate_thermal(&config.thermal)?;
    validate_workload(&config.workload)?;
    validate_passive(&config.passive)?;
    validate_gas(&config.gas)?;
    validate_tec(&config.tec)?;
    validate_fan(&config.fan)?;
    validate_battery(&config.battery)?;
    config.policy.validate()?;
    validate_phases(&config.phases)?;
    Ok(())
}

fn validate_mission(m: &MissionDef) -> VResult {
    non_negative("mission.duration_s", m.duration_s)?;
    positive("mission.dt_s", m.dt_s)?;
    finite("mission.critical_c", m.critical_c)?;
    positive("mission.max_step_delta_c", m.max_step_delta_c)?;
    let ticks = m.tick_count_f64();
    if ticks > MAX_TICKS as f64 {
        return Err(invalid(
            "mission.duration_s",
            m.duration_s,
            &format!("needs {ticks} ticks of {} s, more than {MAX_TICKS}", m.dt_s),
        ));
    }
    if m.record_every == 0 {
        return Err(invalid("mission.record_every", 0.0, "must be at least 1"));
    }
    Ok(())
}

fn validate_thermal(t: &ThermalDef) -> VResult {
    positive("thermal.capacitance_j_per_c", t.capacitance_j_per_c)?;
    finite("thermal.initial_c", t.initial_c)
}

fn validate_workload(w: &WorkloadDef) -> VResult {
    non_negative("workload.rated_w", w.rated_w)?;
    non_negative("workload.base_fraction", w.base_fraction)?;
    non_negative("workload.variation_fraction", w.variation_fraction)?;
    positive("workload.variation_period_s", w.variation_period_s)?;
    for (i, window) in w.stress_windows.iter().enumerate() {
        let field = |name: &str| format!("workload.stress_windows[{i}].{name}");
        finite(&field("start_s"), window.start_s)?;
        finite(&field("end_s"), window.end_s)?;
        if window.end_s <= window.start_s {
            return Err(invalid(&field("end_s"), window.end_s, "must be after start_s"));
        }
        non_negative(&field("level_fraction"), window.level_fraction)?;
    }
    Ok(())
}

fn validate_passive(p: &PassiveDef) -> VResult {
    match p {
        PassiveDef::Constant { watts } => non_negative("passive.watts", *watts),
        PassiveDef::Ambient {
            w_per_c,
            ambient_c,
            swing,
        } => {
            non_negative("passive.w_per_c", *w_per_c)?;
            finite("passive.ambient_c", *ambient_c)?;
            if let Some(swing) = swing {
                non_negative("passive.swing.amplitude_c", swing.amplitude_c)?;
                positive("passive.swing.period_s", swing.period_s)?;
            }
            Ok(())
        }
    }
}

fn validate_gas(g: &GasDef) -> VResult {
    if g.canister_count.is_some() || g.canister_capacity_j.is_some() {
        return Err(ValidationError::InvalidValue {
            field: "gas.canister_count".to_string(),
            value: format!("{:?}", g.canister_count),
            reason: "only valid in version 1 files; list gas.canisters instead".to_string(),
        });
    }
    if g.canisters.is_empty() {
        return Err(ValidationError::Missing {
            field: "gas.canisters".to_string(),
            reason: "at least one canister is required".to_string(),
        });
    }
    if g.canisters.len() > MAX_CANISTERS {
        return Err(invalid(
            "gas.canisters",
            g.canisters.len() as f64,
            &format!("at most {MAX_CANISTERS} canisters"),
        ));
    }
    for (i, c) in g.canisters.iter().enumerate() {
        positive(&format!("gas.canisters[{i}].capacity_j"), c.capacity_j)?;
    }
    non_negative("gas.burst_rate_w", g.burst_rate_w)?;
    if !g.purge_efficiency.is_finite() || g.purge_efficiency <= 0.0 || g.purge_efficiency > 1.0 {
        return Err(invalid(
            "gas.purge_efficiency",
            g.purge_efficiency,
            "must be within (0, 1]",
        ));
    }
    non_negative("gas.afterglow_w", g.afterglow_w)?;
    non_negative("gas.afterglow_s", g.afterglow_s)?;
    non_negative("gas.microburst_afterglow_s", g.microburst_afterglow_s)
}

fn validate_tec(t: &TecDef) -> VResult {
    non_negative("tec.max_cooling_w", t.max_cooling_w)?;
    non_negative("tec.draw_w", t.draw_w)?;
    if !t.base_efficiency.is_finite() || t.base_efficiency <= 0.0 || t.base_efficiency > 1.0 {
        return Err(invalid(
            "tec.base_efficiency",
            t.base_efficiency,
            "must be within (0, 1]",
        ));
    }
    within("tec.min_efficiency", t.min_efficiency, 0.0, t.base_efficiency)?;
    positive("tec.derate_span_c", t.derate_span_c)?;
    finite("tec.derate_hot_c", t.derate_hot_c)?;
    within("tec.derate_factor", t.derate_factor, 0.0, 1.0)?;
    positive("tec.max_runtime_s", t.max_runtime_s)?;
    non_negative("tec.cooldown_s", t.cooldown_s)?;
    finite("tec.shutdown_hot_c", t.shutdown_hot_c)?;
    finite("tec.resume_hot_c", t.resume_hot_c)?;
    if t.resume_hot_c > t.shutdown_hot_c {
        return Err(invalid(
            "tec.resume_hot_c",
            t.resume_hot_c,
            "must not exceed shutdown_hot_c",
        ));
    }
    positive(
        "tec.hot_side_capacitance_j_per_c",
        t.hot_side_capacitance_j_per_c,
    )?;
    non_negative("tec.reject_w", t.reject_w)?;
    non_negative("tec.recovery_c_per_s", t.recovery_c_per_s)?;
    non_negative("tec.assist_after_purge_s", t.assist_after_purge_s)?;
    non_negative("tec.reserve_off_wh", t.reserve_off_wh)?;
    finite("tec.reserve_on_wh", t.reserve_on_wh)?;
    if t.reserve_on_wh < t.reserve_off_wh {
        return Err(invalid(
            "tec.reserve_on_wh",
            t.reserve_on_wh,
            "must not be below reserve_off_wh",
        ));
    }
    Ok(())
}

fn validate_fan(f: &FanDef) -> VResult {
    non_negative("fan.draw_w", f.draw_w)?;
    if !f.multiplier_base.is_finite() || f.multiplier_base < 1.0 {
        return Err(invalid(
            "fan.multiplier_base",
            f.multiplier_base,
            "must be at least 1",
        ));
    }
    non_negative("fan.speed_gain", f.speed_gain)?;
    if !f.multiplier_min.is_finite() || f.multiplier_min < 1.0 {
        return Err(invalid(
            "fan.multiplier_min",
            f.multiplier_min,
            "must be at least 1 so the fan never reduces cooling",
        ));
    }
    if !f.multiplier_max.is_finite() || f.multiplier_max < f.multiplier_min {
        return Err(invalid(
            "fan.multiplier_max",
            f.multiplier_max,
            "must be finite and not below multiplier_min",
        ));
    }
    non_negative("fan.purge_boost", f.purge_boost)?;
    non_negative("fan.boost_window_s", f.boost_window_s)?;
    within("fan.purge_duty_pct", f.purge_duty_pct, 0.0, 100.0)?;
    non_negative("fan.ramp_up_s", f.ramp_up_s)?;
    non_negative("fan.ramp_down_s", f.ramp_down_s)
}

fn validate_battery(b: &BatteryDef) -> VResult {
    non_negative("battery.capacity_wh", b.capacity_wh)?;
    if let Some(initial) = b.initial_wh {
        within("battery.initial_wh", initial, 0.0, b.capacity_wh)?;
    }
    Ok(())
}

fn validate_phases(phases: &[PhaseDef]) -> VResult {
    for (i, phase) in phases.iter().enumerate() {
        if phase.name.trim().is_empty() {
            return Err(ValidationError::Missing {
                field: format!("phases[{i}].name"),
                reason: "phase names must not be empty".to_string(),
            });
        }
        positive(&format!("phases[{i}].duration_s"), phase.duration_s)?;
    }
    Ok(())
}
