//! Query helpers for loaded traces.

use std::collections::BTreeMap;
use std::io::Write;

use cc_controls::Mode;
use cc_sim::TickRecord;
use serde::Serialize;

use crate::error::{AppError, AppResult};

/// Named numeric columns of a [`TickRecord`].
pub const TRACE_VARIABLES: &[&str] = &[
    "heat_w",
    "temperature_c",
    "gas_remaining_j",
    "battery_remaining_wh",
    "fan_duty_pct",
    "fan_multiplier",
    "tec_hot_side_c",
    "cooling_total_w",
    "passive_w",
    "microburst_w",
    "purge_w",
    "afterglow_w",
    "tec_w",
    "fan_boost_w",
];

fn variable(record: &TickRecord, name: &str) -> Option<f64> {
    let c = &record.cooling_w;
    Some(match name {
        "heat_w" => record.heat_w,
        "temperature_c" => record.temperature_c,
        "gas_remaining_j" => record.gas_remaining_j,
        "battery_remaining_wh" => record.battery_remaining_wh,
        "fan_duty_pct" => record.fan_duty_pct,
        "fan_multiplier" => record.fan_multiplier,
        "tec_hot_side_c" => record.tec_hot_side_c,
        "cooling_total_w" => record.cooling_total_w,
        "passive_w" => c.passive,
        "microburst_w" => c.microburst,
        "purge_w" => c.purge,
        "afterglow_w" => c.afterglow,
        "tec_w" => c.tec,
        "fan_boost_w" => c.fan_boost,
        _ => return None,
    })
}

#[derive(Debug, Clone)]
pub struct TraceSummary {
    pub time_range: (f64, f64),
    pub record_count: usize,
    pub mode_counts: BTreeMap<Mode, usize>,
    pub purge_ticks: usize,
}

pub fn summarize_trace(records: &[TickRecord]) -> AppResult<TraceSummary> {
    let (Some(first), Some(last)) = (records.first(), records.last()) else {
        return Err(AppError::InvalidInput("No records in run".to_string()));
    };
    let mut mode_counts = BTreeMap::new();
    for r in records {
        *mode_counts.entry(r.mode).or_insert(0) += 1;
    }
    Ok(TraceSummary {
        time_range: (first.time_s, last.time_s),
        record_count: records.len(),
        mode_counts,
        purge_ticks: records.iter().filter(|r| r.purge).count(),
    })
}

/// `(time_s, value)` pairs for one variable.
pub fn extract_series(records: &[TickRecord], name: &str) -> AppResult<Vec<(f64, f64)>> {
    if !TRACE_VARIABLES.contains(&name) {
        return Err(AppError::InvalidInput(format!(
            "Unknown trace variable: {name}"
        )));
    }
    Ok(records
        .iter()
        .filter_map(|r| variable(r, name).map(|v| (r.time_s, v)))
        .collect())
}

#[derive(Serialize)]
struct CsvRow<'a> {
    tick: usize,
    time_s: f64,
    mode: &'a str,
    purge: bool,
    canister_index: usize,
    tec_enabled: bool,
    heat_w: f64,
    temperature_c: f64,
    gas_remaining_j: f64,
    battery_remaining_wh: f64,
    fan_duty_pct: f64,
    fan_multiplier: f64,
    tec_hot_side_c: f64,
    passive_w: f64,
    microburst_w: f64,
    purge_w: f64,
    afterglow_w: f64,
    tec_w: f64,
    fan_boost_w: f64,
    cooling_total_w: f64,
}

/// Write the trace as CSV with a header row.
pub fn export_csv<W: Write>(records: &[TickRecord], writer: W) -> AppResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for r in records {
        let c = &r.cooling_w;
        wtr.serialize(CsvRow {
            tick: r.tick,
            time_s: r.time_s,
            mode: r.mode.as_str(),
            purge: r.purge,
            canister_index: r.canister_index,
            tec_enabled: r.tec_enabled,
            heat_w: r.heat_w,
            temperature_c: r.temperature_c,
            gas_remaining_j: r.gas_remaining_j,
            battery_remaining_wh: r.battery_remaining_wh,
            fan_duty_pct: r.fan_duty_pct,
            fan_multiplier: r.fan_multiplier,
            tec_hot_side_c: r.tec_hot_side_c,
            passive_w: c.passive,
            microburst_w: c.microburst,
            purge_w: c.purge,
            afterglow_w: c.afterglow,
            tec_w: c.tec,
            fan_boost_w: c.fan_boost,
            cooling_total_w: r.cooling_total_w,
        })?;
    }
    wtr.flush()?;
    Ok(())
}
