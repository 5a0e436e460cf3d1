//! Result data types.

use cc_project::ScenarioConfig;
use cc_sim::{RunSummary, Verdict};
use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub scenario: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub engine_version: String,
    pub dt_s: f64,
    pub duration_s: f64,
    pub ticks: usize,
    /// Trace lines written, after `record_every` decimation.
    pub recorded: usize,
    pub verdict: Verdict,
}

impl RunManifest {
    pub fn new(
        run_id: RunId,
        config: &ScenarioConfig,
        summary: &RunSummary,
        engine_version: &str,
        recorded: usize,
    ) -> Self {
        Self {
            run_id,
            scenario: config.name.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            engine_version: engine_version.to_string(),
            dt_s: config.mission.dt_s,
            duration_s: config.mission.duration_s,
            ticks: summary.ticks,
            recorded,
            verdict: summary.verdict,
        }
    }
}
