//! Run execution and caching service.

use std::ops::ControlFlow;
use std::time::Instant;

use cc_project::ScenarioConfig;
use cc_results::{RunManifest, RunStore};
use cc_sim::{ENGINE_VERSION, Engine, RunSummary, TickRecord};
use tracing::{info, warn};

use crate::error::AppResult;
use crate::progress::{RunProgressEvent, RunStage, SimProgress};

/// Progress callbacks fire roughly this many times over a run.
const PROGRESS_UPDATES: usize = 100;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub engine_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            engine_version: ENGINE_VERSION.to_string(),
        }
    }
}

/// Request to execute a run.
pub struct RunRequest<'a> {
    pub config: &'a ScenarioConfig,
    pub store: &'a RunStore,
    pub options: RunOptions,
}

#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub simulate_time_s: f64,
    pub save_time_s: f64,
    pub load_cache_time_s: f64,
    pub total_time_s: f64,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub summary: RunSummary,
    pub loaded_from_cache: bool,
    pub timing: RunTimingSummary,
}

fn emit(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    scenario: &str,
    stage: RunStage,
    started: Instant,
    message: &str,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent::stage(
            scenario,
            stage,
            started.elapsed().as_secs_f64(),
            Some(message.to_string()),
        ));
    }
}

/// Execute or load a run.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    ensure_run_with_progress(request, None)
}

/// Execute or load a run and stream progress events.
pub fn ensure_run_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let mut timing = RunTimingSummary::default();
    let config = request.config;
    let scenario = config.name.as_str();

    emit(
        &mut progress_cb,
        scenario,
        RunStage::CheckingCache,
        started,
        "Checking run cache",
    );
    let run_id = cc_results::compute_run_id(config, &request.options.engine_version)?;

    if request.options.use_cache && request.store.has_run(&run_id) {
        emit(
            &mut progress_cb,
            scenario,
            RunStage::LoadingCachedResult,
            started,
            "Loading cached run",
        );
        let load_started = Instant::now();
        let manifest = request.store.load_manifest(&run_id)?;
        let summary = request.store.load_summary(&run_id)?;
        timing.load_cache_time_s = load_started.elapsed().as_secs_f64();
        timing.total_time_s = started.elapsed().as_secs_f64();
        emit(
            &mut progress_cb,
            scenario,
            RunStage::Completed,
            started,
            "Loaded from cache",
        );
        info!(%run_id, scenario, "run loaded from cache");
        return Ok(RunResponse {
            run_id,
            manifest,
            summary,
            loaded_from_cache: true,
            timing,
        });
    }

    emit(
        &mut progress_cb,
        scenario,
        RunStage::Simulating,
        started,
        "Simulating",
    );
    let sim_started = Instant::now();
    let engine = Engine::new(config)?;
    let total_ticks = engine.tick_count();
    let every = (total_ticks / PROGRESS_UPDATES).max(1);
    let output = engine.run_with(|record: &TickRecord| {
        if let Some(cb) = progress_cb.as_deref_mut()
            && (record.tick % every == 0 || record.tick + 1 == total_ticks)
        {
            cb(RunProgressEvent {
                scenario: scenario.to_string(),
                stage: RunStage::Simulating,
                elapsed_wall_s: started.elapsed().as_secs_f64(),
                message: None,
                sim: Some(SimProgress {
                    tick: record.tick + 1,
                    total_ticks,
                    sim_time_s: record.time_s,
                    temperature_c: record.temperature_c,
                    fraction_complete: (record.tick + 1) as f64 / total_ticks as f64,
                }),
            });
        }
        ControlFlow::Continue(())
    });
    timing.simulate_time_s = sim_started.elapsed().as_secs_f64();

    emit(
        &mut progress_cb,
        scenario,
        RunStage::SavingResults,
        started,
        "Saving run output",
    );
    let save_started = Instant::now();
    let manifest = RunManifest::new(
        run_id.clone(),
        config,
        &output.summary,
        &request.options.engine_version,
        output.records.len(),
    );
    if output.summary.halted {
        // non-finite temperatures have no JSON form
        warn!(%run_id, scenario, "halted run is not stored");
    } else {
        request
            .store
            .save_run(&manifest, &output.records, &output.summary)?;
    }
    timing.save_time_s = save_started.elapsed().as_secs_f64();
    timing.total_time_s = started.elapsed().as_secs_f64();

    emit(
        &mut progress_cb,
        scenario,
        RunStage::Completed,
        started,
        "Run complete",
    );
    Ok(RunResponse {
        run_id,
        manifest,
        summary: output.summary,
        loaded_from_cache: false,
        timing,
    })
}

/// Manifest, summary and trace of a stored run.
pub fn load_run(
    store: &RunStore,
    run_id: &str,
) -> AppResult<(RunManifest, RunSummary, Vec<TickRecord>)> {
    let manifest = store.load_manifest(run_id)?;
    let summary = store.load_summary(run_id)?;
    let trace = store.load_trace(run_id)?;
    Ok((manifest, summary, trace))
}

pub fn list_runs(store: &RunStore, scenario: Option<&str>) -> AppResult<Vec<RunManifest>> {
    Ok(store.list_runs(scenario)?)
}
