//! Shared application service layer for the canister cooling simulator.
//!
//! Centralizes scenario handling, cached run execution, parallel sweeps and
//! trace queries for the command line front end.

pub mod error;
pub mod progress;
pub mod query;
pub mod run_service;
pub mod scenario_service;
pub mod sweep;

pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage, SimProgress};
pub use query::{TRACE_VARIABLES, TraceSummary, export_csv, extract_series, summarize_trace};
pub use run_service::{
    RunOptions, RunRequest, RunResponse, RunTimingSummary, ensure_run, ensure_run_with_progress,
    list_runs, load_run,
};
pub use scenario_service::{
    PresetSummary, list_presets, load_scenario, resolve_scenario, save_scenario,
    validate_scenario,
};
pub use sweep::{SWEEP_PARAMETERS, SweepCase, SweepOptions, SweepOutcome, run_sweep, vary};
