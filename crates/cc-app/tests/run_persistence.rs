use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use cc_app::{RunOptions, RunRequest, RunStage, load_run, run_service};
use cc_project::presets;
use cc_results::RunStore;

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

#[test]
fn second_run_is_served_from_cache() {
    let root = unique_temp_dir("cc_app_cache");
    let store = RunStore::new(root.clone()).expect("failed to create run store");
    let mut config = presets::tactical();
    config.mission.duration_s = 600.0;

    let request = RunRequest {
        config: &config,
        store: &store,
        options: RunOptions::default(),
    };
    let first = run_service::ensure_run(&request).expect("first run failed");
    assert!(!first.loaded_from_cache);

    let second = run_service::ensure_run(&request).expect("second run failed");
    assert!(second.loaded_from_cache);
    assert_eq!(first.run_id, second.run_id);
    assert_eq!(second.summary.ticks, 120);
    assert_eq!(second.summary.verdict, first.summary.verdict);

    let (manifest, summary, trace) = load_run(&store, &first.run_id).expect("load failed");
    assert_eq!(manifest.scenario, "tactical");
    assert_eq!(summary.ticks, 120);
    assert_eq!(trace.len(), 120);

    let uncached = RunRequest {
        config: &config,
        store: &store,
        options: RunOptions {
            use_cache: false,
            ..RunOptions::default()
        },
    };
    assert!(!run_service::ensure_run(&uncached).unwrap().loaded_from_cache);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn progress_reaches_completion() {
    let root = unique_temp_dir("cc_app_progress");
    let store = RunStore::new(root.clone()).expect("failed to create run store");
    let config = presets::tactical();
    let request = RunRequest {
        config: &config,
        store: &store,
        options: RunOptions {
            use_cache: false,
            ..RunOptions::default()
        },
    };

    let mut stages = Vec::new();
    let mut last_fraction = 0.0;
    let mut cb = |event: cc_app::RunProgressEvent| {
        if let Some(sim) = &event.sim {
            assert!(sim.fraction_complete >= last_fraction);
            last_fraction = sim.fraction_complete;
        }
        stages.push(event.stage);
    };
    run_service::ensure_run_with_progress(&request, Some(&mut cb)).expect("run failed");

    assert_eq!(stages.first(), Some(&RunStage::CheckingCache));
    assert_eq!(stages.last(), Some(&RunStage::Completed));
    assert!(stages.contains(&RunStage::SavingResults));
    assert_eq!(last_fraction, 1.0);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn invalid_scenario_is_not_run() {
    let root = unique_temp_dir("cc_app_invalid");
    let store = RunStore::new(root.clone()).expect("failed to create run store");
    let mut config = presets::tactical();
    config.gas.canisters.clear();
    let request = RunRequest {
        config: &config,
        store: &store,
        options: RunOptions::default(),
    };
    assert!(matches!(
        run_service::ensure_run(&request),
        Err(cc_app::AppError::Validation(_))
    ));
    assert!(store.list_runs(None).unwrap().is_empty());
    let _ = fs::remove_dir_all(&root);
}

#[test]
fn halted_run_is_reported_but_not_stored() {
    let root = unique_temp_dir("cc_app_halted");
    let store = RunStore::new(root.clone()).expect("failed to create run store");
    let mut config = presets::tactical();
    config.workload.rated_w = 1e308;
    let request = RunRequest {
        config: &config,
        store: &store,
        options: RunOptions::default(),
    };
    let response = run_service::ensure_run(&request).expect("run failed");
    assert!(response.summary.halted);
    assert!(!response.summary.verdict.is_pass());
    assert!(!store.has_run(&response.run_id));
    let _ = fs::remove_dir_all(&root);
}
