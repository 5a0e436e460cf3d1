use cc_app::{SweepOptions, run_sweep, vary};
use cc_project::presets;
use cc_sim::Verdict;

#[test]
fn sweep_matches_serial_runs() {
    let base = presets::tactical();
    let cases = vary(&base, "thermal.initial_c", &[20.0, 25.0, 30.0]).unwrap();
    let outcomes = run_sweep(&cases, &SweepOptions::default());
    assert_eq!(outcomes.len(), 3);
    for (case, outcome) in cases.iter().zip(&outcomes) {
        assert_eq!(case.label, outcome.label);
        let serial = cc_sim::simulate(&case.config).unwrap().summary;
        assert_eq!(outcome.result.as_ref().unwrap(), &serial);
    }
}

#[test]
fn one_case_aborting_does_not_stop_others() {
    let mut passive = presets::passive_only();
    passive.name = "passive".to_string();
    let mut cases = vary(&presets::tactical(), "battery.capacity_wh", &[60.0]).unwrap();
    cases.extend(vary(&passive, "thermal.initial_c", &[25.0]).unwrap());

    let outcomes = run_sweep(
        &cases,
        &SweepOptions {
            abort_above_c: Some(95.0),
        },
    );
    let tactical = outcomes[0].result.as_ref().unwrap();
    let passive = outcomes[1].result.as_ref().unwrap();

    assert!(!tactical.aborted);
    assert_eq!(tactical.verdict, Verdict::Pass);
    assert_eq!(tactical.ticks, 720);

    assert!(passive.aborted);
    assert!(passive.ticks < 720);
    assert!(passive.final_c > 95.0);
}

#[test]
fn invalid_case_is_reported_in_place() {
    let cases = vary(&presets::tactical(), "mission.dt_s", &[5.0, -1.0]).unwrap();
    let outcomes = run_sweep(&cases, &SweepOptions::default());
    assert!(outcomes[0].result.is_ok());
    assert!(outcomes[1].result.is_err());
}
