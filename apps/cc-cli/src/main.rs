use cc_app::{
    AppError, AppResult, RunOptions, RunProgressEvent, RunRequest, RunStage, SweepOptions, query,
    run_service, scenario_service, sweep,
};
use cc_controls::{ControlPolicy, FirmwareController, PolicyConfig, SampleConfig, SensorReadings};
use cc_results::RunStore;
use cc_sim::{RunSummary, Verdict};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "ccsim")]
#[command(about = "Canister cooling simulator: CO2 gas, TEC and fan enclosure model", long_about = None)]
struct Cli {
    /// Run store directory
    #[arg(long, global = true, default_value = ".ccsim/runs")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in scenario presets
    Presets,
    /// Validate a scenario file or preset
    Validate {
        /// Scenario file (YAML/JSON) or preset name
        scenario: String,
    },
    /// Run a mission and print the verdict
    Run {
        /// Scenario file (YAML/JSON) or preset name
        scenario: String,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
        /// Print every recorded event
        #[arg(long)]
        events: bool,
    },
    /// Run one scenario across several values of a parameter
    Sweep {
        /// Scenario file (YAML/JSON) or preset name
        scenario: String,
        /// Parameter to vary (e.g. thermal.initial_c)
        #[arg(long)]
        param: String,
        /// Comma-separated values
        #[arg(long, value_delimiter = ',', required = true)]
        values: Vec<f64>,
        /// Stop a case once its temperature exceeds this value
        #[arg(long)]
        abort_above: Option<f64>,
    },
    /// List stored runs
    Runs {
        /// Only runs of this scenario
        #[arg(long)]
        scenario: Option<String>,
    },
    /// Show details of a stored run
    ShowRun {
        /// Run ID to display
        run_id: String,
        /// Print every recorded event
        #[arg(long)]
        events: bool,
    },
    /// Export a stored trace as CSV
    ExportTrace {
        /// Run ID
        run_id: String,
        /// Export only this variable as time_s,value
        #[arg(long)]
        variable: Option<String>,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the firmware register table over a temperature range
    FirmwareTable {
        #[arg(long, default_value_t = 15.0)]
        from: f64,
        #[arg(long, default_value_t = 95.0)]
        to: f64,
        #[arg(long, default_value_t = 5.0)]
        step: f64,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Presets => cmd_presets(),
        Commands::Validate { scenario } => cmd_validate(&scenario),
        Commands::Run {
            scenario,
            no_cache,
            events,
        } => cmd_run(&cli.store, &scenario, !no_cache, events),
        Commands::Sweep {
            scenario,
            param,
            values,
            abort_above,
        } => cmd_sweep(&scenario, &param, &values, abort_above),
        Commands::Runs { scenario } => cmd_runs(&cli.store, scenario.as_deref()),
        Commands::ShowRun { run_id, events } => cmd_show_run(&cli.store, &run_id, events),
        Commands::ExportTrace {
            run_id,
            variable,
            output,
        } => cmd_export_trace(&cli.store, &run_id, variable.as_deref(), output.as_deref()),
        Commands::FirmwareTable { from, to, step } => cmd_firmware_table(from, to, step),
    }
}

fn cmd_presets() -> AppResult<()> {
    println!("Presets:");
    for preset in scenario_service::list_presets() {
        println!("  {:<16} {}", preset.name, preset.description);
    }
    Ok(())
}

fn cmd_validate(scenario: &str) -> AppResult<()> {
    println!("Validating scenario: {}", scenario);
    let config = scenario_service::resolve_scenario(scenario)?;
    scenario_service::validate_scenario(&config)?;
    println!(
        "✓ Scenario '{}' is valid ({} ticks of {} s)",
        config.name,
        config.mission.tick_count(),
        config.mission.dt_s
    );
    Ok(())
}

fn cmd_run(store_dir: &Path, scenario: &str, use_cache: bool, events: bool) -> AppResult<()> {
    let config = scenario_service::resolve_scenario(scenario)?;
    let store = RunStore::new(store_dir.to_path_buf())?;
    println!("Running scenario: {}", config.name);

    let request = RunRequest {
        config: &config,
        store: &store,
        options: RunOptions {
            use_cache,
            ..RunOptions::default()
        },
    };

    let mut last_emit = Instant::now();
    let mut last_stage = None;
    let response = run_service::ensure_run_with_progress(
        &request,
        Some(&mut |event: RunProgressEvent| {
            let emit_now =
                last_stage != Some(event.stage) || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                last_stage = Some(event.stage);
                last_emit = Instant::now();
            }
        }),
    )?;
    clear_progress_line();

    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {}", response.run_id);
    } else {
        println!("✓ Simulation completed: {}", response.run_id);
    }
    print_summary(&response.summary, events);
    println!(
        "\nTiming: simulate {:.3}s, save {:.3}s, total {:.3}s",
        response.timing.simulate_time_s, response.timing.save_time_s, response.timing.total_time_s
    );
    Ok(())
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(100));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    match (&event.stage, &event.sim) {
        (RunStage::Simulating, Some(p)) => {
            let width = 28usize;
            let filled = ((p.fraction_complete * width as f64).round() as usize).min(width);
            print!(
                "\r[{}{}] {:>6.2}%  t={:.0}s  T={:.1}°C  elapsed={:.1}s",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled)),
                p.fraction_complete * 100.0,
                p.sim_time_s,
                p.temperature_c,
                event.elapsed_wall_s
            );
        }
        _ => {
            let mut line = format!(
                "\r{}  elapsed={:.2}s",
                event.stage.label(),
                event.elapsed_wall_s
            );
            if let Some(msg) = &event.message {
                line.push_str(&format!("  {}", msg));
            }
            print!("{}", line);
        }
    }
    let _ = io::stdout().flush();
}

fn print_summary(summary: &RunSummary, events: bool) {
    let mark = match summary.verdict {
        Verdict::Pass => "✓",
        Verdict::Fail => "✗",
    };
    println!("\n{} {} ({})", mark, summary.verdict, summary.scenario);
    println!(
        "  Temperature: initial {:.1}°C, final {:.1}°C, peak {:.1}°C at {:.0}s (critical {:.1}°C)",
        summary.initial_c, summary.final_c, summary.peak_c, summary.peak_time_s, summary.critical_c
    );
    println!(
        "  Ticks: {} ({:.0}s simulated){}{}",
        summary.ticks,
        summary.simulated_s,
        if summary.halted { ", halted" } else { "" },
        if summary.aborted { ", aborted" } else { "" }
    );
    println!(
        "  Gas used: {:.1}%  Battery used: {:.1}%  Purges: {}  Canister switches: {}",
        summary.gas_used_pct, summary.battery_used_pct, summary.purge_count, summary.canister_switches
    );
    if summary.instability_count > 0 {
        println!(
            "  Numerical warnings: {} (truncation bound {:.2}°C)",
            summary.instability_count, summary.truncation_bound_c
        );
    }

    let ledger = &summary.ledger;
    println!("\nEnergy ledger:");
    println!("  Heat in:  {:>10.0} J", ledger.heat_in_j);
    let shares = ledger.shares_pct();
    for ((name, joules), (_, pct)) in ledger.cooling_j.entries().iter().zip(shares.entries()) {
        println!("  {:<10}{:>10.0} J  {:>5.1}%", name, joules, pct);
    }
    println!("  Stored:   {:>10.0} J", ledger.stored_j);
    println!("  Residual: {:>10.3e} J", ledger.residual_j());

    if events {
        println!("\nEvents:");
        for event in &summary.events {
            println!("  {:>8.1}s  {:?}", event.time_s, event.kind);
        }
    }
}

fn cmd_sweep(
    scenario: &str,
    param: &str,
    values: &[f64],
    abort_above: Option<f64>,
) -> AppResult<()> {
    let base = scenario_service::resolve_scenario(scenario)?;
    let cases = sweep::vary(&base, param, values)?;
    println!("Sweeping {} over {} values of {}", base.name, cases.len(), param);

    let started = Instant::now();
    let outcomes = sweep::run_sweep(
        &cases,
        &SweepOptions {
            abort_above_c: abort_above,
        },
    );

    println!(
        "\n{:>12}  {:>7}  {:>8}  {:>8}  {:>6}  {:>8}",
        "value", "verdict", "final°C", "peak°C", "gas%", "battery%"
    );
    for outcome in outcomes {
        match outcome.result {
            Ok(s) => println!(
                "{:>12}  {:>7}  {:>8.1}  {:>8.1}  {:>6.1}  {:>8.1}{}",
                outcome.value,
                s.verdict.to_string(),
                s.final_c,
                s.peak_c,
                s.gas_used_pct,
                s.battery_used_pct,
                if s.aborted { "  (aborted)" } else { "" }
            ),
            Err(reason) => println!("{:>12}  error: {}", outcome.value, reason),
        }
    }
    println!("\nElapsed: {:.3}s", started.elapsed().as_secs_f64());
    Ok(())
}

fn cmd_runs(store_dir: &Path, scenario: Option<&str>) -> AppResult<()> {
    let store = RunStore::new(store_dir.to_path_buf())?;
    let runs = run_service::list_runs(&store, scenario)?;

    if runs.is_empty() {
        println!("No stored runs in {}", store_dir.display());
    } else {
        println!("Stored runs:");
        for manifest in runs {
            println!(
                "  {}  {:<20} {}  {}",
                manifest.run_id, manifest.scenario, manifest.verdict, manifest.timestamp
            );
        }
    }
    Ok(())
}

fn cmd_show_run(store_dir: &Path, run_id: &str, events: bool) -> AppResult<()> {
    let store = RunStore::new(store_dir.to_path_buf())?;
    println!("Loading run: {}", run_id);
    let (manifest, summary, trace) = run_service::load_run(&store, run_id)?;
    println!(
        "  Scenario: {}  engine {}  stored {}",
        manifest.scenario, manifest.engine_version, manifest.timestamp
    );

    if let Ok(t) = query::summarize_trace(&trace) {
        println!(
            "  Trace: {} records, {:.0} - {:.0} s, {} purge ticks",
            t.record_count, t.time_range.0, t.time_range.1, t.purge_ticks
        );
        for (mode, count) in &t.mode_counts {
            println!("    {:<10} {}", mode, count);
        }
    }
    print_summary(&summary, events);
    Ok(())
}

fn cmd_export_trace(
    store_dir: &Path,
    run_id: &str,
    variable: Option<&str>,
    output: Option<&Path>,
) -> AppResult<()> {
    let store = RunStore::new(store_dir.to_path_buf())?;
    let trace = store.load_trace(run_id)?;

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout()),
    };
    match variable {
        Some(name) => {
            let series = query::extract_series(&trace, name)?;
            writeln!(writer, "time_s,{}", name)?;
            for (t, v) in series {
                writeln!(writer, "{},{}", t, v)?;
            }
        }
        None => query::export_csv(&trace, &mut writer)?,
    }
    writer.flush()?;

    if let Some(path) = output {
        eprintln!("✓ Exported {} records to {}", trace.len(), path.display());
    }
    Ok(())
}

fn cmd_firmware_table(from: f64, to: f64, step: f64) -> AppResult<()> {
    if !(step > 0.0) || !(to >= from) {
        return Err(AppError::InvalidInput(
            "expected --step > 0 and --to >= --from".to_string(),
        ));
    }
    let policy = ControlPolicy::new(PolicyConfig::default())
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;
    let sample = SampleConfig::new(1.0).map_err(|e| AppError::InvalidInput(e.to_string()))?;

    println!(
        "{:>7}  {:<10} {:>5} {:>5} {:>7} {:>7}",
        "T °C", "mode", "burst", "purge", "tec_pwm", "fan_pwm"
    );
    let steps = ((to - from) / step).floor() as usize;
    for k in 0..=steps {
        let temp_c = from + k as f64 * step;
        // fresh controller per row so the burst schedule starts open
        let mut controller = FirmwareController::new(policy.clone(), sample);
        let frame = controller.tick(
            0.0,
            SensorReadings {
                die_c: temp_c,
                enclosure_c: temp_c,
            },
        );
        let mode = controller
            .last_mode()
            .map_or_else(|| "-".to_string(), |m| m.to_string());
        println!(
            "{:>7.1}  {:<10} {:>5} {:>5} {:>7} {:>7}",
            temp_c,
            mode,
            frame.burst_valve_open,
            frame.purge_valve_open,
            frame.tec_pwm,
            frame.fan_pwm
        );
    }
    Ok(())
}
