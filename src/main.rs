//! EV charging planner entry point: CLI wiring around the planning runner.

use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;

use ev_planner::config::PlannerConfig;
use ev_planner::io::export::{export_report_json, export_schedule_csv, export_sites_csv};
use ev_planner::runner::run_planning;

/// Parsed CLI arguments.
struct CliArgs {
    config_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    report_out: Option<String>,
    sites_out: Option<String>,
    schedule_out: Option<String>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("ev-planner: EV charging infrastructure planner");
    eprintln!();
    eprintln!("Usage: ev-planner [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>          Load planning config from TOML file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        PlannerConfig::PRESETS.join(", ")
    );
    eprintln!("  --seed <u64>             Override every random seed");
    eprintln!("  --report-out <path>      Write the full report as JSON");
    eprintln!("  --sites-out <path>       Write recommended sites as CSV");
    eprintln!("  --schedule-out <path>    Write the hourly schedule as CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after planning");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the baseline preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}

/// Returns the value following a flag, exiting if it is missing.
fn flag_value(args: &[String], i: usize, flag: &str, kind: &str) -> String {
    match args.get(i) {
        Some(v) => v.clone(),
        None => {
            eprintln!("error: {flag} requires a {kind} argument");
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        config_path: None,
        preset: None,
        seed_override: None,
        report_out: None,
        sites_out: None,
        schedule_out: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--config" => {
                i += 1;
                cli.config_path = Some(flag_value(&args, i, "--config", "path"));
            }
            "--preset" => {
                i += 1;
                cli.preset = Some(flag_value(&args, i, "--preset", "name"));
            }
            "--seed" => {
                i += 1;
                let raw = flag_value(&args, i, "--seed", "u64");
                if let Ok(s) = raw.parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{raw}\" is not a valid u64");
                    process::exit(1);
                }
            }
            "--report-out" => {
                i += 1;
                cli.report_out = Some(flag_value(&args, i, "--report-out", "path"));
            }
            "--sites-out" => {
                i += 1;
                cli.sites_out = Some(flag_value(&args, i, "--sites-out", "path"));
            }
            "--schedule-out" => {
                i += 1;
                cli.schedule_out = Some(flag_value(&args, i, "--schedule-out", "path"));
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                let raw = flag_value(&args, i, "--port", "u16");
                if let Ok(p) = raw.parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{raw}\" is not a valid u16");
                    process::exit(1);
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = parse_args();
    init_logging();

    // --config takes priority, then --preset, then baseline
    let mut config = if let Some(ref path) = cli.config_path {
        match PlannerConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match PlannerConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        PlannerConfig::baseline()
    };

    if let Some(seed) = cli.seed_override {
        config.placement.seed = seed;
        config.clustering.seed = seed;
        config.data.seed = seed;
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let report = match run_planning(&config) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    println!("{report}");

    if let Some(ref path) = cli.report_out {
        if let Err(e) = export_report_json(&report, Path::new(path)) {
            eprintln!("error: failed to write report: {e}");
            process::exit(1);
        }
        eprintln!("Report written to {path}");
    }
    if let Some(ref path) = cli.sites_out {
        if let Err(e) = export_sites_csv(report.sites(), Path::new(path)) {
            eprintln!("error: failed to write sites CSV: {e}");
            process::exit(1);
        }
        eprintln!("Sites written to {path}");
    }
    if let Some(ref path) = cli.schedule_out {
        if let Err(e) = export_schedule_csv(&report.schedule, Path::new(path)) {
            eprintln!("error: failed to write schedule CSV: {e}");
            process::exit(1);
        }
        eprintln!("Schedule written to {path}");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(ev_planner::api::AppState { config, report });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(ev_planner::api::serve(state, addr)) {
            eprintln!("error: API server failed on {addr}: {e}");
            process::exit(1);
        }
    }
}
