//! Solar upgrade planner entry point: config loading, climate resolution,
//! optimization, and export.

use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use solar_upgrade_planner::cli::{parse_args, print_usage};
use solar_upgrade_planner::climate::resolver::{ClimateCaches, resolve_climate};
use solar_upgrade_planner::config::PlannerConfig;
use solar_upgrade_planner::io::export::{PlanReport, export_csv, export_json};
use solar_upgrade_planner::optimizer::{
    OptimizeOptions, PlanningContext, build_expansion_explanation, optimize_upgrades,
};
use solar_upgrade_planner::telemetry::init_tracing;

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn main() {
    init_tracing();

    let cli = match parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("error: {e}");
            print_usage();
            process::exit(1);
        }
    };

    // --config takes priority, then --preset, then baseline
    let loaded = if let Some(ref path) = cli.config {
        PlannerConfig::from_toml_file(path)
    } else if let Some(ref name) = cli.preset {
        PlannerConfig::from_preset(name)
    } else {
        Ok(PlannerConfig::baseline())
    };
    let mut config = match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    if let Some(zip) = cli.zip {
        config.climate.zip_code = zip;
    }

    let config = match config.into_validated() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    // No live source: the resolver falls back to the synthetic profile
    let mut caches = ClimateCaches::in_memory();
    let snapshot = resolve_climate(
        &config.climate.zip_code,
        &config.climate.api_key,
        &mut caches,
        None,
        unix_now(),
        false,
    );
    let ctx = PlanningContext::new(&config, Some(&snapshot));

    let optimization = match optimize_upgrades(&ctx, &OptimizeOptions::default()) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    let expansion = match build_expansion_explanation(&ctx, &optimization) {
        Ok(result) => Some(result),
        Err(e) => {
            eprintln!("warning: {e}");
            None
        }
    };

    println!("{}\n", ctx.inputs.climate);
    println!("{optimization}");
    if let Some(ref exp) = expansion {
        println!("\n{exp}");
    }

    if let Some(ref path) = cli.csv_out {
        if let Err(e) = export_csv(&optimization.results, path) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Scenarios written to {}", path.display());
    }

    if let Some(ref path) = cli.json_out {
        let report = PlanReport {
            climate: &ctx.inputs.climate,
            optimization: &optimization,
            expansion: expansion.as_ref(),
        };
        if let Err(e) = export_json(&report, path) {
            eprintln!("error: failed to write JSON: {e}");
            process::exit(1);
        }
        eprintln!("Report written to {}", path.display());
    }
}
