use std::env;
use std::path::PathBuf;

pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub zip: Option<String>,
    pub csv_out: Option<PathBuf>,
    pub json_out: Option<PathBuf>,
}

/// Parses the process arguments.
///
/// # Errors
///
/// Returns a message for unknown, repeated, or conflicting arguments.
pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(&args)
}

pub fn parse_args_from(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut config = None;
    let mut preset = None;
    let mut zip = None;
    let mut csv_out = None;
    let mut json_out = None;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --config (expected a TOML file path)")?;
                if config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                if preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--zip" => {
                i += 1;
                let value = args.next_or_err(i, "missing value for --zip (expected a 5-digit ZIP code)")?;
                if zip.replace(value.to_string()).is_some() {
                    return Err("--zip provided more than once".to_string());
                }
            }
            "--csv-out" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --csv-out (expected a file path)")?;
                if csv_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--csv-out provided more than once".to_string());
                }
            }
            "--json-out" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --json-out (expected a file path)")?;
                if json_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--json-out provided more than once".to_string());
                }
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if config.is_some() && preset.is_some() {
        return Err("arguments `--config` and `--preset` are mutually exclusive; choose one source".to_string());
    }

    Ok(CliOptions {
        config,
        preset,
        zip,
        csv_out,
        json_out,
    })
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index).map(String::as_str).ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("solar-upgrade-planner: rank solar and battery upgrades over a builder baseline");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  solar-upgrade-planner [--config <path> | --preset <name>] [--zip <zip>]");
    eprintln!("                        [--csv-out <path>] [--json-out <path>]");
    eprintln!();
    eprintln!("Presets: baseline, flex_home, vpp_529 (default: baseline)");
    eprintln!("Log level follows RUST_LOG (default: info).");
}
