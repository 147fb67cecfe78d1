//! CSV and JSON export of planning results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::inputs::ClimateInfo;
use crate::optimizer::{ExpansionResult, OptimizationResult, Scenario};

/// Column header for the ranked scenario table.
const HEADER: &str = "rank,final_solar_kw,final_batteries,is_no_upgrade,added_solar_kw,\
                       incremental_capex,incremental_annual_benefit,incremental_monthly_net_outflow,\
                       levered_npv,unlevered_npv,unlevered_irr,payback_years,\
                       annual_solar_kwh,utility_bill_after,vpp_revenue,clipped_pct";

/// Everything written by the JSON export.
#[derive(Debug, Serialize)]
pub struct PlanReport<'a> {
    pub climate: &'a ClimateInfo,
    pub optimization: &'a OptimizationResult,
    pub expansion: Option<&'a ExpansionResult>,
}

/// Exports ranked scenarios to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(scenarios: &[Scenario], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_csv(scenarios, io::BufWriter::new(file))
}

/// Writes ranked scenarios as CSV to any writer, best first.
///
/// An undefined IRR or a payback that never happens is an empty cell.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(scenarios: &[Scenario], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for (rank, s) in scenarios.iter().enumerate() {
        wtr.write_record(&[
            (rank + 1).to_string(),
            format!("{:.2}", s.final_solar_kw),
            s.final_batteries.to_string(),
            s.is_no_upgrade.to_string(),
            format!("{:.2}", s.costs.added_solar_kw),
            format!("{:.2}", s.incremental_capex()),
            format!("{:.2}", s.incremental_annual_benefit),
            format!("{:.2}", s.incremental_monthly_net_outflow),
            format!("{:.2}", s.incremental_npv()),
            format!("{:.2}", s.unlevered.npv),
            s.unlevered.irr.map(|r| format!("{r:.6}")).unwrap_or_default(),
            s.unlevered.payback_years.map(|y| y.to_string()).unwrap_or_default(),
            format!("{:.1}", s.annual.solar_generation_kwh),
            format!("{:.2}", s.annual.utility_bill_after),
            format!("{:.2}", s.annual.vpp_revenue),
            format!("{:.4}", s.annual.clipped_pct),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports the full report as pretty-printed JSON.
///
/// # Errors
///
/// Returns an `io::Error` if file creation, serialisation, or writing fails.
pub fn export_json(report: &PlanReport<'_>, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_json(report, io::BufWriter::new(file))
}

/// # Errors
///
/// Returns an `io::Error` if serialisation or writing fails.
pub fn write_json(report: &PlanReport<'_>, mut writer: impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;
    use crate::optimizer::{OptimizeOptions, PlanningContext, build_expansion_explanation, optimize_upgrades};

    fn run() -> (PlanningContext, OptimizationResult) {
        let mut cfg = PlannerConfig::baseline();
        cfg.sizing.solar_max_kw = 6.0;
        cfg.sizing.solar_step_kw = 1.0;
        let ctx = PlanningContext::new(&cfg, None);
        let opt = optimize_upgrades(&ctx, &OptimizeOptions::default()).unwrap();
        (ctx, opt)
    }

    #[test]
    fn header_and_row_count() {
        let (_, opt) = run();
        let mut buf = Vec::new();
        write_csv(&opt.results, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("rank,final_solar_kw,final_batteries,is_no_upgrade"));
        assert_eq!(lines.len(), opt.results.len() + 1);
        assert!(lines[1].starts_with("1,"));
    }

    #[test]
    fn csv_round_trip_parseable() {
        let (_, opt) = run();
        let mut buf = Vec::new();
        write_csv(&opt.results, &mut buf).unwrap();

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let headers = rdr.headers().cloned().unwrap();
        assert_eq!(headers.len(), 16);
        for record in rdr.records() {
            let rec = record.unwrap();
            let solar: f64 = rec[1].parse().unwrap();
            assert!(solar >= 3.95);
            let _: bool = rec[3].parse().unwrap();
            assert!(rec[8].parse::<f64>().is_ok(), "levered NPV should parse");
        }
    }

    #[test]
    fn deterministic_output() {
        let (_, opt) = run();
        let mut a = Vec::new();
        let mut b = Vec::new();
        write_csv(&opt.results, &mut a).unwrap();
        write_csv(&opt.results, &mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn json_report_has_sections() {
        let (ctx, opt) = run();
        let expansion = build_expansion_explanation(&ctx, &opt).unwrap();
        let report = PlanReport {
            climate: &ctx.inputs.climate,
            optimization: &opt,
            expansion: Some(&expansion),
        };
        let mut buf = Vec::new();
        write_json(&report, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["climate"]["status"], "fallback_synthetic");
        assert_eq!(value["optimization"]["objective"], "max_incremental_levered_npv");
        assert_eq!(value["expansion"]["steps"].as_array().map(Vec::len), Some(2));
    }
}
