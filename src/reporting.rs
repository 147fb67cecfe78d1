//! Plain-text summaries of planning results.

use std::fmt;

use crate::inputs::ClimateInfo;
use crate::optimizer::{ExpansionResult, OptimizationResult};

/// How many ranked scenarios the summary lists.
pub const TOP_SCENARIOS: usize = 5;

impl fmt::Display for ClimateInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Climate ---")?;
        writeln!(f, "Location:        {}", self.location_label)?;
        write!(f, "Status:          {:?}", self.status)?;
        if let Some(reason) = self.fallback_reason {
            write!(f, " ({reason:?})")?;
        }
        Ok(())
    }
}

impl fmt::Display for OptimizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = &self.baseline;
        writeln!(f, "--- Baseline ---")?;
        writeln!(f, "System:                {}", base.label)?;
        writeln!(f, "Annual bill before:    ${:.2}", base.annual.bill_before)?;
        writeln!(f, "Annual bill after:     ${:.2}", base.annual.utility_bill_after)?;
        writeln!(f, "Monthly with loan:     ${:.2}", base.monthly_net_outflow_with_loan)?;
        writeln!(f)?;

        let best = &self.best;
        writeln!(f, "--- Recommendation ---")?;
        if self.no_upgrade_recommended {
            writeln!(f, "No upgrade: keep the baseline system.")?;
        } else {
            writeln!(
                f,
                "Upgrade to:            {:.2} kW solar, {} batteries",
                best.final_solar_kw, best.final_batteries
            )?;
            writeln!(f, "Incremental capex:     ${:.2}", best.incremental_capex())?;
            writeln!(f, "Annual benefit:        ${:.2}", best.incremental_annual_benefit)?;
            writeln!(f, "Levered NPV:           ${:.2}", best.incremental_npv())?;
            match best.unlevered.irr {
                Some(irr) => writeln!(f, "Unlevered IRR:         {:.2}%", irr * 100.0)?,
                None => writeln!(f, "Unlevered IRR:         n/a")?,
            }
            match best.unlevered.payback_years {
                Some(y) => writeln!(f, "Payback:               {y} years")?,
                None => writeln!(f, "Payback:               never")?,
            }
            writeln!(f, "Monthly net change:    ${:+.2}", best.incremental_monthly_net_outflow)?;
        }
        writeln!(f)?;

        writeln!(f, "--- Top scenarios ({} evaluated) ---", self.results.len())?;
        for (rank, s) in self.results.iter().take(TOP_SCENARIOS).enumerate() {
            writeln!(
                f,
                "{:>2}. {:>6.2} kW, {} batt  NPV ${:>10.2}  capex ${:>10.2}  monthly {:+.2}",
                rank + 1,
                s.final_solar_kw,
                s.final_batteries,
                s.incremental_npv(),
                s.incremental_capex(),
                s.incremental_monthly_net_outflow
            )?;
        }
        write!(f, "Invalid scenarios:     {}", self.invalid_scenarios)
    }
}

impl fmt::Display for ExpansionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--- Battery expansion ---")?;
        for step in &self.steps {
            let marker = if step.on_recommended_path { "*" } else { " " };
            write!(
                f,
                "\n{marker} {} -> {} batt at {:.2} kW: benefit {:+.2}/yr, NPV {:+.2}, monthly {:+.2}",
                step.from_batteries,
                step.to_batteries,
                step.best_solar_kw,
                step.delta_annual_benefit,
                step.delta_npv,
                step.delta_monthly_outflow
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::PlannerConfig;
    use crate::optimizer::{OptimizeOptions, PlanningContext, build_expansion_explanation, optimize_upgrades};

    #[test]
    fn summary_lists_baseline_and_ranking() {
        let mut cfg = PlannerConfig::baseline();
        cfg.sizing.solar_max_kw = 6.0;
        cfg.sizing.solar_step_kw = 1.0;
        let ctx = PlanningContext::new(&cfg, None);
        let opt = optimize_upgrades(&ctx, &OptimizeOptions::default()).unwrap();
        let text = opt.to_string();
        assert!(text.contains("--- Baseline ---"));
        assert!(text.contains("3.95 kW (10 modules)"));
        assert!(text.contains(" 1. "));

        let exp = build_expansion_explanation(&ctx, &opt).unwrap();
        let text = exp.to_string();
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("0 -> 1 batt"));

        let climate = ctx.inputs.climate.to_string();
        assert!(climate.contains("FallbackSynthetic"));
    }
}
