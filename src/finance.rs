//! Loan payments and multi-year return projections.

use serde::Serialize;

use crate::inputs::{AnalysisInputs, FinancingInputs};

/// Lower bound of the IRR search bracket.
const IRR_LOW: f64 = -0.99;
/// Initial upper bound of the IRR search bracket.
const IRR_HIGH: f64 = 1.0;
const IRR_BRACKET_GROWTH: f64 = 1.6;
const IRR_MAX_BRACKET_STEPS: u32 = 32;
const IRR_MAX_RATE: f64 = 200.0;
const IRR_ITERATIONS: u32 = 120;
const IRR_TOLERANCE: f64 = 1e-8;

/// Monthly payment that amortizes `principal` over `years`.
///
/// # Arguments
///
/// * `principal` - Amount financed ($); non-positive gives 0
/// * `apr` - Annual percentage rate as a fraction (0.06 = 6 %)
/// * `years` - Loan term; 0 is treated as 1
///
/// # Examples
///
/// ```
/// use solar_upgrade_planner::finance::monthly_payment;
///
/// assert_eq!(monthly_payment(12_000.0, 0.0, 1), 1_000.0);
/// ```
pub fn monthly_payment(principal: f64, apr: f64, years: u32) -> f64 {
    if principal.is_nan() || principal <= 0.0 {
        return 0.0;
    }
    let n = f64::from(years.max(1) * 12);
    let apr = if apr.is_finite() { apr.max(0.0) } else { 0.0 };
    if apr <= 0.0 {
        return principal / n;
    }
    let r = apr / 12.0;
    principal * r / (1.0 - (1.0 + r).powf(-n))
}

/// Net present value of `cash_flows` at `rate`; index 0 is undiscounted.
pub fn npv(rate: f64, cash_flows: &[f64]) -> f64 {
    cash_flows
        .iter()
        .enumerate()
        .map(|(year, cf)| cf / (1.0 + rate).powi(year as i32))
        .sum()
}

/// Internal rate of return by bisection.
///
/// Returns `None` when the flows do not contain both signs or no sign
/// change of the NPV can be bracketed.
pub fn irr(cash_flows: &[f64]) -> Option<f64> {
    if cash_flows.len() < 2 {
        return None;
    }
    let has_negative = cash_flows.iter().any(|&cf| cf < 0.0);
    let has_positive = cash_flows.iter().any(|&cf| cf > 0.0);
    if !(has_negative && has_positive) {
        return None;
    }

    let mut low = IRR_LOW;
    let mut high = IRR_HIGH;
    let mut low_val = npv(low, cash_flows);
    let mut high_val = npv(high, cash_flows);

    let mut steps = 0;
    while low_val * high_val > 0.0 && steps < IRR_MAX_BRACKET_STEPS && high < IRR_MAX_RATE {
        high *= IRR_BRACKET_GROWTH;
        high_val = npv(high, cash_flows);
        steps += 1;
    }
    if !low_val.is_finite() || !high_val.is_finite() || low_val * high_val > 0.0 {
        return None;
    }

    for _ in 0..IRR_ITERATIONS {
        let mid = 0.5 * (low + high);
        let mid_val = npv(mid, cash_flows);
        if !mid_val.is_finite() {
            return None;
        }
        if mid_val.abs() < IRR_TOLERANCE {
            return Some(mid);
        }
        if low_val * mid_val <= 0.0 {
            high = mid;
        } else {
            low = mid;
            low_val = mid_val;
        }
    }
    Some(0.5 * (low + high))
}

/// Multi-year cash-flow projection for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    /// Year 0 first.
    pub cash_flows: Vec<f64>,
    pub npv: f64,
    pub irr: Option<f64>,
    /// First year the cumulative cash flow reaches zero; `None` if never.
    pub payback_years: Option<u32>,
    pub cumulative: f64,
}

impl Projection {
    fn from_cash_flows(cash_flows: Vec<f64>, discount_rate: f64) -> Self {
        let mut cumulative = 0.0;
        let mut payback_years = None;
        for (year, cf) in cash_flows.iter().enumerate() {
            cumulative += cf;
            if year > 0 && payback_years.is_none() && cumulative >= 0.0 {
                payback_years = Some(year as u32);
            }
        }
        Self {
            npv: npv(discount_rate, &cash_flows),
            irr: irr(&cash_flows),
            payback_years,
            cumulative,
            cash_flows,
        }
    }
}

/// Escalation, degradation, and discount settings clamped to usable ranges.
#[derive(Debug, Clone, Copy)]
struct Horizon {
    years: u32,
    discount_rate: f64,
    /// Year-over-year benefit growth factor.
    annual_scale: f64,
}

impl Horizon {
    fn new(analysis: &AnalysisInputs, battery_count: u32) -> Self {
        let clean = |v: f64, hi: f64| if v.is_finite() { v.clamp(0.0, hi) } else { 0.0 };
        let battery_factor = if battery_count > 0 {
            1.0 - clean(analysis.battery_degradation, 1.0)
        } else {
            1.0
        };
        Self {
            years: analysis.years.max(1),
            discount_rate: clean(analysis.discount_rate, 2.0),
            annual_scale: (1.0 + clean(analysis.utility_escalation, 1.0))
                * (1.0 - clean(analysis.solar_degradation, 1.0))
                * battery_factor,
        }
    }

    fn benefit(&self, first_year_benefit: f64, year: u32) -> f64 {
        first_year_benefit * self.annual_scale.powi(year as i32 - 1)
    }
}

/// Projects an upgrade paid in cash: `[-capex, benefit_1, .., benefit_N]`.
///
/// # Arguments
///
/// * `analysis` - Horizon and rates
/// * `capex` - Incremental upfront cost (floored at 0)
/// * `annual_benefit` - First-year incremental operating benefit
/// * `battery_count` - Batteries in the candidate; any enables battery degradation
pub fn project_unlevered(analysis: &AnalysisInputs, capex: f64, annual_benefit: f64, battery_count: u32) -> Projection {
    let horizon = Horizon::new(analysis, battery_count);
    let capex = if capex.is_finite() { capex.max(0.0) } else { 0.0 };
    let benefit = if annual_benefit.is_finite() { annual_benefit } else { 0.0 };

    let cash_flows = std::iter::once(-capex)
        .chain((1..=horizon.years).map(|y| horizon.benefit(benefit, y)))
        .collect();
    Projection::from_cash_flows(cash_flows, horizon.discount_rate)
}

/// Projects a fully financed upgrade.
///
/// Nothing is paid up front; each year carries the operating benefit less
/// twelve loan payments while the loan is outstanding.
pub fn project_levered(
    analysis: &AnalysisInputs,
    financing: &FinancingInputs,
    capex: f64,
    annual_benefit: f64,
    battery_count: u32,
) -> Projection {
    let horizon = Horizon::new(analysis, battery_count);
    let capex = if capex.is_finite() { capex.max(0.0) } else { 0.0 };
    let benefit = if annual_benefit.is_finite() { annual_benefit } else { 0.0 };
    let annual_debt_service = 12.0 * monthly_payment(capex, financing.apr, financing.years);

    let cash_flows = std::iter::once(0.0)
        .chain((1..=horizon.years).map(|y| {
            let debt = if y <= financing.years { annual_debt_service } else { 0.0 };
            horizon.benefit(benefit, y) - debt
        }))
        .collect();
    Projection::from_cash_flows(cash_flows, horizon.discount_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis() -> AnalysisInputs {
        AnalysisInputs {
            years: 15,
            discount_rate: 0.06,
            utility_escalation: 0.03,
            solar_degradation: 0.005,
            battery_degradation: 0.02,
        }
    }

    #[test]
    fn zero_interest_is_straight_line() {
        assert!((monthly_payment(10_000.0, 0.0, 15) - 10_000.0 / 180.0).abs() < 1e-9);
        assert_eq!(monthly_payment(0.0, 0.06, 15), 0.0);
        assert_eq!(monthly_payment(-5.0, 0.06, 15), 0.0);
    }

    #[test]
    fn amortized_payment_matches_formula() {
        // $10k at 6 % over 15 years
        let p = monthly_payment(10_000.0, 0.06, 15);
        assert!((p - 84.385_68).abs() < 1e-4, "payment was {p}");
        assert_eq!(monthly_payment(10_000.0, 0.06, 0), monthly_payment(10_000.0, 0.06, 1));
    }

    #[test]
    fn irr_of_simple_annuity() {
        let flows = [-10_000.0, 3_000.0, 3_000.0, 3_000.0, 3_000.0, 3_000.0];
        let rate = irr(&flows).unwrap();
        assert!(rate > 0.0 && rate < 1.0);
        assert!(npv(rate, &flows).abs() < 1e-4);
        // about 15.24 %
        assert!((rate - 0.1524).abs() < 1e-3);
        assert_eq!(irr(&flows), Some(rate));
    }

    #[test]
    fn irr_requires_both_signs() {
        assert_eq!(irr(&[]), None);
        assert_eq!(irr(&[-1.0]), None);
        assert_eq!(irr(&[-100.0, -10.0]), None);
        assert_eq!(irr(&[0.0, 10.0, 10.0]), None);
    }

    #[test]
    fn irr_is_negative_for_losing_investment() {
        let rate = irr(&[-10_000.0, 1_000.0, 1_000.0, 1_000.0]).unwrap();
        assert!(rate < 0.0 && rate > -0.99);
    }

    #[test]
    fn unlevered_projection_grows_and_pays_back() {
        let mut a = analysis();
        a.utility_escalation = 0.0;
        a.solar_degradation = 0.0;
        a.discount_rate = 0.0;
        let p = project_unlevered(&a, 10_000.0, 2_500.0, 0);
        assert_eq!(p.cash_flows.len(), 16);
        assert_eq!(p.cash_flows[0], -10_000.0);
        assert_eq!(p.payback_years, Some(4));
        assert!((p.npv - (15.0 * 2_500.0 - 10_000.0)).abs() < 1e-6);
        assert!((p.cumulative - p.npv).abs() < 1e-6);
    }

    #[test]
    fn battery_degradation_only_with_batteries() {
        let a = analysis();
        let without = project_unlevered(&a, 5_000.0, 1_000.0, 0);
        let with = project_unlevered(&a, 5_000.0, 1_000.0, 1);
        assert_eq!(without.cash_flows[1], with.cash_flows[1]);
        assert!(with.cash_flows[5] < without.cash_flows[5]);
        let scale = 1.03 * 0.995;
        assert!((without.cash_flows[3] - 1_000.0 * scale * scale).abs() < 1e-9);
    }

    #[test]
    fn never_paying_back_is_none() {
        let p = project_unlevered(&analysis(), 50_000.0, 100.0, 0);
        assert_eq!(p.payback_years, None);
        assert!(p.npv < 0.0);
    }

    #[test]
    fn levered_projection_nets_debt_service() {
        let mut a = analysis();
        a.utility_escalation = 0.0;
        a.solar_degradation = 0.0;
        let financing = FinancingInputs { apr: 0.0, years: 10 };
        let p = project_levered(&a, &financing, 12_000.0, 2_000.0, 0);
        assert_eq!(p.cash_flows[0], 0.0);
        assert!((p.cash_flows[1] - (2_000.0 - 1_200.0)).abs() < 1e-9);
        assert!((p.cash_flows[10] - 800.0).abs() < 1e-9);
        assert!((p.cash_flows[11] - 2_000.0).abs() < 1e-9);
        assert_eq!(p.payback_years, Some(1));
    }

    #[test]
    fn zero_capex_levered_equals_unlevered_benefits() {
        let a = analysis();
        let financing = FinancingInputs { apr: 0.06, years: 15 };
        let lev = project_levered(&a, &financing, 0.0, 500.0, 0);
        let unlev = project_unlevered(&a, 0.0, 500.0, 0);
        assert!((lev.npv - unlev.npv).abs() < 1e-9);
    }
}
