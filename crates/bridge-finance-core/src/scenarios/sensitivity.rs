use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::bridge::financing::{calculate_bridge_financing, BridgeMetric, DealParameters};
use crate::error::BridgeFinanceError;
use crate::types::*;
use crate::BridgeFinanceResult;

/// Largest sweep accepted on one axis, and for a whole 2-way grid.
pub const MAX_GRID_POINTS: usize = 10_000;

/// A deal term that can be swept
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DealVariable {
    InvoiceAmount,
    AnnualInterestRatePct,
    DaysOutstanding,
    MarginPct,
    AdvanceRatePct,
    ArrangementFeePct,
    FixedFee,
}

impl DealVariable {
    pub const ALL: [DealVariable; 7] = [
        DealVariable::InvoiceAmount,
        DealVariable::AnnualInterestRatePct,
        DealVariable::DaysOutstanding,
        DealVariable::MarginPct,
        DealVariable::AdvanceRatePct,
        DealVariable::ArrangementFeePct,
        DealVariable::FixedFee,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DealVariable::InvoiceAmount => "invoice_amount",
            DealVariable::AnnualInterestRatePct => "annual_interest_rate_pct",
            DealVariable::DaysOutstanding => "days_outstanding",
            DealVariable::MarginPct => "margin_pct",
            DealVariable::AdvanceRatePct => "advance_rate_pct",
            DealVariable::ArrangementFeePct => "arrangement_fee_pct",
            DealVariable::FixedFee => "fixed_fee",
        }
    }

    pub fn from_name(name: &str) -> BridgeFinanceResult<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.name() == name)
            .ok_or_else(|| BridgeFinanceError::InvalidInput {
                field: format!("variable:{name}"),
                reason: "Not a deal parameter".into(),
            })
    }

    /// Current value of this term on a deal.
    pub fn get(self, params: &DealParameters) -> Decimal {
        match self {
            DealVariable::InvoiceAmount => params.invoice_amount,
            DealVariable::AnnualInterestRatePct => params.annual_interest_rate_pct,
            DealVariable::DaysOutstanding => Decimal::from(params.days_outstanding),
            DealVariable::MarginPct => params.margin_pct,
            DealVariable::AdvanceRatePct => params.advance_rate_pct,
            DealVariable::ArrangementFeePct => params.arrangement_fee_pct,
            DealVariable::FixedFee => params.fixed_fee,
        }
    }

    /// Copy of `params` with this term replaced by `value`.
    pub fn apply(self, params: &DealParameters, value: Decimal) -> BridgeFinanceResult<DealParameters> {
        let mut out = params.clone();
        match self {
            DealVariable::InvoiceAmount => out.invoice_amount = value,
            DealVariable::AnnualInterestRatePct => out.annual_interest_rate_pct = value,
            DealVariable::DaysOutstanding => out.days_outstanding = whole_days(value)?,
            DealVariable::MarginPct => out.margin_pct = value,
            DealVariable::AdvanceRatePct => out.advance_rate_pct = value,
            DealVariable::ArrangementFeePct => out.arrangement_fee_pct = value,
            DealVariable::FixedFee => out.fixed_fee = value,
        }
        Ok(out)
    }
}

/// Input for 1- or 2-way sensitivity analysis on a bridge deal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeSensitivityInput {
    /// Base case deal
    pub base: DealParameters,
    /// First variable to sweep (name must be a deal parameter)
    pub variable_1: SensitivityVariable,
    /// Optional second variable; omitted gives a single-row grid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_2: Option<SensitivityVariable>,
    /// Result metric to record
    #[serde(default = "default_metric")]
    pub output_metric: BridgeMetric,
}

fn default_metric() -> BridgeMetric {
    BridgeMetric::NetMarginAfterFinancing
}

/// Output of bridge sensitivity analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeSensitivityOutput {
    pub variable_1_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_2_name: Option<String>,
    pub variable_1_values: Vec<Decimal>,
    pub variable_2_values: Vec<Decimal>,
    pub output_metric: BridgeMetric,
    /// Matrix[i][j] = metric when variable_1 = variable_1_values[i], variable_2 = variable_2_values[j].
    /// With one variable the matrix has a single row indexed by variable_1.
    pub matrix: Vec<Vec<Decimal>>,
    /// Metric at the unmodified base deal
    pub base_case_value: Decimal,
}

/// Generate the sweep values for a sensitivity variable from min to max with step.
fn generate_sweep_values(var: &SensitivityVariable) -> BridgeFinanceResult<Vec<Decimal>> {
    if var.step <= Decimal::ZERO {
        return Err(BridgeFinanceError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Step must be positive".into(),
        });
    }
    if var.min > var.max {
        return Err(BridgeFinanceError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Min must be <= max".into(),
        });
    }

    let too_many = || BridgeFinanceError::InvalidInput {
        field: format!("variable:{}", var.name),
        reason: format!("Sweep exceeds {MAX_GRID_POINTS} points; widen the step"),
    };
    // whole steps in the range, plus the start and a possible trailing max
    let points = var
        .max
        .checked_sub(var.min)
        .and_then(|span| span.checked_div(var.step))
        .and_then(|steps| steps.floor().to_usize())
        .and_then(|steps| steps.checked_add(2))
        .ok_or_else(too_many)?;
    if points > MAX_GRID_POINTS + 1 {
        return Err(too_many());
    }

    let mut values = Vec::with_capacity(points);
    let mut current = var.min;
    while current <= var.max {
        values.push(current);
        match current.checked_add(var.step) {
            Some(next) => current = next,
            None => break,
        }
    }
    // Ensure max is included if step doesn't land exactly on it
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }
    if values.len() > MAX_GRID_POINTS {
        return Err(too_many());
    }

    Ok(values)
}

fn whole_days(value: Decimal) -> BridgeFinanceResult<i32> {
    if value.fract() != Decimal::ZERO {
        return Err(BridgeFinanceError::InvalidInput {
            field: "variable:days_outstanding".into(),
            reason: format!("Days must be whole numbers, got {value}"),
        });
    }
    value.to_i32().ok_or_else(|| BridgeFinanceError::InvalidInput {
        field: "variable:days_outstanding".into(),
        reason: format!("{value} is out of range for days"),
    })
}

/// Sweep a parameter and check it is usable before evaluating anything.
fn resolve_variable(var: &SensitivityVariable) -> BridgeFinanceResult<(DealVariable, Vec<Decimal>)> {
    let deal_var = DealVariable::from_name(&var.name)?;
    if deal_var == DealVariable::DaysOutstanding {
        whole_days(var.min)?;
        whole_days(var.max)?;
        whole_days(var.step)?;
    }
    Ok((deal_var, generate_sweep_values(var)?))
}

/// Evaluate a bridge deal over a 1- or 2-way grid of parameter values.
///
/// Grid points that cannot be computed (e.g. a zero invoice) are recorded
/// as zero with a warning rather than aborting the sweep.
pub fn evaluate_bridge_sensitivity(
    input: &BridgeSensitivityInput,
) -> BridgeFinanceResult<ComputationOutput<BridgeSensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let (var1, v1_values) = resolve_variable(&input.variable_1)?;
    let second = input.variable_2.as_ref().map(resolve_variable).transpose()?;

    if let Some((var2, v2_values)) = &second {
        if *var2 == var1 {
            return Err(BridgeFinanceError::InvalidInput {
                field: "variable_2".into(),
                reason: "Second variable must differ from the first".into(),
            });
        }
        if v1_values.len().saturating_mul(v2_values.len()) > MAX_GRID_POINTS {
            return Err(BridgeFinanceError::InvalidInput {
                field: "variable_2".into(),
                reason: format!(
                    "Grid of {} x {} exceeds {MAX_GRID_POINTS} points",
                    v1_values.len(),
                    v2_values.len()
                ),
            });
        }
    }

    let metric = input.output_metric;
    let base_case_value = calculate_bridge_financing(&input.base)?.metric(metric);

    let eval = |params: BridgeFinanceResult<DealParameters>| -> BridgeFinanceResult<Decimal> {
        Ok(calculate_bridge_financing(&params?)?.metric(metric))
    };

    let mut matrix: Vec<Vec<Decimal>> = Vec::new();
    let mut record = |label: String, value: BridgeFinanceResult<Decimal>| match value {
        Ok(v) => v,
        Err(e) => {
            warnings.push(format!("Evaluation failed at {label}: {e}"));
            Decimal::ZERO
        }
    };

    match &second {
        Some((var2, v2_values)) => {
            for v1 in &v1_values {
                let mut row = Vec::with_capacity(v2_values.len());
                for v2 in v2_values {
                    let params = var1
                        .apply(&input.base, *v1)
                        .and_then(|p| var2.apply(&p, *v2));
                    row.push(record(format!("({v1}, {v2})"), eval(params)));
                }
                matrix.push(row);
            }
        }
        None => {
            let row: Vec<Decimal> = v1_values
                .iter()
                .map(|v1| record(format!("({v1})"), eval(var1.apply(&input.base, *v1))))
                .collect();
            matrix.push(row);
        }
    }

    let output = BridgeSensitivityOutput {
        variable_1_name: var1.name().to_string(),
        variable_2_name: second.as_ref().map(|(v, _)| v.name().to_string()),
        variable_1_values: v1_values,
        variable_2_values: second.map(|(_, vals)| vals).unwrap_or_default(),
        output_metric: metric,
        matrix,
        base_case_value,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Bridge Financing Sensitivity Analysis",
        &serde_json::json!({
            "variable_1": input.variable_1.name,
            "variable_2": input.variable_2.as_ref().map(|v| v.name.clone()),
            "output_metric": metric.name(),
            "base_case_value": base_case_value.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_deal() -> DealParameters {
        DealParameters::new(dec!(10_000), dec!(18), 60, dec!(25)).with_arrangement_fee_pct(dec!(1))
    }

    fn var(name: &str, min: Decimal, max: Decimal, step: Decimal) -> SensitivityVariable {
        SensitivityVariable {
            name: name.into(),
            min,
            max,
            step,
        }
    }

    #[test]
    fn test_sweep_includes_max() {
        let vals = generate_sweep_values(&var("x", dec!(0), dec!(10), dec!(4))).unwrap();
        assert_eq!(vals, vec![dec!(0), dec!(4), dec!(8), dec!(10)]);
    }

    #[test]
    fn test_sweep_rejects_bad_step() {
        assert!(generate_sweep_values(&var("x", dec!(0), dec!(10), dec!(0))).is_err());
        assert!(generate_sweep_values(&var("x", dec!(10), dec!(0), dec!(1))).is_err());
    }

    #[test]
    fn test_sweep_rejects_huge_axis_up_front() {
        let err = generate_sweep_values(&var("fixed_fee", dec!(0), dec!(1_000_000_000_000_000_000), dec!(1)))
            .unwrap_err();
        assert!(err.to_string().contains("exceeds"));

        // span itself overflows the decimal range
        let wide = var(
            "fixed_fee",
            dec!(-70_000_000_000_000_000_000_000_000),
            dec!(70_000_000_000_000_000_000_000_000),
            dec!(1),
        );
        assert!(generate_sweep_values(&wide).is_err());
    }

    #[test]
    fn test_sweep_at_axis_limit_is_accepted() {
        let vals = generate_sweep_values(&var("fixed_fee", dec!(1), dec!(10_000), dec!(1))).unwrap();
        assert_eq!(vals.len(), MAX_GRID_POINTS);
        assert!(generate_sweep_values(&var("fixed_fee", dec!(0), dec!(10_000), dec!(1))).is_err());
    }

    #[test]
    fn test_sweep_near_decimal_max_terminates() {
        let top = Decimal::MAX - dec!(1);
        let vals = generate_sweep_values(&var("fixed_fee", top, Decimal::MAX, dec!(1))).unwrap();
        assert_eq!(vals, vec![top, Decimal::MAX]);
    }

    #[test]
    fn test_two_way_grid_over_cap_rejected() {
        let input = BridgeSensitivityInput {
            base: base_deal(),
            variable_1: var("fixed_fee", dec!(1), dec!(200), dec!(1)),
            variable_2: Some(var("margin_pct", dec!(1), dec!(100), dec!(1))),
            output_metric: BridgeMetric::NetMarginAfterFinancing,
        };
        // 200 x 100 points
        let err = evaluate_bridge_sensitivity(&input).unwrap_err();
        assert!(err.to_string().contains("200 x 100"));
    }

    #[test]
    fn test_one_way_days_sweep() {
        let input = BridgeSensitivityInput {
            base: base_deal(),
            variable_1: var("days_outstanding", dec!(30), dec!(90), dec!(30)),
            variable_2: None,
            output_metric: BridgeMetric::InterestCost,
        };
        let out = evaluate_bridge_sensitivity(&input).unwrap();
        let r = &out.result;

        assert_eq!(r.variable_1_values.len(), 3);
        assert!(r.variable_2_values.is_empty());
        assert_eq!(r.matrix.len(), 1);
        let row = &r.matrix[0];
        assert!(row[0] < row[1] && row[1] < row[2]);
        // 60 days sits in the middle of the sweep
        assert_eq!(row[1], r.base_case_value);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_two_way_grid_dimensions() {
        let input = BridgeSensitivityInput {
            base: base_deal(),
            variable_1: var("annual_interest_rate_pct", dec!(10), dec!(20), dec!(5)),
            variable_2: Some(var("advance_rate_pct", dec!(50), dec!(100), dec!(25))),
            output_metric: BridgeMetric::NetMarginAfterFinancing,
        };
        let out = evaluate_bridge_sensitivity(&input).unwrap();
        let r = &out.result;

        assert_eq!(r.variable_2_name.as_deref(), Some("advance_rate_pct"));
        assert_eq!(r.matrix.len(), 3);
        assert!(r.matrix.iter().all(|row| row.len() == 3));
        // Higher rate and higher advance both cost more
        assert!(r.matrix[0][0] > r.matrix[2][2]);
    }

    #[test]
    fn test_failed_points_become_warnings() {
        let input = BridgeSensitivityInput {
            base: base_deal(),
            variable_1: var("invoice_amount", dec!(0), dec!(10_000), dec!(5_000)),
            variable_2: None,
            output_metric: BridgeMetric::FinancingCostPctOfInvoice,
        };
        let out = evaluate_bridge_sensitivity(&input).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("Division by zero"));
        assert_eq!(out.result.matrix[0][0], Decimal::ZERO);
        assert!(out.result.matrix[0][2] > Decimal::ZERO);
    }

    #[test]
    fn test_fractional_days_rejected() {
        let input = BridgeSensitivityInput {
            base: base_deal(),
            variable_1: var("days_outstanding", dec!(30), dec!(60), dec!(7.5)),
            variable_2: None,
            output_metric: BridgeMetric::InterestCost,
        };
        assert!(evaluate_bridge_sensitivity(&input).is_err());
    }

    #[test]
    fn test_unknown_and_duplicate_variables_rejected() {
        let mut input = BridgeSensitivityInput {
            base: base_deal(),
            variable_1: var("ebitda", dec!(1), dec!(2), dec!(1)),
            variable_2: None,
            output_metric: BridgeMetric::InterestCost,
        };
        assert!(evaluate_bridge_sensitivity(&input).is_err());

        input.variable_1 = var("margin_pct", dec!(10), dec!(20), dec!(5));
        input.variable_2 = Some(var("margin_pct", dec!(10), dec!(20), dec!(5)));
        assert!(evaluate_bridge_sensitivity(&input).is_err());
    }

    #[test]
    fn test_apply_and_get_agree() {
        let base = base_deal();
        for v in DealVariable::ALL {
            let updated = v.apply(&base, dec!(42)).unwrap();
            assert_eq!(v.get(&updated), dec!(42));
        }
    }
}
