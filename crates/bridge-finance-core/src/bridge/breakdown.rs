//! Display-ready views of a [`FinancingResult`]: the labelled line-by-line
//! breakdown, the before/after margin comparison and the interest vs fees
//! split. Values are kept unrounded; only the `display` strings are rounded
//! to 2 dp.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::financing::{analyze_bridge_financing, DealParameters, FinancingResult};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::BridgeFinanceResult;

const HUNDRED: Decimal = dec!(100);

/// How a breakdown value should be read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MetricUnit {
    Currency,
    Percent,
}

/// One labelled row of the breakdown table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BreakdownLine {
    pub metric: String,
    pub unit: MetricUnit,
    pub value: Decimal,
    pub display: String,
}

/// Gross margin, net margin and the financing cost between them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarginComparison {
    pub gross_margin_before: Money,
    pub net_margin_after: Money,
    pub financing_cost: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BridgeBreakdown {
    pub lines: Vec<BreakdownLine>,
    pub margin_comparison: MarginComparison,
    /// Arrangement fee component of total fees.
    pub arrangement_fee_value: Money,
    /// Fixed fee component of total fees.
    pub fixed_fee: Money,
    /// Interest as a percent of total financing cost; 0 when nothing is charged
    /// or the share cannot be represented.
    pub interest_share_pct: Percent,
}

/// Lay out a computed result as labelled rows and summary figures.
pub fn build_breakdown(result: &FinancingResult) -> BridgeBreakdown {
    use MetricUnit::{Currency, Percent as Pct};

    let rows: [(&str, MetricUnit, Decimal); 11] = [
        ("Invoice amount", Currency, result.invoice_amount),
        ("Principal borrowed (advance)", Currency, result.principal_borrowed),
        ("Gross margin (before financing)", Currency, result.gross_margin_value),
        ("Interest cost", Currency, result.interest_cost),
        ("Total fees (arrangement + fixed)", Currency, result.total_fees),
        ("Total financing cost", Currency, result.total_financing_cost),
        ("Net margin (after financing)", Currency, result.net_margin_after_financing),
        ("Margin eaten by financing (value)", Currency, result.margin_eaten_value),
        ("Margin eaten by financing (% of margin)", Pct, result.margin_eaten_pct_of_margin),
        ("Financing cost (% of invoice)", Pct, result.financing_cost_pct_of_invoice),
        ("Effective annualized cost (% on invoice)", Pct, result.effective_annualized_cost_pct),
    ];

    let lines = rows
        .into_iter()
        .map(|(metric, unit, value)| BreakdownLine {
            metric: metric.to_string(),
            unit,
            value,
            display: match unit {
                MetricUnit::Currency => format_money(value),
                MetricUnit::Percent => format_percent(value),
            },
        })
        .collect();

    let interest_share_pct = if result.total_financing_cost > Decimal::ZERO {
        result
            .interest_cost
            .checked_div(result.total_financing_cost)
            .and_then(|share| share.checked_mul(HUNDRED))
            .unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };

    BridgeBreakdown {
        lines,
        margin_comparison: MarginComparison {
            gross_margin_before: result.gross_margin_value,
            net_margin_after: result.net_margin_after_financing,
            financing_cost: result.margin_eaten_value,
        },
        arrangement_fee_value: result.total_fees - result.fixed_fee,
        fixed_fee: result.fixed_fee,
        interest_share_pct,
    }
}

/// Validate and analyse a deal, returning its breakdown in the output envelope.
pub fn analyze_bridge_breakdown(
    params: &DealParameters,
) -> BridgeFinanceResult<ComputationOutput<BridgeBreakdown>> {
    let start = Instant::now();
    let analysis = analyze_bridge_financing(params)?;
    let breakdown = build_breakdown(&analysis.result);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Invoice bridge financing breakdown -- display values rounded to 2 dp",
        &analysis.assumptions,
        analysis.warnings,
        elapsed,
        breakdown,
    ))
}

/// `1234567.891` -> `1,234,567.89`
pub fn format_money(value: Decimal) -> String {
    let fixed = format!("{:.2}", value.round_dp(2));
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped}.{frac_part}")
}

/// `13.4685` -> `13.47 %`
pub fn format_percent(value: Decimal) -> String {
    format!("{:.2} %", value.round_dp(2))
}
