//! Bridge financing against a single invoice: how much of the invoice's
//! gross margin is consumed by borrowing against it until the buyer pays.
//!
//! Interest is simple (not compounded) on a 365-day year with no leap-year
//! adjustment. Input rates are percentages (18 = 18%) and are converted to
//! fractions before use. Monetary values and rates are `rust_decimal::Decimal`
//! throughout.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::BridgeFinanceError;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::BridgeFinanceResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Day-count basis for interest and annualisation.
const DAYS_IN_YEAR: Decimal = dec!(365);
/// Percent divisor.
const HUNDRED: Decimal = dec!(100);
/// Share of the invoice a lender typically advances.
const DEFAULT_ADVANCE_RATE_PCT: Decimal = dec!(80);
/// Margin erosion above which the analysis flags the deal.
const HEAVY_EROSION_PCT: Decimal = dec!(50);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

fn default_advance_rate_pct() -> Percent {
    DEFAULT_ADVANCE_RATE_PCT
}

/// Terms of a bridge facility drawn against one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealParameters {
    /// Face value of the invoice.
    pub invoice_amount: Money,
    /// Annual nominal interest rate charged by the lender, in percent.
    pub annual_interest_rate_pct: Percent,
    /// Days until the invoice is collected and the advance repaid.
    /// Zero or negative horizons carry no interest.
    pub days_outstanding: i32,
    /// Gross profit margin on the invoice, in percent.
    pub margin_pct: Percent,
    /// Share of the invoice advanced as principal, in percent (default 80).
    #[serde(default = "default_advance_rate_pct")]
    pub advance_rate_pct: Percent,
    /// Upfront arrangement fee as a percent of the invoice (default 0).
    #[serde(default)]
    pub arrangement_fee_pct: Percent,
    /// Flat legal / processing fee in currency units (default 0).
    #[serde(default)]
    pub fixed_fee: Money,
}

impl DealParameters {
    /// Deal with the default advance rate and no fees.
    pub fn new(
        invoice_amount: Money,
        annual_interest_rate_pct: Percent,
        days_outstanding: i32,
        margin_pct: Percent,
    ) -> Self {
        Self {
            invoice_amount,
            annual_interest_rate_pct,
            days_outstanding,
            margin_pct,
            advance_rate_pct: DEFAULT_ADVANCE_RATE_PCT,
            arrangement_fee_pct: Decimal::ZERO,
            fixed_fee: Decimal::ZERO,
        }
    }

    pub fn with_advance_rate_pct(mut self, advance_rate_pct: Percent) -> Self {
        self.advance_rate_pct = advance_rate_pct;
        self
    }

    pub fn with_arrangement_fee_pct(mut self, arrangement_fee_pct: Percent) -> Self {
        self.arrangement_fee_pct = arrangement_fee_pct;
        self
    }

    pub fn with_fixed_fee(mut self, fixed_fee: Money) -> Self {
        self.fixed_fee = fixed_fee;
        self
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Derived economics of a bridge facility, with the deal terms echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancingResult {
    // -- Echo of the deal terms --
    pub invoice_amount: Money,
    pub annual_interest_rate_pct: Percent,
    pub days_outstanding: i32,
    pub margin_pct: Percent,
    pub advance_rate_pct: Percent,
    pub arrangement_fee_pct: Percent,
    pub fixed_fee: Money,

    // -- Derived metrics --
    /// Amount actually borrowed (invoice times advance rate).
    pub principal_borrowed: Money,
    /// Profit on the invoice before financing.
    pub gross_margin_value: Money,
    /// Simple interest on the principal over the horizon.
    pub interest_cost: Money,
    /// Arrangement fee plus fixed fee.
    pub total_fees: Money,
    /// Interest plus fees.
    pub total_financing_cost: Money,
    /// Gross margin less financing cost. Negative when financing costs
    /// more than the deal earns.
    pub net_margin_after_financing: Money,
    /// Portion of the margin consumed by financing (equal to the total cost).
    pub margin_eaten_value: Money,
    /// Margin eaten as a percent of gross margin; 0 when there is no margin.
    pub margin_eaten_pct_of_margin: Percent,
    /// Total financing cost as a percent of the invoice.
    pub financing_cost_pct_of_invoice: Percent,
    /// Financing cost on the invoice scaled to a 365-day year.
    pub effective_annualized_cost_pct: Percent,
}

/// A derived metric of [`FinancingResult`] addressable by name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BridgeMetric {
    PrincipalBorrowed,
    GrossMarginValue,
    InterestCost,
    TotalFees,
    TotalFinancingCost,
    NetMarginAfterFinancing,
    MarginEatenValue,
    MarginEatenPctOfMargin,
    FinancingCostPctOfInvoice,
    EffectiveAnnualizedCostPct,
}

impl BridgeMetric {
    pub const ALL: [BridgeMetric; 10] = [
        BridgeMetric::PrincipalBorrowed,
        BridgeMetric::GrossMarginValue,
        BridgeMetric::InterestCost,
        BridgeMetric::TotalFees,
        BridgeMetric::TotalFinancingCost,
        BridgeMetric::NetMarginAfterFinancing,
        BridgeMetric::MarginEatenValue,
        BridgeMetric::MarginEatenPctOfMargin,
        BridgeMetric::FinancingCostPctOfInvoice,
        BridgeMetric::EffectiveAnnualizedCostPct,
    ];

    /// Field name as it appears in serialised output.
    pub fn name(self) -> &'static str {
        match self {
            BridgeMetric::PrincipalBorrowed => "principal_borrowed",
            BridgeMetric::GrossMarginValue => "gross_margin_value",
            BridgeMetric::InterestCost => "interest_cost",
            BridgeMetric::TotalFees => "total_fees",
            BridgeMetric::TotalFinancingCost => "total_financing_cost",
            BridgeMetric::NetMarginAfterFinancing => "net_margin_after_financing",
            BridgeMetric::MarginEatenValue => "margin_eaten_value",
            BridgeMetric::MarginEatenPctOfMargin => "margin_eaten_pct_of_margin",
            BridgeMetric::FinancingCostPctOfInvoice => "financing_cost_pct_of_invoice",
            BridgeMetric::EffectiveAnnualizedCostPct => "effective_annualized_cost_pct",
        }
    }

    pub fn from_name(name: &str) -> BridgeFinanceResult<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| BridgeFinanceError::InvalidInput {
                field: "metric".into(),
                reason: format!("Unknown metric '{name}'"),
            })
    }
}

impl FinancingResult {
    pub fn metric(&self, metric: BridgeMetric) -> Decimal {
        match metric {
            BridgeMetric::PrincipalBorrowed => self.principal_borrowed,
            BridgeMetric::GrossMarginValue => self.gross_margin_value,
            BridgeMetric::InterestCost => self.interest_cost,
            BridgeMetric::TotalFees => self.total_fees,
            BridgeMetric::TotalFinancingCost => self.total_financing_cost,
            BridgeMetric::NetMarginAfterFinancing => self.net_margin_after_financing,
            BridgeMetric::MarginEatenValue => self.margin_eaten_value,
            BridgeMetric::MarginEatenPctOfMargin => self.margin_eaten_pct_of_margin,
            BridgeMetric::FinancingCostPctOfInvoice => self.financing_cost_pct_of_invoice,
            BridgeMetric::EffectiveAnnualizedCostPct => self.effective_annualized_cost_pct,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the economics of bridge financing against an invoice.
///
/// Pure and deterministic. The caller must ensure `invoice_amount > 0`
/// (see [`validate_deal`]); a zero invoice is reported as
/// [`BridgeFinanceError::DivisionByZero`] rather than computed. Any step whose
/// value falls outside the decimal range is reported as
/// [`BridgeFinanceError::InvalidInput`] naming the metric that overflowed.
pub fn calculate_bridge_financing(params: &DealParameters) -> BridgeFinanceResult<FinancingResult> {
    let annual_rate = params.annual_interest_rate_pct / HUNDRED;
    let margin_rate = params.margin_pct / HUNDRED;
    let advance_rate = params.advance_rate_pct / HUNDRED;
    let arrangement_fee_rate = params.arrangement_fee_pct / HUNDRED;

    let principal_borrowed = in_range(
        params.invoice_amount.checked_mul(advance_rate),
        "principal_borrowed",
    )?;
    let gross_margin_value = in_range(
        params.invoice_amount.checked_mul(margin_rate),
        "gross_margin_value",
    )?;

    let interest_cost = if params.days_outstanding > 0 {
        let year_fraction = Decimal::from(params.days_outstanding) / DAYS_IN_YEAR;
        in_range(
            principal_borrowed
                .checked_mul(annual_rate)
                .and_then(|v| v.checked_mul(year_fraction)),
            "interest_cost",
        )?
    } else {
        Decimal::ZERO
    };

    let arrangement_fee_value = in_range(
        params.invoice_amount.checked_mul(arrangement_fee_rate),
        "arrangement_fee_value",
    )?;
    let total_fees = in_range(arrangement_fee_value.checked_add(params.fixed_fee), "total_fees")?;

    let total_financing_cost = in_range(
        interest_cost.checked_add(total_fees),
        "total_financing_cost",
    )?;
    let net_margin_after_financing = in_range(
        gross_margin_value.checked_sub(total_financing_cost),
        "net_margin_after_financing",
    )?;

    let margin_eaten_value = total_financing_cost;
    let margin_eaten_pct_of_margin = if gross_margin_value > Decimal::ZERO {
        in_range(
            margin_eaten_value
                .checked_div(gross_margin_value)
                .and_then(|v| v.checked_mul(HUNDRED)),
            "margin_eaten_pct_of_margin",
        )?
    } else {
        Decimal::ZERO
    };

    if params.invoice_amount.is_zero() {
        return Err(BridgeFinanceError::DivisionByZero {
            context: "financing cost as % of invoice (invoice_amount is zero)".into(),
        });
    }
    let financing_cost_pct_of_invoice = in_range(
        total_financing_cost
            .checked_div(params.invoice_amount)
            .and_then(|v| v.checked_mul(HUNDRED)),
        "financing_cost_pct_of_invoice",
    )?;

    let effective_annualized_cost_pct = if params.days_outstanding > 0 {
        in_range(
            financing_cost_pct_of_invoice
                .checked_mul(DAYS_IN_YEAR / Decimal::from(params.days_outstanding)),
            "effective_annualized_cost_pct",
        )?
    } else {
        Decimal::ZERO
    };

    Ok(FinancingResult {
        invoice_amount: params.invoice_amount,
        annual_interest_rate_pct: params.annual_interest_rate_pct,
        days_outstanding: params.days_outstanding,
        margin_pct: params.margin_pct,
        advance_rate_pct: params.advance_rate_pct,
        arrangement_fee_pct: params.arrangement_fee_pct,
        fixed_fee: params.fixed_fee,
        principal_borrowed,
        gross_margin_value,
        interest_cost,
        total_fees,
        total_financing_cost,
        net_margin_after_financing,
        margin_eaten_value,
        margin_eaten_pct_of_margin,
        financing_cost_pct_of_invoice,
        effective_annualized_cost_pct,
    })
}

/// Check deal terms at the boundary, before calculating.
///
/// `days_outstanding` is not checked: zero and negative horizons are a
/// defined zero-cost case.
pub fn validate_deal(params: &DealParameters) -> BridgeFinanceResult<()> {
    if params.invoice_amount <= Decimal::ZERO {
        return Err(BridgeFinanceError::InvalidInput {
            field: "invoice_amount".into(),
            reason: "Enter a positive invoice amount to see the financing impact".into(),
        });
    }
    non_negative(params.annual_interest_rate_pct, "annual_interest_rate_pct")?;
    non_negative(params.margin_pct, "margin_pct")?;
    non_negative(params.arrangement_fee_pct, "arrangement_fee_pct")?;
    non_negative(params.fixed_fee, "fixed_fee")?;
    if params.advance_rate_pct < Decimal::ZERO || params.advance_rate_pct > HUNDRED {
        return Err(BridgeFinanceError::InvalidInput {
            field: "advance_rate_pct".into(),
            reason: "Advance rate must be between 0 and 100 percent".into(),
        });
    }
    Ok(())
}

/// Validate, calculate and wrap the result in the standard output envelope.
pub fn analyze_bridge_financing(
    params: &DealParameters,
) -> BridgeFinanceResult<ComputationOutput<FinancingResult>> {
    let start = Instant::now();
    validate_deal(params)?;

    let result = calculate_bridge_financing(params)?;
    let warnings = deal_warnings(&result);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Invoice bridge financing -- simple interest on advanced principal, 365-day basis",
        &serde_json::json!({
            "day_count": "365",
            "interest": "simple",
            "rounding": "none",
        }),
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a checked decimal operation that overflowed to an input error.
fn in_range(value: Option<Decimal>, field: &str) -> BridgeFinanceResult<Decimal> {
    value.ok_or_else(|| BridgeFinanceError::InvalidInput {
        field: field.to_string(),
        reason: format!("{field} is outside the representable decimal range for these terms"),
    })
}

fn non_negative(value: Decimal, field: &str) -> BridgeFinanceResult<()> {
    if value < Decimal::ZERO {
        return Err(BridgeFinanceError::InvalidInput {
            field: field.to_string(),
            reason: format!("{field} cannot be negative"),
        });
    }
    Ok(())
}

fn deal_warnings(result: &FinancingResult) -> Vec<String> {
    let mut warnings = Vec::new();

    if result.days_outstanding <= 0 {
        warnings.push(
            "Days outstanding is zero or negative: interest and annualized cost reported as zero"
                .into(),
        );
    }
    if result.gross_margin_value.is_zero() {
        warnings.push("Gross margin is zero: margin eaten reported as 0% of margin".into());
    }
    if result.net_margin_after_financing < Decimal::ZERO {
        warnings.push(format!(
            "Financing cost exceeds gross margin by {}: deal is loss-making after financing",
            (-result.net_margin_after_financing).round_dp(2)
        ));
    } else if result.margin_eaten_pct_of_margin >= HEAVY_EROSION_PCT {
        warnings.push(format!(
            "Financing consumes {}% of the gross margin",
            result.margin_eaten_pct_of_margin.round_dp(1)
        ));
    }

    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
