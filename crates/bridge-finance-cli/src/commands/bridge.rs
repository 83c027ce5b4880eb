use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use bridge_finance_core::bridge::breakdown;
use bridge_finance_core::bridge::financing::{self, DealParameters};

use crate::input;

/// Deal terms for bridge financing against one invoice
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct DealArgs {
    /// Invoice face value
    #[arg(long)]
    pub invoice_amount: Option<Decimal>,

    /// Annual interest rate charged by the bank, in percent (e.g. 18 for 18%)
    #[arg(long, alias = "rate")]
    pub annual_interest_rate_pct: Option<Decimal>,

    /// Days until repayment
    #[arg(long, alias = "days")]
    pub days_outstanding: Option<i32>,

    /// Gross margin on the invoice, in percent
    #[arg(long, alias = "margin")]
    pub margin_pct: Option<Decimal>,

    /// Share of the invoice borrowed, in percent
    #[arg(long, default_value = "80")]
    pub advance_rate_pct: Decimal,

    /// Arrangement fee as a percent of the invoice
    #[arg(long, default_value = "0")]
    pub arrangement_fee_pct: Decimal,

    /// Fixed legal / processing fees
    #[arg(long, default_value = "0")]
    pub fixed_fee: Decimal,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Collect the deal from a file, piped stdin, or flags, in that order.
fn resolve_deal(args: DealArgs) -> Result<DealParameters, Box<dyn std::error::Error>> {
    let deal: DealParameters = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(deal) = input::stdin::read_stdin()? {
        deal
    } else {
        deal_from_args(args)?
    };
    require_positive_invoice(deal)
}

/// Build a deal from individual flags; the four core terms are required.
fn deal_from_args(args: DealArgs) -> Result<DealParameters, Box<dyn std::error::Error>> {
    Ok(DealParameters {
        invoice_amount: args
            .invoice_amount
            .ok_or("--invoice-amount is required (or provide --input)")?,
        annual_interest_rate_pct: args
            .annual_interest_rate_pct
            .ok_or("--annual-interest-rate-pct is required (or provide --input)")?,
        days_outstanding: args
            .days_outstanding
            .ok_or("--days-outstanding is required (or provide --input)")?,
        margin_pct: args
            .margin_pct
            .ok_or("--margin-pct is required (or provide --input)")?,
        advance_rate_pct: args.advance_rate_pct,
        arrangement_fee_pct: args.arrangement_fee_pct,
        fixed_fee: args.fixed_fee,
    })
}

/// The calculator divides by the invoice amount; stop here rather than call it.
fn require_positive_invoice(deal: DealParameters) -> Result<DealParameters, Box<dyn std::error::Error>> {
    if deal.invoice_amount <= Decimal::ZERO {
        return Err("Enter a positive invoice amount to see the financing impact.".into());
    }
    Ok(deal)
}

pub fn run_bridge(args: DealArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let deal = resolve_deal(args)?;
    let result = financing::analyze_bridge_financing(&deal)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_breakdown(args: DealArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let deal = resolve_deal(args)?;
    let result = breakdown::analyze_bridge_breakdown(&deal)?;
    Ok(serde_json::to_value(result)?)
}
