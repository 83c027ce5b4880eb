use clap::Args;
use serde_json::Value;

use bridge_finance_core::bridge::financing::{BridgeMetric, DealParameters};
use bridge_finance_core::scenarios::sensitivity::{self, BridgeSensitivityInput};
use bridge_finance_core::SensitivityVariable;

use crate::input;

/// Arguments for sensitivity analysis
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct SensitivityArgs {
    /// First sensitivity variable in format name:min:max:step
    /// (e.g. "days_outstanding:30:120:30")
    #[arg(long)]
    pub var1: String,

    /// Second sensitivity variable (optional, creates a 2D table)
    #[arg(long)]
    pub var2: Option<String>,

    /// Result metric to record (e.g. net_margin_after_financing)
    #[arg(long, default_value = "net_margin_after_financing")]
    pub metric: String,

    /// Path to JSON file with the base case deal (stdin if omitted)
    #[arg(long)]
    pub base_inputs: Option<String>,
}

fn parse_sens_var(spec: &str) -> Result<SensitivityVariable, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 4 {
        return Err(format!(
            "Sensitivity variable must be name:min:max:step, got '{}'",
            spec
        )
        .into());
    }
    Ok(SensitivityVariable {
        name: parts[0].to_string(),
        min: parts[1].parse()?,
        max: parts[2].parse()?,
        step: parts[3].parse()?,
    })
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let variable_1 = parse_sens_var(&args.var1)?;
    let variable_2 = args.var2.as_deref().map(parse_sens_var).transpose()?;
    let output_metric = BridgeMetric::from_name(&args.metric)?;

    let base: DealParameters = if let Some(ref path) = args.base_inputs {
        input::file::read_json(path)?
    } else if let Some(deal) = input::stdin::read_stdin()? {
        deal
    } else {
        return Err("--base-inputs <file.json> or stdin required for sensitivity analysis".into());
    };

    let sens_input = BridgeSensitivityInput {
        base,
        variable_1,
        variable_2,
        output_metric,
    };
    let result = sensitivity::evaluate_bridge_sensitivity(&sens_input)?;
    Ok(serde_json::to_value(result)?)
}
