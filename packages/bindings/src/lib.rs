use napi::Result as NapiResult;
use napi_derive::napi;

use bridge_finance_core::bridge::{breakdown, financing};
use bridge_finance_core::scenarios::sensitivity;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Bridge financing
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_bridge_financing(input_json: String) -> NapiResult<String> {
    let input: financing::DealParameters =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = financing::analyze_bridge_financing(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn bridge_breakdown(input_json: String) -> NapiResult<String> {
    let input: financing::DealParameters =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = breakdown::analyze_bridge_breakdown(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[napi]
pub fn bridge_sensitivity(input_json: String) -> NapiResult<String> {
    let input: sensitivity::BridgeSensitivityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = sensitivity::evaluate_bridge_sensitivity(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
