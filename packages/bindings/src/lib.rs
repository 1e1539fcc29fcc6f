use std::sync::Arc;

use napi::Result as NapiResult;
use napi_derive::napi;

use landed_cost_core::compliance::{assess_risks, RiskInput};
use landed_cost_core::engine::LandedCostEngine;
use landed_cost_core::hunter::RateHunter;
use landed_cost_core::lookup::{InMemoryTariffStore, TariffSnapshot};
use landed_cost_core::preference::resolve_preference;
use landed_cost_core::reference::ReferenceData;
use landed_cost_core::types::ShipmentInput;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn build_engine(snapshot_json: &str) -> NapiResult<LandedCostEngine> {
    let snapshot: TariffSnapshot = serde_json::from_str(snapshot_json).map_err(to_napi_error)?;
    let store = InMemoryTariffStore::from_snapshot(snapshot).map_err(to_napi_error)?;
    Ok(LandedCostEngine::new(
        Arc::new(store),
        Arc::new(ReferenceData::builtin()),
    ))
}

// ---------------------------------------------------------------------------
// Landed cost
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_landed_cost(snapshot_json: String, input_json: String) -> NapiResult<String> {
    let input: ShipmentInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let engine = build_engine(&snapshot_json)?;
    let output = engine.calculate(&input, None).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn find_better_origins(snapshot_json: String, input_json: String) -> NapiResult<String> {
    let input: ShipmentInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let engine = build_engine(&snapshot_json)?;
    let base = engine.calculate(&input, None).map_err(to_napi_error)?;
    let result = RateHunter::new(engine).find_better_origins(&input, &base);
    serde_json::to_string(&result).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Compliance / preference
// ---------------------------------------------------------------------------

#[napi]
pub fn assess_import_risks(input_json: String) -> NapiResult<String> {
    let input: RiskInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let reference = ReferenceData::builtin();
    let assessment = assess_risks(&reference, &input);
    serde_json::to_string(&assessment).map_err(to_napi_error)
}

#[derive(serde::Deserialize)]
struct PreferenceBindingInput {
    hs_code: String,
    origin: String,
    #[serde(default)]
    mfn_rate: Option<rust_decimal::Decimal>,
}

#[napi]
pub fn resolve_trade_preference(input_json: String) -> NapiResult<String> {
    let input: PreferenceBindingInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let reference = ReferenceData::builtin();
    let decision = resolve_preference(&reference, &input.hs_code, &input.origin, input.mfn_rate);
    serde_json::to_string(&decision).map_err(to_napi_error)
}
