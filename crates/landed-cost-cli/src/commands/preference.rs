use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use landed_cost_core::preference::resolve_preference;
use landed_cost_core::reference::ReferenceData;

/// Arguments for preferential-rate resolution
#[derive(Args)]
pub struct PreferenceArgs {
    /// HS commodity code (4-10 digits)
    #[arg(long)]
    pub hs_code: String,

    /// ISO 3166-1 alpha-2 origin country
    #[arg(long)]
    pub origin: String,

    /// MFN benchmark rate as a percentage (e.g. 25 for 25%)
    #[arg(long)]
    pub mfn_pct: Option<Decimal>,
}

pub fn run_preference(args: PreferenceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let reference = ReferenceData::builtin();
    let decision = resolve_preference(
        &reference,
        &args.hs_code,
        &args.origin,
        args.mfn_pct.map(|p| p / dec!(100)),
    );
    Ok(serde_json::to_value(decision)?)
}

pub fn run_agreements() -> Result<Value, Box<dyn std::error::Error>> {
    let reference = ReferenceData::builtin();
    Ok(serde_json::to_value(reference.agreements())?)
}
