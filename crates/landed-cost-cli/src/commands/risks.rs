use clap::Args;
use serde_json::Value;

use landed_cost_core::compliance::{assess_risks, RiskInput};
use landed_cost_core::reference::ReferenceData;

/// Arguments for compliance screening
#[derive(Args)]
pub struct RisksArgs {
    /// HS commodity code (4-10 digits)
    #[arg(long)]
    pub hs_code: String,

    /// ISO 3166-1 alpha-2 origin country
    #[arg(long)]
    pub origin: Option<String>,

    /// Goods are used / second-hand
    #[arg(long)]
    pub used: bool,
}

pub fn run_assess_risks(args: RisksArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let reference = ReferenceData::builtin();
    let assessment = assess_risks(
        &reference,
        &RiskInput {
            hs_code: args.hs_code,
            origin_iso: args.origin,
            used_goods: args.used,
            importer_type: None,
        },
    );
    Ok(serde_json::to_value(assessment)?)
}
