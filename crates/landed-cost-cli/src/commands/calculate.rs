use clap::Args;
use serde_json::Value;

use super::ShipmentArgs;

/// Arguments for a landed-cost calculation
#[derive(Args)]
pub struct CalculateArgs {
    #[command(flatten)]
    pub shipment: ShipmentArgs,

    /// Label recorded against the run in history
    #[arg(long)]
    pub label: Option<String>,
}

pub fn run_calculate(args: CalculateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input = args.shipment.to_shipment()?;
    let engine = args.shipment.to_engine()?;
    let output = engine.calculate(&input, args.label.as_deref())?;
    Ok(serde_json::to_value(output)?)
}
