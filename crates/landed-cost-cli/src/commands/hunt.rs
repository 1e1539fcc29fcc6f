use clap::Args;
use serde_json::Value;

use landed_cost_core::hunter::RateHunter;

use super::ShipmentArgs;

/// Arguments for the smart rate hunt
#[derive(Args)]
pub struct HuntArgs {
    #[command(flatten)]
    pub shipment: ShipmentArgs,

    /// Overall deadline for the fan-out, in seconds
    #[arg(long, default_value = "10")]
    pub timeout_secs: u64,
}

pub fn run_hunt(args: HuntArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input = args.shipment.to_shipment()?;
    let engine = args.shipment.to_engine()?;

    let base = engine.calculate(&input, None)?;
    let result = RateHunter::new(engine)
        .with_timeout(std::time::Duration::from_secs(args.timeout_secs))
        .find_better_origins(&input, &base);

    Ok(serde_json::json!({
        "base_total": base.landed_cost_total,
        "result": result,
    }))
}
