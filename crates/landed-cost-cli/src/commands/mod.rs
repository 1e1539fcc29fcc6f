pub mod calculate;
pub mod hunt;
pub mod preference;
pub mod risks;

use std::sync::Arc;

use clap::Args;
use rust_decimal::Decimal;

use landed_cost_core::engine::LandedCostEngine;
use landed_cost_core::lookup::{InMemoryTariffStore, TariffSnapshot};
use landed_cost_core::reference::ReferenceData;
use landed_cost_core::{ImporterType, Incoterm, ShipmentInput};

use crate::demo;
use crate::input;

/// Shipment flags shared by `calculate` and `hunt`.
#[derive(Args)]
pub struct ShipmentArgs {
    /// Path to a ShipmentInput JSON file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// HS commodity code (4-10 digits)
    #[arg(long)]
    pub hs_code: Option<String>,

    /// Customs value in ZAR
    #[arg(long)]
    pub customs_value: Option<Decimal>,

    /// Invoice value in foreign currency (pair with --exchange-rate)
    #[arg(long)]
    pub invoice_value: Option<Decimal>,

    /// Exchange rate to ZAR
    #[arg(long)]
    pub exchange_rate: Option<Decimal>,

    /// Freight cost in ZAR
    #[arg(long)]
    pub freight: Option<Decimal>,

    /// Insurance cost in ZAR
    #[arg(long)]
    pub insurance: Option<Decimal>,

    /// Combined freight + insurance, overriding the individual flags
    #[arg(long)]
    pub freight_insurance: Option<Decimal>,

    /// Other landing charges in ZAR
    #[arg(long)]
    pub other_charges: Option<Decimal>,

    /// Unit count (enables per-unit cost)
    #[arg(long)]
    pub quantity: Option<u32>,

    /// Gross weight in kilograms
    #[arg(long)]
    pub weight_kg: Option<Decimal>,

    /// Volume in litres
    #[arg(long)]
    pub volume_litres: Option<Decimal>,

    /// Incoterm: FOB, CIF, EXW, DAP or DDP
    #[arg(long, default_value = "FOB")]
    pub incoterm: String,

    /// Importer is a registered VAT vendor
    #[arg(long)]
    pub vat_registered: bool,

    /// ISO 3166-1 alpha-2 origin country
    #[arg(long)]
    pub origin: Option<String>,

    /// Goods are used / second-hand
    #[arg(long)]
    pub used: bool,

    /// Path to a tariff snapshot JSON (defaults to the bundled demo tariff)
    #[arg(long)]
    pub tariff_file: Option<String>,
}

impl ShipmentArgs {
    /// Resolve the shipment payload: `--input` file, then piped stdin,
    /// then individual flags.
    pub fn to_shipment(&self) -> Result<ShipmentInput, Box<dyn std::error::Error>> {
        if let Some(ref path) = self.input {
            return Ok(input::read_json(path)?);
        }
        if let Some(data) = input::read_stdin()? {
            return Ok(serde_json::from_value(data)?);
        }

        let hs_code = self
            .hs_code
            .clone()
            .ok_or("--hs-code is required (or provide --input / piped JSON)")?;

        Ok(ShipmentInput {
            hs_code,
            customs_value: self.customs_value,
            invoice_value: self.invoice_value,
            exchange_rate: self.exchange_rate,
            freight_cost: self.freight,
            insurance_cost: self.insurance,
            freight_insurance: self.freight_insurance,
            other_charges: self.other_charges,
            quantity: self.quantity,
            weight_kg: self.weight_kg,
            volume_litres: self.volume_litres,
            incoterm: self.incoterm.parse::<Incoterm>()?,
            importer_type: if self.vat_registered {
                ImporterType::VatRegistered
            } else {
                ImporterType::Private
            },
            origin_country: self.origin.clone(),
            destination_country: "ZA".into(),
            used_goods: self.used,
        })
    }

    /// Build the engine over the requested tariff snapshot.
    pub fn to_engine(&self) -> Result<LandedCostEngine, Box<dyn std::error::Error>> {
        let snapshot: TariffSnapshot = match self.tariff_file {
            Some(ref path) => input::read_json(path)?,
            None => demo::demo_snapshot(),
        };
        let store = InMemoryTariffStore::from_snapshot(snapshot)?;
        Ok(LandedCostEngine::new(
            Arc::new(store),
            Arc::new(ReferenceData::builtin()),
        ))
    }
}
