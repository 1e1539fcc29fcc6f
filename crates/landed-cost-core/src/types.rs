use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LandedCostError;
use crate::LandedCostResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.25 = 25%). Never as percentages.
pub type Rate = Decimal;

/// Currency code
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    ZAR,
    USD,
    EUR,
    GBP,
    CNY,
    Other(String),
}

/// Commercial delivery terms on the invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Incoterm {
    /// Free on Board — freight and insurance are on top of the invoice value.
    Fob,
    /// Cost, Insurance & Freight — freight and insurance already in the invoice value.
    Cif,
    /// Ex Works.
    Exw,
    /// Delivered at Place.
    Dap,
    /// Delivered Duty Paid.
    Ddp,
}

impl std::fmt::Display for Incoterm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Incoterm::Fob => "FOB",
            Incoterm::Cif => "CIF",
            Incoterm::Exw => "EXW",
            Incoterm::Dap => "DAP",
            Incoterm::Ddp => "DDP",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Incoterm {
    type Err = LandedCostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "FOB" => Ok(Incoterm::Fob),
            "CIF" => Ok(Incoterm::Cif),
            "EXW" => Ok(Incoterm::Exw),
            "DAP" => Ok(Incoterm::Dap),
            "DDP" => Ok(Incoterm::Ddp),
            other => Err(LandedCostError::InvalidInput {
                field: "incoterm".into(),
                reason: format!("Unknown incoterm '{}'. Expected FOB, CIF, EXW, DAP or DDP", other),
            }),
        }
    }
}

/// VAT status of the importer. Registered vendors can typically reclaim
/// import VAT, so the ex-VAT landed cost is also reported for them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImporterType {
    VatRegistered,
    #[default]
    Private,
}

/// One calculation request. Either `customs_value` or the pair
/// (`invoice_value`, `exchange_rate`) must resolve to a non-negative ZAR
/// amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentInput {
    /// HS commodity code, 4-10 numeric digits.
    pub hs_code: String,
    /// Customs value in ZAR, if already converted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customs_value: Option<Money>,
    /// Invoice value in the foreign currency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_value: Option<Money>,
    /// Exchange rate to ZAR applied to `invoice_value`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<Decimal>,
    /// Freight cost in ZAR.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freight_cost: Option<Money>,
    /// Insurance cost in ZAR.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance_cost: Option<Money>,
    /// Combined freight + insurance, overriding the individual fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freight_insurance: Option<Money>,
    /// Other landing charges in ZAR (wharfage, documentation, etc.).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_charges: Option<Money>,
    /// Unit count. Required (>= 1) when per-unit cost is wanted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    /// Gross weight in kilograms, for specific duties per kg.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<Decimal>,
    /// Volume in litres, for specific duties per litre.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_litres: Option<Decimal>,
    pub incoterm: Incoterm,
    #[serde(default)]
    pub importer_type: ImporterType,
    /// ISO 3166-1 alpha-2 origin country.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_country: Option<String>,
    /// Destination is fixed to South Africa.
    #[serde(default = "default_destination")]
    pub destination_country: String,
    /// Used / second-hand goods flag (triggers import-permit rules).
    #[serde(default)]
    pub used_goods: bool,
}

fn default_destination() -> String {
    "ZA".to_string()
}

impl ShipmentInput {
    /// Validate the request before any calculation runs.
    pub fn validate(&self) -> LandedCostResult<()> {
        if self.hs_code.len() < 4
            || self.hs_code.len() > 10
            || !self.hs_code.chars().all(|c| c.is_ascii_digit())
        {
            return Err(LandedCostError::InvalidInput {
                field: "hs_code".into(),
                reason: "HS code must be 4-10 numeric digits".into(),
            });
        }
        let product = self.product_value_zar()?;
        if product < Decimal::ZERO {
            return Err(LandedCostError::InvalidInput {
                field: "customs_value".into(),
                reason: "Resolved product value must be non-negative".into(),
            });
        }
        if self.quantity == Some(0) {
            return Err(LandedCostError::InvalidInput {
                field: "quantity".into(),
                reason: "Quantity must be at least 1 when supplied".into(),
            });
        }
        for (field, value) in [
            ("freight_cost", self.freight_cost),
            ("insurance_cost", self.insurance_cost),
            ("freight_insurance", self.freight_insurance),
            ("other_charges", self.other_charges),
            ("weight_kg", self.weight_kg),
            ("volume_litres", self.volume_litres),
        ] {
            if let Some(v) = value {
                if v < Decimal::ZERO {
                    return Err(LandedCostError::InvalidInput {
                        field: field.into(),
                        reason: "Value cannot be negative".into(),
                    });
                }
            }
        }
        if let Some(ref origin) = self.origin_country {
            if origin.len() != 2 || !origin.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(LandedCostError::InvalidInput {
                    field: "origin_country".into(),
                    reason: "Origin must be an ISO 3166-1 alpha-2 code".into(),
                });
            }
        }
        Ok(())
    }

    /// Resolve the ZAR product value: invoice x exchange rate when both are
    /// present, otherwise the customs value directly.
    pub fn product_value_zar(&self) -> LandedCostResult<Money> {
        match (self.invoice_value, self.exchange_rate, self.customs_value) {
            (Some(invoice), Some(fx), _) => Ok(invoice * fx),
            (_, _, Some(customs)) => Ok(customs),
            _ => Err(LandedCostError::InvalidInput {
                field: "customs_value".into(),
                reason: "Provide customs_value, or invoice_value with exchange_rate".into(),
            }),
        }
    }

    /// Freight + insurance + other charges on top of the product value.
    /// Under CIF the freight and insurance components are already inside
    /// the invoice value by convention and drop to zero; other landing
    /// charges (wharfage, documentation) are not, and always count.
    pub fn freight_insurance_zar(&self) -> Money {
        let other = self.other_charges.unwrap_or(Decimal::ZERO);
        if self.incoterm == Incoterm::Cif {
            return other;
        }
        let base = self.freight_insurance.unwrap_or_else(|| {
            self.freight_cost.unwrap_or(Decimal::ZERO)
                + self.insurance_cost.unwrap_or(Decimal::ZERO)
        });
        base + other
    }
}

/// One row of the output breakdown. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalcLineItem {
    pub key: String,
    pub label: String,
    /// Amount in ZAR, rounded to the cent.
    pub amount: Money,
    /// Human-readable formula, sufficient to reconstruct the number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_applied: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CalcLineItem {
    pub fn new(key: &str, label: &str, amount: Money) -> Self {
        CalcLineItem {
            key: key.to_string(),
            label: label.to_string(),
            amount,
            formula: None,
            rate_applied: None,
            notes: None,
        }
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    pub fn with_rate_applied(mut self, rate: impl Into<String>) -> Self {
        self.rate_applied = Some(rate.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// One append-only audit entry produced during a calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStep {
    pub step: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

/// Ordered audit trail for one calculation invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditTrace {
    pub steps: Vec<AuditStep>,
}

impl AuditTrace {
    pub fn record(&mut self, step: &str, detail: impl Into<String>) {
        self.record_value(step, detail, None);
    }

    pub fn record_value(
        &mut self,
        step: &str,
        detail: impl Into<String>,
        value: Option<serde_json::Value>,
    ) {
        self.steps.push(AuditStep {
            step: step.to_string(),
            detail: detail.into(),
            value,
            timestamp: Utc::now(),
        });
    }
}

/// How much faith to place in the estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_input() -> ShipmentInput {
        ShipmentInput {
            hs_code: "85171200".into(),
            customs_value: Some(dec!(10_000)),
            invoice_value: None,
            exchange_rate: None,
            freight_cost: Some(dec!(1_500)),
            insurance_cost: Some(dec!(200)),
            freight_insurance: None,
            other_charges: None,
            quantity: Some(10),
            weight_kg: None,
            volume_litres: None,
            incoterm: Incoterm::Fob,
            importer_type: ImporterType::Private,
            origin_country: Some("CN".into()),
            destination_country: "ZA".into(),
            used_goods: false,
        }
    }

    #[test]
    fn test_product_value_prefers_invoice_times_fx() {
        let mut input = base_input();
        input.invoice_value = Some(dec!(500));
        input.exchange_rate = Some(dec!(18.50));
        assert_eq!(input.product_value_zar().unwrap(), dec!(9_250));
    }

    #[test]
    fn test_product_value_falls_back_to_customs_value() {
        let input = base_input();
        assert_eq!(input.product_value_zar().unwrap(), dec!(10_000));
    }

    #[test]
    fn test_cif_zeroes_freight_and_insurance() {
        let mut input = base_input();
        input.incoterm = Incoterm::Cif;
        assert_eq!(input.freight_insurance_zar(), Decimal::ZERO);
    }

    #[test]
    fn test_cif_keeps_other_charges() {
        let mut input = base_input();
        input.incoterm = Incoterm::Cif;
        input.other_charges = Some(dec!(300));
        // Freight and insurance fall away under CIF; landing charges do not.
        assert_eq!(input.freight_insurance_zar(), dec!(300));
    }

    #[test]
    fn test_combined_freight_field_overrides_components() {
        let mut input = base_input();
        input.freight_insurance = Some(dec!(2_000));
        assert_eq!(input.freight_insurance_zar(), dec!(2_000));
    }

    #[test]
    fn test_other_charges_join_the_freight_component() {
        let mut input = base_input();
        input.other_charges = Some(dec!(300));
        assert_eq!(input.freight_insurance_zar(), dec!(2_000));
    }

    #[test]
    fn test_validate_rejects_alpha_hs_code() {
        let mut input = base_input();
        input.hs_code = "85A7".into();
        assert!(matches!(
            input.validate(),
            Err(LandedCostError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_quantity() {
        let mut input = base_input();
        input.quantity = Some(0);
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_validate_requires_a_resolvable_value() {
        let mut input = base_input();
        input.customs_value = None;
        assert!(input.validate().is_err());
    }
}
