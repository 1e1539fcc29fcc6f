//! The validated tariff-rule model.
//!
//! Rules arrive from the tariff store as a tagged union ([`DutyRate`]) that
//! is validated at the data-access boundary, so the evaluator never sees a
//! loosely-typed payload. Anti-dumping rows carry the [`DutyType`] tag and
//! are excluded from the base-rate lookup.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LandedCostError;
use crate::types::Currency;
use crate::LandedCostResult;

/// Classification tag on a stored rate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DutyType {
    AdValorem,
    Specific,
    Compound,
    AntiDumping,
    Other,
}

impl std::fmt::Display for DutyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DutyType::AdValorem => "AD_VALOREM",
            DutyType::Specific => "SPECIFIC",
            DutyType::Compound => "COMPOUND",
            DutyType::AntiDumping => "ANTI_DUMPING",
            DutyType::Other => "OTHER",
        };
        write!(f, "{}", s)
    }
}

/// Physical dimension a specific duty is levied on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecificUnit {
    Kg,
    Litre,
    Item,
}

impl SpecificUnit {
    /// Parse tariff-book unit spellings ("kg", "li", "u", "pair", ...).
    pub fn parse(s: &str) -> Option<SpecificUnit> {
        match s.to_lowercase().as_str() {
            "kg" | "kilogram" => Some(SpecificUnit::Kg),
            "litre" | "liter" | "li" | "l" => Some(SpecificUnit::Litre),
            "item" | "u" | "unit" | "pair" => Some(SpecificUnit::Item),
            _ => None,
        }
    }
}

impl std::fmt::Display for SpecificUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SpecificUnit::Kg => "kg",
            SpecificUnit::Litre => "litre",
            SpecificUnit::Item => "item",
        };
        write!(f, "{}", s)
    }
}

/// Fixed amount per physical unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecificRate {
    pub rate: Decimal,
    pub unit: SpecificUnit,
    #[serde(default)]
    pub currency: Currency,
}

/// How the two components of a compound duty combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompoundOperator {
    Max,
    MaxLess,
    Sum,
}

/// The rate payload itself, validated before it reaches calculation logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DutyRate {
    /// Percentage of value. 0 is permitted and means duty-free.
    AdValorem { pct: Decimal },
    /// Fixed amount per kg / litre / item.
    Specific(SpecificRate),
    /// Ad valorem and specific components joined by an operator. A missing
    /// operator falls back to MAX at evaluation time.
    Compound {
        #[serde(skip_serializing_if = "Option::is_none")]
        operator: Option<CompoundOperator>,
        ad_valorem_pct: Decimal,
        specific: SpecificRate,
        /// "less X%" reduction for the MAX_LESS operator.
        #[serde(skip_serializing_if = "Option::is_none")]
        less_pct: Option<Decimal>,
    },
    /// A rate formula the engine cannot compute (formula duties, quotas).
    Other { description: String },
}

impl DutyRate {
    /// Validate the payload invariants at the data-access boundary.
    pub fn validate(&self, hs_code: &str) -> LandedCostResult<()> {
        let invalid = |field: &str, reason: &str| LandedCostError::InvalidInput {
            field: format!("{} ({})", field, hs_code),
            reason: reason.into(),
        };
        match self {
            DutyRate::AdValorem { pct } => {
                if *pct < Decimal::ZERO {
                    return Err(invalid("pct", "Ad valorem percentage cannot be negative"));
                }
            }
            DutyRate::Specific(spec) => {
                if spec.rate < Decimal::ZERO {
                    return Err(invalid("rate", "Specific rate cannot be negative"));
                }
            }
            DutyRate::Compound {
                ad_valorem_pct,
                specific,
                less_pct,
                ..
            } => {
                if *ad_valorem_pct < Decimal::ZERO {
                    return Err(invalid(
                        "ad_valorem_pct",
                        "Compound ad valorem component cannot be negative",
                    ));
                }
                if specific.rate < Decimal::ZERO {
                    return Err(invalid("rate", "Compound specific component cannot be negative"));
                }
                if let Some(less) = less_pct {
                    if *less < Decimal::ZERO || *less > Decimal::ONE_HUNDRED {
                        return Err(invalid("less_pct", "Reduction must be between 0 and 100"));
                    }
                }
            }
            DutyRate::Other { .. } => {}
        }
        Ok(())
    }

    /// The ad valorem share of this rate as a fraction (0.25 = 25%), used
    /// when comparing against preferential rates. Purely specific rates
    /// have no ad valorem equivalent.
    pub fn ad_valorem_fraction(&self) -> Option<Decimal> {
        match self {
            DutyRate::AdValorem { pct } => Some(pct / Decimal::ONE_HUNDRED),
            DutyRate::Compound { ad_valorem_pct, .. } => {
                Some(ad_valorem_pct / Decimal::ONE_HUNDRED)
            }
            _ => None,
        }
    }

    /// Short description for audit output.
    pub fn describe(&self) -> String {
        match self {
            DutyRate::AdValorem { pct } => format!("{}% ad valorem", pct),
            DutyRate::Specific(spec) => format!("R{}/{}", spec.rate, spec.unit),
            DutyRate::Compound {
                operator,
                ad_valorem_pct,
                specific,
                less_pct,
            } => {
                let op = match operator {
                    Some(CompoundOperator::Max) | None => "MAX",
                    Some(CompoundOperator::MaxLess) => "MAX_LESS",
                    Some(CompoundOperator::Sum) => "SUM",
                };
                let less = less_pct
                    .map(|l| format!(" less {}%", l))
                    .unwrap_or_default();
                format!(
                    "{}({}% ad valorem, R{}/{}){}",
                    op, ad_valorem_pct, specific.rate, specific.unit, less
                )
            }
            DutyRate::Other { description } => description.clone(),
        }
    }
}

/// One row of a tariff schedule for one HS code within one version.
/// Immutable once its version is published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutyRuleRecord {
    pub id: String,
    pub hs_code: String,
    pub duty_type: DutyType,
    pub rate: DutyRate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DutyRuleRecord {
    /// The tag and the payload must agree; enforced when a snapshot loads.
    pub fn validate(&self) -> LandedCostResult<()> {
        self.rate.validate(&self.hs_code)?;
        let consistent = matches!(
            (&self.duty_type, &self.rate),
            (DutyType::AdValorem, DutyRate::AdValorem { .. })
                | (DutyType::Specific, DutyRate::Specific(_))
                | (DutyType::Compound, DutyRate::Compound { .. })
                | (DutyType::AntiDumping, _)
                | (DutyType::Other, DutyRate::Other { .. })
        );
        if !consistent {
            return Err(LandedCostError::InvalidInput {
                field: format!("duty_type ({})", self.hs_code),
                reason: format!(
                    "Duty type {} does not match the rate payload",
                    self.duty_type
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_unit_parsing_covers_tariff_book_spellings() {
        assert_eq!(SpecificUnit::parse("kg"), Some(SpecificUnit::Kg));
        assert_eq!(SpecificUnit::parse("li"), Some(SpecificUnit::Litre));
        assert_eq!(SpecificUnit::parse("u"), Some(SpecificUnit::Item));
        assert_eq!(SpecificUnit::parse("pair"), Some(SpecificUnit::Item));
        assert_eq!(SpecificUnit::parse("furlong"), None);
    }

    #[test]
    fn test_negative_ad_valorem_rejected() {
        let rate = DutyRate::AdValorem { pct: dec!(-5) };
        assert!(rate.validate("6403").is_err());
    }

    #[test]
    fn test_zero_ad_valorem_is_valid_duty_free() {
        let rate = DutyRate::AdValorem { pct: Decimal::ZERO };
        assert!(rate.validate("8517").is_ok());
    }

    #[test]
    fn test_mismatched_tag_and_payload_rejected() {
        let record = DutyRuleRecord {
            id: "r1".into(),
            hs_code: "640359".into(),
            duty_type: DutyType::Specific,
            rate: DutyRate::AdValorem { pct: dec!(30) },
            notes: None,
        };
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_ad_valorem_fraction() {
        let rate = DutyRate::AdValorem { pct: dec!(25) };
        assert_eq!(rate.ad_valorem_fraction(), Some(dec!(0.25)));

        let spec = DutyRate::Specific(SpecificRate {
            rate: dec!(0.50),
            unit: SpecificUnit::Litre,
            currency: Currency::ZAR,
        });
        assert_eq!(spec.ad_valorem_fraction(), None);
    }
}
