//! Pure duty evaluation: one rate payload + shipment facts -> one line item.
//!
//! A specific or compound rate whose physical dimension (weight, volume,
//! count) is missing from the shipment evaluates to zero but is flagged
//! not-computable — callers must treat that as "cannot compute with the
//! given inputs", never as a valid zero-duty result.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::duty::rule::{CompoundOperator, DutyRate, SpecificRate, SpecificUnit};
use crate::error::LandedCostError;
use crate::types::{CalcLineItem, Money, ShipmentInput};
use crate::LandedCostResult;

const HUNDRED: Decimal = dec!(100);

/// Whether the duty amount is a real computation or a data-quality gap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DutyComputability {
    Computed,
    /// The shipment lacks the dimension the rate is levied on.
    MissingDimension { unit: SpecificUnit },
}

/// Evaluated duty line plus its computability flag.
#[derive(Debug, Clone)]
pub struct DutyLine {
    pub item: CalcLineItem,
    pub computability: DutyComputability,
}

impl DutyLine {
    pub fn is_computable(&self) -> bool {
        self.computability == DutyComputability::Computed
    }
}

/// One resolved component of a specific or compound rate.
struct SpecificComponent {
    amount: Money,
    quantity: Option<Decimal>,
    formula: String,
}

/// Resolve the shipment quantity a specific rate applies to and compute the
/// component amount. Shared by the SPECIFIC and COMPOUND branches.
fn resolve_specific_component(spec: &SpecificRate, shipment: &ShipmentInput) -> SpecificComponent {
    let quantity = match spec.unit {
        SpecificUnit::Kg => shipment.weight_kg,
        SpecificUnit::Litre => shipment.volume_litres,
        SpecificUnit::Item => shipment.quantity.map(Decimal::from),
    }
    .filter(|q| *q > Decimal::ZERO);

    match quantity {
        Some(q) => SpecificComponent {
            amount: (spec.rate * q).round_dp(2),
            quantity: Some(q),
            formula: format!("R{}/{} × {} {}", spec.rate, spec.unit, q, spec.unit),
        },
        None => SpecificComponent {
            amount: Decimal::ZERO,
            quantity: None,
            formula: format!("R{}/{} × (missing {})", spec.rate, spec.unit, spec.unit),
        },
    }
}

/// Evaluate one duty rate against a shipment on the given dutiable value.
///
/// Fails with [`LandedCostError::UnsupportedDutyType`] on rate records the
/// engine cannot compute — a configuration error, never defaulted to zero.
pub fn evaluate_duty(
    rate: &DutyRate,
    shipment: &ShipmentInput,
    dutiable_value: Money,
) -> LandedCostResult<DutyLine> {
    match rate {
        DutyRate::AdValorem { pct } => {
            if pct.is_zero() {
                return Ok(DutyLine {
                    item: CalcLineItem::new("duty", "Customs duty", Decimal::ZERO)
                        .with_formula("0%")
                        .with_rate_applied("Free"),
                    computability: DutyComputability::Computed,
                });
            }
            let amount = (dutiable_value * pct / HUNDRED).round_dp(2);
            Ok(DutyLine {
                item: CalcLineItem::new("duty", "Customs duty", amount)
                    .with_formula(format!("R{} × {}%", dutiable_value, pct))
                    .with_rate_applied(format!("{}% ad valorem", pct)),
                computability: DutyComputability::Computed,
            })
        }

        DutyRate::Specific(spec) => {
            let component = resolve_specific_component(spec, shipment);
            let computability = match component.quantity {
                Some(_) => DutyComputability::Computed,
                None => DutyComputability::MissingDimension { unit: spec.unit },
            };
            Ok(DutyLine {
                item: CalcLineItem::new("duty", "Customs duty", component.amount)
                    .with_formula(component.formula)
                    .with_rate_applied(format!("R{} per {}", spec.rate, spec.unit)),
                computability,
            })
        }

        DutyRate::Compound {
            operator,
            ad_valorem_pct,
            specific,
            less_pct,
        } => {
            let ad_valorem_amount = (dutiable_value * ad_valorem_pct / HUNDRED).round_dp(2);
            let component = resolve_specific_component(specific, shipment);

            let (amount, op_label) = match operator {
                Some(CompoundOperator::Sum) => {
                    (ad_valorem_amount + component.amount, "SUM".to_string())
                }
                Some(CompoundOperator::MaxLess) => {
                    let less = less_pct.unwrap_or(Decimal::ZERO);
                    let max = ad_valorem_amount.max(component.amount);
                    (
                        (max * (HUNDRED - less) / HUNDRED).round_dp(2),
                        format!("MAX less {}%", less),
                    )
                }
                Some(CompoundOperator::Max) => {
                    (ad_valorem_amount.max(component.amount), "MAX".to_string())
                }
                // No operator recorded on the tariff line: take the greater.
                None => (
                    ad_valorem_amount.max(component.amount),
                    "MAX (operator defaulted)".to_string(),
                ),
            };

            let computability = match component.quantity {
                Some(_) => DutyComputability::Computed,
                None => DutyComputability::MissingDimension {
                    unit: specific.unit,
                },
            };

            Ok(DutyLine {
                item: CalcLineItem::new("duty", "Customs duty", amount)
                    .with_formula(format!(
                        "{}(R{} × {}% = R{}, {} = R{})",
                        op_label,
                        dutiable_value,
                        ad_valorem_pct,
                        ad_valorem_amount,
                        component.formula,
                        component.amount
                    ))
                    .with_rate_applied(format!(
                        "Compound {} of {}% ad valorem and R{}/{}",
                        op_label, ad_valorem_pct, specific.rate, specific.unit
                    )),
                computability,
            })
        }

        DutyRate::Other { description } => Err(LandedCostError::UnsupportedDutyType {
            duty_type: description.clone(),
            code: shipment.hs_code.clone(),
        }),
    }
}
