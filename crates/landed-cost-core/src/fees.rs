//! Heuristic ancillary charges: forex/merchant fees, clearance, port dues,
//! disbursements. These are estimates drawn from typical clearing-agent
//! schedules, not authoritative tariffs, and every line discloses that.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{CalcLineItem, Money};

/// Forex and merchant fees as a share of the dutiable value.
const FOREX_PCT: Decimal = dec!(0.025);

/// Flat customs clearance / agency fee.
const CLEARANCE_FEE: Decimal = dec!(1_250);

/// Port and terminal dues as a share of the dutiable value.
const PORT_PCT: Decimal = dec!(0.008);

/// Floor on port and terminal dues.
const PORT_MINIMUM: Decimal = dec!(850);

/// Flat disbursement / administration recovery.
const DISBURSEMENT_FEE: Decimal = dec!(550);

const ESTIMATE_NOTE: &str = "Estimate based on typical clearing-agent schedules, not an official tariff";

/// The four ancillary line items plus their total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AncillaryEstimate {
    pub items: Vec<CalcLineItem>,
    pub total: Money,
}

/// Estimate ancillary charges on the CIF value. Always succeeds for a
/// non-negative input; each item is computed independently.
pub fn estimate_ancillary(dutiable_value: Money) -> AncillaryEstimate {
    let forex = (dutiable_value * FOREX_PCT).round_dp(2);
    let port = (dutiable_value * PORT_PCT).round_dp(2).max(PORT_MINIMUM);

    let items = vec![
        CalcLineItem::new("fee_forex", "Forex & merchant fees", forex)
            .with_formula(format!("R{} × 2.5%", dutiable_value))
            .with_rate_applied("2.5% of CIF value")
            .with_notes(ESTIMATE_NOTE),
        CalcLineItem::new("fee_clearance", "Clearance & agency fee", CLEARANCE_FEE)
            .with_formula("Flat R1,250")
            .with_notes(ESTIMATE_NOTE),
        CalcLineItem::new("fee_port", "Port & terminal dues", port)
            .with_formula(format!("max(R{} × 0.8%, R850)", dutiable_value))
            .with_notes(ESTIMATE_NOTE),
        CalcLineItem::new("fee_disbursements", "Disbursements & admin", DISBURSEMENT_FEE)
            .with_formula("Flat R550")
            .with_notes(ESTIMATE_NOTE),
    ];
    let total = items.iter().map(|i| i.amount).sum();

    AncillaryEstimate { items, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fee_schedule_on_100k() {
        let est = estimate_ancillary(dec!(100_000));
        // forex 2_500, clearance 1_250, port 800 -> floored to 850, disb 550
        assert_eq!(est.items[0].amount, dec!(2_500.00));
        assert_eq!(est.items[1].amount, dec!(1_250));
        assert_eq!(est.items[2].amount, dec!(850));
        assert_eq!(est.items[3].amount, dec!(550));
        assert_eq!(est.total, dec!(5_150.00));
    }

    #[test]
    fn test_port_dues_rise_above_the_floor() {
        let est = estimate_ancillary(dec!(200_000));
        assert_eq!(est.items[2].amount, dec!(1_600.00));
    }

    #[test]
    fn test_flat_fees_survive_zero_value() {
        let est = estimate_ancillary(Decimal::ZERO);
        assert_eq!(est.total, dec!(1_250) + dec!(850) + dec!(550));
    }

    #[test]
    fn test_every_item_discloses_estimate_status() {
        let est = estimate_ancillary(dec!(50_000));
        assert!(est.items.iter().all(|i| i.notes.is_some()));
    }
}
