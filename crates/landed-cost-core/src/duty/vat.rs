//! Import VAT on the Added Tax Value (ATV).
//!
//! ATV = customs value x 1.1 + duty; VAT = ATV x 15%. The 10% uplift and
//! the 15% rate are policy constants of the destination jurisdiction and
//! must not change without a version bump of the engine.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{CalcLineItem, Money};

/// Statutory uplift applied to the customs value before VAT.
pub const ATV_UPLIFT: Decimal = dec!(1.1);

/// Standard VAT rate.
pub const VAT_RATE: Decimal = dec!(0.15);

/// Compute the import VAT line from an already-validated customs value and
/// duty amount. Pure arithmetic; no failure modes.
pub fn calculate_vat(dutiable_value: Money, duty_amount: Money) -> CalcLineItem {
    let added_tax_value = dutiable_value * ATV_UPLIFT + duty_amount;
    let vat = (added_tax_value * VAT_RATE).round_dp(2);
    CalcLineItem::new("vat", "Import VAT", vat)
        .with_formula(format!(
            "((R{} × 1.1) + R{}) × 15%",
            dutiable_value, duty_amount
        ))
        .with_rate_applied("15% on ATV")
}
