use std::sync::Arc;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use landed_cost_core::duty::{
    evaluate_duty, CompoundOperator, DutyRate, DutyRuleRecord, DutyType, SpecificRate,
    SpecificUnit,
};
use landed_cost_core::engine::LandedCostEngine;
use landed_cost_core::lookup::{
    CalcRunRecord, HsCodeRecord, InMemoryRunHistory, InMemoryTariffStore, RunHistory,
    SnapshotPreference, TariffSnapshot, TariffVersion,
};
use landed_cost_core::preference::PreferenceStatus;
use landed_cost_core::reference::ReferenceData;
use landed_cost_core::{
    Currency, ImporterType, Incoterm, LandedCostError, LandedCostResult, ShipmentInput,
};

// ===========================================================================
// Fixtures
// ===========================================================================

fn tariff_snapshot() -> TariffSnapshot {
    let hs = |code: &str, description: &str| HsCodeRecord {
        code: code.into(),
        description: description.into(),
    };
    let rule = |id: &str, code: &str, duty_type: DutyType, rate: DutyRate| DutyRuleRecord {
        id: id.into(),
        hs_code: code.into(),
        duty_type,
        rate,
        notes: None,
    };

    TariffSnapshot {
        version: TariffVersion {
            id: "v-2025-1".into(),
            label: "2025.1".into(),
            effective_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            active: true,
        },
        hs_codes: vec![
            hs("85171200", "Smartphones"),
            hs("64035990", "Leather footwear"),
            hs("61091000", "Cotton T-shirts, knitted"),
            hs("22042110", "Wine in containers of 2 litres or less"),
            hs("04061000", "Fresh cheese"),
            hs("39269090", "Other articles of plastics"),
        ],
        duty_rules: vec![
            rule(
                "r-phone",
                "85171200",
                DutyType::AdValorem,
                DutyRate::AdValorem { pct: dec!(0) },
            ),
            rule(
                "r-shoe",
                "64035990",
                DutyType::AdValorem,
                DutyRate::AdValorem { pct: dec!(10) },
            ),
            rule(
                "r-shirt",
                "61091000",
                DutyType::AdValorem,
                DutyRate::AdValorem { pct: dec!(45) },
            ),
            rule(
                "r-wine",
                "22042110",
                DutyType::Specific,
                DutyRate::Specific(SpecificRate {
                    rate: dec!(0.50),
                    unit: SpecificUnit::Litre,
                    currency: Currency::ZAR,
                }),
            ),
            rule(
                "r-cheese",
                "04061000",
                DutyType::Compound,
                DutyRate::Compound {
                    operator: Some(CompoundOperator::Max),
                    ad_valorem_pct: dec!(20),
                    specific: SpecificRate {
                        rate: dec!(5),
                        unit: SpecificUnit::Kg,
                        currency: Currency::ZAR,
                    },
                    less_pct: None,
                },
            ),
            // 39269090 deliberately has no rate in this version.
        ],
        preferences: vec![SnapshotPreference {
            hs_code: "64035990".into(),
            origin_iso2: "DE".into(),
            agreement_code: "EU-EPA".into(),
            rate: DutyRate::AdValorem { pct: dec!(0) },
            eligibility_notes: None,
            required_documents: vec!["EUR.1 movement certificate".into()],
        }],
    }
}

fn engine() -> LandedCostEngine {
    let store = InMemoryTariffStore::from_snapshot(tariff_snapshot()).unwrap();
    LandedCostEngine::new(Arc::new(store), Arc::new(ReferenceData::builtin()))
}

fn shipment(hs_code: &str, customs_value: Decimal) -> ShipmentInput {
    ShipmentInput {
        hs_code: hs_code.into(),
        customs_value: Some(customs_value),
        invoice_value: None,
        exchange_rate: None,
        freight_cost: None,
        insurance_cost: None,
        freight_insurance: None,
        other_charges: None,
        quantity: None,
        weight_kg: None,
        volume_litres: None,
        incoterm: Incoterm::Cif,
        importer_type: ImporterType::Private,
        origin_country: None,
        destination_country: "ZA".into(),
        used_goods: false,
    }
}

fn line_amount(output: &landed_cost_core::engine::CalcOutput, key: &str) -> Decimal {
    output
        .breakdown
        .iter()
        .find(|l| l.key == key)
        .map(|l| l.amount)
        .unwrap_or_else(|| panic!("no '{}' line in breakdown", key))
}

// ===========================================================================
// Scenario tests
// ===========================================================================

#[test]
fn test_ad_valorem_scenario() {
    // 10% on R10,000 CIF: duty 1,000; VAT ((10,000 x 1.1) + 1,000) x 0.15 = 1,800
    let output = engine()
        .calculate(&shipment("64035990", dec!(10_000)), None)
        .unwrap();
    assert_eq!(line_amount(&output, "duty"), dec!(1_000.00));
    assert_eq!(line_amount(&output, "vat"), dec!(1_800.00));
    // Ancillary on CIF 10,000: 250 + 1,250 + 850 + 550 = 2,900
    assert_eq!(output.landed_cost_total, dec!(15_700.00));
}

#[test]
fn test_specific_rate_scenario() {
    let mut input = shipment("22042110", dec!(1_000));
    input.volume_litres = Some(dec!(1_000));
    let output = engine().calculate(&input, None).unwrap();
    assert_eq!(line_amount(&output, "duty"), dec!(500.00));
    assert_eq!(line_amount(&output, "vat"), dec!(240.00));
}

#[test]
fn test_free_rate_shortcut() {
    let output = engine()
        .calculate(&shipment("85171200", dec!(250_000)), None)
        .unwrap();
    let duty = output.breakdown.iter().find(|l| l.key == "duty").unwrap();
    assert_eq!(duty.amount, Decimal::ZERO);
    assert_eq!(duty.rate_applied.as_deref(), Some("Free"));
}

#[test]
fn test_total_identity_holds_to_the_cent() {
    let mut input = shipment("64035990", dec!(12_345.67));
    input.incoterm = Incoterm::Fob;
    input.freight_cost = Some(dec!(1_500));
    input.insurance_cost = Some(dec!(234.56));
    let output = engine().calculate(&input, None).unwrap();

    let product = line_amount(&output, "customs_value");
    let freight = line_amount(&output, "freight");
    let duty = line_amount(&output, "duty");
    let vat = line_amount(&output, "vat");
    let ancillary: Decimal = output
        .breakdown
        .iter()
        .filter(|l| l.key.starts_with("fee_"))
        .map(|l| l.amount)
        .sum();

    assert_eq!(
        output.landed_cost_total,
        product + freight + duty + vat + ancillary
    );
    // Second formulation: CIF + duty + VAT + ancillary.
    assert_eq!(
        output.landed_cost_total,
        (product + freight) + duty + vat + ancillary
    );
}

#[test]
fn test_breakdown_order_is_fixed() {
    let mut input = shipment("64035990", dec!(10_000));
    input.incoterm = Incoterm::Fob;
    input.freight_cost = Some(dec!(1_000));
    let output = engine().calculate(&input, None).unwrap();
    let keys: Vec<&str> = output.breakdown.iter().map(|l| l.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "customs_value",
            "freight",
            "duty",
            "vat",
            "fee_forex",
            "fee_clearance",
            "fee_port",
            "fee_disbursements",
        ]
    );
}

#[test]
fn test_cif_omits_the_freight_line() {
    let mut input = shipment("64035990", dec!(10_000));
    input.freight_cost = Some(dec!(9_999)); // ignored under CIF
    let output = engine().calculate(&input, None).unwrap();
    assert!(!output.breakdown.iter().any(|l| l.key == "freight"));
}

#[test]
fn test_cif_keeps_other_landing_charges_in_the_breakdown() {
    let mut input = shipment("64035990", dec!(10_000));
    input.freight_cost = Some(dec!(9_999)); // ignored under CIF
    input.other_charges = Some(dec!(300)); // not part of the invoice value
    let output = engine().calculate(&input, None).unwrap();
    assert_eq!(line_amount(&output, "freight"), dec!(300.00));
}

// ===========================================================================
// Preference override
// ===========================================================================

#[test]
fn test_preference_override_replaces_never_merges() {
    let mut input = shipment("64035990", dec!(10_000));
    input.origin_country = Some("DE".into());
    let output = engine().calculate(&input, None).unwrap();

    // Must equal evaluating the override rate directly — not a blend of
    // the 10% base and the 0% override.
    let override_rate = DutyRate::AdValorem { pct: dec!(0) };
    let direct = evaluate_duty(&override_rate, &input, dec!(10_000)).unwrap();
    assert_eq!(line_amount(&output, "duty"), direct.item.amount);

    // The audit trail names the agreement that supplied the override.
    assert!(output
        .audit_trace
        .steps
        .iter()
        .any(|s| s.step == "preference_override" && s.detail.contains("EU-EPA")));
}

#[test]
fn test_preference_decision_attached_for_covered_origin() {
    let mut input = shipment("61091000", dec!(10_000));
    input.origin_country = Some("MU".into());
    let output = engine().calculate(&input, None).unwrap();
    let decision = output.preference.unwrap();
    assert_eq!(decision.status, PreferenceStatus::Eligible);
    assert_eq!(decision.best_option.unwrap().rate, dec!(0));
}

// ===========================================================================
// Error taxonomy
// ===========================================================================

#[test]
fn test_unknown_hs_code() {
    let err = engine()
        .calculate(&shipment("99999999", dec!(1_000)), None)
        .unwrap_err();
    assert!(matches!(err, LandedCostError::UnknownHsCode { .. }));
}

#[test]
fn test_known_code_without_a_rate_is_a_distinct_error() {
    let err = engine()
        .calculate(&shipment("39269090", dec!(1_000)), None)
        .unwrap_err();
    assert!(matches!(err, LandedCostError::NoRateForVersion { .. }));
}

#[test]
fn test_no_active_tariff_version_fails_fast() {
    let mut snapshot = tariff_snapshot();
    snapshot.version.active = false;
    let store = InMemoryTariffStore::from_snapshot(snapshot).unwrap();
    let engine = LandedCostEngine::new(Arc::new(store), Arc::new(ReferenceData::builtin()));
    let err = engine
        .calculate(&shipment("64035990", dec!(1_000)), None)
        .unwrap_err();
    assert!(matches!(err, LandedCostError::NoActiveTariffVersion));
}

#[test]
fn test_missing_dimension_is_not_computable_not_zero() {
    // Wine duty is per litre; no volume declared.
    let err = engine()
        .calculate(&shipment("22042110", dec!(1_000)), None)
        .unwrap_err();
    assert!(matches!(err, LandedCostError::NotComputable { .. }));
}

// ===========================================================================
// Output shape
// ===========================================================================

#[test]
fn test_registered_importer_sees_ex_vat_total() {
    let mut input = shipment("64035990", dec!(10_000));
    input.importer_type = ImporterType::VatRegistered;
    let output = engine().calculate(&input, None).unwrap();
    let vat = line_amount(&output, "vat");
    assert_eq!(
        output.landed_cost_ex_vat,
        Some(output.landed_cost_total - vat)
    );
}

#[test]
fn test_private_importer_has_no_ex_vat_total() {
    let output = engine()
        .calculate(&shipment("64035990", dec!(10_000)), None)
        .unwrap();
    assert_eq!(output.landed_cost_ex_vat, None);
}

#[test]
fn test_per_unit_cost_only_when_quantity_supplied() {
    let mut input = shipment("64035990", dec!(10_000));
    input.quantity = Some(100);
    let output = engine().calculate(&input, None).unwrap();
    assert_eq!(
        output.per_unit_cost,
        Some((output.landed_cost_total / dec!(100)).round_dp(2))
    );

    let output = engine()
        .calculate(&shipment("64035990", dec!(10_000)), None)
        .unwrap();
    assert_eq!(output.per_unit_cost, None);
}

#[test]
fn test_high_value_shipment_gets_inspection_note() {
    let output = engine()
        .calculate(&shipment("64035990", dec!(750_000)), None)
        .unwrap();
    assert!(output
        .risk_notes
        .iter()
        .any(|n| n.contains("inspection probability increased")));
}

// ===========================================================================
// Run history side effect
// ===========================================================================

struct FailingHistory;

impl RunHistory for FailingHistory {
    fn record_run(&self, _run: &CalcRunRecord) -> LandedCostResult<()> {
        Err(LandedCostError::RunHistoryError("sink unavailable".into()))
    }
}

#[test]
fn test_history_failure_never_fails_the_calculation() {
    let store = InMemoryTariffStore::from_snapshot(tariff_snapshot()).unwrap();
    let engine = LandedCostEngine::new(Arc::new(store), Arc::new(ReferenceData::builtin()))
        .with_history(Arc::new(FailingHistory));
    let result = engine.calculate(&shipment("64035990", dec!(10_000)), None);
    assert!(result.is_ok());
}

#[test]
fn test_successful_run_is_recorded() {
    let history = Arc::new(InMemoryRunHistory::new());
    let store = InMemoryTariffStore::from_snapshot(tariff_snapshot()).unwrap();
    let engine = LandedCostEngine::new(Arc::new(store), Arc::new(ReferenceData::builtin()))
        .with_history(history.clone());
    engine
        .calculate(&shipment("64035990", dec!(10_000)), Some("web"))
        .unwrap();
    let runs = history.runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].tariff_version_id, "v-2025-1");
    assert_eq!(runs[0].label.as_deref(), Some("web"));
}
