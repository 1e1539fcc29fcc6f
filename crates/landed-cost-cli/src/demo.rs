//! Bundled demo tariff snapshot so the binary works without a live store.
//! Rates are illustrative; real deployments load a snapshot produced by the
//! ingestion pipeline via `--tariff-file`.

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use landed_cost_core::duty::{
    CompoundOperator, DutyRate, DutyRuleRecord, DutyType, SpecificRate, SpecificUnit,
};
use landed_cost_core::lookup::{
    HsCodeRecord, SnapshotPreference, TariffSnapshot, TariffVersion,
};
use landed_cost_core::Currency;

pub fn demo_snapshot() -> TariffSnapshot {
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
    let zar = |rate, unit| SpecificRate {
        rate,
        unit,
        currency: Currency::ZAR,
    };
    let pref = |code: &str, origin: &str, agreement: &str, rate: DutyRate, docs: &[&str]| {
        SnapshotPreference {
            hs_code: code.into(),
            origin_iso2: origin.into(),
            agreement_code: agreement.into(),
            rate,
            eligibility_notes: None,
            required_documents: docs.iter().map(|d| d.to_string()).collect(),
        }
    };

    TariffSnapshot {
        version: TariffVersion {
            id: "demo-2025-1".into(),
            label: "Demo 2025.1".into(),
            effective_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            active: true,
        },
        hs_codes: vec![
            hs("85171200", "Smartphones"),
            hs("84713000", "Portable computers"),
            hs("64035990", "Leather footwear"),
            hs("61091000", "Cotton T-shirts, knitted"),
            hs("22042110", "Wine in containers of 2 litres or less"),
            hs("04061000", "Fresh cheese and curd"),
            hs("87032319", "Motor cars, 1500-3000cc"),
            hs("30049090", "Other medicaments, packaged for retail"),
        ],
        duty_rules: vec![
            rule(
                "demo-phone",
                "85171200",
                DutyType::AdValorem,
                DutyRate::AdValorem { pct: dec!(0) },
            ),
            rule(
                "demo-laptop",
                "84713000",
                DutyType::AdValorem,
                DutyRate::AdValorem { pct: dec!(0) },
            ),
            rule(
                "demo-shoe",
                "64035990",
                DutyType::AdValorem,
                DutyRate::AdValorem { pct: dec!(30) },
            ),
            rule(
                "demo-shirt",
                "61091000",
                DutyType::AdValorem,
                DutyRate::AdValorem { pct: dec!(45) },
            ),
            rule(
                "demo-wine",
                "22042110",
                DutyType::Specific,
                DutyRate::Specific(zar(dec!(0.50), SpecificUnit::Litre)),
            ),
            rule(
                "demo-cheese",
                "04061000",
                DutyType::Compound,
                DutyRate::Compound {
                    operator: Some(CompoundOperator::Max),
                    ad_valorem_pct: dec!(20),
                    specific: zar(dec!(5), SpecificUnit::Kg),
                    less_pct: None,
                },
            ),
            rule(
                "demo-car",
                "87032319",
                DutyType::AdValorem,
                DutyRate::AdValorem { pct: dec!(25) },
            ),
            rule(
                "demo-medicine",
                "30049090",
                DutyType::AdValorem,
                DutyRate::AdValorem { pct: dec!(10) },
            ),
            // Anti-dumping add-on, excluded from the base-rate lookup.
            rule(
                "demo-shoe-ad",
                "64035990",
                DutyType::AntiDumping,
                DutyRate::AdValorem { pct: dec!(60) },
            ),
        ],
        preferences: vec![
            pref(
                "64035990",
                "DE",
                "EU-EPA",
                DutyRate::AdValorem { pct: dec!(4.8) },
                &["EUR.1 movement certificate"],
            ),
            pref(
                "61091000",
                "BW",
                "SADC",
                DutyRate::AdValorem { pct: dec!(0) },
                &["SADC Certificate of Origin"],
            ),
            pref(
                "61091000",
                "MU",
                "SADC",
                DutyRate::AdValorem { pct: dec!(0) },
                &["SADC Certificate of Origin"],
            ),
            pref(
                "22042110",
                "DE",
                "EU-EPA",
                DutyRate::AdValorem { pct: dec!(0) },
                &["EUR.1 movement certificate"],
            ),
            pref(
                "64035990",
                "CH",
                "EFTA",
                DutyRate::AdValorem { pct: dec!(6) },
                &["EUR.1 movement certificate"],
            ),
        ],
    }
}
