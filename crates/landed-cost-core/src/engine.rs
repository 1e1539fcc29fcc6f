//! The landed-cost orchestrator: one linear pass from shipment input to an
//! auditable breakdown.
//!
//! Steps run strictly in sequence — tariff version, base rule, preference
//! override, value resolution, duty, VAT, ancillary, aggregation. Duty is
//! computed on the FOB-equivalent base even under CIF terms (the
//! destination customs-value convention); ancillary charges run on CIF.
//! The run-history write is fire-and-forget: its failure is logged and
//! never reaches the caller.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::compliance::{assess_risks, RiskAssessment, RiskInput};
use crate::duty::{evaluate_duty, DutyComputability, DutyRate, DutyType};
use crate::error::LandedCostError;
use crate::fees::estimate_ancillary;
use crate::lookup::{CalcRunRecord, RunHistory, TariffStore, TariffVersion};
use crate::preference::{resolve_preference, PreferenceDecision};
use crate::reference::ReferenceData;
use crate::types::{
    AuditTrace, CalcLineItem, Confidence, ImporterType, Money, ShipmentInput,
};
use crate::duty::vat::calculate_vat;
use crate::LandedCostResult;

/// Declared values above this attract a static inspection-probability note.
const HIGH_VALUE_THRESHOLD: Decimal = dec!(500_000);

/// The full calculation result. Ephemeral — one per call; persistence is a
/// side effect owned by the run-history collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalcOutput {
    /// Total landed cost in ZAR: CIF value + duty + VAT + ancillary.
    pub landed_cost_total: Money,
    /// Total excluding VAT, reported for VAT-registered importers only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landed_cost_ex_vat: Option<Money>,
    pub currency: String,
    /// Ordered breakdown: product value, freight (when > 0), duty, VAT,
    /// then ancillary items. Order is significant.
    pub breakdown: Vec<CalcLineItem>,
    pub tariff_version: TariffVersion,
    pub confidence: Confidence,
    pub audit_trace: AuditTrace,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_unit_cost: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preference: Option<PreferenceDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_assessment: Option<RiskAssessment>,
    /// Static advisory notes (chapter heuristics, high-value flag).
    pub risk_notes: Vec<String>,
    pub warnings: Vec<String>,
}

/// The engine. Cheap to clone — all state is shared behind `Arc`s; every
/// calculation is a pure pass over the injected store and reference data.
#[derive(Clone)]
pub struct LandedCostEngine {
    store: Arc<dyn TariffStore>,
    history: Option<Arc<dyn RunHistory>>,
    reference: Arc<ReferenceData>,
}

impl LandedCostEngine {
    pub fn new(store: Arc<dyn TariffStore>, reference: Arc<ReferenceData>) -> Self {
        LandedCostEngine {
            store,
            history: None,
            reference,
        }
    }

    /// Attach a best-effort run-history sink.
    pub fn with_history(mut self, history: Arc<dyn RunHistory>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Compute the landed cost for one shipment.
    pub fn calculate(
        &self,
        input: &ShipmentInput,
        run_label: Option<&str>,
    ) -> LandedCostResult<CalcOutput> {
        input.validate()?;
        let mut trace = AuditTrace::default();
        let mut warnings: Vec<String> = Vec::new();

        // 1. Active tariff version — fatal if none is published.
        let version = self
            .store
            .active_version()
            .ok_or(LandedCostError::NoActiveTariffVersion)?;
        trace.record(
            "tariff_version",
            format!("Resolved active tariff version {} ({})", version.label, version.id),
        );

        // 2. Base duty rule, excluding anti-dumping rows. Unknown code and
        // missing rate are distinct failures: fix the input vs fix the data.
        let hs = self
            .store
            .find_hs_code(&input.hs_code)
            .ok_or_else(|| LandedCostError::UnknownHsCode {
                code: input.hs_code.clone(),
            })?;
        let base_rule = self
            .store
            .find_duty_rule(&version.id, &hs.code, &[DutyType::AntiDumping])
            .ok_or_else(|| LandedCostError::NoRateForVersion {
                code: hs.code.clone(),
                version: version.label.clone(),
            })?;
        trace.record(
            "base_rule",
            format!("Base duty rule for HS {}: {}", hs.code, base_rule.rate.describe()),
        );

        // 3. Preference override — replaces the rate wholesale, never merges.
        let mut working_rate: DutyRate = base_rule.rate.clone();
        let mut override_agreement: Option<String> = None;
        if let Some(ref origin) = input.origin_country {
            if let Some(pref) =
                self.store.find_origin_preference(&version.id, &hs.code, origin)
            {
                trace.record(
                    "preference_override",
                    format!(
                        "Origin preference under {} replaces the general rate: {}",
                        pref.agreement_code,
                        pref.rate.describe()
                    ),
                );
                working_rate = pref.rate;
                override_agreement = Some(pref.agreement_code);
            }
        }

        // 4. Value resolution. FOB base for duty, CIF for ancillary.
        let product_value = input.product_value_zar()?.round_dp(2);
        let freight_insurance = input.freight_insurance_zar().round_dp(2);
        let fob_value = product_value;
        let cif_value = fob_value + freight_insurance;
        trace.record_value(
            "values",
            format!(
                "Product value R{} ({} terms); freight & insurance R{}; CIF R{}",
                product_value, input.incoterm, freight_insurance, cif_value
            ),
            Some(serde_json::json!({
                "fob_value": fob_value.to_string(),
                "cif_value": cif_value.to_string(),
            })),
        );

        // 5. Duty on the FOB base.
        let duty_line = evaluate_duty(&working_rate, input, fob_value)?;
        if let DutyComputability::MissingDimension { unit } = duty_line.computability {
            return Err(LandedCostError::NotComputable {
                code: hs.code.clone(),
                reason: format!(
                    "The rate is levied per {unit} but the shipment does not declare \
                     a {unit} quantity"
                ),
            });
        }
        let duty_amount = duty_line.item.amount;
        trace.record(
            "duty",
            format!(
                "Duty R{} — {}",
                duty_amount,
                duty_line.item.rate_applied.as_deref().unwrap_or("n/a")
            ),
        );

        // 6. Import VAT on (FOB, duty).
        let vat_line = calculate_vat(fob_value, duty_amount);
        let vat_amount = vat_line.amount;
        trace.record("vat", format!("Import VAT R{} on ATV basis", vat_amount));

        // 7. Ancillary estimate on CIF.
        let ancillary = estimate_ancillary(cif_value);
        trace.record(
            "ancillary",
            format!("Ancillary estimate R{} across {} items", ancillary.total, ancillary.items.len()),
        );

        // 8. Aggregate in fixed order.
        let mut breakdown = vec![CalcLineItem::new(
            "customs_value",
            "Customs value (FOB)",
            product_value,
        )];
        if freight_insurance > Decimal::ZERO {
            breakdown.push(CalcLineItem::new(
                "freight",
                "Freight, insurance & landing charges",
                freight_insurance,
            ));
        }
        breakdown.push(duty_line.item.clone());
        breakdown.push(vat_line);
        breakdown.extend(ancillary.items.clone());

        let landed_cost_total = cif_value + duty_amount + vat_amount + ancillary.total;
        trace.record(
            "total",
            format!(
                "Landed cost R{} = CIF R{} + duty R{} + VAT R{} + ancillary R{}",
                landed_cost_total, cif_value, duty_amount, vat_amount, ancillary.total
            ),
        );

        // 9. Registered vendors can reclaim import VAT.
        let landed_cost_ex_vat = (input.importer_type == ImporterType::VatRegistered)
            .then(|| landed_cost_total - vat_amount);

        // Preference decision against the base (pre-override) MFN rate.
        let preference = input.origin_country.as_deref().map(|origin| {
            resolve_preference(
                &self.reference,
                &hs.code,
                origin,
                base_rule.rate.ad_valorem_fraction(),
            )
        });
        let mfn_fallback_used = preference.is_some()
            && base_rule.rate.ad_valorem_fraction().is_none();
        if mfn_fallback_used {
            warnings.push(
                "MFN benchmark taken from the chapter-level fallback table; the base \
                 rate has no ad valorem equivalent"
                    .into(),
            );
        }
        if override_agreement.is_some() {
            warnings.push(format!(
                "Duty computed under the {} preferential rate; proof of origin is required",
                override_agreement.as_deref().unwrap_or_default()
            ));
        }

        // Compliance screening plus static advisory notes.
        let risk_assessment = assess_risks(
            &self.reference,
            &RiskInput {
                hs_code: hs.code.clone(),
                origin_iso: input.origin_country.clone(),
                used_goods: input.used_goods,
                importer_type: Some(input.importer_type),
            },
        );
        let risk_notes = derive_risk_notes(&hs.code, cif_value, input.used_goods);

        let per_unit_cost = input
            .quantity
            .filter(|q| *q >= 1)
            .map(|q| (landed_cost_total / Decimal::from(q)).round_dp(2));

        let confidence = if mfn_fallback_used {
            Confidence::Low
        } else if warnings.is_empty() {
            Confidence::High
        } else {
            Confidence::Medium
        };

        let output = CalcOutput {
            landed_cost_total,
            landed_cost_ex_vat,
            currency: "ZAR".into(),
            breakdown,
            tariff_version: version.clone(),
            confidence,
            audit_trace: trace,
            per_unit_cost,
            preference,
            risk_assessment: Some(risk_assessment),
            risk_notes,
            warnings,
        };

        // 10. Fire-and-forget persistence. Never let a history outage fail
        // the calculation the user is waiting on.
        if let Some(ref history) = self.history {
            let record = CalcRunRecord {
                user_id: None,
                tariff_version_id: version.id.clone(),
                label: run_label.map(str::to_string),
                inputs: serde_json::to_value(input).unwrap_or_default(),
                outputs: serde_json::to_value(&output).unwrap_or_default(),
                confidence: output.confidence,
                recorded_at: Utc::now(),
            };
            if let Err(e) = history.record_run(&record) {
                tracing::warn!(error = %e, "run history write failed; returning result anyway");
            }
        }

        Ok(output)
    }
}

/// Static advisory notes from chapter heuristics and a high-value flag.
/// Coarser than the compliance matcher; both are surfaced.
fn derive_risk_notes(hs_code: &str, cif_value: Money, used_goods: bool) -> Vec<String> {
    let mut notes = Vec::new();
    let chapter = &hs_code[..hs_code.len().min(2)];
    match chapter {
        "22" => notes.push("Alcoholic beverages attract excise duty on top of customs duty".into()),
        "24" => notes.push("Tobacco products attract excise duty and strict marking rules".into()),
        "30" => notes.push("Medicaments are subject to SAHPRA import control".into()),
        "71" => notes.push("Precious goods require SARS registration and are inspection-prone".into()),
        "87" => notes.push("Vehicles require NRCS homologation before registration".into()),
        _ => {}
    }
    if used_goods {
        notes.push("Used goods require an ITAC import permit issued before shipment".into());
    }
    if cif_value > HIGH_VALUE_THRESHOLD {
        notes.push("High declared value (> R500,000): inspection probability increased".into());
    }
    notes
}
