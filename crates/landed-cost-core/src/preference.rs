//! Trade-preference resolution: match an origin country to the agreements
//! covering it, look up preferential duty lines, and pick the best rate
//! against the MFN benchmark.
//!
//! Read-only against the static reference tables. "Not found" is a normal
//! outcome modeled as a `not_eligible` decision, never an error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::reference::ReferenceData;
use crate::types::Rate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceStatus {
    Eligible,
    NotEligible,
}

/// One claimable preference under one agreement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceOption {
    pub agreement_code: String,
    pub agreement_name: String,
    /// Preferential ad valorem rate as a fraction (0.048 = 4.8%).
    pub rate: Rate,
    /// Duty-rate points saved versus MFN, floored at zero.
    pub savings_pct: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules_of_origin: Option<String>,
    pub required_documents: Vec<String>,
    pub sources: Vec<String>,
}

/// Outcome of preference resolution for one (HS code, origin) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceDecision {
    pub status: PreferenceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// MFN benchmark the savings are measured against.
    pub mfn_rate: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_option: Option<PreferenceOption>,
    pub options: Vec<PreferenceOption>,
}

impl PreferenceDecision {
    fn not_eligible(reason: &str, mfn_rate: Rate) -> Self {
        PreferenceDecision {
            status: PreferenceStatus::NotEligible,
            reason: Some(reason.to_string()),
            mfn_rate,
            best_option: None,
            options: Vec::new(),
        }
    }
}

/// Resolve the best preferential rate for an HS code and origin country.
///
/// `mfn_rate` is the general rate as a fraction; when the caller cannot
/// supply one (purely specific base rates), the chapter-level fallback
/// table is consulted, defaulting to zero savings headroom.
pub fn resolve_preference(
    reference: &ReferenceData,
    hs_code: &str,
    origin_iso2: &str,
    mfn_rate: Option<Rate>,
) -> PreferenceDecision {
    let mfn = mfn_rate
        .or_else(|| reference.mfn_fallback_rate(hs_code))
        .unwrap_or(Decimal::ZERO);

    let agreements = reference.agreements_covering(origin_iso2);
    if agreements.is_empty() {
        return PreferenceDecision::not_eligible(
            &format!("No active trade agreement covers origin '{}'", origin_iso2),
            mfn,
        );
    }

    let mut options: Vec<PreferenceOption> = Vec::new();
    for agreement in &agreements {
        let Some(rate) = reference.preferential_rate(&agreement.code, hs_code) else {
            continue;
        };
        let savings = (mfn - rate).max(Decimal::ZERO);
        options.push(PreferenceOption {
            agreement_code: agreement.code.clone(),
            agreement_name: agreement.name.clone(),
            rate,
            savings_pct: savings,
            rules_of_origin: reference
                .rules_of_origin(&agreement.code, hs_code)
                .map(str::to_string),
            required_documents: agreement.proof_documents.clone(),
            sources: agreement.sources.clone(),
        });
    }

    if options.is_empty() {
        return PreferenceDecision::not_eligible(
            &format!(
                "Origin '{}' is covered by an agreement, but no preferential rate \
                 exists for HS {}",
                origin_iso2, hs_code
            ),
            mfn,
        );
    }

    // Lowest rate wins; on a tie the agreement encountered first in
    // declaration order keeps the slot (strict less-than, stable).
    let mut best = options[0].clone();
    for option in &options[1..] {
        if option.rate < best.rate {
            best = option.clone();
        }
    }

    PreferenceDecision {
        status: PreferenceStatus::Eligible,
        reason: None,
        mfn_rate: mfn,
        best_option: Some(best),
        options,
    }
}
