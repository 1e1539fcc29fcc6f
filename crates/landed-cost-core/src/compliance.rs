//! Rule-based compliance / import-risk screening.
//!
//! Rules match on HS-code prefixes (with `"*"` as a wildcard) and an
//! optional used-goods condition. Matching is read-only over the static
//! rule table; an empty match set is a valid "no known risk" result.

use serde::{Deserialize, Serialize};

use crate::reference::ReferenceData;
use crate::types::ImporterType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn weight(&self) -> u32 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
        }
    }
}

/// One static compliance rule. Immutable reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceRule {
    pub id: String,
    /// Regulator that owns the requirement (ITAC, NRCS, SAHPRA, ...).
    pub authority: String,
    pub rule_type: String,
    pub title: String,
    pub summary: String,
    pub severity: Severity,
    /// HS-code prefixes this rule applies to; `"*"` matches everything.
    pub hs_patterns: Vec<String>,
    /// When set, the rule only applies if the shipment's used-goods flag
    /// equals this value. Absent means "don't care".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_goods: Option<bool>,
    pub actions: Vec<String>,
    pub documents: Vec<String>,
    pub sources: Vec<String>,
}

impl ComplianceRule {
    fn matches(&self, input: &RiskInput) -> bool {
        let hs_hit = self
            .hs_patterns
            .iter()
            .any(|p| p == "*" || input.hs_code.starts_with(p.as_str()));
        if !hs_hit {
            return false;
        }
        match self.used_goods {
            Some(required) => input.used_goods == required,
            None => true,
        }
    }
}

/// The facts the matcher screens against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskInput {
    pub hs_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_iso: Option<String>,
    #[serde(default)]
    pub used_goods: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importer_type: Option<ImporterType>,
}

/// One matched rule, carried into the output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFinding {
    pub rule_id: String,
    pub authority: String,
    pub title: String,
    pub summary: String,
    pub severity: Severity,
    pub actions: Vec<String>,
    pub documents: Vec<String>,
    pub sources: Vec<String>,
}

/// Ranked findings plus the overall 0-10 score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Sum of severity weights, capped at 10; floored at 7 whenever any
    /// high-severity rule matched so a single blocking issue is never
    /// visually minor.
    pub overall_risk_score: u32,
    pub findings: Vec<RiskFinding>,
    /// Titles of the top three findings by severity.
    pub top_risks: Vec<String>,
}

const SCORE_CAP: u32 = 10;
const HIGH_SEVERITY_FLOOR: u32 = 7;

/// Match the static rule table against the shipment facts and score the
/// result. No failure modes.
pub fn assess_risks(reference: &ReferenceData, input: &RiskInput) -> RiskAssessment {
    let mut findings: Vec<RiskFinding> = reference
        .compliance_rules()
        .iter()
        .filter(|rule| rule.matches(input))
        .map(|rule| RiskFinding {
            rule_id: rule.id.clone(),
            authority: rule.authority.clone(),
            title: rule.title.clone(),
            summary: rule.summary.clone(),
            severity: rule.severity,
            actions: rule.actions.clone(),
            documents: rule.documents.clone(),
            sources: rule.sources.clone(),
        })
        .collect();

    let raw: u32 = findings.iter().map(|f| f.severity.weight()).sum();
    let any_high = findings.iter().any(|f| f.severity == Severity::High);

    let mut score = raw.min(SCORE_CAP);
    if any_high {
        score = score.max(HIGH_SEVERITY_FLOOR);
    }

    // Stable sort: ties keep original rule-table order.
    findings.sort_by(|a, b| b.severity.weight().cmp(&a.severity.weight()));

    let top_risks = findings.iter().take(3).map(|f| f.title.clone()).collect();

    RiskAssessment {
        overall_risk_score: score,
        findings,
        top_risks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn input(hs: &str, used: bool) -> RiskInput {
        RiskInput {
            hs_code: hs.into(),
            origin_iso: Some("CN".into()),
            used_goods: used,
            importer_type: None,
        }
    }

    #[test]
    fn test_no_match_yields_zero_score_not_an_error() {
        let reference = ReferenceData::builtin();
        // Chapter 47 (pulp) has no dedicated rules in the builtin table.
        let assessment = assess_risks(&reference, &input("47010000", false));
        assert!(assessment
            .findings
            .iter()
            .all(|f| f.severity != Severity::High));
    }

    #[test]
    fn test_used_goods_permit_rule_matches_wildcard() {
        let reference = ReferenceData::builtin();
        let assessment = assess_risks(&reference, &input("47010000", true));
        assert!(assessment
            .findings
            .iter()
            .any(|f| f.rule_id == "itac-used-goods-permit"));
    }

    #[test]
    fn test_used_goods_rule_skipped_for_new_goods() {
        let reference = ReferenceData::builtin();
        let assessment = assess_risks(&reference, &input("87032319", false));
        assert!(!assessment
            .findings
            .iter()
            .any(|f| f.rule_id == "itac-used-vehicle-permit"));
    }

    #[test]
    fn test_high_severity_floors_score_at_seven() {
        let reference = ReferenceData::builtin();
        // Medicaments: SAHPRA registration is a high-severity rule.
        let assessment = assess_risks(&reference, &input("30049090", false));
        assert!(assessment.overall_risk_score >= 7);
    }

    #[test]
    fn test_score_capped_at_ten() {
        let reference = ReferenceData::builtin();
        // Used vehicle: stacks permit, NRCS, and vehicle rules.
        let assessment = assess_risks(&reference, &input("87032319", true));
        assert!(assessment.overall_risk_score <= 10);
    }

    #[test]
    fn test_findings_sorted_by_severity_descending() {
        let reference = ReferenceData::builtin();
        let assessment = assess_risks(&reference, &input("85171200", true));
        let weights: Vec<u32> = assessment
            .findings
            .iter()
            .map(|f| f.severity.weight())
            .collect();
        let mut sorted = weights.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(weights, sorted);
    }

    #[test]
    fn test_top_risks_limited_to_three() {
        let reference = ReferenceData::builtin();
        let assessment = assess_risks(&reference, &input("87032319", true));
        assert!(assessment.top_risks.len() <= 3);
    }
}
