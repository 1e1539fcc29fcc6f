//! The store boundary: read access to versioned tariff data and the
//! best-effort run-history sink.
//!
//! The engine receives these as injected trait objects; lifecycle (open at
//! process start, close at shutdown) belongs to the host application. The
//! in-memory implementation backs tests, the CLI, and the bindings, loading
//! a serialisable [`TariffSnapshot`].

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::duty::{DutyRate, DutyRuleRecord, DutyType};
use crate::error::LandedCostError;
use crate::types::Confidence;
use crate::LandedCostResult;

/// One published, immutable tariff snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffVersion {
    pub id: String,
    pub label: String,
    pub effective_date: NaiveDate,
    pub active: bool,
}

/// An HS commodity code known to the tariff book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HsCodeRecord {
    pub code: String,
    pub description: String,
}

/// Preferential override of the general duty rule for one
/// (version, HS code, origin) triple. Replaces the base rate wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginPreference {
    pub agreement_code: String,
    pub rate: DutyRate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligibility_notes: Option<String>,
    pub required_documents: Vec<String>,
}

/// Read access to versioned tariff data.
pub trait TariffStore: Send + Sync {
    fn active_version(&self) -> Option<TariffVersion>;
    fn find_hs_code(&self, code: &str) -> Option<HsCodeRecord>;
    /// The duty rule for an HS code within a version, skipping rows whose
    /// duty type is in `exclude` (the base lookup excludes anti-dumping).
    fn find_duty_rule(
        &self,
        version_id: &str,
        hs_code: &str,
        exclude: &[DutyType],
    ) -> Option<DutyRuleRecord>;
    fn find_origin_preference(
        &self,
        version_id: &str,
        hs_code: &str,
        origin_iso2: &str,
    ) -> Option<OriginPreference>;
}

/// One persisted calculation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalcRunRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub tariff_version_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub inputs: serde_json::Value,
    pub outputs: serde_json::Value,
    pub confidence: Confidence,
    pub recorded_at: DateTime<Utc>,
}

/// Write-through run history. Failures are the caller's to swallow — a
/// history outage must never fail a calculation.
pub trait RunHistory: Send + Sync {
    fn record_run(&self, run: &CalcRunRecord) -> LandedCostResult<()>;
}

/// Serialisable snapshot of one tariff version, as produced by the
/// (out-of-scope) ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffSnapshot {
    pub version: TariffVersion,
    pub hs_codes: Vec<HsCodeRecord>,
    pub duty_rules: Vec<DutyRuleRecord>,
    #[serde(default)]
    pub preferences: Vec<SnapshotPreference>,
}

/// A preference row inside a snapshot, keyed by HS code and origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotPreference {
    pub hs_code: String,
    pub origin_iso2: String,
    pub agreement_code: String,
    pub rate: DutyRate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligibility_notes: Option<String>,
    #[serde(default)]
    pub required_documents: Vec<String>,
}

/// In-memory [`TariffStore`] over one validated snapshot.
pub struct InMemoryTariffStore {
    version: TariffVersion,
    hs_codes: HashMap<String, HsCodeRecord>,
    rules: HashMap<String, Vec<DutyRuleRecord>>,
    preferences: HashMap<(String, String), OriginPreference>,
}

impl InMemoryTariffStore {
    /// Build a store, validating every rule payload at the boundary and
    /// enforcing the one-preference-per-(HS, origin) composite key.
    pub fn from_snapshot(snapshot: TariffSnapshot) -> LandedCostResult<Self> {
        let mut hs_codes = HashMap::new();
        for hs in snapshot.hs_codes {
            hs_codes.insert(hs.code.clone(), hs);
        }

        let mut rules: HashMap<String, Vec<DutyRuleRecord>> = HashMap::new();
        for rule in snapshot.duty_rules {
            rule.validate()?;
            if !hs_codes.contains_key(&rule.hs_code) {
                return Err(LandedCostError::InvalidInput {
                    field: "duty_rules".into(),
                    reason: format!("Rule '{}' references unknown HS code {}", rule.id, rule.hs_code),
                });
            }
            rules.entry(rule.hs_code.clone()).or_default().push(rule);
        }

        let mut preferences = HashMap::new();
        for pref in snapshot.preferences {
            pref.rate.validate(&pref.hs_code)?;
            let key = (pref.hs_code.clone(), pref.origin_iso2.to_uppercase());
            let duplicate = preferences
                .insert(
                    key,
                    OriginPreference {
                        agreement_code: pref.agreement_code,
                        rate: pref.rate,
                        eligibility_notes: pref.eligibility_notes,
                        required_documents: pref.required_documents,
                    },
                )
                .is_some();
            if duplicate {
                return Err(LandedCostError::InvalidInput {
                    field: "preferences".into(),
                    reason: format!(
                        "Duplicate origin preference for HS {} / origin {}",
                        pref.hs_code, pref.origin_iso2
                    ),
                });
            }
        }

        Ok(InMemoryTariffStore {
            version: snapshot.version,
            hs_codes,
            rules,
            preferences,
        })
    }
}

impl TariffStore for InMemoryTariffStore {
    fn active_version(&self) -> Option<TariffVersion> {
        self.version.active.then(|| self.version.clone())
    }

    fn find_hs_code(&self, code: &str) -> Option<HsCodeRecord> {
        self.hs_codes.get(code).cloned()
    }

    fn find_duty_rule(
        &self,
        version_id: &str,
        hs_code: &str,
        exclude: &[DutyType],
    ) -> Option<DutyRuleRecord> {
        if version_id != self.version.id {
            return None;
        }
        self.rules
            .get(hs_code)?
            .iter()
            .find(|r| !exclude.contains(&r.duty_type))
            .cloned()
    }

    fn find_origin_preference(
        &self,
        version_id: &str,
        hs_code: &str,
        origin_iso2: &str,
    ) -> Option<OriginPreference> {
        if version_id != self.version.id {
            return None;
        }
        self.preferences
            .get(&(hs_code.to_string(), origin_iso2.to_uppercase()))
            .cloned()
    }
}

/// Run-history sink that keeps records in memory. Backs the tests and any
/// host that wants history without a database.
#[derive(Default)]
pub struct InMemoryRunHistory {
    runs: Mutex<Vec<CalcRunRecord>>,
}

impl InMemoryRunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runs(&self) -> Vec<CalcRunRecord> {
        // Records are append-only, so a poisoned guard still holds a
        // consistent list; recover it rather than panicking.
        self.runs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl RunHistory for InMemoryRunHistory {
    fn record_run(&self, run: &CalcRunRecord) -> LandedCostResult<()> {
        self.runs
            .lock()
            .map_err(|_| LandedCostError::RunHistoryError("history lock poisoned".into()))?
            .push(run.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot() -> TariffSnapshot {
        TariffSnapshot {
            version: TariffVersion {
                id: "v1".into(),
                label: "2025.1".into(),
                effective_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                active: true,
            },
            hs_codes: vec![HsCodeRecord {
                code: "64035990".into(),
                description: "Leather footwear".into(),
            }],
            duty_rules: vec![
                DutyRuleRecord {
                    id: "r-ad".into(),
                    hs_code: "64035990".into(),
                    duty_type: DutyType::AntiDumping,
                    rate: DutyRate::AdValorem { pct: dec!(60) },
                    notes: None,
                },
                DutyRuleRecord {
                    id: "r-base".into(),
                    hs_code: "64035990".into(),
                    duty_type: DutyType::AdValorem,
                    rate: DutyRate::AdValorem { pct: dec!(30) },
                    notes: None,
                },
            ],
            preferences: vec![SnapshotPreference {
                hs_code: "64035990".into(),
                origin_iso2: "DE".into(),
                agreement_code: "EU-EPA".into(),
                rate: DutyRate::AdValorem { pct: dec!(4.8) },
                eligibility_notes: None,
                required_documents: vec!["EUR.1 movement certificate".into()],
            }],
        }
    }

    #[test]
    fn test_base_lookup_skips_anti_dumping_rows() {
        let store = InMemoryTariffStore::from_snapshot(snapshot()).unwrap();
        let rule = store
            .find_duty_rule("v1", "64035990", &[DutyType::AntiDumping])
            .unwrap();
        assert_eq!(rule.id, "r-base");
    }

    #[test]
    fn test_preference_key_is_case_insensitive_on_origin() {
        let store = InMemoryTariffStore::from_snapshot(snapshot()).unwrap();
        assert!(store.find_origin_preference("v1", "64035990", "de").is_some());
    }

    #[test]
    fn test_duplicate_preference_rejected() {
        let mut snap = snapshot();
        snap.preferences.push(snap.preferences[0].clone());
        assert!(InMemoryTariffStore::from_snapshot(snap).is_err());
    }

    #[test]
    fn test_inactive_version_reports_none() {
        let mut snap = snapshot();
        snap.version.active = false;
        let store = InMemoryTariffStore::from_snapshot(snap).unwrap();
        assert!(store.active_version().is_none());
    }

    #[test]
    fn test_runs_accessor_survives_a_poisoned_lock() {
        let history = std::sync::Arc::new(InMemoryRunHistory::new());
        history
            .record_run(&CalcRunRecord {
                user_id: None,
                tariff_version_id: "v1".into(),
                label: None,
                inputs: serde_json::Value::Null,
                outputs: serde_json::Value::Null,
                confidence: Confidence::High,
                recorded_at: Utc::now(),
            })
            .unwrap();

        // Panic while holding the lock to poison it.
        let poisoner = std::sync::Arc::clone(&history);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.runs.lock().unwrap();
            panic!("poisoning the history lock");
        })
        .join();

        assert_eq!(history.runs().len(), 1);
    }

    #[test]
    fn test_rule_referencing_unknown_hs_code_rejected() {
        let mut snap = snapshot();
        snap.duty_rules.push(DutyRuleRecord {
            id: "r-orphan".into(),
            hs_code: "99999999".into(),
            duty_type: DutyType::AdValorem,
            rate: DutyRate::AdValorem { pct: dec!(10) },
            notes: None,
        });
        assert!(InMemoryTariffStore::from_snapshot(snap).is_err());
    }
}
