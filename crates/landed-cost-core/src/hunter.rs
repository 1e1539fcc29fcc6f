//! The smart rate hunter: re-run the full landed-cost calculation for a
//! fixed panel of strategy origins in parallel and rank the alternatives.
//!
//! Settle-all semantics throughout: each candidate thread owns its cloned
//! input and engine handle, a failed or slow candidate is dropped, and the
//! hunter never returns an error — total failure yields an empty list and
//! a "best rate" insight. It must never prevent the primary calculation
//! from being shown.

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::engine::{CalcOutput, LandedCostEngine};
use crate::preference::PreferenceStatus;
use crate::types::{Money, Rate, ShipmentInput};

/// Sourcing origins the hunter evaluates as alternatives.
pub const STRATEGY_ORIGINS: [&str; 9] =
    ["CN", "DE", "IN", "US", "VN", "TR", "BW", "MU", "EG"];

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const HIGH_FRICTION_RISK: u32 = 7;
const MEDIUM_FRICTION_RISK: u32 = 4;

/// Extra compliance / documentation burden of switching to an origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrictionLevel {
    Low,
    Medium,
    High,
}

/// One surviving candidate origin with its cost delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginAlternative {
    pub origin: String,
    pub landed_cost_total: Money,
    /// Base total minus this candidate's total; positive means cheaper.
    pub savings: Money,
    pub savings_pct: Rate,
    pub friction: FrictionLevel,
    pub preference_applies: bool,
    pub risk_score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    /// The current origin already offers the best available rate.
    BestRate,
    /// A cheaper origin was found.
    SavingsFound,
}

/// The single human-facing takeaway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateHuntInsight {
    pub kind: InsightKind,
    pub headline: String,
    pub current_total: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_total: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartRateResult {
    /// Ranked by savings, descending.
    pub alternatives: Vec<OriginAlternative>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_alternative: Option<OriginAlternative>,
    pub insight: RateHuntInsight,
}

/// Fan-out runner over the strategy panel.
pub struct RateHunter {
    engine: LandedCostEngine,
    timeout: Duration,
}

impl RateHunter {
    pub fn new(engine: LandedCostEngine) -> Self {
        RateHunter {
            engine,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overall wall-clock bound on the fan-out, so one slow lookup cannot
    /// hang the hunter. Stragglers are dropped, not cancelled.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the full calculation for every panel origin other than the
    /// current one and rank the survivors.
    pub fn find_better_origins(
        &self,
        base_input: &ShipmentInput,
        base: &CalcOutput,
    ) -> SmartRateResult {
        let current = base_input
            .origin_country
            .as_deref()
            .unwrap_or_default()
            .to_uppercase();
        let candidates: Vec<String> = STRATEGY_ORIGINS
            .iter()
            .filter(|o| **o != current)
            .map(|o| o.to_string())
            .collect();

        let (tx, rx) = mpsc::channel();
        for origin in candidates.iter().cloned() {
            let engine = self.engine.clone();
            let mut input = base_input.clone();
            input.origin_country = Some(origin.clone());
            let tx = tx.clone();
            thread::spawn(move || {
                let result = engine.calculate(&input, None);
                // The receiver may have hit its deadline and gone away.
                let _ = tx.send((origin, result));
            });
        }
        drop(tx);

        let deadline = Instant::now() + self.timeout;
        let mut alternatives: Vec<OriginAlternative> = Vec::new();
        for _ in 0..candidates.len() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((origin, Ok(output))) => {
                    alternatives.push(build_alternative(origin, &output, base));
                }
                Ok((origin, Err(e))) => {
                    tracing::debug!(origin = %origin, error = %e, "candidate origin dropped");
                }
                Err(_) => {
                    tracing::debug!("rate hunt deadline reached; dropping stragglers");
                    break;
                }
            }
        }

        alternatives.sort_by(|a, b| b.savings.cmp(&a.savings));

        let positives: Vec<&OriginAlternative> = alternatives
            .iter()
            .filter(|a| a.savings > Decimal::ZERO)
            .collect();
        let best_alternative = positives
            .iter()
            .find(|a| a.friction != FrictionLevel::High)
            .or_else(|| positives.first())
            .map(|a| (*a).clone());

        let insight = match &best_alternative {
            Some(best) => RateHuntInsight {
                kind: InsightKind::SavingsFound,
                headline: format!(
                    "Sourcing from {} could save R{} ({}%) on this shipment",
                    best.origin,
                    best.savings,
                    (best.savings_pct * Decimal::ONE_HUNDRED).round_dp(1)
                ),
                current_total: base.landed_cost_total,
                best_origin: Some(best.origin.clone()),
                best_total: Some(best.landed_cost_total),
                savings: Some(best.savings),
            },
            None => RateHuntInsight {
                kind: InsightKind::BestRate,
                headline: "Your current origin already offers the best available rate".into(),
                current_total: base.landed_cost_total,
                best_origin: None,
                best_total: None,
                savings: None,
            },
        };

        SmartRateResult {
            alternatives,
            best_alternative,
            insight,
        }
    }
}

fn build_alternative(
    origin: String,
    output: &CalcOutput,
    base: &CalcOutput,
) -> OriginAlternative {
    let savings = base.landed_cost_total - output.landed_cost_total;
    let savings_pct = if base.landed_cost_total > Decimal::ZERO {
        (savings / base.landed_cost_total).round_dp(4)
    } else {
        Decimal::ZERO
    };

    let risk_score = output
        .risk_assessment
        .as_ref()
        .map(|r| r.overall_risk_score)
        .unwrap_or(0);
    let preference_applies = output
        .preference
        .as_ref()
        .map(|p| p.status == PreferenceStatus::Eligible)
        .unwrap_or(false);
    let needs_proof_documents = output
        .preference
        .as_ref()
        .and_then(|p| p.best_option.as_ref())
        .map(|o| !o.required_documents.is_empty())
        .unwrap_or(false);

    let friction = if risk_score >= HIGH_FRICTION_RISK {
        FrictionLevel::High
    } else if (preference_applies && needs_proof_documents)
        || risk_score >= MEDIUM_FRICTION_RISK
    {
        FrictionLevel::Medium
    } else {
        FrictionLevel::Low
    };

    OriginAlternative {
        origin,
        landed_cost_total: output.landed_cost_total,
        savings,
        savings_pct,
        friction,
        preference_applies,
        risk_score,
    }
}
