//! Risk aggregation and tier classification.
//!
//! Two scoring strategies behind one [`RiskPolicy`] seam, selected once at
//! startup and never blended:
//!
//! | Policy   | Score            | Tier cut points              | Confidence        |
//! |----------|------------------|------------------------------|-------------------|
//! | Additive | integer points   | ≥7 / ≥4 / ≥2 / else          | fixed per tier    |
//! | Weighted | fraction [0, 1]  | <0.30 / <0.55 / <0.75 / else | the score itself  |
//!
//! Both step functions are total and order-preserving: a higher score never
//! lands in a less severe tier.

use serde::Serialize;

use super::history::HistorySignal;
use super::symptoms::SymptomSignals;
use crate::models::{RiskPolicyKind, RiskScore, UrgencyTier};

/// Extracted signals for one request, as consumed by a policy.
#[derive(Debug, Clone, Copy)]
pub struct RiskInputs<'a> {
    /// Canonical image redness ratio in [0, 1].
    pub redness_ratio: f64,
    pub symptoms: &'a SymptomSignals,
    pub history: &'a HistorySignal,
}

/// Weighted-policy component breakdown, reported alongside the score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClinicalFactors {
    pub visual_score: f64,
    pub systemic_score: f64,
    pub local_score: f64,
    pub history_score: f64,
    pub final_risk_score: f64,
}

/// Deterministic outcome of a policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub policy: RiskPolicyKind,
    pub score: RiskScore,
    pub tier: UrgencyTier,
    pub confidence: f64,
    pub primary_condition: &'static str,
    /// One note per contributing signal, in a fixed order.
    pub reasoning: Vec<String>,
    /// Present for the weighted policy only.
    pub clinical_factors: Option<ClinicalFactors>,
}

/// Scoring strategy seam.
pub trait RiskPolicy: Send + Sync {
    fn kind(&self) -> RiskPolicyKind;

    /// Pure and total over validated inputs.
    fn assess(&self, inputs: &RiskInputs<'_>) -> RiskAssessment;
}

/// Build the configured policy.
pub fn policy_for(kind: RiskPolicyKind) -> Box<dyn RiskPolicy> {
    match kind {
        RiskPolicyKind::Additive => Box::new(AdditivePolicy),
        RiskPolicyKind::Weighted => Box::new(WeightedPolicy),
    }
}

// ═══════════════════════════════════════════════════════════
// Additive integer policy
// ═══════════════════════════════════════════════════════════

/// Integer points: symptom category weights plus an image-redness band.
/// History carries no weight here.
pub struct AdditivePolicy;

/// (ratio strictly above, points, note), most severe first.
const REDNESS_BANDS: [(f64, u32, &str); 3] = [
    (0.40, 3, "Severe redness intensity detected in image."),
    (0.25, 2, "Moderate redness intensity detected in image."),
    (0.10, 1, "Mild redness detected in image."),
];

/// Points and note for the band the ratio falls in, if any.
pub fn redness_band(ratio: f64) -> Option<(u32, &'static str)> {
    REDNESS_BANDS
        .iter()
        .find(|(threshold, _, _)| ratio > *threshold)
        .map(|(_, points, note)| (*points, *note))
}

/// Tier, confidence, and condition label for an additive score.
pub fn classify_points(points: u32) -> (UrgencyTier, f64, &'static str) {
    if points >= 7 {
        (
            UrgencyTier::Emergency,
            0.93,
            "Severe Allergic Reaction or Serious Infection",
        )
    } else if points >= 4 {
        (UrgencyTier::Urgent, 0.86, "Possible Skin Infection")
    } else if points >= 2 {
        (UrgencyTier::Monitor, 0.76, "Mild Dermatologic Condition")
    } else {
        (UrgencyTier::SelfCare, 0.66, "Low Risk Condition")
    }
}

impl RiskPolicy for AdditivePolicy {
    fn kind(&self) -> RiskPolicyKind {
        RiskPolicyKind::Additive
    }

    fn assess(&self, inputs: &RiskInputs<'_>) -> RiskAssessment {
        let mut points = inputs.symptoms.additive_points();
        let mut reasoning: Vec<String> = inputs
            .symptoms
            .findings
            .iter()
            .map(|f| f.note.to_string())
            .collect();

        if let Some((band_points, note)) = redness_band(inputs.redness_ratio) {
            points += band_points;
            reasoning.push(note.to_string());
        }

        let (tier, confidence, primary_condition) = classify_points(points);

        RiskAssessment {
            policy: RiskPolicyKind::Additive,
            score: RiskScore::Points(points),
            tier,
            confidence,
            primary_condition,
            reasoning,
            clinical_factors: None,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Weighted normalized policy
// ═══════════════════════════════════════════════════════════

/// Convex combination of four component scores, each in [0, 1].
pub struct WeightedPolicy;

const VISUAL_WEIGHT: f64 = 0.35;
const SYSTEMIC_WEIGHT: f64 = 0.30;
const LOCAL_WEIGHT: f64 = 0.20;
const HISTORY_WEIGHT: f64 = 0.15;

/// Each keyword hit adds this to its component, capped at 1.0.
const KEYWORD_STEP: f64 = 0.25;

/// Tier for a normalized score.
pub fn classify_normalized(score: f64) -> UrgencyTier {
    if score < 0.30 {
        UrgencyTier::SelfCare
    } else if score < 0.55 {
        UrgencyTier::Monitor
    } else if score < 0.75 {
        UrgencyTier::Urgent
    } else {
        UrgencyTier::Emergency
    }
}

fn weighted_condition(score: f64, visual: f64) -> &'static str {
    if score > 0.65 {
        "Possible Skin Infection"
    } else if visual > 0.4 {
        "Inflammatory Dermatitis"
    } else {
        "Mild Dermatological Condition"
    }
}

fn keyword_score(hits: usize) -> f64 {
    (hits as f64 * KEYWORD_STEP).min(1.0)
}

impl RiskPolicy for WeightedPolicy {
    fn kind(&self) -> RiskPolicyKind {
        RiskPolicyKind::Weighted
    }

    fn assess(&self, inputs: &RiskInputs<'_>) -> RiskAssessment {
        let visual = (inputs.redness_ratio * 2.0).clamp(0.0, 1.0);
        let systemic = keyword_score(inputs.symptoms.systemic_hits.len());
        let local = keyword_score(inputs.symptoms.local_hits.len());
        let history = inputs.history.modifier.clamp(0.0, 1.0);

        let raw = VISUAL_WEIGHT * visual
            + SYSTEMIC_WEIGHT * systemic
            + LOCAL_WEIGHT * local
            + HISTORY_WEIGHT * history;
        // Classify on the reported value so score and tier never disagree.
        let score = round2(raw.clamp(0.0, 1.0));

        let mut reasoning = Vec::new();
        if visual > 0.0 {
            reasoning.push(format!(
                "Visible redness covers {:.1}% of the image.",
                inputs.redness_ratio * 100.0
            ));
        }
        for keyword in &inputs.symptoms.systemic_hits {
            reasoning.push(format!("Systemic symptom reported: {keyword}."));
        }
        for keyword in &inputs.symptoms.local_hits {
            reasoning.push(format!("Local severity sign reported: {keyword}."));
        }
        reasoning.extend(inputs.history.notes.iter().map(|n| n.to_string()));

        RiskAssessment {
            policy: RiskPolicyKind::Weighted,
            score: RiskScore::Normalized(score),
            tier: classify_normalized(score),
            confidence: score,
            primary_condition: weighted_condition(score, visual),
            reasoning,
            clinical_factors: Some(ClinicalFactors {
                visual_score: round2(visual),
                systemic_score: round2(systemic),
                local_score: round2(local),
                history_score: round2(history),
                final_risk_score: score,
            }),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
