use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{RiskPolicyKind, UrgencyTier};

/// A persisted triage case. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub id: i64,
    pub symptoms: String,
    /// Canonical redness ratio of the uploaded image.
    pub image_redness_score: Option<f64>,
    pub prediction: String,
    pub confidence: f64,
    pub urgency: UrgencyTier,
    pub risk_score: RiskScore,
    pub clinical_reasoning: Vec<String>,
    /// Earlier case this one follows up on.
    pub follow_up_of: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to insert a case; the store assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewCase {
    pub symptoms: String,
    pub image_redness_score: Option<f64>,
    pub prediction: String,
    pub confidence: f64,
    pub urgency: UrgencyTier,
    pub risk_score: RiskScore,
    pub clinical_reasoning: Vec<String>,
    pub follow_up_of: Option<i64>,
}

/// Policy-dependent risk score: integer points or a normalized fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RiskScore {
    Points(u32),
    Normalized(f64),
}

impl RiskScore {
    pub fn policy(&self) -> RiskPolicyKind {
        match self {
            Self::Points(_) => RiskPolicyKind::Additive,
            Self::Normalized(_) => RiskPolicyKind::Weighted,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Points(p) => f64::from(*p),
            Self::Normalized(v) => *v,
        }
    }

    /// Rebuild a score from its stored column pair.
    pub fn from_stored(policy: RiskPolicyKind, value: f64) -> Self {
        match policy {
            RiskPolicyKind::Additive => Self::Points(value.max(0.0).round() as u32),
            RiskPolicyKind::Weighted => Self::Normalized(value),
        }
    }
}
