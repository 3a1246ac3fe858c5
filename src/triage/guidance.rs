//! Fixed per-tier guidance text.
//!
//! Nothing here is computed from the request: the tier alone selects the
//! lists, so two cases in the same tier always receive identical guidance.

use crate::models::UrgencyTier;

/// Override shown whenever the tier is Emergency, regardless of confidence.
pub const EMERGENCY_ACTION: &str = "SEEK IMMEDIATE MEDICAL CARE. CALL EMERGENCY SERVICES.";

/// Always present on every report.
pub const DISCLAIMER: &str = "This is not a medical diagnosis. Seek professional medical advice.";

pub fn recommendations(tier: UrgencyTier) -> &'static [&'static str] {
    match tier {
        UrgencyTier::SelfCare => &[
            "Monitor symptoms.",
            "Apply basic skin care.",
            "Seek care if symptoms worsen.",
        ],
        UrgencyTier::Monitor => &[
            "Schedule outpatient consultation.",
            "Monitor temperature and spread.",
        ],
        UrgencyTier::Urgent => &[
            "Seek medical evaluation within 24 hours.",
            "Avoid self-medication.",
            "Monitor for systemic symptoms.",
        ],
        UrgencyTier::Emergency => &[
            "Seek immediate emergency care.",
            "Go to nearest hospital.",
            "Do not delay treatment.",
        ],
    }
}

/// Signs that should prompt escalation beyond the current tier.
pub fn warning_signs(tier: UrgencyTier) -> &'static [&'static str] {
    match tier {
        UrgencyTier::SelfCare | UrgencyTier::Monitor => &[
            "Rapid spreading redness",
            "High fever",
            "Severe pain",
            "Difficulty breathing",
        ],
        UrgencyTier::Urgent => &[
            "Red streaks extending from the area",
            "High fever or chills",
            "Severe or worsening pain",
            "Difficulty breathing",
        ],
        UrgencyTier::Emergency => &[
            "Difficulty breathing or swallowing",
            "Swelling of the face, lips or tongue",
            "Confusion or fainting",
            "Rapidly spreading redness with fever",
        ],
    }
}

pub fn emergency_action(tier: UrgencyTier) -> Option<&'static str> {
    (tier == UrgencyTier::Emergency).then_some(EMERGENCY_ACTION)
}
