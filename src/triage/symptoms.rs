//! Symptom signal extraction from free-text complaints.
//!
//! Two independent readings of the same lower-cased text:
//! - **Categories** — regex patterns on word boundaries, scanned in fixed
//!   definition order. Each match contributes one weight and one note.
//! - **Keyword density** — plain substring hits against the systemic and
//!   local keyword lists, consumed by the weighted policy.
//!
//! No match is a valid outcome: the result is simply empty.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::TriageError;

/// Trimmed symptom text shorter than this is rejected.
pub const MIN_SYMPTOM_CHARS: usize = 5;

/// Trimmed symptom text longer than this is rejected.
pub const MAX_SYMPTOM_CHARS: usize = 2000;

/// Systemic-involvement keywords (weighted policy).
pub const SYSTEMIC_KEYWORDS: &[&str] = &["fever", "chills", "fatigue", "body ache"];

/// Local-severity keywords (weighted policy).
pub const LOCAL_KEYWORDS: &[&str] = &["pain", "swelling", "pus", "warm", "spreading"];

/// Clinical keyword category. Declaration order is scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SymptomCategory {
    Fever,
    Redness,
    Swelling,
    Pain,
    Airway,
    Rash,
}

impl SymptomCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fever => "fever",
            Self::Redness => "redness",
            Self::Swelling => "swelling",
            Self::Pain => "pain",
            Self::Airway => "airway",
            Self::Rash => "rash",
        }
    }
}

/// One matched category with its additive weight and reasoning note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymptomFinding {
    pub category: SymptomCategory,
    pub points: u32,
    pub note: &'static str,
}

/// Everything the policies need from the symptom text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SymptomSignals {
    /// Matched categories in definition order.
    pub findings: Vec<SymptomFinding>,
    /// Systemic keywords present in the text.
    pub systemic_hits: Vec<&'static str>,
    /// Local-severity keywords present in the text.
    pub local_hits: Vec<&'static str>,
}

impl SymptomSignals {
    pub fn additive_points(&self) -> u32 {
        self.findings.iter().map(|f| f.points).sum()
    }

    pub fn categories(&self) -> Vec<SymptomCategory> {
        self.findings.iter().map(|f| f.category).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty() && self.systemic_hits.is_empty() && self.local_hits.is_empty()
    }
}

struct CategoryPattern {
    regex: Regex,
    category: SymptomCategory,
    points: u32,
    note: &'static str,
}

static CATEGORY_PATTERNS: LazyLock<Vec<CategoryPattern>> = LazyLock::new(|| {
    vec![
        pattern(
            r"\bfever\b",
            SymptomCategory::Fever,
            2,
            "Fever detected — systemic involvement possible.",
        ),
        pattern(
            r"\b(?:red|redness)\b",
            SymptomCategory::Redness,
            2,
            "Redness reported — inflammatory response suspected.",
        ),
        pattern(
            r"\bswelling\b",
            SymptomCategory::Swelling,
            2,
            "Swelling detected — possible allergic reaction.",
        ),
        pattern(
            r"\b(?:pain|tender)\b",
            SymptomCategory::Pain,
            1,
            "Pain suggests active inflammatory condition.",
        ),
        pattern(
            r"\b(?:breath|breathing|choking)\b",
            SymptomCategory::Airway,
            4,
            "Airway involvement suspected — high severity.",
        ),
        pattern(
            r"\brash\b",
            SymptomCategory::Rash,
            1,
            "Rash described — dermatologic involvement likely.",
        ),
    ]
});

fn pattern(
    regex_str: &str,
    category: SymptomCategory,
    points: u32,
    note: &'static str,
) -> CategoryPattern {
    CategoryPattern {
        regex: Regex::new(regex_str).expect("Invalid symptom regex pattern"),
        category,
        points,
        note,
    }
}

/// Trim and bound-check symptom text. Length counts characters, not bytes.
pub fn validate_symptoms(raw: &str) -> Result<&str, TriageError> {
    let trimmed = raw.trim();
    let chars = trimmed.chars().count();

    if chars < MIN_SYMPTOM_CHARS {
        return Err(TriageError::SymptomsTooShort {
            chars,
            min: MIN_SYMPTOM_CHARS,
        });
    }
    if chars > MAX_SYMPTOM_CHARS {
        return Err(TriageError::SymptomsTooLong {
            chars,
            max: MAX_SYMPTOM_CHARS,
        });
    }
    Ok(trimmed)
}

/// Scan symptom text for category matches and keyword density.
pub fn extract_symptom_signals(text: &str) -> SymptomSignals {
    let lower = text.to_lowercase();

    let findings = CATEGORY_PATTERNS
        .iter()
        .filter(|p| p.regex.is_match(&lower))
        .map(|p| SymptomFinding {
            category: p.category,
            points: p.points,
            note: p.note,
        })
        .collect();

    SymptomSignals {
        findings,
        systemic_hits: keyword_hits(&lower, SYSTEMIC_KEYWORDS),
        local_hits: keyword_hits(&lower, LOCAL_KEYWORDS),
    }
}

fn keyword_hits(lower: &str, keywords: &[&'static str]) -> Vec<&'static str> {
    keywords
        .iter()
        .copied()
        .filter(|k| lower.contains(k))
        .collect()
}
