//! Patient-history risk modifier.

use serde::{Deserialize, Serialize};

const DIABETES_WEIGHT: f64 = 0.3;
const IMMUNOCOMPROMISED_WEIGHT: f64 = 0.4;
const PREVIOUS_INFECTION_WEIGHT: f64 = 0.2;
const MODIFIER_CAP: f64 = 1.0;

/// Structured history flags. Absent record ≡ all flags false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientHistory {
    #[serde(default)]
    pub diabetes: bool,
    #[serde(default)]
    pub immunocompromised: bool,
    #[serde(default)]
    pub previous_infection: bool,
}

/// Clamped modifier plus one note per contributing flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistorySignal {
    pub modifier: f64,
    pub notes: Vec<&'static str>,
}

pub fn history_modifier(history: Option<&PatientHistory>) -> HistorySignal {
    let Some(history) = history else {
        return HistorySignal::default();
    };

    let flags = [
        (
            history.diabetes,
            DIABETES_WEIGHT,
            "Diabetes history raises infection risk.",
        ),
        (
            history.immunocompromised,
            IMMUNOCOMPROMISED_WEIGHT,
            "Immunocompromised status raises infection risk.",
        ),
        (
            history.previous_infection,
            PREVIOUS_INFECTION_WEIGHT,
            "Previous related infection reported.",
        ),
    ];

    let mut total = 0.0;
    let mut notes = Vec::new();
    for (set, weight, note) in flags {
        if set {
            total += weight;
            notes.push(note);
        }
    }

    HistorySignal {
        modifier: total.min(MODIFIER_CAP),
        notes,
    }
}
