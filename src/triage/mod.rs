//! Multimodal triage core.
//!
//! Symptom text and a skin photo are turned into independent signals, fused
//! by the configured [`policy::RiskPolicy`] into a score and urgency tier,
//! compared against an optional prior case, and persisted as a [`Case`].
//!
//! Everything here is deterministic. The only external collaborator is the
//! explanation provider, which can decorate a report but never change it.
//!
//! [`Case`]: crate::models::Case

pub mod engine;
pub mod error;
pub mod followup;
pub mod guidance;
pub mod history;
pub mod image;
pub mod policy;
pub mod symptoms;

pub use engine::{TriageEngine, TriageReport, TriageRequest};
pub use error::TriageError;
pub use history::PatientHistory;
