//! Explanation collaborator: optional prose around a deterministic result.
//!
//! The engine only ever calls [`explain_or_placeholder`]. Any failure of the
//! provider (disabled, unreachable, slow, malformed) is logged and replaced
//! by [`Explanation::placeholder`]; it never reaches the caller and never
//! changes the tier, score, or persisted case.

pub mod client;
pub mod prompt;

pub use client::ChatCompletionsExplainer;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ExplanationConfig;
use crate::models::RiskScore;

const PLACEHOLDER_SUMMARY: &str = "AI explanation unavailable.";

#[derive(Error, Debug)]
pub enum ExplanationError {
    #[error("Explanation provider not configured")]
    Disabled,

    #[error("Cannot reach explanation service at {0}")]
    Connection(String),

    #[error("Explanation request timed out after {0}s")]
    Timeout(u64),

    #[error("Explanation service returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed explanation output: {0}")]
    Malformed(String),
}

/// Structured narrative returned by the collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub summary: String,
    #[serde(default)]
    pub reasoning: Vec<String>,
    #[serde(default)]
    pub differentials: Vec<String>,
    #[serde(default)]
    pub warning_signs: Vec<String>,
}

impl Explanation {
    /// Fixed payload used whenever the collaborator fails.
    pub fn placeholder() -> Self {
        Self {
            summary: PLACEHOLDER_SUMMARY.to_string(),
            reasoning: Vec::new(),
            differentials: Vec::new(),
            warning_signs: Vec::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        *self == Self::placeholder()
    }
}

/// What the collaborator is told about a case.
#[derive(Debug, Clone, Copy)]
pub struct ExplanationRequest<'a> {
    pub symptoms: &'a str,
    pub risk_score: RiskScore,
    /// Tier label as shown to the user.
    pub urgency: &'a str,
    pub primary_condition: &'a str,
    pub redness_ratio: f64,
}

/// Capability seam for the explanation collaborator.
pub trait ExplanationProvider: Send + Sync {
    fn explain(&self, request: &ExplanationRequest<'_>) -> Result<Explanation, ExplanationError>;
}

impl<T: ExplanationProvider + ?Sized> ExplanationProvider for Arc<T> {
    fn explain(&self, request: &ExplanationRequest<'_>) -> Result<Explanation, ExplanationError> {
        (**self).explain(request)
    }
}

/// Call the provider; substitute the placeholder on any error.
pub fn explain_or_placeholder(
    provider: &dyn ExplanationProvider,
    request: &ExplanationRequest<'_>,
) -> Explanation {
    match provider.explain(request) {
        Ok(explanation) => explanation,
        Err(ExplanationError::Disabled) => {
            debug!("Explanation provider disabled, using placeholder");
            Explanation::placeholder()
        }
        Err(e) => {
            warn!(error = %e, "Explanation unavailable, using placeholder");
            Explanation::placeholder()
        }
    }
}

/// Build the provider described by configuration. No API key, or a client
/// that cannot be constructed, yields the disabled provider.
pub fn provider_from_config(config: &ExplanationConfig) -> Box<dyn ExplanationProvider> {
    let Some(api_key) = config.api_key.as_deref() else {
        tracing::info!("No explanation API key configured, explanations disabled");
        return Box::new(DisabledExplainer);
    };

    match ChatCompletionsExplainer::new(config, api_key) {
        Ok(client) => {
            tracing::info!(model = %config.model, "Explanation provider configured");
            Box::new(client)
        }
        Err(e) => {
            warn!(error = %e, "Cannot build explanation client, explanations disabled");
            Box::new(DisabledExplainer)
        }
    }
}

/// Provider used when no collaborator is configured.
pub struct DisabledExplainer;

impl ExplanationProvider for DisabledExplainer {
    fn explain(&self, _request: &ExplanationRequest<'_>) -> Result<Explanation, ExplanationError> {
        Err(ExplanationError::Disabled)
    }
}

/// Mock provider for testing — returns a configurable explanation and
/// counts calls.
pub struct MockExplainer {
    explanation: Option<Explanation>,
    calls: AtomicUsize,
}

impl MockExplainer {
    pub fn new(explanation: Explanation) -> Self {
        Self {
            explanation: Some(explanation),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails every call with a connection error.
    pub fn failing() -> Self {
        Self {
            explanation: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ExplanationProvider for MockExplainer {
    fn explain(&self, _request: &ExplanationRequest<'_>) -> Result<Explanation, ExplanationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.explanation
            .clone()
            .ok_or_else(|| ExplanationError::Connection("mock".into()))
    }
}
