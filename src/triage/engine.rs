//! Triage engine: one request in, one persisted case and report out.
//!
//! Pipeline flow:
//! 1. Validate symptom text and declared content type (nothing decoded yet)
//! 2. Image signal (size bound, decode, minimum resolution, redness)
//! 3. Symptom signals and history modifier
//! 4. Policy assessment (score, tier, confidence, condition)
//! 5. Follow-up comparison (lookup only, never fails)
//! 6. Persist the case
//! 7. Explanation (placeholder on any failure)
//! 8. Assemble the report
//!
//! Steps 1–2 are the only ones that can reject a request; a rejected
//! request persists nothing.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::followup::compare_with_prior;
use super::guidance;
use super::history::{history_modifier, PatientHistory};
use super::image::{validate_content_type, ImageAnalyzer, RednessAnalyzer};
use super::policy::{policy_for, ClinicalFactors, RiskInputs, RiskPolicy};
use super::symptoms::{extract_symptom_signals, validate_symptoms};
use super::TriageError;
use crate::config::AppConfig;
use crate::db::CaseStore;
use crate::explanation::{
    explain_or_placeholder, provider_from_config, Explanation, ExplanationProvider,
    ExplanationRequest,
};
use crate::models::{ImageQuality, NewCase, RiskPolicyKind, RiskScore, UrgencyTier};

/// Inputs for one triage request.
#[derive(Debug, Clone, Default)]
pub struct TriageRequest {
    pub symptoms: String,
    pub image: Vec<u8>,
    /// Declared MIME type of `image`.
    pub content_type: Option<String>,
    pub history: Option<PatientHistory>,
    pub follow_up_case_id: Option<i64>,
}

/// Everything returned to the caller for one case.
#[derive(Debug, Clone, Serialize)]
pub struct TriageReport {
    pub case_id: i64,
    pub risk_policy: RiskPolicyKind,
    pub risk_score: RiskScore,
    pub urgency_tier: UrgencyTier,
    /// Tier label in the active policy's naming.
    pub urgency_level: String,
    pub urgency_color: String,
    pub primary_condition: String,
    pub confidence: f64,
    pub clinical_reasoning: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinical_factors: Option<ClinicalFactors>,
    pub image_redness_score: f64,
    pub image_mean_redness: f64,
    pub image_quality: ImageQuality,
    pub image_width: u32,
    pub image_height: u32,
    pub follow_up_of: Option<i64>,
    pub improvement_percentage: Option<f64>,
    pub emergency_action: Option<String>,
    pub recommendations: Vec<String>,
    pub warning_signs: Vec<String>,
    pub ai_explanation: Explanation,
    pub disclaimer: String,
}

pub struct TriageEngine {
    analyzer: Box<dyn ImageAnalyzer>,
    policy: Box<dyn RiskPolicy>,
    store: Arc<dyn CaseStore>,
    explainer: Box<dyn ExplanationProvider>,
}

impl TriageEngine {
    pub fn new(
        analyzer: Box<dyn ImageAnalyzer>,
        policy: Box<dyn RiskPolicy>,
        store: Arc<dyn CaseStore>,
        explainer: Box<dyn ExplanationProvider>,
    ) -> Self {
        Self {
            analyzer,
            policy,
            store,
            explainer,
        }
    }

    /// Production wiring from configuration.
    ///
    /// Builds a blocking HTTP client when an explanation key is configured,
    /// so call this off the async runtime.
    pub fn from_config(config: &AppConfig, store: Arc<dyn CaseStore>) -> Self {
        Self::new(
            Box::new(RednessAnalyzer::new(config.max_image_bytes)),
            policy_for(config.risk_policy),
            store,
            provider_from_config(&config.explanation),
        )
    }

    pub fn policy_kind(&self) -> RiskPolicyKind {
        self.policy.kind()
    }

    pub fn store(&self) -> &Arc<dyn CaseStore> {
        &self.store
    }

    /// Run the full pipeline for one request.
    pub fn triage(&self, request: &TriageRequest) -> Result<TriageReport, TriageError> {
        // ── Validation ──
        let symptoms = validate_symptoms(&request.symptoms)?;
        validate_content_type(request.content_type.as_deref())?;

        // ── Signals ──
        let image = self.analyzer.analyze(&request.image)?;
        let symptom_signals = extract_symptom_signals(symptoms);
        let history = history_modifier(request.history.as_ref());

        // ── Classification ──
        let assessment = self.policy.assess(&RiskInputs {
            redness_ratio: image.redness_ratio,
            symptoms: &symptom_signals,
            history: &history,
        });
        let policy = assessment.policy;
        let tier = assessment.tier;

        // ── Follow-up ──
        let follow_up = compare_with_prior(
            self.store.as_ref(),
            request.follow_up_case_id,
            image.redness_ratio,
        );

        // ── Persist ──
        let case = self.store.insert(&NewCase {
            symptoms: symptoms.to_string(),
            image_redness_score: Some(image.redness_ratio),
            prediction: assessment.primary_condition.to_string(),
            confidence: assessment.confidence,
            urgency: tier,
            risk_score: assessment.score,
            clinical_reasoning: assessment.reasoning.clone(),
            follow_up_of: follow_up.prior_case_id,
        })?;

        info!(
            case_id = case.id,
            tier = tier.as_str(),
            score = assessment.score.as_f64(),
            policy = policy.as_str(),
            ratio = image.redness_ratio,
            follow_up_of = ?case.follow_up_of,
            "Case triaged"
        );

        // ── Explanation ──
        let urgency_level = tier.label(policy);
        let ai_explanation = explain_or_placeholder(
            self.explainer.as_ref(),
            &ExplanationRequest {
                symptoms,
                risk_score: assessment.score,
                urgency: urgency_level,
                primary_condition: assessment.primary_condition,
                redness_ratio: image.redness_ratio,
            },
        );

        Ok(TriageReport {
            case_id: case.id,
            risk_policy: policy,
            risk_score: assessment.score,
            urgency_tier: tier,
            urgency_level: urgency_level.to_string(),
            urgency_color: tier.color().to_string(),
            primary_condition: assessment.primary_condition.to_string(),
            confidence: assessment.confidence,
            clinical_reasoning: assessment.reasoning,
            clinical_factors: assessment.clinical_factors,
            image_redness_score: image.redness_ratio,
            image_mean_redness: image.mean_redness,
            image_quality: image.quality,
            image_width: image.width,
            image_height: image.height,
            follow_up_of: case.follow_up_of,
            improvement_percentage: follow_up.improvement_percentage,
            emergency_action: guidance::emergency_action(tier).map(String::from),
            recommendations: to_strings(guidance::recommendations(tier)),
            warning_signs: to_strings(guidance::warning_signs(tier)),
            ai_explanation,
            disclaimer: guidance::DISCLAIMER.to_string(),
        })
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
