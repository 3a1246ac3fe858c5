//! Prompt construction and response parsing for the explanation model.

use super::{Explanation, ExplanationError, ExplanationRequest};

/// Build the single user message sent to the model.
pub fn build_prompt(request: &ExplanationRequest<'_>) -> String {
    format!(
        r#"You are a responsible dermatology-focused medical triage assistant.

Patient symptoms:
{symptoms}

Image redness ratio:
{ratio:.3}

Computed risk score:
{score}

Urgency level:
{urgency}

Preliminary condition label:
{condition}

Respond ONLY in valid JSON format:

{{
  "summary": "2-3 sentence explanation",
  "reasoning": ["bullet 1", "bullet 2", "bullet 3"],
  "differentials": ["3 medically reasonable related conditions"],
  "warning_signs": ["2-3 realistic escalation symptoms"]
}}

Rules:
- If urgency is Emergency due to airway symptoms, limit differentials to allergic or systemic causes and avoid minor dermatologic conditions.
- Do NOT mention cardiac arrest.
- Stay within dermatologic or allergic conditions.
- Do NOT provide a definitive diagnosis.
- Keep output medically realistic."#,
        symptoms = request.symptoms,
        ratio = request.redness_ratio,
        score = request.risk_score.as_f64(),
        urgency = request.urgency,
        condition = request.primary_condition,
    )
}

/// Locate the JSON object in model output, tolerating markdown fences and
/// surrounding prose.
pub fn extract_json_block(content: &str) -> Option<&str> {
    let trimmed = content.trim();

    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return Some(after_fence[..end].trim());
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        if let Some(end) = after_fence.find("```") {
            let block = after_fence[..end].trim();
            if block.starts_with('{') {
                return Some(block);
            }
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&trimmed[start..=end]),
        _ => None,
    }
}

/// Parse model output into an [`Explanation`]. Anything without a non-empty
/// summary is malformed.
pub fn parse_explanation(content: &str) -> Result<Explanation, ExplanationError> {
    let block = extract_json_block(content)
        .ok_or_else(|| ExplanationError::Malformed("No JSON object in response".into()))?;

    let explanation: Explanation =
        serde_json::from_str(block).map_err(|e| ExplanationError::Malformed(e.to_string()))?;

    if explanation.summary.trim().is_empty() {
        return Err(ExplanationError::Malformed("Empty summary".into()));
    }
    Ok(explanation)
}
