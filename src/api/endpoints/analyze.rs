//! `POST /analyze` — multipart symptom text + skin photo → triage report.
//!
//! Form fields:
//! - `symptoms` (required) — free text
//! - `image` (required) — file part with its declared content type
//! - `follow_up_case_id` (optional) — prior case to compare against
//! - `diabetes`, `immunocompromised`, `previous_infection` (optional) —
//!   history flags, truthy when `true`, `1`, `on` or `yes`
//!
//! The engine is CPU-bound and blocking, so it runs on the blocking pool.

use axum::extract::{Multipart, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::triage::{PatientHistory, TriageReport, TriageRequest};

/// Fields collected from the multipart body.
#[derive(Debug, Default)]
struct AnalyzeForm {
    symptoms: Option<String>,
    image: Option<Vec<u8>>,
    content_type: Option<String>,
    follow_up_case_id: Option<i64>,
    history: Option<PatientHistory>,
}

impl AnalyzeForm {
    fn into_request(self) -> Result<TriageRequest, ApiError> {
        let symptoms = self
            .symptoms
            .ok_or_else(|| ApiError::BadRequest("Missing 'symptoms' field".into()))?;
        let image = self
            .image
            .ok_or_else(|| ApiError::BadRequest("Missing 'image' file".into()))?;

        Ok(TriageRequest {
            symptoms,
            image,
            content_type: self.content_type,
            history: self.history,
            follow_up_case_id: self.follow_up_case_id,
        })
    }
}

pub async fn analyze(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Json<TriageReport>, ApiError> {
    let request = read_form(&mut multipart).await?.into_request()?;

    let engine = ctx.engine.clone();
    let report = tokio::task::spawn_blocking(move || engine.triage(&request)).await??;

    Ok(Json(report))
}

async fn read_form(multipart: &mut Multipart) -> Result<AnalyzeForm, ApiError> {
    let mut form = AnalyzeForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "symptoms" => form.symptoms = Some(field.text().await?),
            "image" => {
                form.content_type = field.content_type().map(str::to_string);
                form.image = Some(field.bytes().await?.to_vec());
            }
            "follow_up_case_id" => {
                form.follow_up_case_id = parse_case_id(&field.text().await?)?;
            }
            "diabetes" | "immunocompromised" | "previous_infection" => {
                let set = parse_flag(&field.text().await?);
                let history = form.history.get_or_insert_with(PatientHistory::default);
                match name.as_str() {
                    "diabetes" => history.diabetes = set,
                    "immunocompromised" => history.immunocompromised = set,
                    _ => history.previous_infection = set,
                }
            }
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

/// Blank means "no follow-up"; anything else must be an integer id.
fn parse_case_id(raw: &str) -> Result<Option<i64>, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|_| ApiError::BadRequest(format!("Invalid follow_up_case_id: {trimmed}")))
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "on" | "yes"
    )
}
