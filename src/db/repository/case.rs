use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::{Case, NewCase, RiskScore};

const CASE_COLUMNS: &str = "id, symptoms, image_redness_score, prediction, confidence, urgency,
     risk_policy, risk_score, clinical_reasoning, follow_up_of, created_at";

/// Insert a new case and return it with its assigned id and timestamp.
pub fn insert_case(conn: &Connection, case: &NewCase) -> Result<Case, DatabaseError> {
    let created_at = Utc::now();
    let reasoning = serde_json::to_string(&case.clinical_reasoning)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;

    conn.execute(
        "INSERT INTO cases (symptoms, image_redness_score, prediction, confidence, urgency,
         risk_policy, risk_score, clinical_reasoning, follow_up_of, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            case.symptoms,
            case.image_redness_score,
            case.prediction,
            case.confidence,
            case.urgency.as_str(),
            case.risk_score.policy().as_str(),
            case.risk_score.as_f64(),
            reasoning,
            case.follow_up_of,
            created_at,
        ],
    )?;

    Ok(Case {
        id: conn.last_insert_rowid(),
        symptoms: case.symptoms.clone(),
        image_redness_score: case.image_redness_score,
        prediction: case.prediction.clone(),
        confidence: case.confidence,
        urgency: case.urgency,
        risk_score: case.risk_score,
        clinical_reasoning: case.clinical_reasoning.clone(),
        follow_up_of: case.follow_up_of,
        created_at,
    })
}

pub fn get_case(conn: &Connection, id: i64) -> Result<Option<Case>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {CASE_COLUMNS} FROM cases WHERE id = ?1"),
            params![id],
            read_case_row,
        )
        .optional()?;

    row.map(case_from_row).transpose()
}

/// All cases, newest first.
pub fn list_cases(conn: &Connection) -> Result<Vec<Case>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CASE_COLUMNS} FROM cases ORDER BY created_at DESC, id DESC"
    ))?;

    let rows = stmt.query_map([], read_case_row)?;

    let mut cases = Vec::new();
    for row in rows {
        cases.push(case_from_row(row?)?);
    }
    Ok(cases)
}

pub fn count_cases(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM cases", [], |row| row.get(0))?)
}

type CaseRow = (
    i64, String, Option<f64>, String, f64, String,
    String, f64, String, Option<i64>, DateTime<Utc>,
);

fn read_case_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CaseRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
    ))
}

fn case_from_row(row: CaseRow) -> Result<Case, DatabaseError> {
    let (
        id, symptoms, image_redness_score, prediction, confidence, urgency,
        risk_policy, risk_score, reasoning, follow_up_of, created_at,
    ) = row;

    let policy = RiskPolicyKind::from_str(&risk_policy)?;
    let clinical_reasoning: Vec<String> = serde_json::from_str(&reasoning)
        .map_err(|e| DatabaseError::ConstraintViolation(format!("case {id} reasoning: {e}")))?;

    Ok(Case {
        id,
        symptoms,
        image_redness_score,
        prediction,
        confidence,
        urgency: UrgencyTier::from_str(&urgency)?,
        risk_score: RiskScore::from_stored(policy, risk_score),
        clinical_reasoning,
        follow_up_of,
        created_at,
    })
}
