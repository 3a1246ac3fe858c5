//! Follow-up comparison against a prior case.

use serde::Serialize;
use tracing::warn;

use crate::db::CaseStore;

/// Outcome of resolving a follow-up reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FollowUpComparison {
    /// Prior case that was found, if any. Only this id may be persisted.
    pub prior_case_id: Option<i64>,
    pub prior_redness: Option<f64>,
    /// Positive means redness decreased.
    pub improvement_percentage: Option<f64>,
}

/// `(prior − current) / prior × 100`, rounded to two decimals.
///
/// `None` when the prior value is absent, zero, negative, or not finite.
pub fn improvement_percentage(prior: Option<f64>, current: f64) -> Option<f64> {
    let prior = prior.filter(|p| p.is_finite() && *p > 0.0)?;
    let change = (prior - current) / prior * 100.0;
    Some((change * 100.0).round() / 100.0)
}

/// Look up the prior case and compare. Never fails: a missing case or a
/// store error both yield no comparison.
pub fn compare_with_prior(
    store: &dyn CaseStore,
    prior_id: Option<i64>,
    current_redness: f64,
) -> FollowUpComparison {
    let Some(prior_id) = prior_id else {
        return FollowUpComparison::default();
    };

    let prior = match store.get(prior_id) {
        Ok(Some(case)) => case,
        Ok(None) => {
            warn!(prior_id, "Follow-up reference not found, skipping comparison");
            return FollowUpComparison::default();
        }
        Err(e) => {
            warn!(prior_id, error = %e, "Follow-up lookup failed, skipping comparison");
            return FollowUpComparison::default();
        }
    };

    FollowUpComparison {
        prior_case_id: Some(prior.id),
        prior_redness: prior.image_redness_score,
        improvement_percentage: improvement_percentage(prior.image_redness_score, current_redness),
    }
}
