//! Shared API state and response shapes.

use std::sync::Arc;

use serde::Serialize;

use crate::db::CaseStore;
use crate::triage::TriageEngine;

/// Multipart framing allowance on top of the image bound.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// State shared by every handler.
#[derive(Clone)]
pub struct ApiContext {
    pub engine: Arc<TriageEngine>,
    pub max_image_bytes: usize,
}

impl ApiContext {
    pub fn new(engine: Arc<TriageEngine>, max_image_bytes: usize) -> Self {
        Self {
            engine,
            max_image_bytes,
        }
    }

    pub fn store(&self) -> &Arc<dyn CaseStore> {
        self.engine.store()
    }

    /// Request body cap: the largest accepted image plus form framing.
    pub fn body_limit(&self) -> usize {
        self.max_image_bytes.saturating_add(FORM_OVERHEAD_BYTES)
    }
}

#[derive(Debug, Serialize)]
pub struct BannerResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub risk_policy: &'static str,
}
