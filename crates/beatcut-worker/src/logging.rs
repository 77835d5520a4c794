//! Structured render logging.
//!
//! Every event carries the job id and the pipeline stage it came from.

use tracing::{error, info, warn, Span};
use uuid::Uuid;

/// Logger bound to one render job.
#[derive(Debug, Clone)]
pub struct RenderLogger {
    job_id: String,
}

impl RenderLogger {
    pub fn new(job_id: &Uuid) -> Self {
        Self {
            job_id: job_id.to_string(),
        }
    }

    pub fn stage(&self, stage: &str, message: &str) {
        info!(job_id = %self.job_id, stage = %stage, "{}", message);
    }

    pub fn warning(&self, stage: &str, message: &str) {
        warn!(job_id = %self.job_id, stage = %stage, "{}", message);
    }

    pub fn failure(&self, stage: &str, message: &str) {
        error!(job_id = %self.job_id, stage = %stage, "{}", message);
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Span covering the whole render.
    pub fn span(&self) -> Span {
        tracing::info_span!("render", job_id = %self.job_id)
    }
}
