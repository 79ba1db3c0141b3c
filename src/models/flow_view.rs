//! Read views returned by `get_document_flow` and embedded in signature outcomes.

use crate::constants::SignerRole;
use crate::models::signature_record::DocumentSignature;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSignature {
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub signed_at: DateTime<Utc>,
}

impl From<&DocumentSignature> for StageSignature {
    fn from(signature: &DocumentSignature) -> Self {
        Self {
            user_id: signature.user_id,
            user_name: signature.user_name.clone(),
            signed_at: signature.signed_at,
        }
    }
}

/// A flow stage annotated with its completion state and attributed signatures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStageView {
    pub flow_stage_id: i64,
    pub role: SignerRole,
    pub role_name: String,
    pub required_count: i32,
    pub current_count: i32,
    pub flow_order: i32,
    pub completed: bool,
    /// True only for the earliest incomplete stage
    pub is_active: bool,
    pub signatures: Vec<StageSignature>,
}

/// Aggregate progress across every stage of a flow
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowProgress {
    pub total_required: i64,
    pub total_signed: i64,
    pub completed_stages: usize,
    pub total_stages: usize,
    pub percent_complete: f64,
}
