use crate::models::FlowStageView;
use serde::{Deserialize, Serialize};

pub const SIGNATURE_RECORDED_MESSAGE: &str = "Signature recorded successfully";

/// Result of a successful `record_signature`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureOutcome {
    pub success: bool,
    pub message: String,
    /// The stage the signature counted towards reached its quota
    pub stage_completed: bool,
    /// Every stage reached its quota and the document is now `signed`
    pub flow_completed: bool,
    /// Stage that became active, when `stage_completed` and more stages follow
    pub next_stage: Option<FlowStageView>,
    /// Flow state as committed by this signature
    pub updated_flow: Vec<FlowStageView>,
}
