//! # Signature Flow Handlers
//!
//! `GET|POST /documents/{id}/flow`, `POST /documents/{id}/sign` and
//! `GET /documents/pending`.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::flow::transitions::flow_progress;
use crate::flow::SignatureOutcome;
use crate::models::{FlowProgress, FlowStage, FlowStageView, PendingDocument, StageDefinition};
use crate::web::errors::{ApiError, ApiResult};
use crate::web::identity::CallerIdentity;
use crate::web::state::AppState;

pub const FLOW_CREATED_MESSAGE: &str = "Signature flow created successfully";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateFlowRequest {
    #[serde(default)]
    pub required_signatures: Vec<StageDefinition>,
}

#[derive(Debug, Serialize)]
pub struct FlowResponse {
    pub success: bool,
    pub flow: Vec<FlowStageView>,
    pub progress: FlowProgress,
}

#[derive(Debug, Serialize)]
pub struct CreateFlowResponse {
    pub success: bool,
    pub message: &'static str,
    pub stages: Vec<FlowStage>,
}

#[derive(Debug, Serialize)]
pub struct PendingDocumentsResponse {
    pub success: bool,
    pub documents: Vec<PendingDocument>,
}

/// Flow state of a document: GET /documents/{id}/flow
pub async fn get_document_flow(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<FlowResponse>> {
    let document_id = document_id(path)?;
    let flow = state.engine.get_document_flow(document_id).await?;
    let progress = flow_progress(&flow);

    Ok(Json(FlowResponse {
        success: true,
        flow,
        progress,
    }))
}

/// Define or replace a flow: POST /documents/{id}/flow
///
/// Restricted to roles allowed to define flows.
pub async fn create_flow(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<CreateFlowRequest>, JsonRejection>,
) -> ApiResult<Json<CreateFlowResponse>> {
    if !caller.role.can_define_flows() {
        warn!(user_id = %caller.user_id, role = %caller.role, "Rejected flow definition from unprivileged caller");
        return Err(ApiError::forbidden(format!(
            "Role '{}' cannot define signature flows",
            caller.role
        )));
    }

    let document_id = document_id(path)?;
    let Json(request) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let stages = state
        .engine
        .create_flow(document_id, &request.required_signatures)
        .await?;

    info!(
        document_id = %document_id,
        user_id = %caller.user_id,
        stage_count = stages.len(),
        "Signature flow defined"
    );

    Ok(Json(CreateFlowResponse {
        success: true,
        message: FLOW_CREATED_MESSAGE,
        stages,
    }))
}

/// Record the caller's signature: POST /documents/{id}/sign
pub async fn sign_document(
    State(state): State<AppState>,
    caller: CallerIdentity,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<SignatureOutcome>> {
    let document_id = document_id(path)?;
    let outcome = state
        .engine
        .record_signature(document_id, caller.user_id, caller.role)
        .await?;

    Ok(Json(outcome))
}

/// Documents awaiting the caller: GET /documents/pending
pub async fn get_pending_documents(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> ApiResult<Json<PendingDocumentsResponse>> {
    let documents = state
        .engine
        .get_pending_signatures(caller.user_id, caller.role)
        .await?;

    Ok(Json(PendingDocumentsResponse {
        success: true,
        documents,
    }))
}

fn document_id(path: Result<Path<Uuid>, PathRejection>) -> ApiResult<Uuid> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::bad_request("Document id must be a valid UUID"))
}
