//! # Signature Flow Engine
//!
//! The engine owns no connection state: the persistence handle is injected at
//! construction and every operation opens its own transaction scope from it.
//!
//! ## Recording a signature
//!
//! Inside one scope, with the document row locked:
//! 1. reject a user who already signed the document
//! 2. load the stages, locking them
//! 3. pick the active stage and require the signer's role to match it
//! 4. insert the signature record and increment the active stage
//! 5. if the stage met its quota, look up the next stage; with none left the
//!    document becomes `signed`
//!
//! The scope commits as a whole or not at all. Events go out only after the
//! commit succeeded.

use crate::constants::SignerRole;
use crate::error::{ErrorKind, FlowError, FlowResult};
use crate::events::{FlowEvent, FlowEventPublisher};
use crate::flow::outcome::{SignatureOutcome, SIGNATURE_RECORDED_MESSAGE};
use crate::flow::transitions::{admit_signature, build_stage_views, validate_definition};
use crate::logging::{log_error, log_flow_operation};
use crate::models::{FlowStage, FlowStageView, NewSignatureRecord, PendingDocument, StageDefinition};
use crate::repository::SignatureFlowStore;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

const COMPONENT: &str = "signature_flow_engine";

/// Multi-stage signature workflow engine
#[derive(Clone)]
pub struct SignatureFlowEngine {
    store: Arc<dyn SignatureFlowStore>,
    events: FlowEventPublisher,
}

impl std::fmt::Debug for SignatureFlowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureFlowEngine")
            .field("subscribers", &self.events.subscriber_count())
            .finish()
    }
}

impl SignatureFlowEngine {
    pub fn new(store: impl SignatureFlowStore + 'static) -> Self {
        Self::with_event_publisher(store, FlowEventPublisher::default())
    }

    pub fn with_event_publisher(
        store: impl SignatureFlowStore + 'static,
        events: FlowEventPublisher,
    ) -> Self {
        Self {
            store: Arc::new(store),
            events,
        }
    }

    pub fn events(&self) -> &FlowEventPublisher {
        &self.events
    }

    /// Define or wholesale replace the flow of a document.
    ///
    /// Previous stage progress is discarded; signature records are kept.
    #[instrument(skip(self, stages), fields(document_id = %document_id, stage_count = stages.len()))]
    pub async fn create_flow(
        &self,
        document_id: Uuid,
        stages: &[StageDefinition],
    ) -> FlowResult<Vec<FlowStage>> {
        const OPERATION: &str = "create signature flow";

        validate_definition(stages).map_err(|e| self.report(OPERATION, document_id, None, e))?;

        let created = self
            .replace_flow(document_id, stages)
            .await
            .map_err(|e| self.report(OPERATION, document_id, None, e))?;

        log_flow_operation(
            OPERATION,
            document_id,
            None,
            "success",
            Some(&format!("{} stages defined", created.len())),
        );
        self.events.publish(FlowEvent::FlowDefined {
            document_id,
            stage_count: created.len(),
        });

        Ok(created)
    }

    /// Stages in sequence order with completion state and attributed signatures.
    ///
    /// Empty when no flow is defined.
    #[instrument(skip(self), fields(document_id = %document_id))]
    pub async fn get_document_flow(&self, document_id: Uuid) -> FlowResult<Vec<FlowStageView>> {
        const OPERATION: &str = "load signature flow";

        self.load_flow(document_id)
            .await
            .map_err(|e| self.report(OPERATION, document_id, None, e))
    }

    /// Record a signature by `user_id` acting as `role`, advancing the flow.
    #[instrument(skip(self), fields(document_id = %document_id, user_id = %user_id, role = %role))]
    pub async fn record_signature(
        &self,
        document_id: Uuid,
        user_id: Uuid,
        role: SignerRole,
    ) -> FlowResult<SignatureOutcome> {
        const OPERATION: &str = "record signature";

        let (outcome, events) = self
            .apply_signature(document_id, user_id, role)
            .await
            .map_err(|e| self.report(OPERATION, document_id, Some(user_id), e))?;

        log_flow_operation(
            OPERATION,
            document_id,
            Some(user_id),
            "success",
            Some(&format!(
                "stage_completed={} flow_completed={}",
                outcome.stage_completed, outcome.flow_completed
            )),
        );

        for event in events {
            self.events.publish(event);
        }

        Ok(outcome)
    }

    /// Pending documents awaiting a signature from `user_id` under `role`,
    /// newest first.
    #[instrument(skip(self), fields(user_id = %user_id, role = %role))]
    pub async fn get_pending_signatures(
        &self,
        user_id: Uuid,
        role: SignerRole,
    ) -> FlowResult<Vec<PendingDocument>> {
        let result = async {
            let mut tx = self.store.begin().await?;
            let pending = tx.pending_signatures(user_id, role).await?;
            tx.commit().await?;
            Ok::<_, FlowError>(pending)
        }
        .await;

        match result {
            Ok(pending) => {
                debug!(count = pending.len(), "Loaded pending signatures");
                Ok(pending)
            }
            Err(err) => {
                let err = err.during("load pending signatures");
                log_error(
                    COMPONENT,
                    "load pending signatures",
                    &err.to_string(),
                    Some(&format!("user_id={user_id} role={role}")),
                );
                Err(err)
            }
        }
    }

    async fn replace_flow(
        &self,
        document_id: Uuid,
        stages: &[StageDefinition],
    ) -> FlowResult<Vec<FlowStage>> {
        let mut tx = self.store.begin().await?;

        tx.lock_document(document_id)
            .await?
            .ok_or(FlowError::DocumentNotFound(document_id))?;

        let created = tx.replace_stages(document_id, stages).await?;
        tx.commit().await?;

        Ok(created)
    }

    async fn load_flow(&self, document_id: Uuid) -> FlowResult<Vec<FlowStageView>> {
        let mut tx = self.store.begin().await?;
        let stages = tx.load_stages(document_id, false).await?;
        let signatures = if stages.is_empty() {
            Vec::new()
        } else {
            tx.load_signatures(document_id).await?
        };
        tx.commit().await?;

        Ok(build_stage_views(&stages, &signatures))
    }

    async fn apply_signature(
        &self,
        document_id: Uuid,
        user_id: Uuid,
        role: SignerRole,
    ) -> FlowResult<(SignatureOutcome, Vec<FlowEvent>)> {
        let mut tx = self.store.begin().await?;

        tx.lock_document(document_id)
            .await?
            .ok_or(FlowError::DocumentNotFound(document_id))?;

        if tx.signature_exists(document_id, user_id).await? {
            return Err(FlowError::AlreadySigned);
        }

        let stages = tx.load_stages(document_id, true).await?;
        let active = admit_signature(&stages, role)?.clone();

        tx.insert_signature_record(&NewSignatureRecord::now(document_id, user_id, role))
            .await?;

        let updated = tx.increment_stage_count(active.flow_stage_id).await?;
        let stage_completed = updated.is_complete();

        let next_stage = if stage_completed {
            tx.find_next_stage(&updated).await?
        } else {
            None
        };
        let flow_completed = stage_completed && next_stage.is_none();

        if flow_completed {
            tx.mark_document_signed(document_id).await?;
        }

        // Snapshot from inside the scope so it matches exactly what commits
        let stages = tx.load_stages(document_id, false).await?;
        let signatures = tx.load_signatures(document_id).await?;
        tx.commit().await?;

        let updated_flow = build_stage_views(&stages, &signatures);
        let next_stage_view = next_stage.as_ref().and_then(|next| {
            updated_flow
                .iter()
                .find(|view| view.flow_stage_id == next.flow_stage_id)
                .cloned()
        });

        let mut events = vec![FlowEvent::SignatureRecorded {
            document_id,
            user_id,
            role,
        }];
        if stage_completed {
            info!(
                flow_stage_id = updated.flow_stage_id,
                flow_order = updated.flow_order,
                next_role = next_stage.as_ref().map(|s| s.role.as_str()),
                "Signature stage completed"
            );
            events.push(FlowEvent::StageCompleted {
                document_id,
                flow_stage_id: updated.flow_stage_id,
                role: updated.role,
                next_role: next_stage.as_ref().map(|s| s.role),
            });
        }
        if flow_completed {
            info!("Signature flow completed; document marked signed");
            events.push(FlowEvent::FlowCompleted { document_id });
        }

        let outcome = SignatureOutcome {
            success: true,
            message: SIGNATURE_RECORDED_MESSAGE.to_string(),
            stage_completed,
            flow_completed,
            next_stage: next_stage_view,
            updated_flow,
        };

        Ok((outcome, events))
    }

    /// Label, log and pass through an operation failure
    fn report(
        &self,
        operation: &str,
        document_id: Uuid,
        user_id: Option<Uuid>,
        err: FlowError,
    ) -> FlowError {
        let err = err.during(operation);

        match err.kind() {
            ErrorKind::Persistence => log_error(
                COMPONENT,
                operation,
                &err.to_string(),
                Some(&format!("document_id={document_id}")),
            ),
            _ => log_flow_operation(
                operation,
                document_id,
                user_id,
                "rejected",
                Some(&err.to_string()),
            ),
        }

        err
    }
}
