//! # In-Memory Signature Flow Store
//!
//! A process-local store with the same transactional contract as the
//! PostgreSQL implementation. A scope takes the store-wide lock when it
//! begins, works on a private copy of the data, and swaps the copy in on
//! commit. Dropping a scope discards the copy, which is a rollback.
//!
//! Holding the lock for the whole scope serializes concurrent scopes, which is
//! stricter than the per-document row locks taken by PostgreSQL but gives the
//! engine the same observable guarantees.

use super::{FlowTransaction, SignatureFlowStore};
use crate::constants::{DocumentStatus, SignerRole};
use crate::error::{FlowError, FlowResult};
use crate::flow::transitions::pending_stage_for_role;
use crate::models::{
    DocumentSignature, DocumentSummary, FlowStage, NewSignatureRecord, PendingDocument,
    SignatureRecord, StageDefinition,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct StoreState {
    documents: HashMap<Uuid, DocumentSummary>,
    users: HashMap<Uuid, String>,
    stages: Vec<FlowStage>,
    records: Vec<SignatureRecord>,
    next_stage_id: i64,
    next_record_id: i64,
    #[cfg(any(test, feature = "test-utils"))]
    fail_next_commit: bool,
}

impl StoreState {
    fn document_stages(&self, document_id: Uuid) -> Vec<FlowStage> {
        let mut stages: Vec<FlowStage> = self
            .stages
            .iter()
            .filter(|stage| stage.document_id == document_id)
            .cloned()
            .collect();
        stages.sort_by(|a, b| a.sequence_cmp(b));
        stages
    }
}

/// Shared in-memory store; clones share the same data
#[derive(Debug, Clone, Default)]
pub struct InMemorySignatureFlowStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemorySignatureFlowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user in the directory used to resolve signer names
    pub async fn insert_user(&self, user_id: Uuid, name: impl Into<String>) {
        self.state.lock().await.users.insert(user_id, name.into());
    }

    /// Register a document owned by the external document store
    pub async fn insert_document(&self, document: DocumentSummary) {
        self.state
            .lock()
            .await
            .documents
            .insert(document.document_id, document);
    }

    /// Create a `pending` document and return its id
    pub async fn create_pending_document(&self, name: impl Into<String>, created_by: Uuid) -> Uuid {
        let now = Utc::now();
        let document = DocumentSummary {
            document_id: Uuid::new_v4(),
            name: name.into(),
            created_by,
            status: DocumentStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let document_id = document.document_id;
        self.insert_document(document).await;
        document_id
    }

    pub async fn document(&self, document_id: Uuid) -> Option<DocumentSummary> {
        self.state.lock().await.documents.get(&document_id).cloned()
    }

    pub async fn stages(&self, document_id: Uuid) -> Vec<FlowStage> {
        self.state.lock().await.document_stages(document_id)
    }

    pub async fn signature_records(&self, document_id: Uuid) -> Vec<SignatureRecord> {
        self.state
            .lock()
            .await
            .records
            .iter()
            .filter(|record| record.document_id == document_id)
            .cloned()
            .collect()
    }

    /// Make the next commit fail, leaving the store untouched
    #[cfg(any(test, feature = "test-utils"))]
    pub async fn fail_next_commit(&self) {
        self.state.lock().await.fail_next_commit = true;
    }
}

#[async_trait]
impl SignatureFlowStore for InMemorySignatureFlowStore {
    async fn begin(&self) -> FlowResult<Box<dyn FlowTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryFlowTransaction { guard, working }))
    }
}

struct InMemoryFlowTransaction {
    guard: OwnedMutexGuard<StoreState>,
    working: StoreState,
}

#[async_trait]
impl FlowTransaction for InMemoryFlowTransaction {
    async fn lock_document(&mut self, document_id: Uuid) -> FlowResult<Option<DocumentSummary>> {
        Ok(self.working.documents.get(&document_id).cloned())
    }

    async fn load_stages(
        &mut self,
        document_id: Uuid,
        _for_update: bool,
    ) -> FlowResult<Vec<FlowStage>> {
        Ok(self.working.document_stages(document_id))
    }

    async fn replace_stages(
        &mut self,
        document_id: Uuid,
        stages: &[StageDefinition],
    ) -> FlowResult<Vec<FlowStage>> {
        self.working
            .stages
            .retain(|stage| stage.document_id != document_id);

        let created_at = Utc::now();
        for definition in stages {
            self.working.next_stage_id += 1;
            self.working.stages.push(FlowStage {
                flow_stage_id: self.working.next_stage_id,
                document_id,
                role: definition.role,
                required_count: definition.required_count,
                current_count: 0,
                flow_order: definition.flow_order,
                created_at,
            });
        }

        Ok(self.working.document_stages(document_id))
    }

    async fn signature_exists(&mut self, document_id: Uuid, user_id: Uuid) -> FlowResult<bool> {
        Ok(self
            .working
            .records
            .iter()
            .any(|record| record.document_id == document_id && record.user_id == user_id))
    }

    async fn insert_signature_record(
        &mut self,
        record: &NewSignatureRecord,
    ) -> FlowResult<SignatureRecord> {
        if self.signature_exists(record.document_id, record.user_id).await? {
            return Err(FlowError::AlreadySigned);
        }

        self.working.next_record_id += 1;
        let inserted = SignatureRecord {
            signature_record_id: self.working.next_record_id,
            document_id: record.document_id,
            user_id: record.user_id,
            role: record.role,
            signed_at: record.signed_at,
        };
        self.working.records.push(inserted.clone());
        Ok(inserted)
    }

    async fn increment_stage_count(&mut self, flow_stage_id: i64) -> FlowResult<FlowStage> {
        let stage = self
            .working
            .stages
            .iter_mut()
            .find(|stage| stage.flow_stage_id == flow_stage_id && !stage.is_complete())
            .ok_or_else(|| {
                FlowError::persistence(
                    "increment stage count",
                    format!("stage {flow_stage_id} is missing or already at quota"),
                )
            })?;

        stage.current_count += 1;
        Ok(stage.clone())
    }

    async fn find_next_stage(&mut self, current: &FlowStage) -> FlowResult<Option<FlowStage>> {
        Ok(self
            .working
            .document_stages(current.document_id)
            .into_iter()
            .find(|stage| stage.sequence_cmp(current).is_gt()))
    }

    async fn mark_document_signed(&mut self, document_id: Uuid) -> FlowResult<()> {
        let document = self
            .working
            .documents
            .get_mut(&document_id)
            .ok_or(FlowError::DocumentNotFound(document_id))?;

        document.status = DocumentStatus::Signed;
        document.updated_at = Utc::now();
        Ok(())
    }

    async fn load_signatures(&mut self, document_id: Uuid) -> FlowResult<Vec<DocumentSignature>> {
        let mut records: Vec<&SignatureRecord> = self
            .working
            .records
            .iter()
            .filter(|record| record.document_id == document_id)
            .collect();
        records.sort_by_key(|record| (record.signed_at, record.signature_record_id));

        Ok(records
            .into_iter()
            .map(|record| DocumentSignature {
                role: record.role,
                user_id: record.user_id,
                user_name: self.working.users.get(&record.user_id).cloned(),
                signed_at: record.signed_at,
            })
            .collect())
    }

    async fn pending_signatures(
        &mut self,
        user_id: Uuid,
        role: SignerRole,
    ) -> FlowResult<Vec<PendingDocument>> {
        let mut pending: Vec<PendingDocument> = self
            .working
            .documents
            .values()
            .filter(|document| document.status == DocumentStatus::Pending)
            .filter(|document| {
                !self.working.records.iter().any(|record| {
                    record.document_id == document.document_id && record.user_id == user_id
                })
            })
            .filter_map(|document| {
                let stages = self.working.document_stages(document.document_id);
                let stage = pending_stage_for_role(&stages, role)?;
                Some(PendingDocument {
                    document_id: document.document_id,
                    name: document.name.clone(),
                    created_by: document.created_by,
                    creator_name: self.working.users.get(&document.created_by).cloned(),
                    created_at: document.created_at,
                    role: stage.role,
                    required_count: stage.required_count,
                    current_count: stage.current_count,
                    remaining_signatures: stage.remaining_signatures(),
                })
            })
            .collect();

        pending.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(a.document_id.cmp(&b.document_id))
        });
        Ok(pending)
    }

    async fn commit(self: Box<Self>) -> FlowResult<()> {
        let InMemoryFlowTransaction { mut guard, working } = *self;

        #[cfg(any(test, feature = "test-utils"))]
        if guard.fail_next_commit {
            guard.fail_next_commit = false;
            return Err(FlowError::persistence(
                "commit transaction",
                "injected commit failure",
            ));
        }

        *guard = working;
        Ok(())
    }
}
