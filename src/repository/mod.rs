//! # Signature Flow Repository
//!
//! Data-access boundary of the engine. A [`SignatureFlowStore`] hands out
//! [`FlowTransaction`] scopes; every read and write of one engine operation
//! goes through a single scope, and nothing is visible to other scopes until
//! [`FlowTransaction::commit`] succeeds. Dropping a scope without committing
//! rolls it back.
//!
//! Implementations must serialize scopes that lock the same document, so the
//! check-then-increment sequence of `record_signature` cannot interleave with
//! another signer or with a flow redefinition.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemorySignatureFlowStore;
pub use postgres::PgSignatureFlowStore;

use crate::constants::SignerRole;
use crate::error::FlowResult;
use crate::models::{
    DocumentSignature, DocumentSummary, FlowStage, NewSignatureRecord, PendingDocument,
    SignatureRecord, StageDefinition,
};
use async_trait::async_trait;
use uuid::Uuid;

/// Source of transaction scopes
#[async_trait]
pub trait SignatureFlowStore: Send + Sync {
    async fn begin(&self) -> FlowResult<Box<dyn FlowTransaction>>;
}

/// One atomic unit of work over the flow tables and the document collaborator
#[async_trait]
pub trait FlowTransaction: Send {
    /// Lock the document row for the rest of the scope and return its metadata
    async fn lock_document(&mut self, document_id: Uuid) -> FlowResult<Option<DocumentSummary>>;

    /// Stages of a document in sequence order; `for_update` locks the rows
    async fn load_stages(&mut self, document_id: Uuid, for_update: bool)
        -> FlowResult<Vec<FlowStage>>;

    /// Delete every stage of the document and insert the new definition at zero progress
    async fn replace_stages(
        &mut self,
        document_id: Uuid,
        stages: &[StageDefinition],
    ) -> FlowResult<Vec<FlowStage>>;

    async fn signature_exists(&mut self, document_id: Uuid, user_id: Uuid) -> FlowResult<bool>;

    /// Fails with `AlreadySigned` when the (document, user) pair already has a record
    async fn insert_signature_record(
        &mut self,
        record: &NewSignatureRecord,
    ) -> FlowResult<SignatureRecord>;

    /// Add one signature to the stage and return the re-read row
    async fn increment_stage_count(&mut self, flow_stage_id: i64) -> FlowResult<FlowStage>;

    /// First stage strictly after `current` in sequence order
    async fn find_next_stage(&mut self, current: &FlowStage) -> FlowResult<Option<FlowStage>>;

    async fn mark_document_signed(&mut self, document_id: Uuid) -> FlowResult<()>;

    /// Every signature on the document, with signer names resolved
    async fn load_signatures(&mut self, document_id: Uuid) -> FlowResult<Vec<DocumentSignature>>;

    /// Pending documents whose active stage requires `role` and that `user_id` has not signed
    async fn pending_signatures(
        &mut self,
        user_id: Uuid,
        role: SignerRole,
    ) -> FlowResult<Vec<PendingDocument>>;

    async fn commit(self: Box<Self>) -> FlowResult<()>;
}
