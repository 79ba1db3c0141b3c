//! # Signature Flow Models
//!
//! Persisted entities owned by the engine (`FlowStage`, `SignatureRecord`),
//! shapes describing the external document/user collaborators, and the read
//! views returned to callers.

pub mod document;
pub mod flow_stage;
pub mod flow_view;
pub mod signature_record;

pub use document::{DocumentSummary, PendingDocument};
pub use flow_stage::{FlowStage, StageDefinition};
pub use flow_view::{FlowProgress, FlowStageView, StageSignature};
pub use signature_record::{DocumentSignature, NewSignatureRecord, SignatureRecord};
