//! # External Document Views
//!
//! The engine references documents and users owned by other components. These
//! structs are the slices of those entities it reads.

use crate::constants::{DocumentStatus, SignerRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Document metadata read from the document store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub document_id: Uuid,
    pub name: String,
    pub created_by: Uuid,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A document awaiting a signature from a given user under a given role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDocument {
    pub document_id: Uuid,
    pub name: String,
    pub created_by: Uuid,
    pub creator_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub role: SignerRole,
    pub required_count: i32,
    pub current_count: i32,
    pub remaining_signatures: i32,
}
