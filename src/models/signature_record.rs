//! # Signature Record Model
//!
//! Immutable history of who signed a document and under which role.
//!
//! Maps to `signature_records`, which carries `UNIQUE (document_id, user_id)`:
//! a user signs a document at most once regardless of role.

use crate::constants::SignerRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub signature_record_id: i64,
    pub document_id: Uuid,
    pub user_id: Uuid,
    pub role: SignerRole,
    pub signed_at: DateTime<Utc>,
}

/// New SignatureRecord for insertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSignatureRecord {
    pub document_id: Uuid,
    pub user_id: Uuid,
    pub role: SignerRole,
    pub signed_at: DateTime<Utc>,
}

impl NewSignatureRecord {
    pub fn now(document_id: Uuid, user_id: Uuid, role: SignerRole) -> Self {
        Self {
            document_id,
            user_id,
            role,
            signed_at: Utc::now(),
        }
    }
}

/// A document's signature joined with the signer's display name from the
/// user directory. Unknown users keep a `None` name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSignature {
    pub role: SignerRole,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub signed_at: DateTime<Utc>,
}
