//! # System Constants
//!
//! Role and status vocabularies shared by the signature flow engine, the
//! persistence layer and the HTTP surface, plus the event names published when
//! a flow advances.
//!
//! Roles and document statuses are persisted as their snake_case codes, so the
//! `Display`/`FromStr` pairs below are the single source of truth for the
//! strings stored in `signature_flow_stages.role`, `signature_records.role`
//! and `documents.status`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Flow lifecycle events published after a successful commit
pub mod events {
    pub const FLOW_DEFINED: &str = "flow.defined";
    pub const SIGNATURE_RECORDED: &str = "flow.signature_recorded";
    pub const STAGE_COMPLETED: &str = "flow.stage_completed";
    pub const FLOW_COMPLETED: &str = "flow.completed";
}

/// Limits applied to flow definitions
pub mod limits {
    /// Maximum number of stages a single document flow may declare
    pub const MAX_STAGES_PER_FLOW: usize = 64;
}

/// Signer roles that can be required by a flow stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerRole {
    /// Operational staff
    #[serde(alias = "operational", alias = "operativo")]
    Employer,
    /// Coordinators
    #[serde(alias = "coordinator", alias = "coordinador")]
    Management,
    /// Deputy administrators
    SubAdmin,
    /// Administrators, the only role allowed to define flows
    Admin,
}

impl SignerRole {
    pub const ALL: [SignerRole; 4] = [
        Self::Employer,
        Self::Management,
        Self::SubAdmin,
        Self::Admin,
    ];

    /// Persisted code for this role
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employer => "employer",
            Self::Management => "management",
            Self::SubAdmin => "sub_admin",
            Self::Admin => "admin",
        }
    }

    /// Human-readable name shown next to a stage
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Employer => "Operativo",
            Self::Management => "Coordinador",
            Self::SubAdmin => "Sub-Administrador",
            Self::Admin => "Administrador",
        }
    }

    /// Whether this role may create or replace a document flow
    pub fn can_define_flows(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for SignerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SignerRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "employer" | "operational" | "operativo" => Ok(Self::Employer),
            "management" | "coordinator" | "coordinador" => Ok(Self::Management),
            "sub_admin" => Ok(Self::SubAdmin),
            "admin" => Ok(Self::Admin),
            other => Err(format!("Invalid signer role: {other}")),
        }
    }
}

/// Status of the external document entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    /// Awaiting signatures; the only status surfaced in pending lists
    Pending,
    /// Every stage of the flow met its quota
    Signed,
    Rejected,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Signed => "signed",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "pending" => Ok(Self::Pending),
            "signed" => Ok(Self::Signed),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("Invalid document status: {s}")),
        }
    }
}
