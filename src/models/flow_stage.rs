//! # Flow Stage Model
//!
//! One quota of signatures required from a single role, positioned in a
//! document's signing sequence by `flow_order`.
//!
//! ## Database Schema
//!
//! Maps to `signature_flow_stages`:
//! ```sql
//! CREATE TABLE signature_flow_stages (
//!   flow_stage_id BIGSERIAL PRIMARY KEY,
//!   document_id UUID NOT NULL,
//!   role TEXT NOT NULL,
//!   required_count INTEGER NOT NULL CHECK (required_count > 0),
//!   current_count INTEGER NOT NULL DEFAULT 0,
//!   flow_order INTEGER NOT NULL,
//!   created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! Stages are ordered by `(flow_order, flow_stage_id)`; the id breaks ties
//! between equal orders in insertion order.

use crate::constants::SignerRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// A persisted stage of a document's signature flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStage {
    pub flow_stage_id: i64,
    pub document_id: Uuid,
    pub role: SignerRole,
    pub required_count: i32,
    /// Never decreases and never exceeds `required_count`
    pub current_count: i32,
    pub flow_order: i32,
    pub created_at: DateTime<Utc>,
}

impl FlowStage {
    pub fn is_complete(&self) -> bool {
        self.current_count >= self.required_count
    }

    pub fn remaining_signatures(&self) -> i32 {
        (self.required_count - self.current_count).max(0)
    }

    /// Sequence ordering used everywhere stages are listed
    pub fn sequence_cmp(&self, other: &Self) -> Ordering {
        self.flow_order
            .cmp(&other.flow_order)
            .then(self.flow_stage_id.cmp(&other.flow_stage_id))
    }
}

/// Caller-supplied stage definition used when creating a flow.
///
/// The wire shape is `{ "role": "employer", "count": 2, "order": 1 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub role: SignerRole,
    #[serde(rename = "count", alias = "required_count")]
    pub required_count: i32,
    #[serde(rename = "order", alias = "flow_order")]
    pub flow_order: i32,
}

impl StageDefinition {
    pub fn new(role: SignerRole, required_count: i32, flow_order: i32) -> Self {
        Self {
            role,
            required_count,
            flow_order,
        }
    }
}
