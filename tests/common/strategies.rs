#![allow(dead_code)]

use chrono::Utc;
use proptest::prelude::*;
use signflow_core::constants::SignerRole;
use signflow_core::models::{FlowStage, StageDefinition};
use uuid::Uuid;

/// Strategy for generating signer roles
pub fn signer_role_strategy() -> impl Strategy<Value = SignerRole> {
    prop::sample::select(SignerRole::ALL.to_vec())
}

/// Strategy for generating valid stage definitions (duplicate orders allowed)
pub fn stage_definition_strategy() -> impl Strategy<Value = StageDefinition> {
    (signer_role_strategy(), 1i32..=4, 1i32..=5)
        .prop_map(|(role, count, order)| StageDefinition::new(role, count, order))
}

pub fn flow_definition_strategy() -> impl Strategy<Value = Vec<StageDefinition>> {
    prop::collection::vec(stage_definition_strategy(), 1..=6)
}

/// Strategy for generating persisted stages at arbitrary, in-bounds progress
pub fn flow_stages_strategy() -> impl Strategy<Value = Vec<FlowStage>> {
    prop::collection::vec(
        (signer_role_strategy(), 1i32..=4, 1i32..=5, 0i32..=4),
        1..=6,
    )
    .prop_map(|rows| {
        let document_id = Uuid::new_v4();
        let created_at = Utc::now();
        rows.into_iter()
            .enumerate()
            .map(|(index, (role, required_count, flow_order, current))| FlowStage {
                flow_stage_id: index as i64 + 1,
                document_id,
                role,
                required_count,
                current_count: current.min(required_count),
                flow_order,
                created_at,
            })
            .collect()
    })
}
