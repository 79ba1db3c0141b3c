//! # Flow State Transitions
//!
//! Pure decision logic over a document's loaded stages. Nothing here touches
//! storage: the engine loads rows inside a transaction scope, asks these
//! functions what may happen, and writes the outcome back in the same scope.
//!
//! A stage is *active* when it is incomplete and every stage before it in
//! sequence order `(flow_order, flow_stage_id)` has met its quota.

use crate::constants::{limits, SignerRole};
use crate::error::{FlowError, FlowResult};
use crate::models::{
    DocumentSignature, FlowProgress, FlowStage, FlowStageView, StageDefinition, StageSignature,
};

/// Reject empty definitions and non-positive quotas
pub fn validate_definition(stages: &[StageDefinition]) -> FlowResult<()> {
    if stages.is_empty() {
        return Err(FlowError::validation(
            "at least one signature stage is required",
        ));
    }

    if stages.len() > limits::MAX_STAGES_PER_FLOW {
        return Err(FlowError::validation(format!(
            "a flow may declare at most {} stages, got {}",
            limits::MAX_STAGES_PER_FLOW,
            stages.len()
        )));
    }

    if let Some(stage) = stages.iter().find(|s| s.required_count <= 0) {
        return Err(FlowError::validation(format!(
            "stage for role '{}' at order {} must require at least one signature, got {}",
            stage.role, stage.flow_order, stage.required_count
        )));
    }

    Ok(())
}

/// The earliest incomplete stage, if any
pub fn find_active_stage(stages: &[FlowStage]) -> Option<&FlowStage> {
    stages
        .iter()
        .filter(|stage| !stage.is_complete())
        .min_by(|a, b| a.sequence_cmp(b))
}

/// The stage immediately following `current` in sequence order
pub fn next_stage_after<'a>(stages: &'a [FlowStage], current: &FlowStage) -> Option<&'a FlowStage> {
    stages
        .iter()
        .filter(|stage| stage.sequence_cmp(current).is_gt())
        .min_by(|a, b| a.sequence_cmp(b))
}

/// Decide whether a signer holding `role` may sign now.
///
/// Returns the active stage the signature will count towards. Signers whose
/// role matches a later stage are rejected until that stage becomes active.
pub fn admit_signature(stages: &[FlowStage], role: SignerRole) -> FlowResult<&FlowStage> {
    if stages.is_empty() {
        return Err(FlowError::NoFlowDefined);
    }

    let active = find_active_stage(stages).ok_or(FlowError::FlowAlreadyComplete)?;

    if active.role != role {
        return Err(FlowError::RoleMismatch {
            required: active.role,
        });
    }

    Ok(active)
}

/// The active stage, when it requires `role`.
///
/// A document is pending for a role exactly when `admit_signature` would
/// accept that role, so ties in `flow_order` resolve the same way.
pub fn pending_stage_for_role(stages: &[FlowStage], role: SignerRole) -> Option<&FlowStage> {
    find_active_stage(stages).filter(|stage| stage.role == role)
}

/// Annotate stages with completion state and role-attributed signatures.
///
/// Signatures are attributed by role, so two stages sharing a role list the
/// same signatures.
pub fn build_stage_views(
    stages: &[FlowStage],
    signatures: &[DocumentSignature],
) -> Vec<FlowStageView> {
    let mut ordered: Vec<&FlowStage> = stages.iter().collect();
    ordered.sort_by(|a, b| a.sequence_cmp(b));

    let active_id = find_active_stage(stages).map(|stage| stage.flow_stage_id);

    ordered
        .into_iter()
        .map(|stage| FlowStageView {
            flow_stage_id: stage.flow_stage_id,
            role: stage.role,
            role_name: stage.role.display_name().to_string(),
            required_count: stage.required_count,
            current_count: stage.current_count,
            flow_order: stage.flow_order,
            completed: stage.is_complete(),
            is_active: Some(stage.flow_stage_id) == active_id,
            signatures: signatures
                .iter()
                .filter(|signature| signature.role == stage.role)
                .map(StageSignature::from)
                .collect(),
        })
        .collect()
}

pub fn flow_progress(views: &[FlowStageView]) -> FlowProgress {
    let total_required: i64 = views.iter().map(|v| i64::from(v.required_count)).sum();
    let total_signed: i64 = views
        .iter()
        .map(|v| i64::from(v.current_count.min(v.required_count)))
        .sum();
    let completed_stages = views.iter().filter(|v| v.completed).count();

    let percent_complete = if total_required > 0 {
        (total_signed as f64 / total_required as f64) * 100.0
    } else {
        0.0
    };

    FlowProgress {
        total_required,
        total_signed,
        completed_stages,
        total_stages: views.len(),
        percent_complete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn stage(id: i64, role: SignerRole, order: i32, required: i32, current: i32) -> FlowStage {
        FlowStage {
            flow_stage_id: id,
            document_id: Uuid::nil(),
            role,
            required_count: required,
            current_count: current,
            flow_order: order,
            created_at: Utc::now(),
        }
    }

    fn signature(role: SignerRole, name: &str) -> DocumentSignature {
        DocumentSignature {
            role,
            user_id: Uuid::new_v4(),
            user_name: Some(name.to_string()),
            signed_at: Utc::now(),
        }
    }

    #[test]
    fn test_validate_definition() {
        assert!(matches!(
            validate_definition(&[]),
            Err(FlowError::Validation(_))
        ));
        assert!(matches!(
            validate_definition(&[StageDefinition::new(SignerRole::Employer, 0, 1)]),
            Err(FlowError::Validation(_))
        ));
        assert!(validate_definition(&[
            StageDefinition::new(SignerRole::Employer, 2, 1),
            StageDefinition::new(SignerRole::Management, 1, 2),
        ])
        .is_ok());

        let too_many: Vec<_> = (0..=limits::MAX_STAGES_PER_FLOW as i32)
            .map(|order| StageDefinition::new(SignerRole::Admin, 1, order))
            .collect();
        assert!(validate_definition(&too_many).is_err());
    }

    #[test]
    fn test_active_stage_is_earliest_incomplete() {
        let stages = vec![
            stage(3, SignerRole::Admin, 3, 1, 0),
            stage(1, SignerRole::Employer, 1, 2, 2),
            stage(2, SignerRole::Management, 2, 1, 0),
        ];
        assert_eq!(find_active_stage(&stages).unwrap().flow_stage_id, 2);

        let done = vec![stage(1, SignerRole::Employer, 1, 1, 1)];
        assert!(find_active_stage(&done).is_none());
    }

    #[test]
    fn test_next_stage_uses_sequence_order() {
        let stages = vec![
            stage(1, SignerRole::Employer, 1, 1, 1),
            stage(2, SignerRole::Management, 1, 1, 0),
            stage(3, SignerRole::Admin, 5, 1, 0),
        ];
        assert_eq!(next_stage_after(&stages, &stages[0]).unwrap().flow_stage_id, 2);
        assert_eq!(next_stage_after(&stages, &stages[1]).unwrap().flow_stage_id, 3);
        assert!(next_stage_after(&stages, &stages[2]).is_none());
    }

    #[test]
    fn test_admission_rules() {
        assert_eq!(
            admit_signature(&[], SignerRole::Employer),
            Err(FlowError::NoFlowDefined)
        );

        let stages = vec![
            stage(1, SignerRole::Employer, 1, 1, 0),
            stage(2, SignerRole::Management, 2, 1, 0),
        ];
        assert_eq!(
            admit_signature(&stages, SignerRole::Management),
            Err(FlowError::RoleMismatch {
                required: SignerRole::Employer
            })
        );
        assert_eq!(
            admit_signature(&stages, SignerRole::Employer)
                .unwrap()
                .flow_stage_id,
            1
        );

        let complete = vec![stage(1, SignerRole::Employer, 1, 1, 1)];
        assert_eq!(
            admit_signature(&complete, SignerRole::Employer),
            Err(FlowError::FlowAlreadyComplete)
        );
    }

    #[test]
    fn test_pending_stage_requires_earlier_stages_complete() {
        let stages = vec![
            stage(1, SignerRole::Employer, 1, 2, 1),
            stage(2, SignerRole::Management, 2, 1, 0),
        ];
        assert_eq!(
            pending_stage_for_role(&stages, SignerRole::Employer)
                .unwrap()
                .flow_stage_id,
            1
        );
        assert!(pending_stage_for_role(&stages, SignerRole::Management).is_none());

        let advanced = vec![
            stage(1, SignerRole::Employer, 1, 2, 2),
            stage(2, SignerRole::Management, 2, 1, 0),
        ];
        assert!(pending_stage_for_role(&advanced, SignerRole::Employer).is_none());
        assert_eq!(
            pending_stage_for_role(&advanced, SignerRole::Management)
                .unwrap()
                .flow_stage_id,
            2
        );
    }

    #[test]
    fn test_pending_stage_with_tied_orders_follows_insertion() {
        let stages = vec![
            stage(1, SignerRole::Employer, 1, 1, 0),
            stage(2, SignerRole::Management, 1, 1, 0),
        ];
        assert!(pending_stage_for_role(&stages, SignerRole::Management).is_none());
        assert_eq!(
            pending_stage_for_role(&stages, SignerRole::Employer)
                .unwrap()
                .flow_stage_id,
            1
        );
    }

    #[test]
    fn test_stage_views_attribute_signatures_by_role() {
        let stages = vec![
            stage(2, SignerRole::Management, 2, 1, 0),
            stage(1, SignerRole::Employer, 1, 2, 2),
        ];
        let signatures = vec![
            signature(SignerRole::Employer, "Ana"),
            signature(SignerRole::Employer, "Luis"),
        ];

        let views = build_stage_views(&stages, &signatures);
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].flow_order, 1);
        assert!(views[0].completed);
        assert!(!views[0].is_active);
        assert_eq!(views[0].signatures.len(), 2);
        assert_eq!(views[0].role_name, "Operativo");

        assert!(!views[1].completed);
        assert!(views[1].is_active);
        assert!(views[1].signatures.is_empty());
    }

    #[test]
    fn test_flow_progress() {
        let stages = vec![
            stage(1, SignerRole::Employer, 1, 2, 2),
            stage(2, SignerRole::Management, 2, 2, 1),
        ];
        let progress = flow_progress(&build_stage_views(&stages, &[]));
        assert_eq!(progress.total_required, 4);
        assert_eq!(progress.total_signed, 3);
        assert_eq!(progress.completed_stages, 1);
        assert_eq!(progress.total_stages, 2);
        assert!((progress.percent_complete - 75.0).abs() < f64::EPSILON);

        let empty = flow_progress(&[]);
        assert_eq!(empty.total_stages, 0);
        assert_eq!(empty.percent_complete, 0.0);
    }
}
