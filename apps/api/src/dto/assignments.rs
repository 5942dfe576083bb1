use std::collections::BTreeSet;

use qryvanta_core::AppError;
use qryvanta_domain::PrincipalPermissionAssignment;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Stored group assignment and overrides of a principal.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/principal-assignment-response.ts"
)]
pub struct PrincipalAssignmentResponse {
    pub subject: String,
    pub group_ids: Vec<String>,
    pub direct_permission_ids: Vec<String>,
    pub revoked_permission_ids: Vec<String>,
}

impl PrincipalAssignmentResponse {
    #[must_use]
    pub fn new(subject: &str, assignment: PrincipalPermissionAssignment) -> Self {
        Self {
            subject: subject.to_owned(),
            group_ids: assignment.group_ids.iter().map(ToString::to_string).collect(),
            direct_permission_ids: assignment.direct_permission_ids.into_iter().collect(),
            revoked_permission_ids: assignment.revoked_permission_ids.into_iter().collect(),
        }
    }
}

/// Incoming payload replacing a principal assignment.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/save-principal-assignment-request.ts"
)]
pub struct SavePrincipalAssignmentRequest {
    #[serde(default)]
    pub group_ids: Vec<String>,
    #[serde(default)]
    pub direct_permission_ids: Vec<String>,
    #[serde(default)]
    pub revoked_permission_ids: Vec<String>,
}

impl TryFrom<SavePrincipalAssignmentRequest> for PrincipalPermissionAssignment {
    type Error = AppError;

    fn try_from(value: SavePrincipalAssignmentRequest) -> Result<Self, Self::Error> {
        let group_ids = value
            .group_ids
            .iter()
            .map(|group_id| {
                Uuid::parse_str(group_id.trim()).map_err(|_| {
                    AppError::Validation(format!("'{group_id}' is not a valid group id"))
                })
            })
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Self {
            group_ids,
            direct_permission_ids: value.direct_permission_ids.into_iter().collect(),
            revoked_permission_ids: value.revoked_permission_ids.into_iter().collect(),
        })
    }
}
