use qryvanta_application::PrincipalAssignmentRepository;
use qryvanta_core::AppResult;
use qryvanta_domain::AdminPermission;
use tracing::info;

use crate::api_config::BootstrapAdminConfig;

/// Grants every administrative permission directly to the bootstrap principal.
///
/// Existing groups and overrides are kept; admin ids are removed from the
/// revoked set.
pub(super) async fn seed_bootstrap_admin(
    assignments: &dyn PrincipalAssignmentRepository,
    admin: &BootstrapAdminConfig,
) -> AppResult<()> {
    let mut assignment = assignments
        .find_assignment(admin.tenant_id, admin.subject.as_str())
        .await?;

    for permission in AdminPermission::all() {
        assignment
            .direct_permission_ids
            .insert(permission.as_str().to_owned());
        assignment.revoked_permission_ids.remove(permission.as_str());
    }

    assignments
        .save_assignment(admin.tenant_id, admin.subject.as_str(), assignment)
        .await?;

    info!(
        subject = %admin.subject,
        tenant_id = %admin.tenant_id,
        "bootstrap administrator seeded"
    );
    Ok(())
}
