use crate::catalogue::{CatalogueDefinition, CatalogueEntry};
use crate::security::AdminPermission;

const CRUD_ACTIONS: &[(&str, &str)] = &[
    ("view", "View"),
    ("create", "Create"),
    ("update", "Update"),
    ("delete", "Delete"),
];

const BUSINESS_MODULES: &[(&str, &str)] = &[
    ("enterprise", "Enterprises"),
    ("department", "Departments"),
    ("user", "Users"),
    ("client", "Clients"),
    ("quotation", "Quotations"),
    ("settlement", "Settlements"),
    ("file", "Files"),
];

/// Returns the catalogue shipped with the service.
///
/// Used when no definition file is configured.
#[must_use]
pub fn builtin_catalogue_definition() -> CatalogueDefinition {
    let mut permissions: Vec<CatalogueEntry> = BUSINESS_MODULES
        .iter()
        .map(|(module, label)| module_entry(module, label, CRUD_ACTIONS))
        .collect();

    permissions.push(
        module_entry("project", "Projects", CRUD_ACTIONS).with_children(vec![
            module_entry("project.task", "Tasks", CRUD_ACTIONS),
        ]),
    );

    permissions.push(CatalogueEntry::new("security", "Security").with_children(
        AdminPermission::all()
            .iter()
            .map(|permission| CatalogueEntry::new(permission.as_str(), permission.label()))
            .collect(),
    ));

    CatalogueDefinition { permissions }
}

fn module_entry(module: &str, label: &str, actions: &[(&str, &str)]) -> CatalogueEntry {
    CatalogueEntry::new(module, label).with_children(
        actions
            .iter()
            .map(|(action, action_label)| {
                CatalogueEntry::new(
                    format!("{module}.{action}"),
                    format!("{action_label} {}", label.to_lowercase()),
                )
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use crate::{AdminPermission, PermissionCatalogue};

    use super::builtin_catalogue_definition;

    #[test]
    fn builtin_catalogue_loads_and_contains_admin_permissions() {
        let catalogue = PermissionCatalogue::load(&builtin_catalogue_definition(), 1);
        assert!(catalogue.is_ok());
        let Ok(catalogue) = catalogue else {
            return;
        };

        for permission in AdminPermission::all() {
            assert!(catalogue.exists(permission.as_str()));
        }
        assert!(catalogue.exists("project.task.delete"));
        assert_eq!(
            catalogue
                .node("project.task")
                .ok()
                .and_then(|node| node.parent_id()),
            Some("project")
        );
    }
}
