use axum::Router;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use qryvanta_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

use cors::build_cors_layer;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route(
            "/api/permissions/tree",
            get(handlers::permissions::permission_tree_handler),
        )
        .route(
            "/api/permissions/all",
            get(handlers::permissions::all_permissions_handler),
        )
        .route(
            "/api/permissions/validate",
            post(handlers::permissions::validate_permissions_handler),
        )
        .route(
            "/api/permissions/nodes/{permission_id}",
            get(handlers::permissions::permission_node_handler),
        )
        .route(
            "/api/permissions/effective",
            get(handlers::permissions::own_effective_permissions_handler),
        )
        .route(
            "/api/permissions/catalogue/reload",
            post(handlers::permissions::reload_catalogue_handler),
        )
        .route(
            "/api/permission-groups",
            get(handlers::permission_groups::list_permission_groups_handler)
                .post(handlers::permission_groups::create_permission_group_handler),
        )
        .route(
            "/api/permission-groups/{group_id}",
            get(handlers::permission_groups::get_permission_group_handler)
                .put(handlers::permission_groups::update_permission_group_handler)
                .delete(handlers::permission_groups::delete_permission_group_handler),
        )
        .route(
            "/api/permission-groups/{group_id}/default",
            post(handlers::permission_groups::set_default_permission_group_handler),
        )
        .route(
            "/api/security/principals/{subject}/assignment",
            get(handlers::principals::get_principal_assignment_handler)
                .put(handlers::principals::save_principal_assignment_handler),
        )
        .route(
            "/api/security/principals/{subject}/effective",
            get(handlers::principals::principal_effective_permissions_handler),
        )
        .layer(from_fn(middleware::require_identity));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(frontend_url)?)
        .with_state(app_state))
}
