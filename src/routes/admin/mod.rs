//! Back-office panel. Every route except `/admin/login` requires a staff
//! token signed with the admin secret.

pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod employees;
pub mod menu;

use utoipa_axum::router::OpenApiRouter;

use crate::{
    auth::StaffClaims,
    core::{app_error::AppError, app_state::AppState, middleware::staff_authorization},
    domain::StaffRole,
};

pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    let protected = OpenApiRouter::new()
        .merge(auth::protected_routes())
        .merge(customers::routes())
        .merge(dashboard::routes())
        .merge(employees::routes())
        .merge(menu::routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            staff_authorization,
        ));

    OpenApiRouter::new().nest("/admin", auth::public_routes().merge(protected))
}

/// Employee management is limited to admins and managers.
pub(crate) fn ensure_staff_manager(claims: &StaffClaims) -> Result<StaffRole, AppError> {
    StaffRole::from_column(&claims.rol)
        .filter(|role| role.manages_staff())
        .ok_or_else(|| {
            AppError::ForbiddenResource(
                "Solo administradores o gerentes pueden gestionar empleados".into(),
            )
        })
}
