use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    auth::StaffClaims,
    core::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        extract::AppJson,
    },
    domain::StaffRole,
    models::{StaffProfile, UpdateStaffEntity},
    routes::admin::ensure_staff_manager,
    services::staff::NewEmployee,
};

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/empleados",
        OpenApiRouter::new()
            .routes(routes!(get_employees, create_employee))
            .routes(routes!(update_employee, deactivate_employee)),
    )
}

#[utoipa::path(
    get,
    path = "/",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Employees", body = StdResponse<Vec<StaffProfile>, String>)
    )
)]
async fn get_employees(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let employees = state.staff.list_employees().await?;

    Ok(StdResponse {
        data: Some(employees),
        message: Some("Get employees successfully"),
    })
}

#[derive(Deserialize, Debug, ToSchema)]
struct CreateEmployeeReq {
    nombre: String,
    apellido: String,
    email: String,
    telefono: Option<String>,
    usuario: String,
    contrasena: String,
    /// `admin`, `gerente` or `cajero`.
    rol: String,
    puesto: Option<String>,
    establecimiento_id: Option<i32>,
}

impl TryFrom<CreateEmployeeReq> for NewEmployee {
    type Error = AppError;

    fn try_from(req: CreateEmployeeReq) -> Result<Self, Self::Error> {
        let rol = StaffRole::from_column(req.rol.trim())
            .ok_or_else(|| AppError::BadRequest(format!("Rol inválido: {}", req.rol)))?;

        Ok(Self {
            nombre: req.nombre,
            apellido: req.apellido,
            email: req.email,
            telefono: req.telefono,
            usuario: req.usuario,
            contrasena: req.contrasena,
            rol,
            puesto: req.puesto,
            establecimiento_id: req.establecimiento_id,
        })
    }
}

#[utoipa::path(
    post,
    path = "/",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    request_body = CreateEmployeeReq,
    responses(
        (status = 201, description = "Employee created", body = StdResponse<StaffProfile, String>),
        (status = 400, description = "Missing fields, unknown role or duplicated user"),
        (status = 403, description = "Caller cannot manage staff")
    )
)]
async fn create_employee(
    State(state): State<AppState>,
    Extension(claims): Extension<StaffClaims>,
    AppJson(req): AppJson<CreateEmployeeReq>,
) -> Result<impl IntoResponse, AppError> {
    ensure_staff_manager(&claims)?;
    let employee = NewEmployee::try_from(req)?;

    let profile = state.staff.create_employee(claims.id, employee).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(profile),
            message: Some("Empleado creado exitosamente"),
        },
    ))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Employee ID")),
    request_body = UpdateStaffEntity,
    responses(
        (status = 200, description = "Employee updated", body = StdResponse<StaffProfile, String>),
        (status = 400, description = "Nothing to update or unknown role"),
        (status = 403, description = "Caller cannot manage staff"),
        (status = 404, description = "Employee not found")
    )
)]
async fn update_employee(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(claims): Extension<StaffClaims>,
    AppJson(changes): AppJson<UpdateStaffEntity>,
) -> Result<impl IntoResponse, AppError> {
    ensure_staff_manager(&claims)?;

    let profile = state.staff.update_employee(claims.id, id, changes).await?;

    Ok(StdResponse {
        data: Some(profile),
        message: Some("Empleado actualizado exitosamente"),
    })
}

/// Deactivates the account. The row is kept for the audit trail.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee deactivated", body = StdResponse<StaffProfile, String>),
        (status = 400, description = "Own account"),
        (status = 403, description = "Caller cannot manage staff"),
        (status = 404, description = "Employee not found")
    )
)]
async fn deactivate_employee(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(claims): Extension<StaffClaims>,
) -> Result<impl IntoResponse, AppError> {
    ensure_staff_manager(&claims)?;

    let profile = state.staff.deactivate_employee(claims.id, id).await?;

    Ok(StdResponse {
        data: Some(profile),
        message: Some("Empleado desactivado exitosamente"),
    })
}
