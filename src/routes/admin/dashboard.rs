use axum::{extract::State, response::IntoResponse};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    core::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
    },
    services::staff::DashboardStats,
};

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(get_dashboard))
}

/// Today's orders and sales, pending orders, customers and active staff.
#[utoipa::path(
    get,
    path = "/dashboard",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Dashboard counters", body = StdResponse<DashboardStats, String>)
    )
)]
async fn get_dashboard(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stats = state.staff.dashboard().await?;

    Ok(StdResponse {
        data: Some(stats),
        message: Some("Get dashboard successfully"),
    })
}
