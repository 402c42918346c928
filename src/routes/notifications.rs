use axum::{
    Extension,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    core::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware::customers_authorization,
    },
    models::NotificationEntity,
    routes::ensure_owner,
    services::notifications::NotificationView,
};

pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/notificaciones",
        OpenApiRouter::new()
            .routes(routes!(get_inbox))
            .routes(routes!(mark_read))
            .routes(routes!(mark_all_read))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                customers_authorization,
            )),
    )
}

/// Latest notifications of the customer with their receipt numbers.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Notifications"],
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Inbox", body = StdResponse<Vec<NotificationView>, String>),
        (status = 403, description = "Inbox of another customer")
    )
)]
async fn get_inbox(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(cliente_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    ensure_owner(cliente_id, id)?;

    let notifications = state.notifications.inbox(id).await?;

    Ok(StdResponse {
        data: Some(notifications),
        message: Some("Get notifications successfully"),
    })
}

#[utoipa::path(
    put,
    path = "/{id}/leer",
    tags = ["Notifications"],
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Marked as read", body = StdResponse<NotificationEntity, String>),
        (status = 404, description = "Notification not found among the customer's")
    )
)]
async fn mark_read(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(cliente_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let notification = state.notifications.mark_read(cliente_id, id).await?;

    Ok(StdResponse {
        data: Some(notification),
        message: Some("Notificación marcada como leída"),
    })
}

#[derive(Serialize, Debug, ToSchema)]
struct MarkAllReadRes {
    actualizadas: usize,
}

#[utoipa::path(
    put,
    path = "/cliente/{cliente_id}/leer-todas",
    tags = ["Notifications"],
    security(("bearerAuth" = [])),
    params(("cliente_id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "All marked as read", body = StdResponse<MarkAllReadRes, String>),
        (status = 403, description = "Inbox of another customer")
    )
)]
async fn mark_all_read(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(cliente_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    ensure_owner(cliente_id, id)?;

    let actualizadas = state.notifications.mark_all_read(id).await?;

    Ok(StdResponse {
        data: Some(MarkAllReadRes { actualizadas }),
        message: Some("Notificaciones marcadas como leídas"),
    })
}
