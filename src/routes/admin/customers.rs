use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    core::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
    },
    services::customers::{CustomerMatch, CustomerStats, CustomerSummary},
};

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/clientes",
        OpenApiRouter::new()
            .routes(routes!(get_customers))
            .routes(routes!(get_customer_stats))
            .routes(routes!(search_customers)),
    )
}

/// Every customer, newest first, with order count and total spent.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Customers", body = StdResponse<Vec<CustomerSummary>, String>)
    )
)]
async fn get_customers(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let customers = state.customers.list_with_orders().await?;

    Ok(StdResponse {
        data: Some(customers),
        message: Some("Get customers successfully"),
    })
}

#[utoipa::path(
    get,
    path = "/estadisticas",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Customer statistics", body = StdResponse<CustomerStats, String>)
    )
)]
async fn get_customer_stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stats = state.customers.stats().await?;

    Ok(StdResponse {
        data: Some(stats),
        message: Some("Get customer statistics successfully"),
    })
}

#[derive(Deserialize, Debug, IntoParams)]
struct SearchQuery {
    /// At least two characters of a name, username, e-mail or phone.
    q: Option<String>,
}

#[utoipa::path(
    get,
    path = "/buscar",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching customers", body = StdResponse<Vec<CustomerMatch>, String>),
        (status = 400, description = "Search term too short")
    )
)]
async fn search_customers(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let matches = state
        .customers
        .search(query.q.as_deref().unwrap_or_default())
        .await?;

    Ok(StdResponse {
        data: Some(matches),
        message: Some("Search customers successfully"),
    })
}
