use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    core::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        extract::AppJson,
    },
    models::{
        BeverageEntity, CreateBeverageEntity, CreateFoodEntity, FoodEntity, UpdateBeverageEntity,
        UpdateFoodEntity,
    },
};

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/menu",
        OpenApiRouter::new()
            .routes(routes!(create_food))
            .routes(routes!(update_food, disable_food))
            .routes(routes!(create_beverage))
            .routes(routes!(update_beverage, disable_beverage)),
    )
}

#[utoipa::path(
    post,
    path = "/comidas",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    request_body = CreateFoodEntity,
    responses(
        (status = 201, description = "Food created", body = StdResponse<FoodEntity, String>),
        (status = 400, description = "Missing name or invalid price")
    )
)]
async fn create_food(
    State(state): State<AppState>,
    AppJson(food): AppJson<CreateFoodEntity>,
) -> Result<impl IntoResponse, AppError> {
    let food = state.menu.create_food(food).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(food),
            message: Some("Comida creada exitosamente"),
        },
    ))
}

#[utoipa::path(
    put,
    path = "/comidas/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Food ID")),
    request_body = UpdateFoodEntity,
    responses(
        (status = 200, description = "Food updated", body = StdResponse<FoodEntity, String>),
        (status = 404, description = "Food not found")
    )
)]
async fn update_food(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    AppJson(changes): AppJson<UpdateFoodEntity>,
) -> Result<impl IntoResponse, AppError> {
    let food = state.menu.update_food(id, changes).await?;

    Ok(StdResponse {
        data: Some(food),
        message: Some("Comida actualizada exitosamente"),
    })
}

/// Marks the food as unavailable.
#[utoipa::path(
    delete,
    path = "/comidas/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Food ID")),
    responses(
        (status = 200, description = "Food disabled", body = StdResponse<FoodEntity, String>),
        (status = 404, description = "Food not found")
    )
)]
async fn disable_food(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let food = state.menu.disable_food(id).await?;

    Ok(StdResponse {
        data: Some(food),
        message: Some("Comida eliminada exitosamente"),
    })
}

#[utoipa::path(
    post,
    path = "/bebidas",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    request_body = CreateBeverageEntity,
    responses(
        (status = 201, description = "Beverage created", body = StdResponse<BeverageEntity, String>),
        (status = 400, description = "Missing name or invalid price")
    )
)]
async fn create_beverage(
    State(state): State<AppState>,
    AppJson(beverage): AppJson<CreateBeverageEntity>,
) -> Result<impl IntoResponse, AppError> {
    let beverage = state.menu.create_beverage(beverage).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(beverage),
            message: Some("Bebida creada exitosamente"),
        },
    ))
}

#[utoipa::path(
    put,
    path = "/bebidas/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Beverage ID")),
    request_body = UpdateBeverageEntity,
    responses(
        (status = 200, description = "Beverage updated", body = StdResponse<BeverageEntity, String>),
        (status = 404, description = "Beverage not found")
    )
)]
async fn update_beverage(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    AppJson(changes): AppJson<UpdateBeverageEntity>,
) -> Result<impl IntoResponse, AppError> {
    let beverage = state.menu.update_beverage(id, changes).await?;

    Ok(StdResponse {
        data: Some(beverage),
        message: Some("Bebida actualizada exitosamente"),
    })
}

#[utoipa::path(
    delete,
    path = "/bebidas/{id}",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Beverage ID")),
    responses(
        (status = 200, description = "Beverage disabled", body = StdResponse<BeverageEntity, String>),
        (status = 404, description = "Beverage not found")
    )
)]
async fn disable_beverage(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let beverage = state.menu.disable_beverage(id).await?;

    Ok(StdResponse {
        data: Some(beverage),
        message: Some("Bebida eliminada exitosamente"),
    })
}
