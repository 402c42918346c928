use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    core::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
    },
    models::CategoryEntity,
    services::menu::{BeverageView, FoodView, MenuItem, PromotionView},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/menu",
        OpenApiRouter::new()
            .routes(routes!(get_menu))
            .routes(routes!(get_menu_item))
            .routes(routes!(get_categories))
            .routes(routes!(get_foods))
            .routes(routes!(get_food))
            .routes(routes!(get_beverages))
            .routes(routes!(get_beverage))
            .routes(routes!(get_promotions)),
    )
}

/// Available food and beverages, each tagged with its `tipo`.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Menu"],
    responses(
        (status = 200, description = "Full menu", body = StdResponse<Vec<MenuItem>, String>)
    )
)]
async fn get_menu(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let menu = state.menu.full_menu().await?;

    Ok(StdResponse {
        data: Some(menu),
        message: Some("Get menu successfully"),
    })
}

/// Food with the given id, falling back to the beverage with that id.
#[utoipa::path(
    get,
    path = "/menu/{id}",
    tags = ["Menu"],
    params(("id" = i32, Path, description = "Food or beverage ID")),
    responses(
        (status = 200, description = "Menu item", body = StdResponse<MenuItem, String>),
        (status = 404, description = "Neither food nor beverage has this ID")
    )
)]
async fn get_menu_item(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let item = state.menu.menu_item(id).await?;

    Ok(StdResponse {
        data: Some(item),
        message: Some("Get menu item successfully"),
    })
}

#[utoipa::path(
    get,
    path = "/categorias",
    tags = ["Menu"],
    responses(
        (status = 200, description = "Food categories", body = StdResponse<Vec<CategoryEntity>, String>)
    )
)]
async fn get_categories(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let categories = state.menu.categories().await?;

    Ok(StdResponse {
        data: Some(categories),
        message: Some("Get categories successfully"),
    })
}

#[utoipa::path(
    get,
    path = "/comidas",
    tags = ["Menu"],
    responses(
        (status = 200, description = "Available food", body = StdResponse<Vec<FoodView>, String>)
    )
)]
async fn get_foods(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let foods = state.menu.foods().await?;

    Ok(StdResponse {
        data: Some(foods),
        message: Some("Get foods successfully"),
    })
}

#[utoipa::path(
    get,
    path = "/comidas/{id}",
    tags = ["Menu"],
    params(("id" = i32, Path, description = "Food ID")),
    responses(
        (status = 200, description = "Food item", body = StdResponse<FoodView, String>),
        (status = 404, description = "Food not found")
    )
)]
async fn get_food(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let food = state.menu.food(id).await?;

    Ok(StdResponse {
        data: Some(food),
        message: Some("Get food successfully"),
    })
}

#[utoipa::path(
    get,
    path = "/bebidas",
    tags = ["Menu"],
    responses(
        (status = 200, description = "Available beverages", body = StdResponse<Vec<BeverageView>, String>)
    )
)]
async fn get_beverages(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let beverages = state.menu.beverages().await?;

    Ok(StdResponse {
        data: Some(beverages),
        message: Some("Get beverages successfully"),
    })
}

#[utoipa::path(
    get,
    path = "/bebidas/{id}",
    tags = ["Menu"],
    params(("id" = i32, Path, description = "Beverage ID")),
    responses(
        (status = 200, description = "Beverage", body = StdResponse<BeverageView, String>),
        (status = 404, description = "Beverage not found")
    )
)]
async fn get_beverage(
    Path(id): Path<i32>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let beverage = state.menu.beverage(id).await?;

    Ok(StdResponse {
        data: Some(beverage),
        message: Some("Get beverage successfully"),
    })
}

/// Active promotions with the products they bundle.
#[utoipa::path(
    get,
    path = "/promociones",
    tags = ["Menu"],
    responses(
        (status = 200, description = "Active promotions", body = StdResponse<Vec<PromotionView>, String>)
    )
)]
async fn get_promotions(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let promotions = state.menu.promotions().await?;

    Ok(StdResponse {
        data: Some(promotions),
        message: Some("Get promotions successfully"),
    })
}
