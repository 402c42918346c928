use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    core::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        extract::AppJson,
        middleware::customers_authorization,
    },
    domain::ProductKind,
    models::CartLineEntity,
    routes::ensure_owner,
    services::{
        ServiceError,
        carts::{CartLine, NewCartItem, QuantityUpdate},
    },
};

pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/carrito",
        OpenApiRouter::new()
            .routes(routes!(get_cart))
            .routes(routes!(add_item))
            .routes(routes!(update_quantity))
            .routes(routes!(remove_item))
            .routes(routes!(clear_cart))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                customers_authorization,
            )),
    )
}

/// Lines of the customer's cart with current product names and images.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Cart lines", body = StdResponse<Vec<CartLine>, String>),
        (status = 403, description = "Cart belongs to another customer")
    )
)]
async fn get_cart(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(cliente_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    ensure_owner(cliente_id, id)?;

    let lines = state.carts.get_cart(id).await?;

    Ok(StdResponse {
        data: Some(lines),
        message: Some("Get cart successfully"),
    })
}

#[derive(Deserialize, Debug, ToSchema)]
struct AddItemReq {
    cliente_id: i32,
    producto_id: i32,
    /// `comida`, `bebida` or `promocion`.
    producto_tipo: String,
    #[serde(default = "one")]
    cantidad: i32,
    precio_unitario: Decimal,
}

fn one() -> i32 {
    1
}

/// Add a product to the cart. Adding a product already in the cart
/// increases its quantity.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    request_body = AddItemReq,
    responses(
        (status = 201, description = "Line created or merged", body = StdResponse<CartLineEntity, String>),
        (status = 400, description = "Invalid quantity, price or product kind"),
        (status = 404, description = "Product not found")
    )
)]
async fn add_item(
    State(state): State<AppState>,
    Extension(cliente_id): Extension<i32>,
    AppJson(req): AppJson<AddItemReq>,
) -> Result<impl IntoResponse, AppError> {
    ensure_owner(cliente_id, req.cliente_id)?;
    let producto_tipo: ProductKind = req.producto_tipo.parse().map_err(ServiceError::from)?;

    let line = state
        .carts
        .add_item(NewCartItem {
            cliente_id,
            producto_id: req.producto_id,
            producto_tipo,
            cantidad: req.cantidad,
            precio_unitario: req.precio_unitario,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(line),
            message: Some("Producto agregado al carrito"),
        },
    ))
}

#[derive(Deserialize, Debug, ToSchema)]
struct UpdateQuantityReq {
    cantidad: i32,
}

#[derive(Serialize, Debug, ToSchema)]
struct UpdateQuantityRes {
    eliminado: bool,
    linea: Option<CartLineEntity>,
}

/// Set the quantity of a cart line. Zero or less removes the line.
#[utoipa::path(
    put,
    path = "/{id}",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Cart line ID")),
    request_body = UpdateQuantityReq,
    responses(
        (status = 200, description = "Quantity updated or line removed", body = StdResponse<UpdateQuantityRes, String>),
        (status = 404, description = "Line not found in the customer's cart")
    )
)]
async fn update_quantity(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(cliente_id): Extension<i32>,
    AppJson(req): AppJson<UpdateQuantityReq>,
) -> Result<impl IntoResponse, AppError> {
    let res = match state
        .carts
        .update_quantity(cliente_id, id, req.cantidad)
        .await?
    {
        QuantityUpdate::Updated(line) => UpdateQuantityRes {
            eliminado: false,
            linea: Some(line),
        },
        QuantityUpdate::Removed => UpdateQuantityRes {
            eliminado: true,
            linea: None,
        },
    };

    Ok(StdResponse {
        data: Some(res),
        message: Some("Carrito actualizado"),
    })
}

/// Remove one line from the cart.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Cart line ID")),
    responses(
        (status = 200, description = "Line removed"),
        (status = 404, description = "Line not found in the customer's cart")
    )
)]
async fn remove_item(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(cliente_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    state.carts.remove_item(cliente_id, id).await?;

    Ok(StdResponse::<(), _> {
        data: None,
        message: Some("Producto eliminado del carrito"),
    })
}

#[derive(Serialize, Debug, ToSchema)]
struct ClearCartRes {
    eliminados: usize,
}

/// Empty the customer's cart.
#[utoipa::path(
    delete,
    path = "/cliente/{cliente_id}",
    tags = ["Cart"],
    security(("bearerAuth" = [])),
    params(("cliente_id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Cart emptied", body = StdResponse<ClearCartRes, String>),
        (status = 403, description = "Cart belongs to another customer")
    )
)]
async fn clear_cart(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(cliente_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    ensure_owner(cliente_id, id)?;

    let eliminados = state.carts.clear_cart(id).await?;

    Ok(StdResponse {
        data: Some(ClearCartRes { eliminados }),
        message: Some("Carrito vaciado"),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::Method;
    use chrono::Utc;
    use serde_json::json;
    use testresult::TestResult;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        routes::app,
        test_helpers::{
            Mocks, body_json, customer_token, empty_request, get_with_token, json_request,
            strict_state,
        },
    };

    #[tokio::test]
    async fn foreign_cart_is_forbidden() -> TestResult {
        let state = strict_state();
        let token = customer_token(&state, 7);

        let res = app(state)
            .oneshot(get_with_token("/carrito/8", &token))
            .await?;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        Ok(())
    }

    #[tokio::test]
    async fn adding_for_another_customer_is_forbidden() -> TestResult {
        let state = strict_state();
        let token = customer_token(&state, 7);

        let res = app(state)
            .oneshot(json_request(
                Method::POST,
                "/carrito",
                Some(&token),
                &json!({
                    "cliente_id": 8,
                    "producto_id": 3,
                    "producto_tipo": "comida",
                    "cantidad": 1,
                    "precio_unitario": "15.00"
                }),
            ))
            .await?;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        Ok(())
    }

    #[tokio::test]
    async fn added_item_is_created() -> TestResult {
        let mut mocks = Mocks::default();
        mocks
            .carts
            .expect_add_item()
            .once()
            .withf(|item| {
                item.cliente_id == 7
                    && item.producto_tipo == ProductKind::Bebida
                    && item.cantidad == 1
            })
            .return_once(|item| {
                Ok(CartLineEntity {
                    id: 1,
                    cliente_id: item.cliente_id,
                    producto_id: item.producto_id,
                    producto_tipo: item.producto_tipo,
                    cantidad: item.cantidad,
                    precio_unitario: item.precio_unitario,
                    fecha_agregado: Utc::now(),
                })
            });
        let state = mocks.into_state();
        let token = customer_token(&state, 7);

        let res = app(state)
            .oneshot(json_request(
                Method::POST,
                "/carrito",
                Some(&token),
                &json!({
                    "cliente_id": 7,
                    "producto_id": 9,
                    "producto_tipo": "bebida",
                    "precio_unitario": "8.00"
                }),
            ))
            .await?;

        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(body_json(res).await["data"]["producto_tipo"], "bebida");

        Ok(())
    }

    #[tokio::test]
    async fn unknown_product_kind_is_rejected() -> TestResult {
        let state = strict_state();
        let token = customer_token(&state, 7);

        let res = app(state)
            .oneshot(json_request(
                Method::POST,
                "/carrito",
                Some(&token),
                &json!({
                    "cliente_id": 7,
                    "producto_id": 9,
                    "producto_tipo": "postre",
                    "precio_unitario": "8.00"
                }),
            ))
            .await?;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(res).await["message"],
            "Tipo de producto inválido: postre"
        );

        Ok(())
    }

    #[tokio::test]
    async fn zero_quantity_reports_removal() -> TestResult {
        let mut mocks = Mocks::default();
        mocks
            .carts
            .expect_update_quantity()
            .once()
            .withf(|cliente_id, line_id, cantidad| {
                *cliente_id == 7 && *line_id == 3 && *cantidad == 0
            })
            .return_once(|_, _, _| Ok(QuantityUpdate::Removed));
        let state = mocks.into_state();
        let token = customer_token(&state, 7);

        let res = app(state)
            .oneshot(json_request(
                Method::PUT,
                "/carrito/3",
                Some(&token),
                &json!({ "cantidad": 0 }),
            ))
            .await?;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["data"]["eliminado"], true);

        Ok(())
    }

    #[tokio::test]
    async fn clearing_uses_the_path_customer() -> TestResult {
        let mut mocks = Mocks::default();
        mocks
            .carts
            .expect_clear_cart()
            .once()
            .withf(|cliente_id| *cliente_id == 7)
            .return_once(|_| Ok(2));
        let state = mocks.into_state();
        let token = customer_token(&state, 7);

        let res = app(state)
            .oneshot(empty_request(Method::DELETE, "/carrito/cliente/7", &token))
            .await?;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["data"]["eliminados"], 2);

        Ok(())
    }
}
