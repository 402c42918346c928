use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    core::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        extract::AppJson,
        middleware::{customers_authorization, staff_authorization},
    },
    domain::{OrderStatus, ProductKind, ReceiptKind},
    mailer::{self, templates},
    models::OrderEntity,
    routes::ensure_owner,
    services::{
        ServiceError,
        checkout::{CheckoutItem, CheckoutRequest},
        orders::{AdminOrderRow, OrderDetail, OrderSummary},
    },
};

/// Default size of the recent orders list.
const RECENT_ORDERS: i64 = 10;

pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    let customer = OpenApiRouter::new()
        .routes(routes!(process_checkout))
        .routes(routes!(get_order_history))
        .routes(routes!(get_order_detail))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            customers_authorization,
        ));

    let staff = OpenApiRouter::new()
        .routes(routes!(get_all_orders))
        .routes(routes!(get_recent_orders))
        .routes(routes!(change_order_status))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            staff_authorization,
        ));

    OpenApiRouter::new().nest("/checkout", customer.merge(staff))
}

#[derive(Deserialize, Debug, ToSchema)]
struct CheckoutItemReq {
    producto_id: i32,
    /// `comida`, `bebida` or `promocion`.
    producto_tipo: String,
    cantidad: i32,
    precio_unitario: Decimal,
}

#[derive(Deserialize, Debug, ToSchema)]
struct CheckoutReq {
    cliente_id: i32,
    tipo_entrega: String,
    direccion_entrega: Option<String>,
    referencia: Option<String>,
    hora_entrega: Option<String>,
    metodo_pago: String,
    /// `boleta` (default) or `factura`.
    tipo_comprobante: Option<String>,
    ruc: Option<String>,
    #[serde(default)]
    items: Vec<CheckoutItemReq>,
}

impl TryFrom<CheckoutReq> for CheckoutRequest {
    type Error = AppError;

    fn try_from(req: CheckoutReq) -> Result<Self, Self::Error> {
        let tipo_comprobante = match req.tipo_comprobante.as_deref() {
            Some(kind) => kind
                .parse::<ReceiptKind>()
                .map_err(|err| AppError::BadRequest(err.to_string()))?,
            None => ReceiptKind::Boleta,
        };

        let items = req
            .items
            .into_iter()
            .map(|item| {
                Ok(CheckoutItem {
                    producto_id: item.producto_id,
                    producto_tipo: item.producto_tipo.parse::<ProductKind>()?,
                    cantidad: item.cantidad,
                    precio_unitario: item.precio_unitario,
                })
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;

        Ok(Self {
            cliente_id: req.cliente_id,
            tipo_entrega: req.tipo_entrega,
            direccion_entrega: req.direccion_entrega,
            referencia: req.referencia,
            hora_entrega: req.hora_entrega,
            metodo_pago: req.metodo_pago,
            tipo_comprobante,
            ruc: req.ruc,
            items,
        })
    }
}

#[derive(Serialize, Debug, ToSchema)]
struct CheckoutRes {
    success: bool,
    orden_id: i32,
    numero_comprobante: String,
    tipo_comprobante: ReceiptKind,
    ruc: Option<String>,
    subtotal: Decimal,
    impuesto: Decimal,
    total: Decimal,
    message: String,
}

/// Place an order from the submitted items: order, lines, receipt and
/// notification are written atomically, then the cart is emptied and a
/// confirmation e-mail is sent.
#[utoipa::path(
    post,
    path = "/procesar",
    tags = ["Checkout"],
    security(("bearerAuth" = [])),
    request_body = CheckoutReq,
    responses(
        (status = 200, description = "Order placed", body = CheckoutRes),
        (status = 400, description = "No items, invalid item, unknown kind or invoice without RUC"),
        (status = 403, description = "Checkout for another customer"),
        (status = 404, description = "Customer or product not found")
    )
)]
async fn process_checkout(
    State(state): State<AppState>,
    Extension(cliente_id): Extension<i32>,
    AppJson(req): AppJson<CheckoutReq>,
) -> Result<impl IntoResponse, AppError> {
    ensure_owner(cliente_id, req.cliente_id)?;

    let receipt = state.checkout.checkout(req.try_into()?).await?;

    mailer::dispatch(
        state.mailer.clone(),
        templates::order_confirmation(&receipt),
    );

    Ok(Json(CheckoutRes {
        success: true,
        orden_id: receipt.orden_id,
        numero_comprobante: receipt.numero_comprobante,
        tipo_comprobante: receipt.tipo_comprobante,
        ruc: receipt.ruc,
        subtotal: receipt.totals.subtotal,
        impuesto: receipt.totals.tax,
        total: receipt.totals.total,
        message: "Compra procesada exitosamente. Te hemos enviado un correo de confirmación."
            .into(),
    }))
}

/// Order history of the authenticated customer, newest first.
#[utoipa::path(
    get,
    path = "/ordenes/{cliente_id}",
    tags = ["Checkout"],
    security(("bearerAuth" = [])),
    params(("cliente_id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Order history", body = StdResponse<Vec<OrderSummary>, String>),
        (status = 403, description = "History of another customer")
    )
)]
async fn get_order_history(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(cliente_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    ensure_owner(cliente_id, id)?;

    let orders = state.orders.customer_history(id).await?;

    Ok(StdResponse {
        data: Some(orders),
        message: Some("Get order history successfully"),
    })
}

/// Header, receipt and lines of one of the customer's orders.
#[utoipa::path(
    get,
    path = "/orden/{id}",
    tags = ["Checkout"],
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order detail", body = StdResponse<OrderDetail, String>),
        (status = 404, description = "Order not found among the customer's orders")
    )
)]
async fn get_order_detail(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(cliente_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let detail = state.orders.order_detail(cliente_id, id).await?;

    Ok(StdResponse {
        data: Some(detail),
        message: Some("Get order successfully"),
    })
}

/// Every order, newest first.
#[utoipa::path(
    get,
    path = "/ordenes/todas",
    tags = ["Checkout"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "All orders", body = StdResponse<Vec<AdminOrderRow>, String>)
    )
)]
async fn get_all_orders(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let orders = state.orders.list_orders(None).await?;

    Ok(StdResponse {
        data: Some(orders),
        message: Some("Get orders successfully"),
    })
}

#[derive(Deserialize, Debug, IntoParams)]
struct RecentOrdersQuery {
    /// Number of orders, 10 by default.
    limit: Option<i64>,
}

/// The latest orders.
#[utoipa::path(
    get,
    path = "/ordenes/recientes",
    tags = ["Checkout"],
    security(("bearerAuth" = [])),
    params(RecentOrdersQuery),
    responses(
        (status = 200, description = "Recent orders", body = StdResponse<Vec<AdminOrderRow>, String>)
    )
)]
async fn get_recent_orders(
    State(state): State<AppState>,
    Query(query): Query<RecentOrdersQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query
        .limit
        .filter(|limit| *limit > 0)
        .unwrap_or(RECENT_ORDERS);

    let orders = state.orders.list_orders(Some(limit)).await?;

    Ok(StdResponse {
        data: Some(orders),
        message: Some("Get recent orders successfully"),
    })
}

#[derive(Deserialize, Debug, ToSchema)]
struct ChangeStatusReq {
    /// `pendiente`, `en_proceso`, `completado` or `cancelado`.
    estado: String,
}

/// Move an order forward through its lifecycle.
#[utoipa::path(
    put,
    path = "/orden/{id}/estado",
    tags = ["Checkout"],
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    request_body = ChangeStatusReq,
    responses(
        (status = 200, description = "Status changed", body = StdResponse<OrderEntity, String>),
        (status = 400, description = "Unknown status or forbidden transition"),
        (status = 404, description = "Order not found")
    )
)]
async fn change_order_status(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    AppJson(req): AppJson<ChangeStatusReq>,
) -> Result<impl IntoResponse, AppError> {
    let next: OrderStatus = req.estado.parse().map_err(ServiceError::from)?;

    let order = state.orders.change_status(id, next).await?;

    Ok(StdResponse {
        data: Some(order),
        message: Some("Estado de la orden actualizado"),
    })
}
