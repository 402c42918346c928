//! Order queries and status changes.

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{
    ExpressionMethods, NullableExpressionMethods, OptionalExtension, QueryDsl, Queryable,
    SelectableHelper,
};
use diesel_async::RunQueryDsl;
use mockall::automock;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    core::aliases::DbPool,
    domain::{InvalidStatus, OrderStatus, ProductKind},
    models::{OrderEntity, OrderLineEntity, ReceiptEntity},
    schema::{cliente, comprobante_pago, detalle_venta, forma_pago, orden_venta},
    services::{ServiceError, catalog},
};

/// Row of a customer's order history.
#[derive(Queryable, Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct OrderSummary {
    pub id: i32,
    pub fecha: DateTime<Utc>,
    pub total: Decimal,
    pub estado: String,
    pub tipo_entrega: String,
    pub numero_comprobante: Option<String>,
    pub tipo_comprobante: Option<String>,
}

/// Row of the back-office order lists.
#[derive(Queryable, Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct AdminOrderRow {
    pub id: i32,
    pub fecha: DateTime<Utc>,
    pub total: Decimal,
    pub estado: String,
    pub tipo_entrega: String,
    pub direccion_entrega: Option<String>,
    pub referencia: Option<String>,
    pub hora_entrega: Option<String>,
    pub cliente_nombre: String,
    pub cliente_apellido: String,
    pub cliente_email: String,
    pub cliente_telefono: Option<String>,
    pub numero_comprobante: Option<String>,
    pub tipo_comprobante: Option<String>,
    pub ruc: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct OrderLineView {
    #[serde(flatten)]
    pub line: OrderLineEntity,
    pub producto_tipo: Option<ProductKind>,
    pub producto_nombre: Option<String>,
    pub producto_imagen: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct OrderReceiptView {
    #[serde(flatten)]
    pub receipt: ReceiptEntity,
    pub metodo_pago: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct OrderDetail {
    pub orden: OrderEntity,
    pub cliente_nombre: String,
    pub cliente_email: String,
    pub comprobante: Option<OrderReceiptView>,
    pub detalles: Vec<OrderLineView>,
}

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db_pool: DbPool,
}

impl PgOrdersService {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    async fn customer_history(&self, cliente_id: i32) -> Result<Vec<OrderSummary>, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let orders = orden_venta::table
            .left_join(comprobante_pago::table)
            .filter(orden_venta::cliente_id.eq(cliente_id))
            .order((orden_venta::fecha.desc(), orden_venta::id.desc()))
            .select((
                orden_venta::id,
                orden_venta::fecha,
                orden_venta::total,
                orden_venta::estado,
                orden_venta::tipo_entrega,
                comprobante_pago::numero.nullable(),
                comprobante_pago::tipo.nullable(),
            ))
            .load::<OrderSummary>(conn)
            .await?;

        Ok(orders)
    }

    async fn order_detail(
        &self,
        cliente_id: i32,
        orden_id: i32,
    ) -> Result<OrderDetail, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let orden: OrderEntity = orden_venta::table
            .find(orden_id)
            .filter(orden_venta::cliente_id.eq(cliente_id))
            .select(OrderEntity::as_select())
            .first(conn)
            .await?;

        let (cliente_nombre, cliente_email) = cliente::table
            .find(orden.cliente_id)
            .select((cliente::nombre, cliente::email))
            .first::<(String, String)>(conn)
            .await?;

        let comprobante = comprobante_pago::table
            .inner_join(forma_pago::table)
            .filter(comprobante_pago::orden_venta_id.eq(orden.id))
            .select((ReceiptEntity::as_select(), forma_pago::metodo))
            .first::<(ReceiptEntity, String)>(conn)
            .await
            .optional()?
            .map(|(receipt, metodo_pago)| OrderReceiptView {
                receipt,
                metodo_pago,
            });

        let lines: Vec<OrderLineEntity> = detalle_venta::table
            .filter(detalle_venta::orden_venta_id.eq(orden.id))
            .order(detalle_venta::id.asc())
            .select(OrderLineEntity::as_select())
            .load(conn)
            .await?;

        let products =
            catalog::summaries_for(conn, lines.iter().filter_map(OrderLineEntity::product)).await?;

        let detalles = lines
            .into_iter()
            .map(|line| {
                let product = line.product();
                let summary = product.and_then(|key| products.get(&key));
                OrderLineView {
                    producto_tipo: product.map(|(kind, _)| kind),
                    producto_nombre: summary.map(|s| s.nombre.clone()),
                    producto_imagen: summary.and_then(|s| s.imagen.clone()),
                    line,
                }
            })
            .collect();

        Ok(OrderDetail {
            orden,
            cliente_nombre,
            cliente_email,
            comprobante,
            detalles,
        })
    }

    async fn list_orders(&self, limit: Option<i64>) -> Result<Vec<AdminOrderRow>, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let mut query = orden_venta::table
            .inner_join(cliente::table)
            .left_join(comprobante_pago::table)
            .order((orden_venta::fecha.desc(), orden_venta::id.desc()))
            .select((
                orden_venta::id,
                orden_venta::fecha,
                orden_venta::total,
                orden_venta::estado,
                orden_venta::tipo_entrega,
                orden_venta::direccion_entrega,
                orden_venta::referencia,
                orden_venta::hora_entrega,
                cliente::nombre,
                cliente::apellido,
                cliente::email,
                cliente::telefono,
                comprobante_pago::numero.nullable(),
                comprobante_pago::tipo.nullable(),
                comprobante_pago::ruc.nullable(),
            ))
            .into_boxed();

        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        Ok(query.load::<AdminOrderRow>(conn).await?)
    }

    async fn change_status(
        &self,
        orden_id: i32,
        next: OrderStatus,
    ) -> Result<OrderEntity, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let stored: String = orden_venta::table
            .find(orden_id)
            .select(orden_venta::estado)
            .first(conn)
            .await?;

        let current: OrderStatus = stored
            .parse()
            .map_err(|_| anyhow!("Order #{orden_id} has unknown stored status '{stored}'"))?;
        current.transition_to(next)?;

        // Compare-and-set: a concurrent change makes the filter miss.
        let updated = diesel::update(
            orden_venta::table
                .find(orden_id)
                .filter(orden_venta::estado.eq(current.as_str())),
        )
        .set(orden_venta::estado.eq(next.as_str()))
        .returning(OrderEntity::as_returning())
        .get_result(conn)
        .await
        .optional()?;

        match updated {
            Some(order) => {
                tracing::info!("Order #{orden_id} moved from {current} to {next}");
                Ok(order)
            }
            None => Err(InvalidStatus::Transition {
                from: current,
                to: next,
            }
            .into()),
        }
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// A customer's orders with their receipt, newest first.
    async fn customer_history(&self, cliente_id: i32) -> Result<Vec<OrderSummary>, ServiceError>;

    /// Header, receipt and lines of an order owned by `cliente_id`.
    async fn order_detail(
        &self,
        cliente_id: i32,
        orden_id: i32,
    ) -> Result<OrderDetail, ServiceError>;

    /// All orders, newest first, optionally capped at `limit`.
    async fn list_orders(&self, limit: Option<i64>) -> Result<Vec<AdminOrderRow>, ServiceError>;

    /// Moves an order forward. Backward, same-state and terminal-state
    /// changes are rejected with [`InvalidStatus`].
    async fn change_status(
        &self,
        orden_id: i32,
        next: OrderStatus,
    ) -> Result<OrderEntity, ServiceError>;
}
