//! Cart store: one line per (customer, kind, product).

use anyhow::Context;
use async_trait::async_trait;
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper, upsert::excluded};
use diesel_async::RunQueryDsl;
use mockall::automock;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    core::aliases::DbPool,
    domain::{ProductKind, receipt::MAX_AMOUNT},
    models::{CartLineEntity, CreateCartLineEntity},
    schema::carrito,
    services::{ServiceError, catalog},
};

#[derive(Debug, Clone, PartialEq)]
pub struct NewCartItem {
    pub cliente_id: i32,
    pub producto_id: i32,
    pub producto_tipo: ProductKind,
    pub cantidad: i32,
    pub precio_unitario: Decimal,
}

/// Cart line enriched with the product's live display fields.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CartLine {
    #[serde(flatten)]
    pub line: CartLineEntity,
    pub nombre: Option<String>,
    pub imagen: Option<String>,
    pub descripcion: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuantityUpdate {
    Updated(CartLineEntity),
    Removed,
}

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db_pool: DbPool,
}

impl PgCartsService {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    async fn get_cart(&self, cliente_id: i32) -> Result<Vec<CartLine>, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let lines: Vec<CartLineEntity> = carrito::table
            .filter(carrito::cliente_id.eq(cliente_id))
            .order((carrito::fecha_agregado.desc(), carrito::id.desc()))
            .select(CartLineEntity::as_select())
            .load(conn)
            .await?;

        let mut products = catalog::summaries_for(
            conn,
            lines.iter().map(|line| (line.producto_tipo, line.producto_id)),
        )
        .await?;

        Ok(lines
            .into_iter()
            .map(|line| {
                let summary = products.remove(&(line.producto_tipo, line.producto_id));
                CartLine {
                    nombre: summary.as_ref().map(|s| s.nombre.clone()),
                    imagen: summary.as_ref().and_then(|s| s.imagen.clone()),
                    descripcion: summary.and_then(|s| s.descripcion),
                    line,
                }
            })
            .collect())
    }

    async fn add_item(&self, item: NewCartItem) -> Result<CartLineEntity, ServiceError> {
        if item.cantidad <= 0 {
            return Err(ServiceError::Validation(
                "La cantidad debe ser mayor a 0".into(),
            ));
        }
        if item.precio_unitario.is_sign_negative() {
            return Err(ServiceError::Validation(
                "El precio unitario no puede ser negativo".into(),
            ));
        }
        if item.precio_unitario > MAX_AMOUNT {
            return Err(ServiceError::Validation(
                "El precio unitario excede el máximo permitido".into(),
            ));
        }

        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        if !catalog::product_exists(conn, item.producto_tipo, item.producto_id).await? {
            return Err(ServiceError::ProductNotFound);
        }

        let line: CartLineEntity = diesel::insert_into(carrito::table)
            .values(CreateCartLineEntity {
                cliente_id: item.cliente_id,
                producto_id: item.producto_id,
                producto_tipo: item.producto_tipo,
                cantidad: item.cantidad,
                precio_unitario: item.precio_unitario,
            })
            .on_conflict((
                carrito::cliente_id,
                carrito::producto_tipo,
                carrito::producto_id,
            ))
            .do_update()
            .set(carrito::cantidad.eq(carrito::cantidad + excluded(carrito::cantidad)))
            .returning(CartLineEntity::as_returning())
            .get_result(conn)
            .await?;

        tracing::debug!(
            "Cart line {} for customer {} now holds {} x {} #{}",
            line.id,
            line.cliente_id,
            line.cantidad,
            line.producto_tipo,
            line.producto_id
        );

        Ok(line)
    }

    async fn update_quantity(
        &self,
        cliente_id: i32,
        line_id: i32,
        cantidad: i32,
    ) -> Result<QuantityUpdate, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let owned_line = carrito::table
            .filter(carrito::id.eq(line_id))
            .filter(carrito::cliente_id.eq(cliente_id));

        if cantidad <= 0 {
            diesel::delete(owned_line).execute(conn).await?;
            return Ok(QuantityUpdate::Removed);
        }

        let line = diesel::update(owned_line)
            .set(carrito::cantidad.eq(cantidad))
            .returning(CartLineEntity::as_returning())
            .get_result(conn)
            .await?;

        Ok(QuantityUpdate::Updated(line))
    }

    async fn remove_item(&self, cliente_id: i32, line_id: i32) -> Result<(), ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let deleted = diesel::delete(
            carrito::table
                .filter(carrito::id.eq(line_id))
                .filter(carrito::cliente_id.eq(cliente_id)),
        )
        .execute(conn)
        .await?;

        if deleted == 0 {
            return Err(ServiceError::NotFound);
        }

        Ok(())
    }

    async fn clear_cart(&self, cliente_id: i32) -> Result<usize, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let deleted = diesel::delete(carrito::table.filter(carrito::cliente_id.eq(cliente_id)))
            .execute(conn)
            .await?;

        tracing::debug!("Cleared {deleted} cart lines for customer {cliente_id}");

        Ok(deleted)
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Lines of a customer's cart, newest first.
    async fn get_cart(&self, cliente_id: i32) -> Result<Vec<CartLine>, ServiceError>;

    /// Adds `cantidad` of a product, merging with an existing line for the
    /// same product.
    async fn add_item(&self, item: NewCartItem) -> Result<CartLineEntity, ServiceError>;

    /// Sets a line's quantity. A quantity of zero or less removes the line.
    async fn update_quantity(
        &self,
        cliente_id: i32,
        line_id: i32,
        cantidad: i32,
    ) -> Result<QuantityUpdate, ServiceError>;

    async fn remove_item(&self, cliente_id: i32, line_id: i32) -> Result<(), ServiceError>;

    /// Removes every line of the customer's cart.
    async fn clear_cart(&self, cliente_id: i32) -> Result<usize, ServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::{test_db::TestDb, test_helpers::unreachable_pool};

    fn item(cantidad: i32, precio: Decimal) -> NewCartItem {
        NewCartItem {
            cliente_id: 1,
            producto_id: 3,
            producto_tipo: ProductKind::Comida,
            cantidad,
            precio_unitario: precio,
        }
    }

    #[tokio::test]
    async fn non_positive_quantity_is_rejected_before_touching_the_database() -> TestResult {
        let service = PgCartsService::new(unreachable_pool());

        let result = service.add_item(item(0, Decimal::new(1500, 2))).await;

        assert!(
            matches!(result, Err(ServiceError::Validation(_))),
            "expected a validation error, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn negative_price_is_rejected() -> TestResult {
        let service = PgCartsService::new(unreachable_pool());

        let result = service.add_item(item(1, Decimal::new(-100, 2))).await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));

        Ok(())
    }

    #[tokio::test]
    async fn price_beyond_column_range_is_rejected() -> TestResult {
        let service = PgCartsService::new(unreachable_pool());

        let result = service.add_item(item(1, Decimal::MAX)).await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));

        Ok(())
    }

    #[tokio::test]
    async fn same_product_added_twice_merges_into_one_line() -> TestResult {
        let db = TestDb::new().await;
        let cliente_id = db.customer("ana").await;
        let producto_id = db.food("Lomo saltado", Decimal::new(2500, 2)).await;
        let service = PgCartsService::new(db.pool.clone());
        let add = |cantidad| NewCartItem {
            cliente_id,
            producto_id,
            producto_tipo: ProductKind::Comida,
            cantidad,
            precio_unitario: Decimal::new(2500, 2),
        };

        let first = service.add_item(add(2)).await?;
        let second = service.add_item(add(3)).await?;

        assert_eq!(first.id, second.id);
        assert_eq!(second.cantidad, 5);
        let cart = service.get_cart(cliente_id).await?;
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].nombre.as_deref(), Some("Lomo saltado"));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_product_is_not_added() -> TestResult {
        let db = TestDb::new().await;
        let cliente_id = db.customer("ana").await;
        let service = PgCartsService::new(db.pool.clone());

        let result = service
            .add_item(NewCartItem {
                cliente_id,
                ..item(1, Decimal::new(1500, 2))
            })
            .await;

        assert!(matches!(result, Err(ServiceError::ProductNotFound)));
        assert_eq!(db.count("carrito").await, 0);

        Ok(())
    }

    #[tokio::test]
    async fn zero_quantity_update_removes_the_line() -> TestResult {
        let db = TestDb::new().await;
        let cliente_id = db.customer("ana").await;
        let producto_id = db.beverage("Chicha morada", Decimal::new(800, 2)).await;
        let service = PgCartsService::new(db.pool.clone());
        let line = service
            .add_item(NewCartItem {
                cliente_id,
                producto_id,
                producto_tipo: ProductKind::Bebida,
                cantidad: 1,
                precio_unitario: Decimal::new(800, 2),
            })
            .await?;

        let update = service.update_quantity(cliente_id, line.id, 0).await?;

        assert_eq!(update, QuantityUpdate::Removed);
        assert!(service.get_cart(cliente_id).await?.is_empty());

        Ok(())
    }
}
