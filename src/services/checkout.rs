//! Checkout: turns a submitted basket into an order, its lines, a receipt and
//! a notification inside one transaction, then empties the customer's cart.

use anyhow::Context;
use async_trait::async_trait;
use chrono::Local;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use mockall::automock;
use rust_decimal::Decimal;

use crate::{
    core::aliases::DbPool,
    domain::{
        OrderStatus, OrderTotals, ProductKind, ReceiptKind,
        calendar::CalendarDay,
        receipt::{MAX_AMOUNT, is_valid_ruc, line_amount, round_money},
        staff::SYSTEM_STAFF_USERNAME,
    },
    models::{
        CreateNotificationEntity, CreateOrderEntity, CreateOrderLineEntity, CreateReceiptEntity,
        CreateStaffEntity, OrderEntity,
    },
    schema::{
        carrito, cliente, comprobante_pago, detalle_venta, empleado, forma_pago, notificacion,
        orden_venta,
    },
    services::{ServiceError, catalog, time_dimension},
};

/// Receipts are issued in this state and never change afterwards.
const RECEIPT_ISSUED: &str = "emitido";

const CONFIRMATION_TITLE: &str = "¡Pedido confirmado! 🎉";

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutItem {
    pub producto_id: i32,
    pub producto_tipo: ProductKind,
    pub cantidad: i32,
    pub precio_unitario: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub cliente_id: i32,
    pub tipo_entrega: String,
    pub direccion_entrega: Option<String>,
    pub referencia: Option<String>,
    pub hora_entrega: Option<String>,
    pub metodo_pago: String,
    pub tipo_comprobante: ReceiptKind,
    pub ruc: Option<String>,
    pub items: Vec<CheckoutItem>,
}

impl CheckoutRequest {
    /// Checks everything that can be decided without the database.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.items.is_empty() {
            return Err(ServiceError::EmptyOrder);
        }

        for item in &self.items {
            if item.cantidad <= 0 {
                return Err(ServiceError::Validation(format!(
                    "Cantidad inválida para {} #{}",
                    item.producto_tipo, item.producto_id
                )));
            }
            if item.precio_unitario.is_sign_negative() || item.precio_unitario > MAX_AMOUNT {
                return Err(ServiceError::Validation(format!(
                    "Precio inválido para {} #{}",
                    item.producto_tipo, item.producto_id
                )));
            }
        }

        if self.tipo_comprobante.requires_tax_id()
            && !self.ruc.as_deref().is_some_and(is_valid_ruc)
        {
            return Err(ServiceError::Validation(
                "La factura requiere un RUC válido de 11 dígitos".into(),
            ));
        }

        self.totals().map(|_| ())
    }

    /// Tax id printed on the receipt. Only invoices carry one.
    fn receipt_ruc(&self) -> Option<String> {
        match self.tipo_comprobante {
            ReceiptKind::Factura => self.ruc.clone(),
            ReceiptKind::Boleta => None,
        }
    }

    /// Rounded totals. Fails when the order total cannot be stored.
    pub fn totals(&self) -> Result<OrderTotals, ServiceError> {
        OrderTotals::from_lines(
            self.items
                .iter()
                .map(|item| (item.cantidad, item.precio_unitario)),
        )
        .map(OrderTotals::rounded)
        .filter(|totals| totals.total <= MAX_AMOUNT)
        .ok_or_else(order_too_large)
    }
}

fn order_too_large() -> ServiceError {
    ServiceError::Validation("El total del pedido excede el máximo permitido".into())
}

/// Line as shown in the confirmation e-mail.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchasedItem {
    pub nombre: String,
    pub cantidad: i32,
    pub precio_unitario: Decimal,
    pub producto_tipo: ProductKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutReceipt {
    pub orden_id: i32,
    pub numero_comprobante: String,
    pub tipo_comprobante: ReceiptKind,
    pub ruc: Option<String>,
    pub totals: OrderTotals,
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<PurchasedItem>,
}

#[derive(Debug, Clone)]
pub struct PgCheckoutService {
    db_pool: DbPool,
}

impl PgCheckoutService {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }
}

/// Id of the `sistema` employee that owns web orders, created on first use.
async fn system_staff_id(conn: &mut AsyncPgConnection) -> Result<i32, ServiceError> {
    let existing = empleado::table
        .filter(empleado::usuario.eq(SYSTEM_STAFF_USERNAME))
        .select(empleado::id)
        .first::<i32>(conn)
        .await
        .optional()?;

    if let Some(id) = existing {
        return Ok(id);
    }

    tracing::warn!("Staff account '{SYSTEM_STAFF_USERNAME}' missing, creating it");

    diesel::insert_into(empleado::table)
        .values(CreateStaffEntity {
            nombre: "Sistema".into(),
            apellido: "Web".into(),
            email: "sistema@raices.local".into(),
            telefono: None,
            usuario: SYSTEM_STAFF_USERNAME.into(),
            contrasena: "!".into(),
            rol: SYSTEM_STAFF_USERNAME.into(),
            puesto: Some("Pedidos web".into()),
            establecimiento_id: None,
            activo: false,
        })
        .on_conflict(empleado::usuario)
        .do_nothing()
        .execute(conn)
        .await?;

    Ok(empleado::table
        .filter(empleado::usuario.eq(SYSTEM_STAFF_USERNAME))
        .select(empleado::id)
        .first::<i32>(conn)
        .await?)
}

async fn payment_method_id(
    conn: &mut AsyncPgConnection,
    metodo: &str,
) -> Result<i32, ServiceError> {
    diesel::insert_into(forma_pago::table)
        .values((
            forma_pago::metodo.eq(metodo),
            forma_pago::descripcion.eq(format!("Pago mediante {metodo}")),
        ))
        .on_conflict(forma_pago::metodo)
        .do_nothing()
        .execute(conn)
        .await?;

    Ok(forma_pago::table
        .filter(forma_pago::metodo.eq(metodo))
        .select(forma_pago::id)
        .first::<i32>(conn)
        .await?)
}

async fn place_order(
    conn: &mut AsyncPgConnection,
    request: CheckoutRequest,
) -> Result<CheckoutReceipt, ServiceError> {
    let (nombre, apellido, email) = cliente::table
        .find(request.cliente_id)
        .select((cliente::nombre, cliente::apellido, cliente::email))
        .first::<(String, String, String)>(conn)
        .await
        .optional()?
        .ok_or(ServiceError::CustomerNotFound)?;

    let empleado_id = system_staff_id(conn).await?;
    let totals = request.totals()?;
    let today = CalendarDay::from(Local::now().date_naive());
    let day = time_dimension::ensure_day(conn, today).await?;

    let order: OrderEntity = diesel::insert_into(orden_venta::table)
        .values(CreateOrderEntity {
            cliente_id: request.cliente_id,
            empleado_id,
            total: totals.total,
            estado: OrderStatus::Pendiente.as_str().into(),
            tipo_entrega: request.tipo_entrega.clone(),
            direccion_entrega: request.direccion_entrega.clone(),
            referencia: request.referencia.clone(),
            hora_entrega: request.hora_entrega.clone(),
            anio_id: day.anio_id,
            mes_id: day.mes_id,
            dia_id: day.dia_id,
        })
        .returning(OrderEntity::as_returning())
        .get_result(conn)
        .await?;

    let mut items = Vec::with_capacity(request.items.len());
    for item in &request.items {
        let nombre = catalog::display_name(conn, item.producto_tipo, item.producto_id).await?;

        diesel::insert_into(detalle_venta::table)
            .values(CreateOrderLineEntity::new(
                order.id,
                item.producto_tipo,
                item.producto_id,
                item.cantidad,
                round_money(
                    line_amount(item.cantidad, item.precio_unitario).ok_or_else(order_too_large)?,
                ),
            ))
            .execute(conn)
            .await?;

        items.push(PurchasedItem {
            nombre,
            cantidad: item.cantidad,
            precio_unitario: item.precio_unitario,
            producto_tipo: item.producto_tipo,
        });
    }

    let forma_pago_id = payment_method_id(conn, &request.metodo_pago).await?;

    let numero_comprobante = request.tipo_comprobante.receipt_number(order.id);
    let ruc = request.receipt_ruc();

    diesel::insert_into(comprobante_pago::table)
        .values(CreateReceiptEntity {
            numero: numero_comprobante.clone(),
            tipo: request.tipo_comprobante.as_str().into(),
            subtotal: totals.subtotal,
            impuesto: totals.tax,
            total: totals.total,
            estado: RECEIPT_ISSUED.into(),
            cliente_id: request.cliente_id,
            empleado_id,
            forma_pago_id,
            orden_venta_id: order.id,
            ruc: ruc.clone(),
        })
        .execute(conn)
        .await?;

    diesel::insert_into(notificacion::table)
        .values(CreateNotificationEntity {
            cliente_id: request.cliente_id,
            orden_venta_id: Some(order.id),
            titulo: CONFIRMATION_TITLE.into(),
            mensaje: format!(
                "Tu pedido #{} ha sido procesado exitosamente. Comprobante: {}",
                order.id, numero_comprobante
            ),
            tipo: "success".into(),
        })
        .execute(conn)
        .await?;

    diesel::delete(carrito::table.filter(carrito::cliente_id.eq(request.cliente_id)))
        .execute(conn)
        .await?;

    Ok(CheckoutReceipt {
        orden_id: order.id,
        numero_comprobante,
        tipo_comprobante: request.tipo_comprobante,
        ruc,
        totals,
        customer_name: format!("{nombre} {apellido}"),
        customer_email: email,
        items,
    })
}

#[async_trait]
impl CheckoutService for PgCheckoutService {
    async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutReceipt, ServiceError> {
        request.validate()?;

        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let cliente_id = request.cliente_id;
        let receipt = conn
            .transaction::<_, ServiceError, _>(move |tx| Box::pin(place_order(tx, request)))
            .await?;

        tracing::info!(
            "Order #{} placed for customer {} (receipt {}, total {})",
            receipt.orden_id,
            cliente_id,
            receipt.numero_comprobante,
            receipt.totals.total
        );

        Ok(receipt)
    }
}

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Places the order atomically. Nothing is written when any step fails.
    async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutReceipt, ServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::{
        services::carts::{CartsService, NewCartItem, PgCartsService},
        test_db::TestDb,
        test_helpers::unreachable_pool,
    };

    fn money(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn request(items: Vec<CheckoutItem>) -> CheckoutRequest {
        CheckoutRequest {
            cliente_id: 1,
            tipo_entrega: "delivery".into(),
            direccion_entrega: Some("Av. Arequipa 123".into()),
            referencia: None,
            hora_entrega: Some("19:30".into()),
            metodo_pago: "yape".into(),
            tipo_comprobante: ReceiptKind::Boleta,
            ruc: None,
            items,
        }
    }

    fn scenario_items() -> Vec<CheckoutItem> {
        vec![
            CheckoutItem {
                producto_id: 3,
                producto_tipo: ProductKind::Comida,
                cantidad: 2,
                precio_unitario: money(1500),
            },
            CheckoutItem {
                producto_id: 9,
                producto_tipo: ProductKind::Bebida,
                cantidad: 1,
                precio_unitario: money(800),
            },
        ]
    }

    #[test]
    fn scenario_totals() {
        let totals = request(scenario_items()).totals().unwrap();

        assert_eq!(totals.subtotal, money(3800));
        assert_eq!(totals.tax, money(684));
        assert_eq!(totals.total, money(4484));
    }

    #[test]
    fn invoice_requires_valid_ruc() {
        let mut req = request(scenario_items());
        req.tipo_comprobante = ReceiptKind::Factura;
        req.ruc = Some("123".into());

        assert!(matches!(req.validate(), Err(ServiceError::Validation(_))));

        req.ruc = Some("20123456789".into());
        assert!(req.validate().is_ok());
        assert_eq!(req.receipt_ruc().as_deref(), Some("20123456789"));
    }

    #[test]
    fn simple_receipt_drops_ruc() {
        let mut req = request(scenario_items());
        req.ruc = Some("20123456789".into());

        assert!(req.validate().is_ok());
        assert_eq!(req.receipt_ruc(), None);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let mut items = scenario_items();
        items[1].cantidad = 0;

        assert!(matches!(
            request(items).validate(),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn huge_price_is_rejected_without_panicking() {
        let mut items = scenario_items();
        items[0].precio_unitario = Decimal::MAX;

        assert!(matches!(
            request(items).validate(),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn total_beyond_storable_amount_is_rejected() {
        let mut items = scenario_items();
        items[0].cantidad = 1_000;
        items[0].precio_unitario = MAX_AMOUNT;

        assert!(matches!(
            request(items).validate(),
            Err(ServiceError::Validation(msg)) if msg.contains("excede")
        ));
    }

    #[tokio::test]
    async fn empty_order_fails_before_taking_a_connection() -> TestResult {
        let service = PgCheckoutService::new(unreachable_pool());

        let result = service.checkout(request(Vec::new())).await;

        assert!(
            matches!(result, Err(ServiceError::EmptyOrder)),
            "expected EmptyOrder, got {result:?}"
        );

        Ok(())
    }

    struct Shop {
        db: TestDb,
        cliente_id: i32,
        comida_id: i32,
        bebida_id: i32,
    }

    /// A customer with one food and one beverage in their cart.
    async fn shop() -> Shop {
        let db = TestDb::new().await;
        let cliente_id = db.customer("ana").await;
        let comida_id = db.food("Lomo saltado", money(1500)).await;
        let bebida_id = db.beverage("Chicha morada", money(800)).await;

        let carts = PgCartsService::new(db.pool.clone());
        for (producto_id, producto_tipo, precio_unitario) in [
            (comida_id, ProductKind::Comida, money(1500)),
            (bebida_id, ProductKind::Bebida, money(800)),
        ] {
            carts
                .add_item(NewCartItem {
                    cliente_id,
                    producto_id,
                    producto_tipo,
                    cantidad: 1,
                    precio_unitario,
                })
                .await
                .expect("Failed to fill the cart");
        }

        Shop {
            db,
            cliente_id,
            comida_id,
            bebida_id,
        }
    }

    fn order(shop: &Shop, comida_id: i32) -> CheckoutRequest {
        let mut items = scenario_items();
        items[0].producto_id = comida_id;
        items[1].producto_id = shop.bebida_id;

        CheckoutRequest {
            cliente_id: shop.cliente_id,
            ..request(items)
        }
    }

    #[tokio::test]
    async fn checkout_writes_one_order_and_empties_the_cart() -> TestResult {
        let shop = shop().await;
        let service = PgCheckoutService::new(shop.db.pool.clone());

        let receipt = service.checkout(order(&shop, shop.comida_id)).await?;

        assert_eq!(receipt.totals.total, money(4484));
        assert_eq!(receipt.items[0].nombre, "Lomo saltado");
        assert_eq!(shop.db.count("orden_venta").await, 1);
        assert_eq!(shop.db.count("detalle_venta").await, 2);
        assert_eq!(shop.db.count("comprobante_pago").await, 1);
        assert_eq!(shop.db.count("notificacion").await, 1);
        assert_eq!(shop.db.count("carrito").await, 0);

        let stored: (Decimal, String) = orden_venta::table
            .find(receipt.orden_id)
            .select((orden_venta::total, orden_venta::estado))
            .first(&mut shop.db.conn().await)
            .await?;
        assert_eq!(stored, (money(4484), "pendiente".to_string()));

        Ok(())
    }

    #[tokio::test]
    async fn empty_order_writes_nothing() -> TestResult {
        let shop = shop().await;
        let service = PgCheckoutService::new(shop.db.pool.clone());

        let result = service
            .checkout(CheckoutRequest {
                items: Vec::new(),
                ..order(&shop, shop.comida_id)
            })
            .await;

        assert!(matches!(result, Err(ServiceError::EmptyOrder)));
        for table in ["orden_venta", "comprobante_pago", "notificacion", "forma_pago", "empleado"] {
            assert_eq!(shop.db.count(table).await, 0, "{table} was written");
        }
        assert_eq!(shop.db.count("carrito").await, 2);

        Ok(())
    }

    #[tokio::test]
    async fn failing_line_rolls_back_the_whole_order() -> TestResult {
        let shop = shop().await;
        let service = PgCheckoutService::new(shop.db.pool.clone());
        let mut basket = order(&shop, shop.comida_id + 1_000);
        basket.items.reverse();

        let result = service.checkout(basket).await;

        assert!(
            matches!(result, Err(ServiceError::Database(_))),
            "expected a database error, got {result:?}"
        );
        for table in [
            "orden_venta",
            "detalle_venta",
            "comprobante_pago",
            "notificacion",
            "empleado",
        ] {
            assert_eq!(shop.db.count(table).await, 0, "{table} was written");
        }
        assert_eq!(shop.db.count("carrito").await, 2);

        Ok(())
    }
}
