use chrono::{DateTime, NaiveDate, Utc};
use diesel::{
    AsChangeset, Selectable,
    prelude::{Associations, Identifiable, Insertable, Queryable},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ProductKind;

// Customers

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::cliente)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerEntity {
    pub id: i32,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub usuario: String,
    pub contrasena: String,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub ruc: Option<String>,
    pub fecha_registro: DateTime<Utc>,
}

/// Customer fields safe to return to clients.
#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::cliente)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerProfile {
    pub id: i32,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub usuario: String,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub ruc: Option<String>,
}

impl From<CustomerEntity> for CustomerProfile {
    fn from(customer: CustomerEntity) -> Self {
        Self {
            id: customer.id,
            nombre: customer.nombre,
            apellido: customer.apellido,
            email: customer.email,
            usuario: customer.usuario,
            telefono: customer.telefono,
            direccion: customer.direccion,
            ruc: customer.ruc,
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::cliente)]
pub struct CreateCustomerEntity {
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub usuario: String,
    pub contrasena: String,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub tipo_documento_id: Option<i32>,
    pub numero_documento: Option<String>,
    pub genero_id: Option<i32>,
    pub distrito_id: Option<i32>,
    pub ruc: Option<String>,
}

#[derive(AsChangeset, Deserialize, Debug, Default, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::cliente)]
pub struct UpdateCustomerEntity {
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
}

// Registration catalogs

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::departamento)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DepartmentEntity {
    pub id: i32,
    pub nombre: String,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::provincia)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProvinceEntity {
    pub id: i32,
    pub nombre: String,
    pub departamento_id: i32,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::distrito)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DistrictEntity {
    pub id: i32,
    pub nombre: String,
    pub provincia_id: i32,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::genero)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GenderEntity {
    pub id: i32,
    pub nombre: String,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::tipo_documento)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DocumentTypeEntity {
    pub id: i32,
    pub nombre: String,
}

// Staff

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::empleado)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StaffEntity {
    pub id: i32,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub telefono: Option<String>,
    pub usuario: String,
    pub contrasena: String,
    pub rol: String,
    pub puesto: Option<String>,
    pub fecha_ingreso: NaiveDate,
    pub activo: bool,
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::empleado)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StaffProfile {
    pub id: i32,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub telefono: Option<String>,
    pub usuario: String,
    pub rol: String,
    pub puesto: Option<String>,
    pub fecha_ingreso: NaiveDate,
    pub activo: bool,
}

impl From<StaffEntity> for StaffProfile {
    fn from(staff: StaffEntity) -> Self {
        Self {
            id: staff.id,
            nombre: staff.nombre,
            apellido: staff.apellido,
            email: staff.email,
            telefono: staff.telefono,
            usuario: staff.usuario,
            rol: staff.rol,
            puesto: staff.puesto,
            fecha_ingreso: staff.fecha_ingreso,
            activo: staff.activo,
        }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::empleado)]
pub struct CreateStaffEntity {
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub telefono: Option<String>,
    pub usuario: String,
    pub contrasena: String,
    pub rol: String,
    pub puesto: Option<String>,
    pub establecimiento_id: Option<i32>,
    pub activo: bool,
}

#[derive(AsChangeset, Deserialize, Debug, Default, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::empleado)]
pub struct UpdateStaffEntity {
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub rol: Option<String>,
    pub puesto: Option<String>,
    pub activo: Option<bool>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::sesion_admin)]
pub struct CreateStaffSessionEntity {
    pub empleado_id: i32,
    pub token: String,
    pub ip_address: String,
    pub user_agent: String,
    pub fecha_expiracion: DateTime<Utc>,
}

// Menu

fn available() -> bool {
    true
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::categoria)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CategoryEntity {
    pub id: i32,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub imagen: Option<String>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::comida)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FoodEntity {
    pub id: i32,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio: Decimal,
    pub categoria_id: i32,
    pub imagen: Option<String>,
    pub disponible: bool,
}

#[derive(Insertable, Deserialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::comida)]
pub struct CreateFoodEntity {
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio: Decimal,
    pub categoria_id: i32,
    pub imagen: Option<String>,
    #[serde(default = "available")]
    pub disponible: bool,
}

#[derive(AsChangeset, Deserialize, Debug, Default, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::comida)]
pub struct UpdateFoodEntity {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub precio: Option<Decimal>,
    pub categoria_id: Option<i32>,
    pub imagen: Option<String>,
    pub disponible: Option<bool>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::bebida)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BeverageEntity {
    pub id: i32,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio: Decimal,
    pub tipo: String,
    pub tamano_ml: Option<i32>,
    pub imagen: Option<String>,
    pub disponible: bool,
}

#[derive(Insertable, Deserialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::bebida)]
pub struct CreateBeverageEntity {
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio: Decimal,
    pub tipo: String,
    pub tamano_ml: Option<i32>,
    pub imagen: Option<String>,
    #[serde(default = "available")]
    pub disponible: bool,
}

#[derive(AsChangeset, Deserialize, Debug, Default, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::bebida)]
pub struct UpdateBeverageEntity {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub precio: Option<Decimal>,
    pub tipo: Option<String>,
    pub tamano_ml: Option<i32>,
    pub imagen: Option<String>,
    pub disponible: Option<bool>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::promociones)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PromotionEntity {
    pub id: i32,
    pub titulo: String,
    pub descripcion: Option<String>,
    pub precio_oferta: Decimal,
    pub imagen: Option<String>,
    pub activo: bool,
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_fin: Option<NaiveDate>,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone)]
#[diesel(belongs_to(PromotionEntity, foreign_key = promocion_id))]
#[diesel(table_name = crate::schema::promocion_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PromotionItemEntity {
    pub id: i32,
    pub promocion_id: i32,
    pub tipo: String,
    pub item_id: i32,
    pub cantidad: i32,
}

// Carts

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::carrito)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartLineEntity {
    pub id: i32,
    pub cliente_id: i32,
    pub producto_id: i32,
    pub producto_tipo: ProductKind,
    pub cantidad: i32,
    pub precio_unitario: Decimal,
    pub fecha_agregado: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::carrito)]
pub struct CreateCartLineEntity {
    pub cliente_id: i32,
    pub producto_id: i32,
    pub producto_tipo: ProductKind,
    pub cantidad: i32,
    pub precio_unitario: Decimal,
}

// Orders

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::orden_venta)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEntity {
    pub id: i32,
    pub cliente_id: i32,
    pub empleado_id: i32,
    pub fecha: DateTime<Utc>,
    pub total: Decimal,
    pub estado: String,
    pub tipo_entrega: String,
    pub direccion_entrega: Option<String>,
    pub referencia: Option<String>,
    pub hora_entrega: Option<String>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orden_venta)]
pub struct CreateOrderEntity {
    pub cliente_id: i32,
    pub empleado_id: i32,
    pub total: Decimal,
    pub estado: String,
    pub tipo_entrega: String,
    pub direccion_entrega: Option<String>,
    pub referencia: Option<String>,
    pub hora_entrega: Option<String>,
    pub anio_id: i32,
    pub mes_id: i32,
    pub dia_id: i32,
}

#[derive(
    Queryable, Selectable, Identifiable, Associations, Serialize, Debug, Clone, PartialEq, ToSchema,
)]
#[diesel(belongs_to(OrderEntity, foreign_key = orden_venta_id))]
#[diesel(table_name = crate::schema::detalle_venta)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderLineEntity {
    pub id: i32,
    pub orden_venta_id: i32,
    pub comida_id: Option<i32>,
    pub bebida_id: Option<i32>,
    pub promocion_id: Option<i32>,
    pub cantidad: i32,
    pub subtotal: Decimal,
}

impl OrderLineEntity {
    /// The one product reference set on the line.
    pub fn product(&self) -> Option<(ProductKind, i32)> {
        match (self.comida_id, self.bebida_id, self.promocion_id) {
            (Some(id), None, None) => Some((ProductKind::Comida, id)),
            (None, Some(id), None) => Some((ProductKind::Bebida, id)),
            (None, None, Some(id)) => Some((ProductKind::Promocion, id)),
            _ => None,
        }
    }
}

#[derive(Insertable, Debug, PartialEq)]
#[diesel(table_name = crate::schema::detalle_venta)]
pub struct CreateOrderLineEntity {
    pub orden_venta_id: i32,
    pub comida_id: Option<i32>,
    pub bebida_id: Option<i32>,
    pub promocion_id: Option<i32>,
    pub cantidad: i32,
    pub subtotal: Decimal,
}

impl CreateOrderLineEntity {
    /// Sets exactly the reference column that matches `kind`.
    pub fn new(
        orden_venta_id: i32,
        kind: ProductKind,
        product_id: i32,
        cantidad: i32,
        subtotal: Decimal,
    ) -> Self {
        let (comida_id, bebida_id, promocion_id) = match kind {
            ProductKind::Comida => (Some(product_id), None, None),
            ProductKind::Bebida => (None, Some(product_id), None),
            ProductKind::Promocion => (None, None, Some(product_id)),
        };

        Self {
            orden_venta_id,
            comida_id,
            bebida_id,
            promocion_id,
            cantidad,
            subtotal,
        }
    }
}

// Receipts

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::comprobante_pago)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReceiptEntity {
    pub id: i32,
    pub numero: String,
    pub tipo: String,
    pub fecha_emision: DateTime<Utc>,
    pub subtotal: Decimal,
    pub impuesto: Decimal,
    pub total: Decimal,
    pub estado: String,
    pub forma_pago_id: i32,
    pub orden_venta_id: i32,
    pub ruc: Option<String>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::comprobante_pago)]
pub struct CreateReceiptEntity {
    pub numero: String,
    pub tipo: String,
    pub subtotal: Decimal,
    pub impuesto: Decimal,
    pub total: Decimal,
    pub estado: String,
    pub cliente_id: i32,
    pub empleado_id: i32,
    pub forma_pago_id: i32,
    pub orden_venta_id: i32,
    pub ruc: Option<String>,
}

// Notifications

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::notificacion)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NotificationEntity {
    pub id: i32,
    pub cliente_id: i32,
    pub orden_venta_id: Option<i32>,
    pub titulo: String,
    pub mensaje: String,
    pub tipo: String,
    pub leida: bool,
    pub fecha_creacion: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::notificacion)]
pub struct CreateNotificationEntity {
    pub cliente_id: i32,
    pub orden_venta_id: Option<i32>,
    pub titulo: String,
    pub mensaje: String,
    pub tipo: String,
}
