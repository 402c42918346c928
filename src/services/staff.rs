//! Staff accounts, panel sessions, audit trail and the dashboard figures.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use diesel::{
    BoolExpressionMethods, ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper, dsl,
};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use mockall::automock;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    auth::passwords,
    core::aliases::DbPool,
    domain::{AuditAction, OrderStatus, StaffRole, staff::SYSTEM_STAFF_USERNAME},
    models::{
        CreateStaffEntity, CreateStaffSessionEntity, StaffEntity, StaffProfile, UpdateStaffEntity,
    },
    schema::{auditoria_empleados, cliente, empleado, orden_venta, sesion_admin},
    services::ServiceError,
};

/// New employee with the password still in plain text.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmployee {
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub telefono: Option<String>,
    pub usuario: String,
    pub contrasena: String,
    pub rol: StaffRole,
    pub puesto: Option<String>,
    pub establecimiento_id: Option<i32>,
}

impl NewEmployee {
    pub fn validate(&self) -> Result<(), ServiceError> {
        let required = [
            &self.nombre,
            &self.apellido,
            &self.email,
            &self.usuario,
            &self.contrasena,
        ];
        if required.iter().any(|value| value.trim().is_empty()) {
            return Err(ServiceError::Validation(
                "Todos los campos obligatorios deben estar completos".into(),
            ));
        }

        Ok(())
    }
}

/// Context of an admin panel login, stored with the session row.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub empleado_id: i32,
    pub token: String,
    pub ip_address: String,
    pub user_agent: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct DashboardStats {
    pub ordenes_hoy: i64,
    pub ventas_hoy: Decimal,
    pub ordenes_pendientes: i64,
    pub total_clientes: i64,
    pub empleados_activos: i64,
}

#[derive(Debug, Clone)]
pub struct PgStaffService {
    db_pool: DbPool,
}

impl PgStaffService {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }
}

async fn insert_audit(
    conn: &mut AsyncPgConnection,
    empleado_id: i32,
    action: AuditAction,
) -> Result<(), ServiceError> {
    diesel::insert_into(auditoria_empleados::table)
        .values((
            auditoria_empleados::empleado_id.eq(empleado_id),
            auditoria_empleados::accion.eq(action.as_str()),
        ))
        .execute(conn)
        .await?;

    Ok(())
}

#[async_trait]
impl StaffService for PgStaffService {
    async fn find_active_by_login(&self, login: &str) -> Result<Option<StaffEntity>, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let staff = empleado::table
            .filter(empleado::usuario.eq(login).or(empleado::email.eq(login)))
            .filter(empleado::activo.eq(true))
            .select(StaffEntity::as_select())
            .first(conn)
            .await
            .optional()?;

        Ok(staff)
    }

    async fn record_audit(&self, empleado_id: i32, action: AuditAction) -> Result<(), ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        insert_audit(conn, empleado_id, action).await?;
        tracing::info!("Audit: staff #{empleado_id} {}", action.as_str());

        Ok(())
    }

    async fn open_session(&self, session: SessionInfo) -> Result<(), ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        diesel::insert_into(sesion_admin::table)
            .values(CreateStaffSessionEntity {
                empleado_id: session.empleado_id,
                token: session.token,
                ip_address: session.ip_address,
                user_agent: session.user_agent,
                fecha_expiracion: session.expires_at,
            })
            .execute(conn)
            .await?;

        Ok(())
    }

    async fn close_session(&self, token: &str) -> Result<usize, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let closed = diesel::update(
            sesion_admin::table
                .filter(sesion_admin::token.eq(token))
                .filter(sesion_admin::activa.eq(true)),
        )
        .set(sesion_admin::activa.eq(false))
        .execute(conn)
        .await?;

        Ok(closed)
    }

    async fn session_profile(
        &self,
        empleado_id: i32,
        token: &str,
    ) -> Result<Option<StaffProfile>, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let session_id = sesion_admin::table
            .filter(sesion_admin::token.eq(token))
            .filter(sesion_admin::empleado_id.eq(empleado_id))
            .filter(sesion_admin::activa.eq(true))
            .filter(sesion_admin::fecha_expiracion.gt(Utc::now()))
            .select(sesion_admin::id)
            .first::<i32>(conn)
            .await
            .optional()?;

        if session_id.is_none() {
            return Ok(None);
        }

        let profile = empleado::table
            .find(empleado_id)
            .filter(empleado::activo.eq(true))
            .select(StaffProfile::as_select())
            .first(conn)
            .await
            .optional()?;

        Ok(profile)
    }

    async fn dashboard(&self) -> Result<DashboardStats, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let start_of_day = Local::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| midnight.and_local_timezone(Local).earliest())
            .map(|midnight| midnight.with_timezone(&Utc))
            .context("Failed to compute the start of the day")?;

        let (ordenes_hoy, ventas_hoy) = orden_venta::table
            .filter(orden_venta::fecha.ge(start_of_day))
            .filter(orden_venta::estado.ne(OrderStatus::Cancelado.as_str()))
            .select((dsl::count_star(), dsl::sum(orden_venta::total)))
            .first::<(i64, Option<Decimal>)>(conn)
            .await?;

        let ordenes_pendientes = orden_venta::table
            .filter(orden_venta::estado.eq(OrderStatus::Pendiente.as_str()))
            .count()
            .get_result(conn)
            .await?;

        let total_clientes = cliente::table.count().get_result(conn).await?;

        let empleados_activos = empleado::table
            .filter(empleado::activo.eq(true))
            .filter(empleado::usuario.ne(SYSTEM_STAFF_USERNAME))
            .count()
            .get_result(conn)
            .await?;

        Ok(DashboardStats {
            ordenes_hoy,
            ventas_hoy: ventas_hoy.unwrap_or_default(),
            ordenes_pendientes,
            total_clientes,
            empleados_activos,
        })
    }

    async fn list_employees(&self) -> Result<Vec<StaffProfile>, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let employees = empleado::table
            .filter(empleado::usuario.ne(SYSTEM_STAFF_USERNAME))
            .order((empleado::activo.desc(), empleado::fecha_ingreso.desc()))
            .select(StaffProfile::as_select())
            .load(conn)
            .await?;

        Ok(employees)
    }

    async fn create_employee(
        &self,
        actor_id: i32,
        employee: NewEmployee,
    ) -> Result<StaffProfile, ServiceError> {
        employee.validate()?;
        let contrasena = passwords::hash_password(employee.contrasena.clone()).await?;

        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let profile = conn
            .transaction::<_, ServiceError, _>(move |tx| {
                Box::pin(async move {
                    let profile: StaffProfile = diesel::insert_into(empleado::table)
                        .values(CreateStaffEntity {
                            nombre: employee.nombre,
                            apellido: employee.apellido,
                            email: employee.email,
                            telefono: employee.telefono,
                            usuario: employee.usuario,
                            contrasena,
                            rol: employee.rol.as_str().into(),
                            puesto: employee.puesto,
                            establecimiento_id: employee.establecimiento_id,
                            activo: true,
                        })
                        .returning(StaffProfile::as_returning())
                        .get_result(tx)
                        .await?;

                    insert_audit(tx, actor_id, AuditAction::CreateEmployee).await?;

                    Ok(profile)
                })
            })
            .await?;

        tracing::info!("Staff #{actor_id} created employee #{}", profile.id);

        Ok(profile)
    }

    async fn update_employee(
        &self,
        actor_id: i32,
        empleado_id: i32,
        changes: UpdateStaffEntity,
    ) -> Result<StaffProfile, ServiceError> {
        if changes == UpdateStaffEntity::default() {
            return Err(ServiceError::Validation(
                "No se enviaron campos para actualizar".into(),
            ));
        }
        if let Some(rol) = &changes.rol {
            if StaffRole::from_column(rol).is_none() {
                return Err(ServiceError::Validation(format!("Rol inválido: {rol}")));
            }
        }

        let action = match changes.activo {
            Some(false) => AuditAction::DeactivateEmployee,
            _ => AuditAction::UpdateEmployee,
        };

        self.apply_employee_change(actor_id, empleado_id, changes, action)
            .await
    }

    async fn deactivate_employee(
        &self,
        actor_id: i32,
        empleado_id: i32,
    ) -> Result<StaffProfile, ServiceError> {
        if actor_id == empleado_id {
            return Err(ServiceError::Validation(
                "No puedes desactivar tu propia cuenta".into(),
            ));
        }

        let changes = UpdateStaffEntity {
            activo: Some(false),
            ..Default::default()
        };

        self.apply_employee_change(actor_id, empleado_id, changes, AuditAction::DeactivateEmployee)
            .await
    }
}

impl PgStaffService {
    /// Updates an employee and writes the audit row in one transaction.
    async fn apply_employee_change(
        &self,
        actor_id: i32,
        empleado_id: i32,
        changes: UpdateStaffEntity,
        action: AuditAction,
    ) -> Result<StaffProfile, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let profile = conn
            .transaction::<_, ServiceError, _>(move |tx| {
                Box::pin(async move {
                    let profile: StaffProfile = diesel::update(
                        empleado::table
                            .find(empleado_id)
                            .filter(empleado::usuario.ne(SYSTEM_STAFF_USERNAME)),
                    )
                    .set(&changes)
                    .returning(StaffProfile::as_returning())
                    .get_result(tx)
                    .await?;

                    insert_audit(tx, actor_id, action).await?;

                    Ok(profile)
                })
            })
            .await?;

        tracing::info!(
            "Staff #{actor_id} applied {} to employee #{empleado_id}",
            action.as_str()
        );

        Ok(profile)
    }
}

#[automock]
#[async_trait]
pub trait StaffService: Send + Sync {
    /// Active staff member by username or e-mail.
    async fn find_active_by_login(&self, login: &str) -> Result<Option<StaffEntity>, ServiceError>;

    /// Appends one row to the audit trail.
    async fn record_audit(&self, empleado_id: i32, action: AuditAction) -> Result<(), ServiceError>;

    async fn open_session(&self, session: SessionInfo) -> Result<(), ServiceError>;

    /// Deactivates the session bound to `token`. Returns how many sessions
    /// were closed.
    async fn close_session(&self, token: &str) -> Result<usize, ServiceError>;

    /// Profile of the staff member when the session for `token` is active,
    /// unexpired and the account is still active.
    async fn session_profile(
        &self,
        empleado_id: i32,
        token: &str,
    ) -> Result<Option<StaffProfile>, ServiceError>;

    async fn dashboard(&self) -> Result<DashboardStats, ServiceError>;

    async fn list_employees(&self) -> Result<Vec<StaffProfile>, ServiceError>;

    async fn create_employee(
        &self,
        actor_id: i32,
        employee: NewEmployee,
    ) -> Result<StaffProfile, ServiceError>;

    async fn update_employee(
        &self,
        actor_id: i32,
        empleado_id: i32,
        changes: UpdateStaffEntity,
    ) -> Result<StaffProfile, ServiceError>;

    async fn deactivate_employee(
        &self,
        actor_id: i32,
        empleado_id: i32,
    ) -> Result<StaffProfile, ServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::{
        domain::{ProductKind, ReceiptKind},
        services::{
            checkout::{CheckoutItem, CheckoutRequest, CheckoutService, PgCheckoutService},
            orders::{OrdersService, PgOrdersService},
        },
        test_db::TestDb,
        test_helpers::unreachable_pool,
    };

    #[tokio::test]
    async fn empty_update_is_rejected() -> TestResult {
        let service = PgStaffService::new(unreachable_pool());

        let result = service
            .update_employee(1, 2, UpdateStaffEntity::default())
            .await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));

        Ok(())
    }

    #[tokio::test]
    async fn unknown_role_is_rejected() -> TestResult {
        let service = PgStaffService::new(unreachable_pool());
        let changes = UpdateStaffEntity {
            rol: Some("emperador".into()),
            ..Default::default()
        };

        let result = service.update_employee(1, 2, changes).await;

        assert!(
            matches!(&result, Err(ServiceError::Validation(msg)) if msg.contains("emperador")),
            "unexpected {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn staff_cannot_deactivate_themselves() -> TestResult {
        let service = PgStaffService::new(unreachable_pool());

        let result = service.deactivate_employee(4, 4).await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));

        Ok(())
    }

    #[test]
    fn new_employee_requires_credentials() {
        let employee = NewEmployee {
            nombre: "Luis".into(),
            apellido: "Rojas".into(),
            email: "luis@raices.test".into(),
            telefono: None,
            usuario: "luis".into(),
            contrasena: " ".into(),
            rol: StaffRole::Cajero,
            puesto: None,
            establecimiento_id: None,
        };

        assert!(matches!(employee.validate(), Err(ServiceError::Validation(_))));
    }

    async fn order_for(db: &TestDb, cliente_id: i32, producto_id: i32) -> i32 {
        PgCheckoutService::new(db.pool.clone())
            .checkout(CheckoutRequest {
                cliente_id,
                tipo_entrega: "recojo".into(),
                direccion_entrega: None,
                referencia: None,
                hora_entrega: None,
                metodo_pago: "efectivo".into(),
                tipo_comprobante: ReceiptKind::Boleta,
                ruc: None,
                items: vec![CheckoutItem {
                    producto_id,
                    producto_tipo: ProductKind::Comida,
                    cantidad: 1,
                    precio_unitario: Decimal::new(2200, 2),
                }],
            })
            .await
            .expect("Failed to place order")
            .orden_id
    }

    #[tokio::test]
    async fn dashboard_sums_today_without_cancelled_orders() -> TestResult {
        let db = TestDb::new().await;
        let cliente_id = db.customer("ana").await;
        let producto_id = db.food("Ají de gallina", Decimal::new(2200, 2)).await;
        order_for(&db, cliente_id, producto_id).await;
        let cancelled = order_for(&db, cliente_id, producto_id).await;
        PgOrdersService::new(db.pool.clone())
            .change_status(cancelled, OrderStatus::Cancelado)
            .await?;

        let stats = PgStaffService::new(db.pool.clone()).dashboard().await?;

        assert_eq!(stats.ordenes_hoy, 1);
        assert_eq!(stats.ventas_hoy, Decimal::new(2596, 2));
        assert_eq!(stats.ordenes_pendientes, 1);
        assert_eq!(stats.total_clientes, 1);
        assert_eq!(stats.empleados_activos, 0);

        Ok(())
    }
}
