use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use mockall::automock;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    core::aliases::DbPool,
    models::NotificationEntity,
    schema::{comprobante_pago, notificacion},
    services::ServiceError,
};

/// Inbox page size.
pub const INBOX_LIMIT: i64 = 50;

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: NotificationEntity,
    pub numero_comprobante: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PgNotificationsService {
    db_pool: DbPool,
}

impl PgNotificationsService {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl NotificationsService for PgNotificationsService {
    async fn inbox(&self, cliente_id: i32) -> Result<Vec<NotificationView>, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let notifications: Vec<NotificationEntity> = notificacion::table
            .filter(notificacion::cliente_id.eq(cliente_id))
            .order((notificacion::fecha_creacion.desc(), notificacion::id.desc()))
            .limit(INBOX_LIMIT)
            .select(NotificationEntity::as_select())
            .load(conn)
            .await?;

        let order_ids: Vec<i32> = notifications
            .iter()
            .filter_map(|notification| notification.orden_venta_id)
            .collect();

        let receipt_numbers: HashMap<i32, String> = comprobante_pago::table
            .filter(comprobante_pago::orden_venta_id.eq_any(&order_ids))
            .select((comprobante_pago::orden_venta_id, comprobante_pago::numero))
            .load::<(i32, String)>(conn)
            .await?
            .into_iter()
            .collect();

        Ok(notifications
            .into_iter()
            .map(|notification| NotificationView {
                numero_comprobante: notification
                    .orden_venta_id
                    .and_then(|id| receipt_numbers.get(&id).cloned()),
                notification,
            })
            .collect())
    }

    async fn mark_read(
        &self,
        cliente_id: i32,
        notificacion_id: i32,
    ) -> Result<NotificationEntity, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let notification = diesel::update(
            notificacion::table
                .find(notificacion_id)
                .filter(notificacion::cliente_id.eq(cliente_id)),
        )
        .set(notificacion::leida.eq(true))
        .returning(NotificationEntity::as_returning())
        .get_result(conn)
        .await?;

        Ok(notification)
    }

    async fn mark_all_read(&self, cliente_id: i32) -> Result<usize, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let updated = diesel::update(
            notificacion::table
                .filter(notificacion::cliente_id.eq(cliente_id))
                .filter(notificacion::leida.eq(false)),
        )
        .set(notificacion::leida.eq(true))
        .execute(conn)
        .await?;

        Ok(updated)
    }
}

#[automock]
#[async_trait]
pub trait NotificationsService: Send + Sync {
    /// Newest notifications of a customer with the receipt number of the
    /// referenced order, if any.
    async fn inbox(&self, cliente_id: i32) -> Result<Vec<NotificationView>, ServiceError>;

    async fn mark_read(
        &self,
        cliente_id: i32,
        notificacion_id: i32,
    ) -> Result<NotificationEntity, ServiceError>;

    /// Returns how many notifications changed.
    async fn mark_all_read(&self, cliente_id: i32) -> Result<usize, ServiceError>;
}
