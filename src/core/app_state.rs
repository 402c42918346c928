use std::sync::Arc;

use anyhow::Result;

use crate::{
    auth::TokenKeys,
    core::{aliases::DbPool, config::Config},
    mailer::{HttpMailer, Mailer},
    services::{
        carts::{CartsService, PgCartsService},
        checkout::{CheckoutService, PgCheckoutService},
        customers::{CustomersService, PgCustomersService},
        menu::{MenuService, PgMenuService},
        notifications::{NotificationsService, PgNotificationsService},
        orders::{OrdersService, PgOrdersService},
        staff::{PgStaffService, StaffService},
    },
};

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tokens: Arc<TokenKeys>,
    pub mailer: Arc<dyn Mailer>,
    pub carts: Arc<dyn CartsService>,
    pub checkout: Arc<dyn CheckoutService>,
    pub orders: Arc<dyn OrdersService>,
    pub notifications: Arc<dyn NotificationsService>,
    pub customers: Arc<dyn CustomersService>,
    pub staff: Arc<dyn StaffService>,
    pub menu: Arc<dyn MenuService>,
}

impl AppState {
    /// Wires the PostgreSQL-backed services and the HTTP mailer.
    pub fn new(config: Config, db_pool: DbPool) -> Result<Self> {
        let mailer = HttpMailer::new(&config.mail)?;
        let tokens = TokenKeys::new(&config.auth);

        Ok(Self {
            tokens: Arc::new(tokens),
            mailer: Arc::new(mailer),
            carts: Arc::new(PgCartsService::new(db_pool.clone())),
            checkout: Arc::new(PgCheckoutService::new(db_pool.clone())),
            orders: Arc::new(PgOrdersService::new(db_pool.clone())),
            notifications: Arc::new(PgNotificationsService::new(db_pool.clone())),
            customers: Arc::new(PgCustomersService::new(db_pool.clone())),
            staff: Arc::new(PgStaffService::new(db_pool.clone())),
            menu: Arc::new(PgMenuService::new(db_pool)),
            config: Arc::new(config),
        })
    }
}
