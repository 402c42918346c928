//! Fixtures shared by handler and service tests.

use std::{sync::Arc, time::Duration};

use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, header},
    response::Response,
};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use serde::Serialize;
use serde_json::Value;

use crate::{
    auth::TokenKeys,
    core::{aliases::DbPool, app_state::AppState, config::test_config},
    mailer::MockMailer,
    services::{
        carts::MockCartsService, checkout::MockCheckoutService,
        customers::MockCustomersService, menu::MockMenuService,
        notifications::MockNotificationsService, orders::MockOrdersService,
        staff::MockStaffService,
    },
};

/// Mocks behind an [`AppState`]. A mock without expectations fails the test
/// on any call.
#[derive(Default)]
pub struct Mocks {
    pub mailer: MockMailer,
    pub carts: MockCartsService,
    pub checkout: MockCheckoutService,
    pub orders: MockOrdersService,
    pub notifications: MockNotificationsService,
    pub customers: MockCustomersService,
    pub staff: MockStaffService,
    pub menu: MockMenuService,
}

impl Mocks {
    pub fn into_state(self) -> AppState {
        let config = test_config();

        AppState {
            tokens: Arc::new(TokenKeys::new(&config.auth)),
            config: Arc::new(config),
            mailer: Arc::new(self.mailer),
            carts: Arc::new(self.carts),
            checkout: Arc::new(self.checkout),
            orders: Arc::new(self.orders),
            notifications: Arc::new(self.notifications),
            customers: Arc::new(self.customers),
            staff: Arc::new(self.staff),
            menu: Arc::new(self.menu),
        }
    }
}

/// State whose services must never be called.
pub fn strict_state() -> AppState {
    Mocks::default().into_state()
}

pub fn customer_token(state: &AppState, id: i32) -> String {
    state
        .tokens
        .issue_customer(id, "ana", "ana@raices.test")
        .unwrap()
        .token
}

pub fn staff_token(state: &AppState, id: i32, rol: &str) -> String {
    state.tokens.issue_staff(id, "jefa", rol).unwrap().token
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: &impl Serialize,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub fn empty_request(method: Method, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Pool pointing at a closed port. Any checkout fails fast, so a test that
/// gets past validation surfaces as an internal error.
pub fn unreachable_pool() -> DbPool {
    let manager = AsyncDieselConnectionManager::new(test_config().database.url);

    DbPool::builder()
        .max_size(1)
        .connection_timeout(Duration::from_millis(50))
        .max_lifetime(None)
        .idle_timeout(None)
        .build_unchecked(manager)
}
