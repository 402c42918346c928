pub mod auth;
pub mod core;
pub mod domain;
pub mod mailer;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;

#[cfg(test)]
mod test_db;
#[cfg(test)]
mod test_helpers;
