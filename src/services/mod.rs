pub mod carts;
pub mod catalog;
pub mod checkout;
pub mod customers;
pub mod errors;
pub mod menu;
pub mod notifications;
pub mod orders;
pub mod staff;
pub mod time_dimension;

pub use errors::ServiceError;
