//! Plain domain types shared by services and routes.

pub mod calendar;
pub mod order_status;
pub mod product_kind;
pub mod receipt;
pub mod staff;

pub use order_status::{InvalidStatus, OrderStatus};
pub use product_kind::{InvalidProductKind, ProductKind};
pub use receipt::{OrderTotals, ReceiptKind};
pub use staff::{AuditAction, StaffRole};
