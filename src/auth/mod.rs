pub mod passwords;
pub mod tokens;

pub use tokens::{CustomerClaims, IssuedToken, StaffClaims, TokenError, TokenKeys};
