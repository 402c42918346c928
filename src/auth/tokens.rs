//! Bearer tokens for customers and staff.
//!
//! The two audiences are signed with independent secrets so a customer token
//! can never be replayed against the admin panel.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::core::config::AuthConfig;

pub const CUSTOMER_TOKEN_TTL_HOURS: i64 = 24;
pub const STAFF_TOKEN_TTL_HOURS: i64 = 8;

/// Discriminator carried by every staff token.
pub const STAFF_TOKEN_KIND: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerClaims {
    pub id: i32,
    pub usuario: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaffClaims {
    pub id: i32,
    pub usuario: String,
    pub rol: String,
    #[serde(default)]
    pub tipo: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token expirado")]
    Expired,

    #[error("Token inválido")]
    Invalid,

    #[error("No tienes permisos de administrador")]
    NotStaff,

    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

#[derive(Clone)]
struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    fn sign<C: Serialize>(&self, claims: &C) -> Result<String, TokenError> {
        encode(&Header::default(), claims, &self.encoding).map_err(TokenError::Signing)
    }

    fn verify<C: DeserializeOwned>(&self, token: &str) -> Result<C, TokenError> {
        decode::<C>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

#[derive(Clone)]
pub struct TokenKeys {
    customer: Keys,
    staff: Keys,
}

impl fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenKeys(**redacted**)")
    }
}

impl TokenKeys {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            customer: Keys::from_secret(&config.customer_secret),
            staff: Keys::from_secret(&config.admin_secret),
        }
    }

    pub fn issue_customer(
        &self,
        id: i32,
        usuario: &str,
        email: &str,
    ) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(CUSTOMER_TOKEN_TTL_HOURS);

        let token = self.customer.sign(&CustomerClaims {
            id,
            usuario: usuario.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        })?;

        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify_customer(&self, token: &str) -> Result<CustomerClaims, TokenError> {
        self.customer.verify(token)
    }

    pub fn issue_staff(&self, id: i32, usuario: &str, rol: &str) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(STAFF_TOKEN_TTL_HOURS);

        let token = self.staff.sign(&StaffClaims {
            id,
            usuario: usuario.to_string(),
            rol: rol.to_string(),
            tipo: STAFF_TOKEN_KIND.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        })?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verifies signature and expiry, then the `tipo = "admin"` discriminator.
    pub fn verify_staff(&self, token: &str) -> Result<StaffClaims, TokenError> {
        let claims: StaffClaims = self.staff.verify(token)?;

        if claims.tipo != STAFF_TOKEN_KIND {
            return Err(TokenError::NotStaff);
        }

        Ok(claims)
    }

    #[cfg(test)]
    pub(crate) fn sign_staff_claims(&self, claims: &StaffClaims) -> String {
        self.staff.sign(claims).unwrap()
    }

    #[cfg(test)]
    pub(crate) fn sign_customer_claims(&self, claims: &CustomerClaims) -> String {
        self.customer.sign(claims).unwrap()
    }
}
