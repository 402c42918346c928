use std::{fmt, str::FromStr};

use diesel::{
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    pg::{Pg, PgValue},
    serialize::{self, Output, ToSql},
    sql_types::Text,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Catalogue a product id belongs to. Stored as text in `carrito.producto_tipo`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow, ToSchema,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Comida,
    Bebida,
    Promocion,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Tipo de producto inválido: {0}")]
pub struct InvalidProductKind(pub String);

impl ProductKind {
    pub const ALL: [ProductKind; 3] = [Self::Comida, Self::Bebida, Self::Promocion];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Comida => "comida",
            Self::Bebida => "bebida",
            Self::Promocion => "promocion",
        }
    }

    /// Fallback display name used when the catalogue row has disappeared.
    pub const fn fallback_name(self) -> &'static str {
        match self {
            Self::Comida => "Comida",
            Self::Bebida => "Bebida",
            Self::Promocion => "Promoción",
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductKind {
    type Err = InvalidProductKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "comida" => Ok(Self::Comida),
            "bebida" => Ok(Self::Bebida),
            "promocion" | "promoción" => Ok(Self::Promocion),
            _ => Err(InvalidProductKind(value.to_string())),
        }
    }
}

impl ToSql<Text, Pg> for ProductKind {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        <str as ToSql<Text, Pg>>::to_sql(self.as_str(), out)
    }
}

impl FromSql<Text, Pg> for ProductKind {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        raw.parse().map_err(Into::into)
    }
}
