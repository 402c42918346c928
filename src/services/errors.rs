use diesel::result::{DatabaseErrorKind, Error};
use thiserror::Error;

use crate::{
    core::app_error::AppError,
    domain::{InvalidProductKind, InvalidStatus},
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("No hay items en el pedido")]
    EmptyOrder,

    #[error(transparent)]
    InvalidProductKind(#[from] InvalidProductKind),

    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatus),

    #[error("Producto no encontrado")]
    ProductNotFound,

    #[error("Cliente no encontrado")]
    CustomerNotFound,

    #[error("Recurso no encontrado")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("Credenciales inválidas")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("storage error")]
    Database(#[source] Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// User-facing message for a unique constraint.
fn conflict_message(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("unique_cliente_email") => "El correo electrónico ya está registrado",
        Some("unique_cliente_usuario") => "El nombre de usuario ya está en uso",
        Some("unique_cliente_documento") => "El número de documento ya está registrado",
        Some("unique_ruc") => "El RUC ya está registrado",
        Some("unique_empleado_email" | "unique_empleado_usuario") => {
            "El usuario o email ya está registrado"
        }
        _ => "El registro ya existe",
    }
}

impl From<Error> for ServiceError {
    fn from(error: Error) -> Self {
        match error {
            Error::NotFound => Self::NotFound,
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) => {
                Self::Conflict(conflict_message(info.constraint_name()).to_string())
            }
            other => Self::Database(other),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Validation(message) => AppError::BadRequest(message),
            err @ (ServiceError::EmptyOrder
            | ServiceError::InvalidProductKind(_)
            | ServiceError::InvalidStatus(_)) => AppError::BadRequest(err.to_string()),
            ServiceError::ProductNotFound
            | ServiceError::CustomerNotFound
            | ServiceError::NotFound => AppError::NotFound,
            ServiceError::Conflict(message) => AppError::Conflict(message),
            err @ ServiceError::InvalidCredentials => AppError::Unauthorized(err.to_string()),
            ServiceError::Forbidden(message) => AppError::ForbiddenResource(message),
            ServiceError::Database(err) => {
                AppError::Other(anyhow::Error::new(err).context("Database query failed"))
            }
            ServiceError::Internal(err) => AppError::Other(err),
        }
    }
}
