use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Lifecycle of an `orden_venta` row.
///
/// Orders only move forward: `pendiente -> en_proceso -> completado`, and any
/// open order may be cancelled. `completado` and `cancelado` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pendiente,
    EnProceso,
    Completado,
    Cancelado,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidStatus {
    #[error("Estado inválido: {0}")]
    Unknown(String),

    #[error("No se puede cambiar el estado de {from} a {to}")]
    Transition { from: OrderStatus, to: OrderStatus },
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        Self::Pendiente,
        Self::EnProceso,
        Self::Completado,
        Self::Cancelado,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pendiente => "pendiente",
            Self::EnProceso => "en_proceso",
            Self::Completado => "completado",
            Self::Cancelado => "cancelado",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completado | Self::Cancelado)
    }

    const fn rank(self) -> u8 {
        match self {
            Self::Pendiente => 0,
            Self::EnProceso => 1,
            Self::Completado | Self::Cancelado => 2,
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }

    /// Validates `self -> next` and returns `next` when allowed.
    pub fn transition_to(self, next: OrderStatus) -> Result<OrderStatus, InvalidStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidStatus::Transition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = InvalidStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "pendiente" | "pending" => Ok(Self::Pendiente),
            "en_proceso" | "in_progress" | "in-progress" => Ok(Self::EnProceso),
            "completado" | "completed" => Ok(Self::Completado),
            "cancelado" | "cancelled" => Ok(Self::Cancelado),
            other => Err(InvalidStatus::Unknown(other.to_string())),
        }
    }
}
