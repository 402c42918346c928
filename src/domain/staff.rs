use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Username of the placeholder account that owns unattended web orders.
pub const SYSTEM_STAFF_USERNAME: &str = "sistema";

/// Staff roles known to the admin panel. Any other `empleado.rol` value is a
/// regular employee without panel access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Admin,
    Gerente,
    Cajero,
}

impl StaffRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Gerente => "gerente",
            Self::Cajero => "cajero",
        }
    }

    /// Roles allowed to create, edit or deactivate employees.
    pub const fn manages_staff(self) -> bool {
        matches!(self, Self::Admin | Self::Gerente)
    }

    /// Parses a stored role; `None` means no panel access.
    pub fn from_column(rol: &str) -> Option<Self> {
        rol.parse().ok()
    }
}

impl FromStr for StaffRole {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "gerente" | "manager" => Ok(Self::Gerente),
            "cajero" | "cashier" => Ok(Self::Cajero),
            _ => Err(()),
        }
    }
}

/// Rows written to `auditoria_empleados.accion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    FailedLogin,
    Login,
    Logout,
    CreateEmployee,
    UpdateEmployee,
    DeactivateEmployee,
}

impl AuditAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FailedLogin => "login_fallido",
            Self::Login => "login_exitoso",
            Self::Logout => "logout",
            Self::CreateEmployee => "crear_empleado",
            Self::UpdateEmployee => "actualizar_empleado",
            Self::DeactivateEmployee => "desactivar_empleado",
        }
    }
}
