use anyhow::Context;
use axum::{
    Extension,
    extract::State,
    http::{HeaderMap, header},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    auth::{StaffClaims, passwords},
    core::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        extract::AppJson,
        middleware::BearerToken,
    },
    domain::{AuditAction, StaffRole},
    models::StaffProfile,
    services::{ServiceError, staff::SessionInfo},
};

pub fn public_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(login))
}

pub fn protected_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(verify))
        .routes(routes!(logout))
}

/// Client address as reported by the reverse proxy.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
        })
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

#[derive(Deserialize, Debug, ToSchema)]
struct AdminLoginReq {
    /// Username or e-mail.
    usuario: String,
    contrasena: String,
}

#[derive(Serialize, Debug, ToSchema)]
struct AdminLoginRes {
    token: String,
    expira: DateTime<Utc>,
    empleado: StaffProfile,
}

/// Exchange staff credentials for an 8h panel token. Every failed password
/// check is audited.
#[utoipa::path(
    post,
    path = "/login",
    tags = ["Admin"],
    request_body = AdminLoginReq,
    responses(
        (status = 200, description = "Logged in", body = StdResponse<AdminLoginRes, String>),
        (status = 401, description = "Unknown or inactive user, or wrong password"),
        (status = 403, description = "Role without panel access")
    )
)]
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(req): AppJson<AdminLoginReq>,
) -> Result<impl IntoResponse, AppError> {
    let staff = state
        .staff
        .find_active_by_login(req.usuario.trim())
        .await?
        .ok_or(ServiceError::InvalidCredentials)?;

    if !passwords::verify_password(req.contrasena, staff.contrasena.clone()).await? {
        state
            .staff
            .record_audit(staff.id, AuditAction::FailedLogin)
            .await?;
        tracing::warn!("Failed panel login for staff #{}", staff.id);
        return Err(ServiceError::InvalidCredentials.into());
    }

    let role = StaffRole::from_column(&staff.rol).ok_or_else(|| {
        AppError::ForbiddenResource("No tienes permisos para acceder al panel".into())
    })?;

    let issued = state
        .tokens
        .issue_staff(staff.id, &staff.usuario, role.as_str())
        .context("Failed to issue staff token")?;

    state
        .staff
        .open_session(SessionInfo {
            empleado_id: staff.id,
            token: issued.token.clone(),
            ip_address: client_ip(&headers),
            user_agent: user_agent(&headers),
            expires_at: issued.expires_at,
        })
        .await?;
    state
        .staff
        .record_audit(staff.id, AuditAction::Login)
        .await?;

    tracing::info!("Staff #{} ({}) logged in", staff.id, role.as_str());

    Ok(StdResponse {
        data: Some(AdminLoginRes {
            token: issued.token,
            expira: issued.expires_at,
            empleado: staff.into(),
        }),
        message: Some("Inicio de sesión exitoso"),
    })
}

/// Staff profile when the token's session is still open.
#[utoipa::path(
    get,
    path = "/verificar",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Session is active", body = StdResponse<StaffProfile, String>),
        (status = 401, description = "Session closed, expired or account disabled")
    )
)]
async fn verify(
    State(state): State<AppState>,
    Extension(claims): Extension<StaffClaims>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state
        .staff
        .session_profile(claims.id, &token)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Sesión expirada o inválida".into()))?;

    Ok(StdResponse {
        data: Some(profile),
        message: Some("Sesión válida"),
    })
}

#[utoipa::path(
    post,
    path = "/logout",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Session closed")
    )
)]
async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<StaffClaims>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> Result<impl IntoResponse, AppError> {
    let closed = state.staff.close_session(&token).await?;
    state
        .staff
        .record_audit(claims.id, AuditAction::Logout)
        .await?;

    tracing::info!("Staff #{} logged out ({closed} sessions closed)", claims.id);

    Ok(StdResponse::<(), _> {
        data: None,
        message: Some("Sesión cerrada exitosamente"),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use chrono::NaiveDate;
    use serde_json::json;
    use testresult::TestResult;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        models::StaffEntity,
        routes::app,
        test_helpers::{Mocks, body_json, empty_request, get_with_token, json_request, staff_token},
    };

    fn staff(hash: &str, rol: &str) -> StaffEntity {
        StaffEntity {
            id: 4,
            nombre: "Rosa".into(),
            apellido: "Huamán".into(),
            email: "rosa@raices.test".into(),
            telefono: None,
            usuario: "rosa".into(),
            contrasena: hash.to_string(),
            rol: rol.into(),
            puesto: None,
            fecha_ingreso: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            activo: true,
        }
    }

    fn login_body(password: &str) -> serde_json::Value {
        json!({ "usuario": "rosa", "contrasena": password })
    }

    #[tokio::test]
    async fn each_failed_login_is_audited() -> TestResult {
        let hash = bcrypt::hash("correcta", 4)?;
        let mut mocks = Mocks::default();
        mocks
            .staff
            .expect_find_active_by_login()
            .times(3)
            .returning(move |_| Ok(Some(staff(&hash, "cajero"))));
        mocks
            .staff
            .expect_record_audit()
            .times(3)
            .withf(|id, action| *id == 4 && *action == AuditAction::FailedLogin)
            .returning(|_, _| Ok(()));
        mocks.staff.expect_open_session().never();
        let app = app(mocks.into_state());

        for _ in 0..3 {
            let res = app
                .clone()
                .oneshot(json_request(
                    Method::POST,
                    "/admin/login",
                    None,
                    &login_body("equivocada"),
                ))
                .await?;

            assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
            assert!(body_json(res).await["data"].is_null());
        }

        Ok(())
    }

    #[tokio::test]
    async fn role_without_panel_access_is_forbidden() -> TestResult {
        let hash = bcrypt::hash("correcta", 4)?;
        let mut mocks = Mocks::default();
        mocks
            .staff
            .expect_find_active_by_login()
            .once()
            .return_once(move |_| Ok(Some(staff(&hash, "cocinero"))));
        mocks.staff.expect_open_session().never();

        let res = app(mocks.into_state())
            .oneshot(json_request(
                Method::POST,
                "/admin/login",
                None,
                &login_body("correcta"),
            ))
            .await?;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        Ok(())
    }

    #[tokio::test]
    async fn successful_login_opens_a_session() -> TestResult {
        let hash = bcrypt::hash("correcta", 4)?;
        let mut mocks = Mocks::default();
        mocks
            .staff
            .expect_find_active_by_login()
            .once()
            .return_once(move |_| Ok(Some(staff(&hash, "gerente"))));
        mocks
            .staff
            .expect_open_session()
            .once()
            .withf(|session| {
                session.empleado_id == 4
                    && session.ip_address == "203.0.113.9"
                    && session.user_agent == "unknown"
            })
            .return_once(|_| Ok(()));
        mocks
            .staff
            .expect_record_audit()
            .once()
            .withf(|id, action| *id == 4 && *action == AuditAction::Login)
            .return_once(|_, _| Ok(()));
        let state = mocks.into_state();
        let tokens = state.tokens.clone();

        let mut req = json_request(Method::POST, "/admin/login", None, &login_body("correcta"));
        req.headers_mut()
            .insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse()?);

        let res = app(state).oneshot(req).await?;

        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        let claims = tokens.verify_staff(body["data"]["token"].as_str().unwrap_or_default())?;
        assert_eq!(claims.rol, "gerente");
        assert!(body["data"]["empleado"].get("contrasena").is_none());

        Ok(())
    }

    #[tokio::test]
    async fn closed_session_fails_verification() -> TestResult {
        let mut mocks = Mocks::default();
        mocks
            .staff
            .expect_session_profile()
            .once()
            .return_once(|_, _| Ok(None));
        let state = mocks.into_state();
        let token = staff_token(&state, 4, "admin");

        let res = app(state)
            .oneshot(get_with_token("/admin/verificar", &token))
            .await?;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        Ok(())
    }

    #[tokio::test]
    async fn logout_closes_the_session_and_audits() -> TestResult {
        let token = staff_token(&Mocks::default().into_state(), 4, "cajero");
        let expected = token.clone();
        let mut mocks = Mocks::default();
        mocks
            .staff
            .expect_close_session()
            .once()
            .withf(move |token| token == expected)
            .return_once(|_| Ok(1));
        mocks
            .staff
            .expect_record_audit()
            .once()
            .withf(|id, action| *id == 4 && *action == AuditAction::Logout)
            .return_once(|_, _| Ok(()));

        let res = app(mocks.into_state())
            .oneshot(empty_request(Method::POST, "/admin/logout", &token))
            .await?;

        assert_eq!(res.status(), StatusCode::OK);

        Ok(())
    }
}
