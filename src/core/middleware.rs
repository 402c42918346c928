use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    auth::TokenError,
    core::{
        app_error::{AppError, ErrorDetail},
        app_state::AppState,
    },
};

/// Raw bearer token of the authenticated caller.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Requires a customer token and injects the customer id as `Extension<i32>`.
pub async fn customers_authorization(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| AppError::Unauthorized("Token no proporcionado".into()))?;

    let claims = state
        .tokens
        .verify_customer(token)
        .map_err(|err| AppError::Unauthorized(err.to_string()))?;

    req.extensions_mut().insert(claims.id);
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Requires a staff token signed with the admin secret and carrying the admin
/// discriminator. Injects `Extension<StaffClaims>` and `Extension<BearerToken>`.
pub async fn staff_authorization(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| AppError::Unauthorized("Token no proporcionado".into()))?
        .to_string();

    let claims = match state.tokens.verify_staff(&token) {
        Ok(claims) => claims,
        Err(err @ TokenError::NotStaff) => {
            return Err(AppError::ForbiddenResource(err.to_string()));
        }
        Err(err) => return Err(AppError::Unauthorized(err.to_string())),
    };

    req.extensions_mut().insert(claims);
    req.extensions_mut().insert(BearerToken(token));

    Ok(next.run(req).await)
}

/// Adds the internal error detail to 500 responses. Only installed outside
/// production.
pub async fn expose_error_detail(req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let body = json!({
        "data": null,
        "message": "Internal server error",
        "error": detail,
    });

    (response.status(), Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use axum::{
        Extension, Router,
        body::to_bytes,
        http::StatusCode,
        middleware, routing,
    };
    use serde_json::Value;
    use testresult::TestResult;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        auth::StaffClaims,
        test_helpers::{get, get_with_token, strict_state},
    };

    async fn whoami(Extension(customer_id): Extension<i32>) -> String {
        customer_id.to_string()
    }

    async fn staff_name(Extension(claims): Extension<StaffClaims>) -> String {
        claims.usuario
    }

    fn customer_router(state: AppState) -> Router {
        Router::new()
            .route("/me", routing::get(whoami))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                customers_authorization,
            ))
            .with_state(state)
    }

    fn staff_router(state: AppState) -> Router {
        Router::new()
            .route("/me", routing::get(staff_name))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                staff_authorization,
            ))
            .with_state(state)
    }

    #[tokio::test]
    async fn customer_token_injects_id() -> TestResult {
        let state = strict_state();
        let token = state.tokens.issue_customer(42, "ana", "ana@raices.test")?.token;

        let res = customer_router(state)
            .oneshot(get_with_token("/me", &token))
            .await?;

        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), usize::MAX).await?;
        assert_eq!(&body[..], b"42");

        Ok(())
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() -> TestResult {
        let res = customer_router(strict_state()).oneshot(get("/me")).await?;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        Ok(())
    }

    #[tokio::test]
    async fn customer_token_cannot_reach_staff_routes() -> TestResult {
        let state = strict_state();
        let token = state.tokens.issue_customer(42, "ana", "ana@raices.test")?.token;

        let res = staff_router(state)
            .oneshot(get_with_token("/me", &token))
            .await?;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        Ok(())
    }

    #[tokio::test]
    async fn staff_token_without_admin_kind_is_forbidden() -> TestResult {
        let state = strict_state();
        let now = chrono::Utc::now().timestamp();
        let token = state.tokens.sign_staff_claims(&StaffClaims {
            id: 1,
            usuario: "caja".into(),
            rol: "cajero".into(),
            tipo: String::new(),
            iat: now,
            exp: now + 600,
        });

        let res = staff_router(state)
            .oneshot(get_with_token("/me", &token))
            .await?;

        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        Ok(())
    }

    #[tokio::test]
    async fn staff_token_injects_claims() -> TestResult {
        let state = strict_state();
        let token = state.tokens.issue_staff(1, "jefa", "admin")?.token;

        let res = staff_router(state)
            .oneshot(get_with_token("/me", &token))
            .await?;

        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), usize::MAX).await?;
        assert_eq!(&body[..], b"jefa");

        Ok(())
    }

    async fn failing() -> Result<(), AppError> {
        Err(AppError::Other(anyhow!("pool timed out")))
    }

    #[tokio::test]
    async fn error_detail_is_exposed_when_installed() -> TestResult {
        let router = Router::new()
            .route("/boom", routing::get(failing))
            .layer(middleware::from_fn(expose_error_detail));

        let res = router.oneshot(get("/boom")).await?;

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await?)?;
        assert_eq!(body["error"], "pool timed out");

        Ok(())
    }

    #[tokio::test]
    async fn error_detail_is_hidden_without_middleware() -> TestResult {
        let router = Router::new().route("/boom", routing::get(failing));

        let res = router.oneshot(get("/boom")).await?;

        let body: Value = serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await?)?;
        assert!(body.get("error").is_none());
        assert_eq!(body["message"], "Internal server error");

        Ok(())
    }
}
