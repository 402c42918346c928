use anyhow::Context;
use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{
    auth::passwords,
    core::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        extract::AppJson,
        middleware::customers_authorization,
    },
    mailer::{self, templates},
    models::{CustomerProfile, UpdateCustomerEntity},
    routes::ensure_owner,
    services::{
        ServiceError,
        customers::{NewCustomer, RegistrationFormData},
    },
};

pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    let public = OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(login))
        .routes(routes!(get_form_data));

    let protected = OpenApiRouter::new()
        .routes(routes!(verify))
        .routes(routes!(get_profile))
        .routes(routes!(update_profile))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            customers_authorization,
        ));

    OpenApiRouter::new().nest("/auth", public.merge(protected))
}

#[derive(Deserialize, Debug, ToSchema)]
struct RegisterReq {
    nombre: String,
    apellido: String,
    email: String,
    usuario: String,
    contrasena: String,
    telefono: Option<String>,
    direccion: Option<String>,
    tipo_documento_id: Option<i32>,
    numero_documento: Option<String>,
    genero_id: Option<i32>,
    distrito_id: Option<i32>,
    ruc: Option<String>,
}

impl From<RegisterReq> for NewCustomer {
    fn from(req: RegisterReq) -> Self {
        Self {
            nombre: req.nombre,
            apellido: req.apellido,
            email: req.email,
            usuario: req.usuario,
            contrasena: req.contrasena,
            telefono: req.telefono,
            direccion: req.direccion,
            tipo_documento_id: req.tipo_documento_id,
            numero_documento: req.numero_documento,
            genero_id: req.genero_id,
            distrito_id: req.distrito_id,
            ruc: req.ruc,
        }
    }
}

/// Register a customer account and send the welcome e-mail.
#[utoipa::path(
    post,
    path = "/registro",
    tags = ["Auth"],
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Customer registered", body = StdResponse<CustomerProfile, String>),
        (status = 400, description = "Missing fields, short password, bad RUC or duplicate account")
    )
)]
async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterReq>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.customers.register(req.into()).await?;

    mailer::dispatch(
        state.mailer.clone(),
        templates::welcome(
            &profile.email,
            &format!("{} {}", profile.nombre, profile.apellido),
        ),
    );

    Ok((
        StatusCode::CREATED,
        StdResponse {
            data: Some(profile),
            message: Some("Cliente registrado exitosamente"),
        },
    ))
}

#[derive(Deserialize, Debug, ToSchema)]
struct LoginReq {
    /// Username or e-mail.
    usuario: String,
    contrasena: String,
}

#[derive(Serialize, Debug, ToSchema)]
struct LoginRes {
    token: String,
    expira: DateTime<Utc>,
    cliente: CustomerProfile,
}

/// Exchange customer credentials for a 24h token.
#[utoipa::path(
    post,
    path = "/login",
    tags = ["Auth"],
    request_body = LoginReq,
    responses(
        (status = 200, description = "Logged in", body = StdResponse<LoginRes, String>),
        (status = 401, description = "Unknown user or wrong password")
    )
)]
async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginReq>,
) -> Result<impl IntoResponse, AppError> {
    let customer = state
        .customers
        .find_by_login(req.usuario.trim())
        .await?
        .ok_or(ServiceError::InvalidCredentials)?;

    if !passwords::verify_password(req.contrasena, customer.contrasena.clone()).await? {
        tracing::warn!("Failed login for customer #{}", customer.id);
        return Err(ServiceError::InvalidCredentials.into());
    }

    let issued = state
        .tokens
        .issue_customer(customer.id, &customer.usuario, &customer.email)
        .context("Failed to issue customer token")?;

    Ok(StdResponse {
        data: Some(LoginRes {
            token: issued.token,
            expira: issued.expires_at,
            cliente: customer.into(),
        }),
        message: Some("Inicio de sesión exitoso"),
    })
}

/// Locations, genders and document types offered by the registration form.
#[utoipa::path(
    get,
    path = "/datos-formulario",
    tags = ["Auth"],
    responses(
        (status = 200, description = "Form choices", body = StdResponse<RegistrationFormData, String>)
    )
)]
async fn get_form_data(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let data = state.customers.form_data().await?;

    Ok(StdResponse {
        data: Some(data),
        message: Some("Get form data successfully"),
    })
}

/// Profile behind the bearer token.
#[utoipa::path(
    get,
    path = "/verificar",
    tags = ["Auth"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Token is valid", body = StdResponse<CustomerProfile, String>),
        (status = 401, description = "Missing, invalid or expired token")
    )
)]
async fn verify(
    State(state): State<AppState>,
    Extension(cliente_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state.customers.profile(cliente_id).await?;

    Ok(StdResponse {
        data: Some(profile),
        message: Some("Token válido"),
    })
}

/// Fetch the profile of the authenticated customer.
#[utoipa::path(
    get,
    path = "/cliente/{id}",
    tags = ["Auth"],
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer profile", body = StdResponse<CustomerProfile, String>),
        (status = 403, description = "Profile belongs to another customer")
    )
)]
async fn get_profile(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(cliente_id): Extension<i32>,
) -> Result<impl IntoResponse, AppError> {
    ensure_owner(cliente_id, id)?;

    let profile = state.customers.profile(id).await?;

    Ok(StdResponse {
        data: Some(profile),
        message: Some("Get profile successfully"),
    })
}

/// Partially update the profile of the authenticated customer.
#[utoipa::path(
    put,
    path = "/cliente/{id}",
    tags = ["Auth"],
    security(("bearerAuth" = [])),
    params(("id" = i32, Path, description = "Customer ID")),
    request_body = UpdateCustomerEntity,
    responses(
        (status = 200, description = "Profile updated", body = StdResponse<CustomerProfile, String>),
        (status = 400, description = "Nothing to update or duplicate e-mail"),
        (status = 403, description = "Profile belongs to another customer")
    )
)]
async fn update_profile(
    Path(id): Path<i32>,
    State(state): State<AppState>,
    Extension(cliente_id): Extension<i32>,
    AppJson(changes): AppJson<UpdateCustomerEntity>,
) -> Result<impl IntoResponse, AppError> {
    ensure_owner(cliente_id, id)?;

    let profile = state.customers.update_profile(id, changes).await?;

    Ok(StdResponse {
        data: Some(profile),
        message: Some("Perfil actualizado exitosamente"),
    })
}
