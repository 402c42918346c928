use axum::Router;
use utoipa::{
    Modify,
    openapi::{
        OpenApi,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_swagger_ui::SwaggerUi;

use crate::core::app_state::AppState;

/// Name of the bearer security scheme referenced by protected handlers.
pub const BEARER_AUTH: &str = "bearerAuth";

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            BEARER_AUTH,
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Serves the Swagger UI at `/swagger-ui` and the document at
/// `/api-docs/openapi.json`.
pub fn create_swagger_ui(mut openapi: OpenApi) -> Router<AppState> {
    BearerSecurity.modify(&mut openapi);

    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
}
