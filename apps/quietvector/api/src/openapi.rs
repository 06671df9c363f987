//! OpenAPI documentation configuration

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

/// Combined OpenAPI documentation for all APIs
#[derive(OpenApi)]
#[openapi(
    info(
        title = "QuietVector API",
        version = "0.1.0",
        description = "Admin API for a Qdrant vector store",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8090", description = "Local development server")
    ),
    nest(
        (path = "/api/auth", api = domain_auth::AuthApiDoc),
        (path = "/api", api = domain_vector::VectorApiDoc),
        (path = "/api", api = domain_vector::SnapshotApiDoc),
        (path = "/api/security", api = domain_security::SecurityApiDoc)
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme referenced by protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
