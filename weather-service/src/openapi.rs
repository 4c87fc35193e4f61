use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::openapi::server::Server;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use common::models::{
    Token, TokenRequest, UserCreate, UserRead, WeatherCreate, WeatherRecord, WeatherUpdate,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::list_weather,
        handlers::create_weather,
        handlers::fetch_weather,
        handlers::update_weather,
        handlers::get_weather,
        handlers::login,
        handlers::create_user,
        handlers::list_users,
    ),
    components(schemas(
        WeatherRecord,
        WeatherCreate,
        WeatherUpdate,
        TokenRequest,
        Token,
        UserCreate,
        UserRead,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "weather", description = "Freshness-gated weather records"),
        (name = "auth", description = "Token issuance"),
        (name = "user", description = "Account management"),
    ),
)]
struct ApiDoc;

/// Registers the `bearer_auth` scheme used by the protected routes.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// OpenAPI document for routes mounted under `api_prefix`.
///
/// The prefix becomes the document's server; `/health` lives at the root and
/// gets its own server override.
pub fn api_doc(api_prefix: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();

    if !api_prefix.is_empty() {
        doc.servers = Some(vec![Server::new(api_prefix)]);
        if let Some(health) = doc.paths.paths.get_mut("/health") {
            health.servers = Some(vec![Server::new("/")]);
        }
    }

    doc
}

pub fn swagger_ui(api_prefix: &str) -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_doc(api_prefix))
}
