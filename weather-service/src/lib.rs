pub mod api_client;
pub mod auth;
pub mod config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod orchestrator;
pub mod store;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::AppState;

/// Builds the full application. API routes are nested under `api_prefix`
/// (empty or `/` mounts them at the root); health and docs stay at the root.
pub fn create_router(state: AppState, api_prefix: &str) -> Router {
    // PUT requires an enabled, authenticated account
    let city_routes = get(handlers::get_weather).merge(put(handlers::update_weather).route_layer(
        axum_middleware::from_fn_with_state(state.clone(), middleware::require_active_user),
    ));

    let api_routes = Router::new()
        .route(
            "/weather",
            get(handlers::list_weather).post(handlers::create_weather),
        )
        .route("/weather/fetch", post(handlers::fetch_weather))
        .route("/weather/token", post(handlers::login))
        .route("/weather/{city_name}", city_routes)
        .route("/user/create_user", post(handlers::create_user))
        .route("/user/users", get(handlers::list_users));

    let prefix = normalize_prefix(api_prefix);
    let app = if prefix.is_empty() {
        Router::new().merge(api_routes)
    } else {
        Router::new().nest(&prefix, api_routes)
    };

    app.route("/health", get(handlers::health))
        .merge(openapi::swagger_ui(&prefix))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `""` and `"/"` mean the root; anything else gets a leading slash and no
/// trailing one.
fn normalize_prefix(api_prefix: &str) -> String {
    let prefix = api_prefix.trim_end_matches('/');
    if prefix.is_empty() || prefix.starts_with('/') {
        prefix.to_string()
    } else {
        format!("/{}", prefix)
    }
}
