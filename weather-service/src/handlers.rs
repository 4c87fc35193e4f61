use axum::{
    Extension, Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use common::errors::AppError;
use common::models::{
    Token, TokenRequest, UserCreate, UserRead, WeatherCreate, WeatherRecord, WeatherUpdate,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::IntoParams;

use crate::auth::AuthService;
use crate::orchestrator::WeatherOrchestrator;
use crate::store::{NewUser, User, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub weather: Arc<WeatherOrchestrator>,
    pub users: Arc<dyn UserStore>,
    pub auth: Arc<AuthService>,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health check")
    )
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": "weather-service" }))
}

#[utoipa::path(
    get,
    path = "/weather",
    responses(
        (status = 200, description = "All stored weather records", body = Vec<WeatherRecord>)
    ),
    tag = "weather"
)]
pub async fn list_weather(
    State(state): State<AppState>,
) -> Result<Json<Vec<WeatherRecord>>, AppError> {
    let records = state.weather.list().await?;
    Ok(Json(records))
}

#[utoipa::path(
    post,
    path = "/weather",
    request_body = WeatherCreate,
    responses(
        (status = 200, description = "Stored weather record", body = WeatherRecord),
        (status = 400, description = "Validation error")
    ),
    tag = "weather"
)]
pub async fn create_weather(
    State(state): State<AppState>,
    Json(payload): Json<WeatherCreate>,
) -> Result<Json<WeatherRecord>, AppError> {
    let record = state.weather.create(&payload).await?;

    info!(city = %record.city, "Weather record created directly");

    Ok(Json(record))
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FetchQuery {
    /// City name
    pub city_name: String,
}

#[utoipa::path(
    post,
    path = "/weather/fetch",
    params(FetchQuery),
    responses(
        (status = 200, description = "Freshly fetched weather record", body = WeatherRecord),
        (status = 400, description = "Upstream weather provider error")
    ),
    tag = "weather"
)]
pub async fn fetch_weather(
    State(state): State<AppState>,
    Query(params): Query<FetchQuery>,
) -> Result<Json<WeatherRecord>, AppError> {
    info!(city = %params.city_name, "Forced weather fetch requested");

    let record = state.weather.refresh(&params.city_name).await?;

    Ok(Json(record))
}

#[utoipa::path(
    put,
    path = "/weather/{city_name}",
    params(
        ("city_name" = String, Path, description = "City name")
    ),
    request_body = WeatherUpdate,
    responses(
        (status = 200, description = "Updated weather record", body = WeatherRecord),
        (status = 400, description = "Inactive user"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "City not found")
    ),
    security(("bearer_auth" = [])),
    tag = "weather"
)]
pub async fn update_weather(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(city_name): Path<String>,
    Json(payload): Json<WeatherUpdate>,
) -> Result<Json<WeatherRecord>, AppError> {
    let record = state.weather.update(&city_name, &payload).await?;

    info!(city = %record.city, user = %user.username, "Weather record updated");

    Ok(Json(record))
}

#[utoipa::path(
    get,
    path = "/weather/{city_name}",
    params(
        ("city_name" = String, Path, description = "City name")
    ),
    responses(
        (status = 200, description = "Cached or freshly fetched weather record", body = WeatherRecord),
        (status = 400, description = "Upstream weather provider error")
    ),
    tag = "weather"
)]
pub async fn get_weather(
    State(state): State<AppState>,
    Path(city_name): Path<String>,
) -> Result<Json<WeatherRecord>, AppError> {
    info!(city = %city_name, "Weather request received");

    let record = state.weather.lookup(&city_name).await?;

    Ok(Json(record))
}

#[utoipa::path(
    post,
    path = "/weather/token",
    request_body(content = TokenRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Bearer token issued", body = Token),
        (status = 401, description = "Incorrect username or password")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<TokenRequest>,
) -> Result<Json<Token>, AppError> {
    let user = state
        .auth
        .authenticate(state.users.as_ref(), &form.username, &form.password)
        .await?;

    let token = state.auth.generate_token(&user.username)?;

    info!(user = %user.username, "Access token issued");

    Ok(Json(Token::bearer(token)))
}

#[utoipa::path(
    post,
    path = "/user/create_user",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created", body = UserRead),
        (status = 400, description = "Username or email already registered")
    ),
    tag = "user"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserRead>), AppError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::validation("Username and password are required"));
    }

    if state
        .users
        .find_by_username(&payload.username)
        .await?
        .is_some()
    {
        return Err(AppError::duplicate("Username already registered"));
    }

    let email = payload.email.filter(|e| !e.trim().is_empty());
    if let Some(email) = &email
        && state.users.find_by_email(email).await?.is_some()
    {
        return Err(AppError::duplicate("Email already registered"));
    }

    let hashed_password = state.auth.hash_password(&payload.password)?;

    let user = state
        .users
        .create_user(NewUser {
            username: payload.username,
            email,
            full_name: payload.full_name,
            disabled: payload.disabled.unwrap_or(false),
            hashed_password,
        })
        .await?;

    info!(user_id = user.id, user = %user.username, "User created");

    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    get,
    path = "/user/users",
    responses(
        (status = 200, description = "List of all users", body = Vec<UserRead>)
    ),
    tag = "user"
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserRead>>, AppError> {
    let users = state.users.list_users().await?;

    Ok(Json(users.into_iter().map(UserRead::from).collect()))
}
