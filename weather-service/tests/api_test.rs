//! End-to-end router tests against the in-memory store and a stub provider.

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use chrono::{TimeDelta, Utc};
use common::errors::ProviderError;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use weather_service::api_client::{FetchedWeather, WeatherProvider};
use weather_service::auth::AuthService;
use weather_service::create_router;
use weather_service::handlers::AppState;
use weather_service::orchestrator::WeatherOrchestrator;
use weather_service::store::{MemoryStore, WeatherStore};

struct StubProvider {
    result: Mutex<Result<FetchedWeather, ProviderError>>,
    calls: AtomicUsize,
}

impl StubProvider {
    fn new() -> Self {
        Self {
            result: Mutex::new(Ok(FetchedWeather {
                city: "Paris".to_string(),
                temperature: 15.0,
                description: "cloudy".to_string(),
            })),
            calls: AtomicUsize::new(0),
        }
    }

    fn fail_with(&self, message: &str) {
        *self.result.lock().unwrap() = Err(ProviderError::new(message));
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherProvider for StubProvider {
    async fn fetch(&self, _city: &str) -> Result<FetchedWeather, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.lock().unwrap().clone()
    }
}

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    provider: Arc<StubProvider>,
}

fn test_app_with_prefix(prefix: &str) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(StubProvider::new());
    let weather = Arc::new(WeatherOrchestrator::new(
        store.clone(),
        provider.clone(),
        Duration::from_secs(10),
        Duration::from_secs(1),
    ));
    let state = AppState {
        weather,
        users: store.clone(),
        auth: Arc::new(AuthService::new("test-secret", Duration::from_secs(600), 4)),
    };

    TestApp {
        router: create_router(state, prefix),
        store,
        provider,
    }
}

fn test_app() -> TestApp {
    test_app_with_prefix("")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn create_user(app: &Router, body: Value) -> (StatusCode, Value) {
    let (status, _, body) = send(app, json_request("POST", "/user/create_user", body, None)).await;
    (status, body)
}

async fn token_for(app: &Router, username: &str, password: &str) -> (StatusCode, HeaderMap, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/weather/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "username={}&password={}",
            username, password
        )))
        .unwrap();
    send(app, request).await
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, _, body) = token_for(app, username, password).await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn lookup_of_unknown_city_fetches_and_stores() {
    let app = test_app();

    let (status, _, body) = send(&app.router, get("/weather/Paris")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "Paris");
    assert_eq!(body["temperature"], 15.0);
    assert_eq!(body["description"], "cloudy");
    assert!(body["timestamp"].is_string());
    assert_eq!(app.provider.calls(), 1);

    let (_, _, listed) = send(&app.router, get("/weather")).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn fresh_record_is_served_without_provider_call() {
    let app = test_app();
    let seeded = app
        .store
        .upsert("Paris", 11.0, "mist", Utc::now() - TimeDelta::seconds(3))
        .await
        .unwrap();

    let (status, _, body) = send(&app.router, get("/weather/Paris")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::to_value(&seeded).unwrap());
    assert_eq!(app.provider.calls(), 0);
}

#[tokio::test]
async fn failed_refresh_of_stale_record_is_400_and_keeps_row() {
    let app = test_app();
    let seeded = app
        .store
        .upsert("Paris", 11.0, "mist", Utc::now() - TimeDelta::seconds(30))
        .await
        .unwrap();
    app.provider
        .fail_with("OpenWeatherMap API error: Invalid API key");

    let (status, _, body) = send(&app.router, get("/weather/Paris")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "OpenWeatherMap API error: Invalid API key");
    assert_eq!(app.provider.calls(), 1);
    assert_eq!(app.store.get("Paris").await.unwrap(), Some(seeded));
}

#[tokio::test]
async fn forced_fetch_upserts_even_when_fresh() {
    let app = test_app();
    app.store
        .upsert("Paris", 11.0, "mist", Utc::now())
        .await
        .unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/weather/fetch?city_name=Paris")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "cloudy");
    assert_eq!(app.provider.calls(), 1);
    assert_eq!(app.store.list_records().await.unwrap().len(), 1);
}

#[tokio::test]
async fn forced_fetch_failure_is_400() {
    let app = test_app();
    app.provider
        .fail_with("OpenWeatherMap API error: city not found");

    let request = Request::builder()
        .method("POST")
        .uri("/weather/fetch?city_name=Atlantis")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "OpenWeatherMap API error: city not found");
    assert!(app.store.list_records().await.unwrap().is_empty());
}

#[tokio::test]
async fn direct_create_skips_provider() {
    let app = test_app();

    let (status, _, body) = send(
        &app.router,
        json_request(
            "POST",
            "/weather",
            json!({ "city": "Berlin", "temperature": 4.5, "description": "fog" }),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "Berlin");
    assert_eq!(app.provider.calls(), 0);
}

#[tokio::test]
async fn update_requires_bearer_token() {
    let app = test_app();
    app.store
        .upsert("Paris", 11.0, "mist", Utc::now())
        .await
        .unwrap();

    let (status, headers, _) = send(
        &app.router,
        json_request("PUT", "/weather/Paris", json!({ "temperature": 20.0 }), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(headers.get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");

    let (status, _, _) = send(
        &app.router,
        json_request(
            "PUT",
            "/weather/Paris",
            json!({ "temperature": 20.0 }),
            Some("not-a-jwt"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn authenticated_update_overwrites_fields() {
    let app = test_app();
    let seeded = app
        .store
        .upsert("Paris", 11.0, "mist", Utc::now() - TimeDelta::seconds(1))
        .await
        .unwrap();
    create_user(
        &app.router,
        json!({ "username": "alice", "password": "secret" }),
    )
    .await;
    let token = login(&app.router, "alice", "secret").await;

    let (status, _, body) = send(
        &app.router,
        json_request(
            "PUT",
            "/weather/paris",
            json!({ "temperature": 20.0 }),
            Some(&token),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["temperature"], 20.0);
    assert_eq!(body["description"], "mist");
    let stored = app.store.get("Paris").await.unwrap().unwrap();
    assert!(stored.timestamp > seeded.timestamp);
    assert_eq!(app.provider.calls(), 0);

    let (status, _, body) = send(
        &app.router,
        json_request(
            "PUT",
            "/weather/Atlantis",
            json!({ "description": "sunken" }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "City not found");
}

#[tokio::test]
async fn disabled_user_cannot_update() {
    let app = test_app();
    app.store
        .upsert("Paris", 11.0, "mist", Utc::now())
        .await
        .unwrap();
    create_user(
        &app.router,
        json!({ "username": "mallory", "password": "secret", "disabled": true }),
    )
    .await;
    let token = login(&app.router, "mallory", "secret").await;

    let (status, _, body) = send(
        &app.router,
        json_request(
            "PUT",
            "/weather/Paris",
            json!({ "temperature": 99.0 }),
            Some(&token),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Inactive user");
    assert_eq!(
        app.store.get("Paris").await.unwrap().unwrap().temperature,
        11.0
    );
}

#[tokio::test]
async fn bad_credentials_are_401() {
    let app = test_app();
    create_user(
        &app.router,
        json!({ "username": "alice", "password": "secret" }),
    )
    .await;

    let (status, headers, body) = token_for(&app.router, "alice", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(headers.get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    assert_eq!(body["error"], "Incorrect username or password");

    let (status, _, _) = token_for(&app.router, "nobody", "secret").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, body) = token_for(&app.router, "alice", "secret").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
}

#[tokio::test]
async fn user_creation_rejects_duplicates() {
    let app = test_app();

    let (status, body) = create_user(
        &app.router,
        json!({
            "username": "alice",
            "email": "alice@example.com",
            "full_name": "Alice Liddell",
            "password": "secret"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["disabled"], false);
    assert!(body.get("hashed_password").is_none());

    let (status, body) = create_user(
        &app.router,
        json!({ "username": "alice", "password": "other" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username already registered");

    let (status, body) = create_user(
        &app.router,
        json!({ "username": "bob", "email": "alice@example.com", "password": "other" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email already registered");

    let (status, _, users) = send(&app.router, get("/user/users")).await;
    assert_eq!(status, StatusCode::OK);
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert!(users[0].get("hashed_password").is_none());
}

#[tokio::test]
async fn routes_nest_under_api_prefix() {
    let app = test_app_with_prefix("/weather-app/v1/");

    let (status, _, _) = send(&app.router, get("/weather-app/v1/weather")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&app.router, get("/weather")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, body) = send(&app.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn openapi_document_points_at_api_prefix() {
    let app = test_app_with_prefix("/weather-app/v1");

    let (status, _, doc) = send(&app.router, get("/api-docs/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["servers"][0]["url"], "/weather-app/v1");
    assert_eq!(doc["paths"]["/health"]["servers"][0]["url"], "/");

    let scheme = &doc["components"]["securitySchemes"]["bearer_auth"];
    assert_eq!(scheme["type"], "http");
    assert_eq!(scheme["scheme"], "bearer");
    assert!(doc["paths"]["/weather/{city_name}"]["put"]["security"].is_array());

    // documented path joined with the server resolves
    let (status, _, _) = send(&app.router, get("/weather-app/v1/weather")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn openapi_document_without_prefix_has_no_servers() {
    let app = test_app();

    let (status, _, doc) = send(&app.router, get("/api-docs/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["servers"].is_null());
    assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());
}
