use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Last-known weather for a city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct WeatherRecord {
    pub id: i64,
    pub city: String,
    pub temperature: f64,
    pub description: String,
    /// Time of the most recent successful write
    pub timestamp: DateTime<Utc>,
}

/// Direct weather record creation request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WeatherCreate {
    pub city: String,
    pub temperature: f64,
    pub description: String,
}

/// Partial update of a stored record; omitted fields are left alone
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct WeatherUpdate {
    pub temperature: Option<f64>,
    pub description: Option<String>,
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // username
    pub exp: usize,  // expiration timestamp
}

/// Account creation request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserCreate {
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub disabled: Option<bool>,
    pub password: String,
}

/// User response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserRead {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub disabled: bool,
}

/// Password grant form
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

/// Bearer token response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

impl Token {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}
