//! Persistence for weather records and user accounts.
//!
//! Both stores are traits so the service can run against PostgreSQL in
//! production and an in-process map when no database is configured.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::errors::AppError;
use common::models::{UserRead, WeatherRecord, WeatherUpdate};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Keyed record of city to last-known weather.
///
/// City names match case-insensitively and at most one record exists per
/// lower-cased name.
#[async_trait]
pub trait WeatherStore: Send + Sync {
    async fn get(&self, city: &str) -> Result<Option<WeatherRecord>, AppError>;

    async fn list_records(&self) -> Result<Vec<WeatherRecord>, AppError>;

    /// Insert or update the record for `city` with `timestamp = now`.
    ///
    /// Atomic per city. A stored record with a newer timestamp than `now` wins
    /// and is returned unchanged.
    async fn upsert(
        &self,
        city: &str,
        temperature: f64,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<WeatherRecord, AppError>;

    /// Overwrite the supplied fields and refresh the timestamp. `None` if the
    /// city is unknown.
    async fn update(
        &self,
        city: &str,
        changes: &WeatherUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<WeatherRecord>, AppError>;
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub disabled: bool,
    pub hashed_password: String,
}

impl From<User> for UserRead {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            disabled: user.disabled,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub disabled: bool,
    pub hashed_password: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Fails with [`AppError::DuplicateError`] on a username or email clash.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn list_users(&self) -> Result<Vec<User>, AppError>;
}

pub(crate) fn city_key(city: &str) -> String {
    city.to_lowercase()
}
