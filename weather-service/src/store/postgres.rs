use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::errors::AppError;
use common::models::{WeatherRecord, WeatherUpdate};
use sqlx::PgPool;

use super::{NewUser, User, UserStore, WeatherStore};

/// PostgreSQL-backed store. Per-city atomicity comes from the unique index on
/// `LOWER(city)` created by the migrations.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WeatherStore for PgStore {
    async fn get(&self, city: &str) -> Result<Option<WeatherRecord>, AppError> {
        let record = sqlx::query_as::<_, WeatherRecord>(
            r#"
            SELECT id, city, temperature, description, timestamp
            FROM weather_data
            WHERE LOWER(city) = LOWER($1)
            "#,
        )
        .bind(city)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_records(&self) -> Result<Vec<WeatherRecord>, AppError> {
        let records = sqlx::query_as::<_, WeatherRecord>(
            r#"
            SELECT id, city, temperature, description, timestamp
            FROM weather_data
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn upsert(
        &self,
        city: &str,
        temperature: f64,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<WeatherRecord, AppError> {
        // No row comes back when a newer write already landed
        let written = sqlx::query_as::<_, WeatherRecord>(
            r#"
            INSERT INTO weather_data (city, temperature, description, timestamp)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT ((LOWER(city))) DO UPDATE
            SET temperature = EXCLUDED.temperature,
                description = EXCLUDED.description,
                timestamp = EXCLUDED.timestamp
            WHERE weather_data.timestamp <= EXCLUDED.timestamp
            RETURNING id, city, temperature, description, timestamp
            "#,
        )
        .bind(city)
        .bind(temperature)
        .bind(description)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match written {
            Some(record) => Ok(record),
            None => self.get(city).await?.ok_or_else(|| {
                AppError::internal(format!("Weather record for {} vanished during upsert", city))
            }),
        }
    }

    async fn update(
        &self,
        city: &str,
        changes: &WeatherUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<WeatherRecord>, AppError> {
        let record = sqlx::query_as::<_, WeatherRecord>(
            r#"
            UPDATE weather_data
            SET temperature = COALESCE($2, temperature),
                description = COALESCE($3, description),
                timestamp = $4
            WHERE LOWER(city) = LOWER($1)
            RETURNING id, city, temperature, description, timestamp
            "#,
        )
        .bind(city)
        .bind(changes.temperature)
        .bind(changes.description.as_deref())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, full_name, disabled, hashed_password
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, full_name, disabled, hashed_password
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, full_name, disabled, hashed_password)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, full_name, disabled, hashed_password
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(user.disabled)
        .bind(&user.hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let unique_violation = e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation());
            if unique_violation {
                AppError::duplicate("Failed to create user due to integrity error")
            } else {
                AppError::from(e)
            }
        })
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, full_name, disabled, hashed_password
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
