use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::errors::AppError;
use common::models::{WeatherRecord, WeatherUpdate};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{NewUser, User, UserStore, WeatherStore, city_key};

#[derive(Default)]
struct WeatherTable {
    rows: HashMap<String, WeatherRecord>,
    next_id: i64,
}

#[derive(Default)]
struct UserTable {
    rows: Vec<User>,
    next_id: i64,
}

/// Process-local store. Each write holds the table lock only for the
/// duration of the single insert or update.
#[derive(Default)]
pub struct MemoryStore {
    weather: RwLock<WeatherTable>,
    users: RwLock<UserTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WeatherStore for MemoryStore {
    async fn get(&self, city: &str) -> Result<Option<WeatherRecord>, AppError> {
        let table = self.weather.read().await;
        Ok(table.rows.get(&city_key(city)).cloned())
    }

    async fn list_records(&self) -> Result<Vec<WeatherRecord>, AppError> {
        let table = self.weather.read().await;
        let mut records: Vec<WeatherRecord> = table.rows.values().cloned().collect();
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    async fn upsert(
        &self,
        city: &str,
        temperature: f64,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<WeatherRecord, AppError> {
        let mut table = self.weather.write().await;
        let key = city_key(city);

        if let Some(existing) = table.rows.get_mut(&key) {
            if existing.timestamp <= now {
                existing.temperature = temperature;
                existing.description = description.to_string();
                existing.timestamp = now;
            }
            return Ok(existing.clone());
        }

        table.next_id += 1;
        let record = WeatherRecord {
            id: table.next_id,
            city: city.to_string(),
            temperature,
            description: description.to_string(),
            timestamp: now,
        };
        table.rows.insert(key, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        city: &str,
        changes: &WeatherUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<WeatherRecord>, AppError> {
        let mut table = self.weather.write().await;
        let Some(existing) = table.rows.get_mut(&city_key(city)) else {
            return Ok(None);
        };

        if let Some(temperature) = changes.temperature {
            existing.temperature = temperature;
        }
        if let Some(description) = &changes.description {
            existing.description = description.clone();
        }
        existing.timestamp = now;

        Ok(Some(existing.clone()))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let table = self.users.read().await;
        Ok(table.rows.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let table = self.users.read().await;
        Ok(table
            .rows
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut table = self.users.write().await;

        let clash = table.rows.iter().any(|u| {
            u.username == user.username
                || (user.email.is_some() && u.email.as_deref() == user.email.as_deref())
        });
        if clash {
            return Err(AppError::duplicate(
                "Failed to create user due to integrity error",
            ));
        }

        table.next_id += 1;
        let created = User {
            id: table.next_id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            disabled: user.disabled,
            hashed_password: user.hashed_password,
        };
        table.rows.push(created.clone());
        Ok(created)
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let table = self.users.read().await;
        Ok(table.rows.clone())
    }
}
