use std::env;
use std::time::Duration;

pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub openweather_api_key: String,
    pub openweather_url: String,
    pub freshness_window: Duration,
    pub provider_timeout: Duration,
    pub api_prefix: String,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset or unparsable values fall
    /// back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            database_max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|n| n.parse().ok())
                .unwrap_or(5),
            jwt_secret: lookup("JWT_SECRET").unwrap_or_else(|| "jwt-secret".to_string()),
            access_token_ttl: Duration::from_secs(
                parsed("ACCESS_TOKEN_EXPIRE_MINUTES")
                    .unwrap_or(30)
                    .saturating_mul(60),
            ),
            bcrypt_cost: lookup("BCRYPT_COST")
                .and_then(|c| c.parse().ok())
                .unwrap_or(bcrypt::DEFAULT_COST),
            openweather_api_key: lookup("OPENWEATHER_API_KEY").unwrap_or_default(),
            openweather_url: lookup("OPENWEATHER_URL").unwrap_or_else(|| {
                "http://api.openweathermap.org/data/2.5/weather".to_string()
            }),
            freshness_window: Duration::from_secs(parsed("FRESHNESS_WINDOW_SECS").unwrap_or(10)),
            provider_timeout: Duration::from_secs(parsed("PROVIDER_TIMEOUT_SECS").unwrap_or(5)),
            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/weather-app/v1".to_string()),
            log_format: lookup("LOG_FORMAT").unwrap_or_else(|| "pretty".to_string()),
        }
    }
}
