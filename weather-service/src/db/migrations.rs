use sqlx::PgPool;
use tracing::info;

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            username VARCHAR(255) UNIQUE NOT NULL,
            email VARCHAR(255) UNIQUE,
            full_name VARCHAR(255),
            disabled BOOLEAN NOT NULL DEFAULT FALSE,
            hashed_password VARCHAR(255) NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS weather_data (
            id BIGSERIAL PRIMARY KEY,
            city VARCHAR(255) NOT NULL,
            temperature DOUBLE PRECISION NOT NULL,
            description TEXT NOT NULL,
            timestamp TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One row per city regardless of case; also the upsert conflict target
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS weather_data_city_key
        ON weather_data (LOWER(city))
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database migrations completed successfully");
    Ok(())
}
