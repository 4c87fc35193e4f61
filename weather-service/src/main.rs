use common::tracing::init_tracing_for;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use weather_service::{
    api_client::OpenWeatherClient,
    auth::AuthService,
    config::Config,
    create_router, db,
    handlers::AppState,
    orchestrator::WeatherOrchestrator,
    store::{MemoryStore, PgStore, UserStore, WeatherStore},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    init_tracing_for(&config.log_format);

    let (weather_store, users): (Arc<dyn WeatherStore>, Arc<dyn UserStore>) =
        match &config.database_url {
            Some(url) => {
                let pool = db::create_pool(url, config.database_max_connections).await?;
                let store = Arc::new(PgStore::new(pool));
                let weather_store: Arc<dyn WeatherStore> = store.clone();
                let users: Arc<dyn UserStore> = store;
                (weather_store, users)
            }
            None => {
                warn!("DATABASE_URL not set, records will be kept in memory only");
                let store = Arc::new(MemoryStore::new());
                let weather_store: Arc<dyn WeatherStore> = store.clone();
                let users: Arc<dyn UserStore> = store;
                (weather_store, users)
            }
        };

    if config.openweather_api_key.is_empty() {
        warn!("OPENWEATHER_API_KEY not set, provider requests will be rejected upstream");
    }

    let provider = Arc::new(OpenWeatherClient::new(
        config.openweather_url.clone(),
        config.openweather_api_key.clone(),
        config.provider_timeout,
    )?);

    let weather = Arc::new(WeatherOrchestrator::new(
        weather_store,
        provider,
        config.freshness_window,
        config.provider_timeout,
    ));

    let state = AppState {
        weather,
        users,
        auth: Arc::new(AuthService::new(
            &config.jwt_secret,
            config.access_token_ttl,
            config.bcrypt_cost,
        )),
    };

    let app = create_router(state, &config.api_prefix);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(
        freshness_window_secs = config.freshness_window.as_secs(),
        "Weather service starting on {}", addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Weather service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }

    warn!("Shutting down gracefully...");
}
