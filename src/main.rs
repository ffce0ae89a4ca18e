use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::time::Duration;

use postbook::auth::purge_spent_tokens;
use postbook::cache::ResponseCache;
use postbook::configuration::{get_configuration, RedisSettings};
use postbook::startup::run;
use postbook::telemetry::init_telemetry;

/// How often the refresh-token retention sweep runs.
const PURGE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    // A weak signing key must never make it past startup.
    if let Err(e) = configuration.jwt.validate() {
        tracing::error!("Invalid JWT configuration: {}", e);
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "JWT configuration error",
        ));
    }

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    tracing::info!("Database connection pool created successfully");

    let cache = build_cache(&configuration.redis).await;

    // Retention sweep: purge refresh tokens that are both used and expired.
    let sweep_pool = pool.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match purge_spent_tokens(&sweep_pool).await {
                Ok(purged) if purged > 0 => {
                    tracing::info!(purged, "Purged spent refresh tokens");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Refresh token purge failed: {}", e);
                }
            }
        }
    });

    let address = format!("127.0.0.1:{}", configuration.application.port);
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, pool, cache, configuration.jwt.clone())?;
    server.await
}

/// Connect the response cache.
///
/// The cache is advisory, so a missing or unreachable Redis downgrades to
/// a disabled cache instead of failing startup.
async fn build_cache(settings: &RedisSettings) -> ResponseCache {
    if !settings.enabled {
        tracing::info!("Response cache disabled by configuration");
        return ResponseCache::disabled();
    }

    let client = match redis::Client::open(settings.connection_string.as_str()) {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!("Invalid Redis configuration, cache disabled: {}", e);
            return ResponseCache::disabled();
        }
    };

    match client.get_connection_manager().await {
        Ok(manager) => {
            tracing::info!("Response cache connected");
            ResponseCache::redis(
                manager,
                Duration::from_millis(settings.operation_timeout_ms),
            )
        }
        Err(e) => {
            tracing::warn!("Redis unreachable, cache disabled: {}", e);
            ResponseCache::disabled()
        }
    }
}
