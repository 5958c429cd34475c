use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use scribe_api::adapters::http::{api_router, with_middleware, AppServices};
use scribe_api::adapters::rate_limiter::{InMemoryRateLimiter, RateLimitConfig, RedisRateLimiter};
use scribe_api::adapters::supabase::{
    JwtSessionValidator, SupabaseAuth, SupabaseClient, SupabaseConversationRepository,
    SupabaseProfileRepository,
};
use scribe_api::config::{AppConfig, RateLimitSettings};
use scribe_api::ports::{RateLimiter, SessionValidator};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config);

    // Missing backend settings are reported, not fatal, so /health can show them.
    if let Err(e) = config.validate() {
        tracing::warn!(error = %e, "Configuration incomplete");
    }
    tracing::info!(environment = ?config.server.environment, "Starting Scribe API");

    let client = SupabaseClient::new(&config.backend)?;
    let auth = Arc::new(SupabaseAuth::new(client.public()));

    let session_validator: Arc<dyn SessionValidator> = match &config.backend.jwt_secret {
        Some(secret) => {
            tracing::info!("Verifying access tokens locally");
            Arc::new(JwtSessionValidator::new(secret))
        }
        None => auth.clone(),
    };

    let services = AppServices {
        auth_provider: auth,
        session_validator,
        profiles: Arc::new(SupabaseProfileRepository::new(client.privileged())),
        conversations: Arc::new(SupabaseConversationRepository::new(client.privileged())),
        rate_limiter: rate_limiter(&config.rate_limit).await,
        password_reset_redirect: config.backend.password_reset_redirect(),
        presence: config.backend.presence(),
    };

    let app = with_middleware(api_router(services), &config.server);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

/// Shared Redis counters when configured, process-local counters otherwise.
async fn rate_limiter(settings: &RateLimitSettings) -> Arc<dyn RateLimiter> {
    let config = RateLimitConfig::from(settings);

    if let Some(url) = &settings.redis_url {
        match RedisRateLimiter::connect(url, config.clone()).await {
            Ok(limiter) => return Arc::new(limiter),
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable, using in-memory rate limiter");
            }
        }
    }
    Arc::new(InMemoryRateLimiter::new(config))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
