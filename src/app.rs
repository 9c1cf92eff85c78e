use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::{
    api::{self, RateLimiter},
    cache::{Cache, MokaCache, RedisCache},
    config::{RateLimitSettings, Settings},
    resolver::CacheAsideResolver,
    services::LocationService,
    store::{
        LocationStore, MemoryLocationStore, MemoryRequestLogStore, PgLocationStore,
        PgRequestLogStore, RequestLogStore, connect_to_db,
    },
    weather::{OpenWeatherClient, WeatherSource},
};

#[derive(Clone)]
pub struct AppState {
    pub locations: Arc<LocationService>,
    pub limiter: Arc<RateLimiter>,
    pub request_logs: Arc<dyn RequestLogStore>,
}

pub fn build_app_state(
    store: Arc<dyn LocationStore>,
    request_logs: Arc<dyn RequestLogStore>,
    cache: Arc<dyn Cache>,
    source: Arc<dyn WeatherSource>,
    cache_timeout: Duration,
    rate_limit: RateLimitSettings,
) -> AppState {
    let resolver = CacheAsideResolver::new(cache, source, cache_timeout);

    AppState {
        locations: Arc::new(LocationService::new(store, resolver)),
        limiter: Arc::new(RateLimiter::new(rate_limit)),
        request_logs,
    }
}

/// Opens the redis cache, falling back to an in-process cache when it can't be reached
pub async fn connect_cache(settings: &Settings) -> Arc<dyn Cache> {
    let Some(url) = &settings.redis_url else {
        tracing::info!("no redis configured, using in-process cache");
        return Arc::new(MokaCache::new());
    };

    match RedisCache::connect(url.as_str()).await {
        Ok(cache) => {
            tracing::info!("connected to redis");
            Arc::new(cache)
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to redis, using in-process cache");
            Arc::new(MokaCache::new())
        }
    }
}

async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = token.cancelled() => {},
    }

    tracing::info!("shutting down");
    token.cancel();
}

pub async fn run(config: Settings) -> Result<()> {
    let pool: Option<PgPool> = match &config.database_url {
        Some(url) => Some(connect_to_db(url.as_str()).await?),
        None => None,
    };

    let (store, request_logs): (Arc<dyn LocationStore>, Arc<dyn RequestLogStore>) = match &pool {
        Some(pool) => (
            Arc::new(PgLocationStore::new(pool.clone())),
            Arc::new(PgRequestLogStore::new(pool.clone())),
        ),
        None => (
            Arc::new(MemoryLocationStore::new()),
            Arc::new(MemoryRequestLogStore::new()),
        ),
    };
    let cache = connect_cache(&config).await;
    let source = Arc::new(OpenWeatherClient::new(&config.weather)?);

    let state = build_app_state(
        store,
        request_logs,
        cache,
        source,
        config.cache_timeout,
        config.rate_limit,
    );
    let router = api::build_router(state.clone());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("App running on {addr}");

    let shutdown = CancellationToken::new();
    let sweeper = tokio::task::spawn(
        state
            .limiter
            .clone()
            .sweep_until_cancelled(shutdown.clone()),
    );

    let served = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await;

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "rate limiter sweeper panicked");
    }
    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("database pool closed");
    }

    served?;
    Ok(())
}
