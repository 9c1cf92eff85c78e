use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
    time::Duration,
};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota};
use tokio_util::sync::CancellationToken;

use crate::{api::error::ApiError, app::AppState, config::RateLimitSettings};

/// Per-client request quota: `max_requests` may arrive at once, after which
/// capacity refills evenly over `window`.
pub struct RateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    sweep_every: Duration,
}

impl RateLimiter {
    pub fn new(settings: RateLimitSettings) -> Self {
        let burst = NonZeroU32::new(settings.max_requests).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(settings.window / burst.get())
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            limiter: governor::RateLimiter::keyed(quota),
            // interval panics on a zero period
            sweep_every: settings.window.max(Duration::from_secs(1)),
        }
    }

    /// Counts a request from `client`, returns false once its quota is spent
    pub fn check(&self, client: IpAddr) -> bool {
        self.limiter.check_key(&client).is_ok()
    }

    /// Forgets clients whose quota has fully refilled
    pub fn sweep(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }

    pub async fn sweep_until_cancelled(self: Arc<Self>, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.sweep_every);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => self.sweep(),
            }
        }
        tracing::debug!("rate limiter sweeper stopped");
    }
}

pub async fn rate_limit(State(app): State<AppState>, req: Request<Body>, next: Next) -> Response {
    // Requests served without connect info (tests, unix sockets) share one bucket
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if !app.limiter.check(client) {
        tracing::warn!(client = %client, "rate limit exceeded");
        return ApiError::too_many_requests().into_response();
    }

    next.run(req).await
}
