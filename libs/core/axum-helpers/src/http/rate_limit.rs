use crate::audit::{extract_ip_from_headers, extract_ip_from_socket};
use crate::errors::{ErrorCode, error_response};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc, time::Duration};

/// Interval between purges of idle client state.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Per-client request budget keyed by client address.
#[derive(Clone)]
pub struct ClientRateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<String>>,
}

impl ClientRateLimiter {
    /// `per_minute` is clamped to at least 1.
    pub fn per_minute(per_minute: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN));
        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
        }
    }

    pub fn check(&self, client: &str) -> bool {
        self.limiter.check_key(&client.to_string()).is_ok()
    }

    /// Drop clients whose budget has fully refilled.
    pub fn purge_stale(&self) -> usize {
        let before = self.limiter.len();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        before.saturating_sub(self.limiter.len())
    }

    /// Spawn the periodic purge task. It lives as long as the runtime.
    pub fn spawn_cleanup(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                let removed = this.purge_stale();
                if removed > 0 {
                    tracing::info!(removed_clients = removed, "Rate limiter cleanup completed");
                }
            }
        })
    }
}

/// Client key: first `X-Forwarded-For` entry, then `X-Real-IP`, then the socket.
pub fn client_ip(request: &Request) -> String {
    extract_ip_from_headers(request.headers())
        .filter(|ip| !ip.is_empty())
        .or_else(|| {
            extract_ip_from_socket(
                request
                    .extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| *addr),
            )
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Returns 429 `RATE_LIMITED` once a client exhausts its budget.
pub async fn rate_limit_middleware(
    State(limiter): State<ClientRateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_ip(&request);
    if !limiter.check(&client) {
        tracing::info!(client = %client, path = %request.uri().path(), "Rate limit exceeded");
        return error_response(
            StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::RateLimited.default_message().to_string(),
            ErrorCode::RateLimited,
        );
    }

    next.run(request).await
}
