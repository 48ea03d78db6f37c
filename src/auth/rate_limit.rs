//! Fixed-window throttle for login attempts, keyed by client IP.
//!
//! A key's window opens on its first attempt and lasts `window`; at the
//! boundary the count drops straight back to zero. IPv6 clients are keyed
//! by their /64, the smallest block a single host is usually handed.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{config::LoginLimitConfig, error::ApiError, state::AppState};

/// Past this many tracked keys, expired windows are swept, at most once per window.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Clone)]
pub struct LoginLimiter {
    max_attempts: u32,
    window: Duration,
    state: Arc<Mutex<Windows>>,
}

#[derive(Default)]
struct Windows {
    by_key: HashMap<IpAddr, Window>,
    last_sweep: Option<Instant>,
}

struct Window {
    count: u32,
    started: Instant,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl LoginLimiter {
    pub fn new(cfg: &LoginLimitConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts,
            window: Duration::from_secs(cfg.window_secs),
            state: Arc::new(Mutex::new(Windows::default())),
        }
    }

    pub fn check(&self, ip: IpAddr) -> Decision {
        self.check_at(ip, Instant::now())
    }

    fn check_at(&self, ip: IpAddr, now: Instant) -> Decision {
        let mut state = self.state.lock();
        let window = self.window;
        let sweep_due = state
            .last_sweep
            .map_or(true, |last| now.duration_since(last) >= window);
        if state.by_key.len() > SWEEP_THRESHOLD && sweep_due {
            state.by_key.retain(|_, w| now.duration_since(w.started) < window);
            state.last_sweep = Some(now);
            debug!(tracked = state.by_key.len(), "login limiter swept");
        }

        let entry = state.by_key.entry(limit_key(ip)).or_insert(Window {
            count: 0,
            started: now,
        });
        if now.duration_since(entry.started) >= self.window {
            entry.count = 0;
            entry.started = now;
        }

        if entry.count >= self.max_attempts {
            return Decision::Limited {
                retry_after: (entry.started + self.window).saturating_duration_since(now),
            };
        }
        entry.count += 1;
        Decision::Allowed {
            remaining: self.max_attempts - entry.count,
        }
    }
}

fn limit_key(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(Ipv6Addr::from(u128::from(v6) & !(u64::MAX as u128))),
        },
        v4 => v4,
    }
}

/// Extractor placed ahead of the login body: over-limit requests are turned
/// away before any credential lookup happens.
pub struct LoginThrottle;

#[async_trait]
impl FromRequestParts<AppState> for LoginThrottle {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

        match state.login_limiter.check(ip) {
            Decision::Allowed { remaining } => {
                debug!(%ip, remaining, "login attempt allowed");
                Ok(LoginThrottle)
            }
            Decision::Limited { retry_after } => {
                warn!(%ip, retry_after_secs = retry_after.as_secs(), "login rate limit exceeded");
                Err(ApiError::RateLimited {
                    retry_after_secs: retry_after.as_secs().max(1),
                })
            }
        }
    }
}
