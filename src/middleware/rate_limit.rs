use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::Error;
use crate::middleware::auth::CurrentUser;

/// Who a request is counted against. Authenticated operators are counted per
/// user, everyone else per client address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateKey {
    User(i32),
    Client(IpAddr),
    Unknown,
}

impl RateKey {
    pub fn for_request(req: &Request<Body>) -> Self {
        if let Some(user) = req.extensions().get::<CurrentUser>() {
            return RateKey::User(user.id);
        }
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| RateKey::Client(addr.ip()))
            .unwrap_or(RateKey::Unknown)
    }
}

#[derive(Debug)]
struct WindowState {
    start: Instant,
    count: u32,
}

#[derive(Debug)]
struct Windows {
    entries: HashMap<RateKey, WindowState>,
    last_prune: Instant,
}

/// Fixed-window limiter with one window per [`RateKey`]. Expired windows are
/// dropped once per window length.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    state: Arc<Mutex<Windows>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            state: Arc::new(Mutex::new(Windows {
                entries: HashMap::new(),
                last_prune: Instant::now(),
            })),
        }
    }

    pub fn allow(&self, key: RateKey) -> bool {
        let mut guard = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();

        if now.duration_since(guard.last_prune) >= self.window {
            let window = self.window;
            guard
                .entries
                .retain(|_, w| now.duration_since(w.start) < window);
            guard.last_prune = now;
        }

        let entry = guard.entries.entry(key).or_insert(WindowState {
            start: now,
            count: 0,
        });
        if now.duration_since(entry.start) >= self.window {
            entry.start = now;
            entry.count = 0;
        }
        if entry.count < self.max_requests {
            entry.count += 1;
            true
        } else {
            false
        }
    }

    pub fn tracked_keys(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entries
            .len()
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let key = RateKey::for_request(&req);
    if !limiter.allow(key) {
        tracing::warn!(path = %req.uri().path(), key = ?key, "rate limit exceeded");
        return Error::RateLimited.into_response();
    }
    next.run(req).await
}

pub fn new_window_state(max_requests: u32, window_secs: u64) -> RateLimiter {
    RateLimiter::new(max_requests, Duration::from_secs(window_secs))
}
