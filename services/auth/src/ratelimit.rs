//! Sliding-window rate limiting behind an injectable store.
//!
//! The store is a port so a single-instance in-memory map and a shared
//! external store are interchangeable without touching calling code.
//! Multi-instance deployments must supply a shared store; the in-memory
//! implementation is process-local by construction.

#![allow(async_fn_in_trait)]

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

/// Timestamp store keyed by arbitrary string.
pub trait RateLimitStore: Send + Sync {
    async fn get(&self, key: &str) -> Vec<DateTime<Utc>>;
    async fn put(&self, key: &str, stamps: Vec<DateTime<Utc>>);
    /// Drop every key whose newest timestamp is at or before `cutoff`.
    fn sweep(&self, cutoff: DateTime<Utc>) -> impl std::future::Future<Output = ()> + Send;
}

#[derive(Default)]
pub struct InMemoryRateLimitStore {
    entries: Mutex<HashMap<String, Vec<DateTime<Utc>>>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    async fn get(&self, key: &str) -> Vec<DateTime<Utc>> {
        self.entries
            .lock()
            .await
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    async fn put(&self, key: &str, stamps: Vec<DateTime<Utc>>) {
        let mut entries = self.entries.lock().await;
        if stamps.is_empty() {
            entries.remove(key);
        } else {
            entries.insert(key.to_owned(), stamps);
        }
    }

    async fn sweep(&self, cutoff: DateTime<Utc>) {
        self.entries
            .lock()
            .await
            .retain(|_, stamps| stamps.iter().any(|t| *t > cutoff));
    }
}

/// Outcome of a limit check.
#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Quota left after this call, 0 when denied.
    pub remaining: u32,
    /// When the oldest surviving slot leaves the window; set on denial.
    pub resets_at: Option<DateTime<Utc>>,
}

/// How often the background sweeper runs.
pub const SWEEP_INTERVAL_SECS: u64 = 60;

/// Keys with no timestamp inside this bound are purged (24 hours).
pub const SWEEP_RETENTION_SECS: i64 = 86400;

pub struct RateLimiter<S: RateLimitStore> {
    store: S,
    // Check-then-record must be indivisible for concurrent calls on the
    // same key; the store itself only promises atomic get/put.
    seq: Mutex<()>,
}

impl<S: RateLimitStore> RateLimiter<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            seq: Mutex::new(()),
        }
    }

    /// Count a request against `key`, allowing at most `max` within the
    /// trailing `window_secs`. On allow the current timestamp is recorded;
    /// on deny nothing is consumed and `resets_at` reports when the oldest
    /// surviving slot expires.
    pub async fn check_limit(&self, key: &str, max: u32, window_secs: i64) -> RateLimitDecision {
        self.check_limit_at(key, max, window_secs, Utc::now()).await
    }

    pub async fn check_limit_at(
        &self,
        key: &str,
        max: u32,
        window_secs: i64,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let _guard = self.seq.lock().await;
        let window_start = now - Duration::seconds(window_secs);

        let mut stamps = self.store.get(key).await;
        stamps.retain(|t| *t > window_start);

        if stamps.len() as u32 >= max {
            let resets_at = stamps
                .iter()
                .min()
                .map(|oldest| *oldest + Duration::seconds(window_secs));
            self.store.put(key, stamps).await;
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                resets_at,
            };
        }

        stamps.push(now);
        let remaining = max - stamps.len() as u32;
        self.store.put(key, stamps).await;
        RateLimitDecision {
            allowed: true,
            remaining,
            resets_at: None,
        }
    }

    /// Non-mutating peek at how many slots `key` currently occupies.
    pub async fn get_count(&self, key: &str, window_secs: i64) -> usize {
        self.get_count_at(key, window_secs, Utc::now()).await
    }

    pub async fn get_count_at(&self, key: &str, window_secs: i64, now: DateTime<Utc>) -> usize {
        let window_start = now - Duration::seconds(window_secs);
        self.store
            .get(key)
            .await
            .iter()
            .filter(|t| **t > window_start)
            .count()
    }

    /// Purge keys with no timestamps inside the retention bound.
    pub async fn sweep(&self, now: DateTime<Utc>) {
        self.store
            .sweep(now - Duration::seconds(SWEEP_RETENTION_SECS))
            .await;
    }
}

/// Run [`RateLimiter::sweep`] every [`SWEEP_INTERVAL_SECS`] until aborted.
pub fn spawn_sweeper<S>(limiter: Arc<RateLimiter<S>>) -> tokio::task::JoinHandle<()>
where
    S: RateLimitStore + 'static,
{
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(SWEEP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            limiter.sweep(Utc::now()).await;
        }
    })
}
