use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, info};

/// Sliding-window counter of failed logins, keyed by normalized email.
///
/// Keys whose failures have all left the window are dropped, both when they
/// are next checked and by [`spawn_sweeper`].
pub struct LoginThrottle {
    max_attempts: u32,
    window: Duration,
    failures: DashMap<String, Vec<Instant>>,
}

impl LoginThrottle {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            failures: DashMap::new(),
        }
    }

    fn disabled(&self) -> bool {
        self.max_attempts == 0
    }

    /// Seconds until the next attempt is allowed, or `None` if allowed now.
    pub fn retry_after(&self, key: &str) -> Option<u64> {
        self.retry_after_at(key, Instant::now())
    }

    fn retry_after_at(&self, key: &str, now: Instant) -> Option<u64> {
        if self.disabled() {
            return None;
        }
        let mut entry = self.failures.get_mut(key)?;
        entry.retain(|t| now.saturating_duration_since(*t) < self.window);
        if entry.is_empty() {
            // The shard lock must be released before removing.
            drop(entry);
            self.failures.remove_if(key, |_, v| v.is_empty());
            return None;
        }
        if (entry.len() as u32) < self.max_attempts {
            return None;
        }
        let oldest = entry.first().copied()?;
        let remaining = self
            .window
            .saturating_sub(now.saturating_duration_since(oldest));
        Some(remaining.as_secs().max(1))
    }

    pub fn record_failure(&self, key: &str) {
        if self.disabled() {
            return;
        }
        self.failures
            .entry(key.to_string())
            .or_default()
            .push(Instant::now());
    }

    pub fn reset(&self, key: &str) {
        self.failures.remove(key);
    }

    /// Number of emails with failures still tracked.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Forget failures older than the window. Returns how many keys were removed.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    fn sweep_expired_at(&self, now: Instant) -> usize {
        let before = self.failures.len();
        self.failures.retain(|_, attempts| {
            attempts.retain(|t| now.saturating_duration_since(*t) < self.window);
            !attempts.is_empty()
        });
        before.saturating_sub(self.failures.len())
    }
}

/// Periodically drop expired login failures until the runtime shuts down.
pub fn spawn_sweeper(throttle: Arc<LoginThrottle>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = throttle.sweep_expired();
            if removed > 0 {
                info!(removed, remaining = throttle.len(), "Swept expired login failures");
            } else {
                debug!(remaining = throttle.len(), "Login throttle sweep found nothing expired");
            }
        }
    })
}
