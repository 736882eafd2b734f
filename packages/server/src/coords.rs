//! In-memory chip coordinates for live play sessions.
//!
//! Each session holds a map of chip index to its last reported position.
//! Concurrent writes to the same index are last-writer-wins. Sessions are
//! created on first write and dropped once idle for longer than the TTL.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ChipCoord {
    pub left: f64,
    pub bottom: f64,
}

pub type CoordMap = BTreeMap<i64, ChipCoord>;

struct SessionCoords {
    coords: CoordMap,
    last_touched: Instant,
}

#[derive(Default)]
pub struct CoordRegistry {
    sessions: DashMap<String, SessionCoords>,
}

impl CoordRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a chip position and return the session's full map.
    pub fn set(&self, session_id: &str, idx: i64, coord: ChipCoord) -> CoordMap {
        let mut entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionCoords {
                coords: CoordMap::new(),
                last_touched: Instant::now(),
            });
        entry.coords.insert(idx, coord);
        entry.last_touched = Instant::now();
        entry.coords.clone()
    }

    /// Current map for a session, empty if none was ever written.
    pub fn get(&self, session_id: &str) -> CoordMap {
        match self.sessions.get_mut(session_id) {
            Some(mut entry) => {
                entry.last_touched = Instant::now();
                entry.coords.clone()
            }
            None => CoordMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions idle for longer than `ttl`. Returns how many were removed.
    pub fn sweep_idle(&self, ttl: Duration) -> usize {
        self.sweep_idle_at(ttl, Instant::now())
    }

    fn sweep_idle_at(&self, ttl: Duration, now: Instant) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, s| now.saturating_duration_since(s.last_touched) <= ttl);
        before.saturating_sub(self.sessions.len())
    }
}

/// Periodically sweep idle sessions until the runtime shuts down.
pub fn spawn_sweeper(
    registry: Arc<CoordRegistry>,
    ttl: Duration,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = registry.sweep_idle(ttl);
            if removed > 0 {
                info!(removed, remaining = registry.len(), "Swept idle coordinate sessions");
            } else {
                debug!(remaining = registry.len(), "Coordinate sweep found nothing idle");
            }
        }
    })
}
