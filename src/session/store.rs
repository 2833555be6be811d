//! Session binding storage.
//!
//! # Responsibilities
//! - Map a session token to the base origin it is bound to
//! - Enforce the binding TTL lazily at lookup time
//! - Allow concurrent lookups and binds (last write wins)

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Source of "now" for expiry decisions.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("manual clock mutex poisoned");
        *now += TimeDelta::from_std(by).unwrap_or(TimeDelta::MAX);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("manual clock mutex poisoned")
    }
}

/// A stored base origin and the moment it stops being valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionBinding {
    pub origin: Url,
    pub expires_at: DateTime<Utc>,
}

impl SessionBinding {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Keyed store of session bindings.
///
/// Implementations must tolerate concurrent `put`/`get` for the same token;
/// the most recent `put` wins.
pub trait SessionStore: Send + Sync {
    /// Bind `token` to `origin` for `ttl`, replacing any previous binding.
    /// Returns the expiry instant.
    fn put(&self, token: &str, origin: Url, ttl: Duration) -> DateTime<Utc>;

    /// The bound origin, if the binding exists and has not expired.
    fn get(&self, token: &str) -> Option<Url>;

    /// Number of bindings that have not yet expired.
    fn len_active(&self) -> usize;

    /// Drop expired bindings, returning how many were removed.
    fn purge_expired(&self) -> usize;
}

/// Single-process store backed by a concurrent map.
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    entries: Arc<DashMap<String, SessionBinding>>,
    clock: Arc<dyn Clock>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            clock,
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySessionStore {
    fn put(&self, token: &str, origin: Url, ttl: Duration) -> DateTime<Utc> {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.entries
            .insert(token.to_string(), SessionBinding { origin, expires_at });
        expires_at
    }

    fn get(&self, token: &str) -> Option<Url> {
        let now = self.clock.now();
        // The read guard must be released before removal.
        let lookup = self
            .entries
            .get(token)
            .map(|binding| binding.is_live(now).then(|| binding.origin.clone()));

        match lookup {
            Some(Some(origin)) => Some(origin),
            Some(None) => {
                self.entries.remove_if(token, |_, binding| !binding.is_live(now));
                None
            }
            None => None,
        }
    }

    fn len_active(&self) -> usize {
        let now = self.clock.now();
        self.entries.iter().filter(|e| e.value().is_live(now)).count()
    }

    fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, binding| binding.is_live(now));
        before.saturating_sub(self.entries.len())
    }
}
