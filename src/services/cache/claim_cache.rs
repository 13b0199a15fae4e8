//! In-memory cache of claim check decisions.
//!
//! Entries are keyed by `(user_id, claim_name)` and evicted by a periodic
//! sweep task owned by the cache. Lookups never look at the entry age; only
//! the sweep enforces the lifetime.
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Lifetime and sweep settings for a [`ClaimCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimCacheConfig {
    pub enabled: bool,
    // 0 = entries never expire.
    pub lifetime_seconds: u64,
    // 0 = no periodic sweep.
    pub cleanup_interval_seconds: u64,
}

impl Default for ClaimCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lifetime_seconds: 300,
            cleanup_interval_seconds: 120,
        }
    }
}

/// A cached claim check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheValue {
    pub has_claim: bool,
    pub recorded_at: Instant,
}

#[derive(Debug, Default)]
struct CacheState {
    enabled: bool,
    // user_id -> claim_name -> value
    entries: HashMap<String, HashMap<String, CacheValue>>,
    sweeper: Option<JoinHandle<()>>,
}

impl CacheState {
    fn remove_outdated(&mut self, lifetime: Duration, now: Instant) -> usize {
        let mut removed = 0;

        self.entries.retain(|_, claims| {
            let before = claims.len();
            claims.retain(|_, value| now.saturating_duration_since(value.recorded_at) <= lifetime);
            removed += before - claims.len();
            !claims.is_empty()
        });

        removed
    }
}

/// TTL-bounded cache of claim decisions with an enable/disable lifecycle.
///
/// All state sits behind one mutex, so a sweep tick never interleaves with
/// `add` or with the stop-then-clear sequence of [`ClaimCache::disable`].
#[derive(Debug)]
pub struct ClaimCache {
    config: ClaimCacheConfig,
    state: Arc<Mutex<CacheState>>,
}

impl ClaimCache {
    /// Build a cache and enable it right away when `config.enabled` is set.
    ///
    /// Enabling spawns the sweep on the current tokio runtime.
    pub fn new(config: ClaimCacheConfig) -> Self {
        let cache = Self {
            config,
            state: Arc::new(Mutex::new(CacheState::default())),
        };

        if config.enabled {
            cache.enable();
        }

        cache
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    /// Enable the cache and start the periodic sweep.
    ///
    /// Repeated calls are no-ops. No sweep is scheduled when either the
    /// lifetime or the cleanup interval is zero.
    pub fn enable(&self) {
        let mut state = self.lock();
        if state.enabled {
            return;
        }

        state.enabled = true;
        state.sweeper = self.spawn_sweeper();

        tracing::debug!(
            lifetime_seconds = self.config.lifetime_seconds,
            cleanup_interval_seconds = self.config.cleanup_interval_seconds,
            sweeping = state.sweeper.is_some(),
            "claim cache enabled"
        );
    }

    /// Stop the sweep and drop every entry.
    pub fn disable(&self) {
        let mut state = self.lock();
        if !state.enabled {
            return;
        }

        state.enabled = false;
        if let Some(handle) = state.sweeper.take() {
            handle.abort();
        }
        state.entries.clear();

        tracing::debug!("claim cache disabled");
    }

    /// Record a claim check result. Overwrites value and timestamp of an
    /// existing entry.
    pub fn add(&self, user_id: &str, claim_name: &str, has_claim: bool) {
        let mut state = self.lock();
        if !state.enabled {
            return;
        }

        let value = CacheValue {
            has_claim,
            recorded_at: Instant::now(),
        };

        state
            .entries
            .entry(user_id.to_owned())
            .or_default()
            .insert(claim_name.to_owned(), value);
    }

    pub fn get(&self, user_id: &str, claim_name: &str) -> Option<CacheValue> {
        self.lock()
            .entries
            .get(user_id)
            .and_then(|claims| claims.get(claim_name))
            .copied()
    }

    pub fn has_matching_entry(&self, user_id: &str, claim_name: &str) -> bool {
        self.lock()
            .entries
            .get(user_id)
            .is_some_and(|claims| claims.contains_key(claim_name))
    }

    /// Number of cached `(user_id, claim_name)` pairs.
    pub fn len(&self) -> usize {
        self.lock().entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry older than the configured lifetime.
    ///
    /// Returns the number of removed entries.
    pub fn sweep(&self) -> usize {
        sweep_state(&self.state, self.config.lifetime_seconds)
    }

    #[cfg(test)]
    pub(crate) fn is_sweeping(&self) -> bool {
        self.lock().sweeper.is_some()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // Entries stay consistent even if a holder panicked.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_sweeper(&self) -> Option<JoinHandle<()>> {
        let lifetime_seconds = self.config.lifetime_seconds;
        let interval_seconds = self.config.cleanup_interval_seconds;
        if lifetime_seconds == 0 || interval_seconds == 0 {
            return None;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("no tokio runtime available; claim cache sweep is not scheduled");
                return None;
            }
        };

        let period = Duration::from_secs(interval_seconds);
        let Some(first_tick) = Instant::now().checked_add(period) else {
            tracing::warn!(
                cleanup_interval_seconds = interval_seconds,
                "cleanup interval out of range; claim cache sweep is not scheduled"
            );
            return None;
        };

        let state = Arc::downgrade(&self.state);

        Some(runtime.spawn(run_sweeper(state, lifetime_seconds, first_tick, period)))
    }
}

impl Drop for ClaimCache {
    fn drop(&mut self) {
        if let Some(handle) = self.lock().sweeper.take() {
            handle.abort();
        }
    }
}

async fn run_sweeper(
    state: Weak<Mutex<CacheState>>,
    lifetime_seconds: u64,
    first_tick: Instant,
    period: Duration,
) {
    let mut deadline = first_tick;

    loop {
        tokio::time::sleep_until(deadline).await;

        let Some(state) = state.upgrade() else {
            return;
        };

        let removed = sweep_state(&state, lifetime_seconds);
        if removed > 0 {
            tracing::debug!(removed, "removed outdated claim cache entries");
        }

        // Next tick is one full period after this sweep finished.
        deadline = match Instant::now().checked_add(period) {
            Some(next) => next,
            None => {
                tracing::warn!("cleanup interval out of range; claim cache sweep stopped");
                return;
            }
        };
    }
}

fn sweep_state(state: &Mutex<CacheState>, lifetime_seconds: u64) -> usize {
    if lifetime_seconds == 0 {
        return 0;
    }

    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    state.remove_outdated(Duration::from_secs(lifetime_seconds), Instant::now())
}
