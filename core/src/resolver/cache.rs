//! Connection-table cache.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::Instant;

struct Snapshot {
    output: Arc<str>,
    captured_at: Instant,
}

#[derive(Default)]
struct State {
    snapshot: Option<Snapshot>,
    /// Bumped on every invalidation.
    generation: u64,
}

/// Last captured connection table, reusable for a fixed time-to-live.
///
/// Shared by the resolver (reads and refreshes) and the process killer
/// (invalidates after a kill). A capture older than the TTL is never served.
pub struct ResolutionCache {
    state: RwLock<State>,
    ttl: Duration,
}

impl ResolutionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            state: RwLock::new(State::default()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached output, if one exists and is younger than the TTL.
    pub fn fresh(&self) -> Option<Arc<str>> {
        let state = self.state.read();
        state
            .snapshot
            .as_ref()
            .filter(|s| s.captured_at.elapsed() < self.ttl)
            .map(|s| Arc::clone(&s.output))
    }

    /// Current invalidation generation.
    ///
    /// Read it before running the enumeration command and pass it to
    /// [`store`](Self::store), so output captured before a kill is dropped.
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    /// Store a fresh capture taken during `generation`.
    ///
    /// Returns false (and stores nothing) if the cache was invalidated since.
    pub fn store(&self, generation: u64, output: Arc<str>) -> bool {
        let mut state = self.state.write();
        if state.generation != generation {
            return false;
        }
        state.snapshot = Some(Snapshot {
            output,
            captured_at: Instant::now(),
        });
        true
    }

    /// Purge the cached capture.
    pub fn invalidate(&self) {
        let mut state = self.state.write();
        state.snapshot = None;
        state.generation = state.generation.wrapping_add(1);
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().snapshot.is_none()
    }
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("ttl", &self.ttl)
            .field("empty", &self.is_empty())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> ResolutionCache {
        ResolutionCache::new(Duration::from_secs(2))
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_within_ttl() {
        let cache = cache();
        assert!(cache.fresh().is_none());

        assert!(cache.store(cache.generation(), Arc::from("TCP 0.0.0.0:80")));
        tokio::time::advance(Duration::from_millis(1999)).await;
        assert_eq!(cache.fresh().as_deref(), Some("TCP 0.0.0.0:80"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_after_ttl() {
        let cache = cache();
        cache.store(cache.generation(), Arc::from("table"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.fresh().is_none());
    }

    #[test]
    fn test_invalidate() {
        let cache = cache();
        cache.store(cache.generation(), Arc::from("table"));
        assert!(!cache.is_empty());

        cache.invalidate();
        assert!(cache.is_empty());
        assert!(cache.fresh().is_none());
    }

    #[test]
    fn test_store_after_invalidation_is_dropped() {
        let cache = cache();
        let generation = cache.generation();

        // A kill lands while the enumeration command is running
        cache.invalidate();

        assert!(!cache.store(generation, Arc::from("pre-kill table")));
        assert!(cache.is_empty());
        assert!(cache.store(cache.generation(), Arc::from("post-kill table")));
    }
}
