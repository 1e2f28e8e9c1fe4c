use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default lifetime of a cached tree answer
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Default maximum number of cached answers
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

type LookupKey = (String, String);

#[derive(Debug)]
struct Entry {
    answer: bool,
    inserted: Instant,
    seq: u64,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<LookupKey, Entry>,
    /// Insertion order; stale sequence numbers are skipped on eviction
    order: VecDeque<(u64, LookupKey)>,
    next_seq: u64,
}

/// Bounded, time-expiring cache of tree-service answers keyed by
/// (candidate label, ancestor label).
///
/// Owned by the host process and shared by reference; safe to use from
/// several threads.
#[derive(Debug)]
pub struct TreeLookupCache {
    state: Mutex<State>,
    ttl: Duration,
    capacity: usize,
}

impl TreeLookupCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Cached answer, if present and not expired
    pub fn get(&self, candidate: &str, ancestor: &str) -> Option<bool> {
        let key = (candidate.to_string(), ancestor.to_string());
        let mut state = self.state.lock();

        let expired = match state.entries.get(&key) {
            Some(entry) if entry.inserted.elapsed() < self.ttl => return Some(entry.answer),
            Some(_) => true,
            None => false,
        };
        if expired {
            state.entries.remove(&key);
        }
        None
    }

    pub fn insert(&self, candidate: &str, ancestor: &str, answer: bool) {
        let key = (candidate.to_string(), ancestor.to_string());
        let mut state = self.state.lock();

        let seq = state.next_seq;
        state.next_seq += 1;

        state.entries.insert(
            key.clone(),
            Entry {
                answer,
                inserted: Instant::now(),
                seq,
            },
        );
        state.order.push_back((seq, key));

        while state.entries.len() > self.capacity {
            let Some((seq, key)) = state.order.pop_front() else {
                break;
            };
            if state.entries.get(&key).is_some_and(|e| e.seq == seq) {
                state.entries.remove(&key);
            }
        }

        // Keep the order queue from growing without bound on repeated updates
        if state.order.len() > self.capacity * 2 {
            let State { entries, order, .. } = &mut *state;
            order.retain(|(seq, key)| entries.get(key).is_some_and(|e| e.seq == *seq));
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.order.clear();
    }
}

impl Default for TreeLookupCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL, DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_and_miss() {
        let cache = TreeLookupCache::default();
        assert_eq!(cache.get("R-L21", "R-M269"), None);

        cache.insert("R-L21", "R-M269", true);
        assert_eq!(cache.get("R-L21", "R-M269"), Some(true));
        assert_eq!(cache.get("R-M269", "R-L21"), None);
    }

    #[test]
    fn test_expiry() {
        let cache = TreeLookupCache::new(Duration::ZERO, 10);
        cache.insert("R-L21", "R-M269", true);
        assert_eq!(cache.get("R-L21", "R-M269"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = TreeLookupCache::new(DEFAULT_CACHE_TTL, 2);
        cache.insert("a", "x", true);
        cache.insert("b", "x", false);
        cache.insert("c", "x", true);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a", "x"), None);
        assert_eq!(cache.get("b", "x"), Some(false));
        assert_eq!(cache.get("c", "x"), Some(true));
    }

    #[test]
    fn test_update_refreshes_position() {
        let cache = TreeLookupCache::new(DEFAULT_CACHE_TTL, 2);
        cache.insert("a", "x", true);
        cache.insert("b", "x", true);
        cache.insert("a", "x", false);
        cache.insert("c", "x", true);

        // "b" is now the oldest live entry
        assert_eq!(cache.get("b", "x"), None);
        assert_eq!(cache.get("a", "x"), Some(false));
        assert_eq!(cache.get("c", "x"), Some(true));
    }
}
