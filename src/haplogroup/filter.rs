use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::haplogroup::cache::TreeLookupCache;
use crate::haplogroup::tree::{TreeService, TreeServiceError};

/// Restrict matches to a haplogroup, optionally including its subclades
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaplogroupFilter {
    /// Label every kept candidate must equal or descend from
    pub ancestor: String,

    /// When false, only exact label equality is kept and no lookups are made
    pub include_descendants: bool,
}

impl HaplogroupFilter {
    pub fn new(ancestor: impl Into<String>, include_descendants: bool) -> Self {
        Self {
            ancestor: ancestor.into().trim().to_string(),
            include_descendants,
        }
    }
}

/// Retry schedule for tree-service lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each further retry
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(retry))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

/// A label whose ancestry could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelFailure {
    pub label: String,
    pub error: String,
    /// Total lookup attempts made
    pub attempts: u32,
}

/// Outcome of resolving the distinct labels of a candidate set
#[derive(Debug, Clone, Default)]
pub struct LabelResolution {
    /// Labels that pass the filter
    pub accepted: HashSet<String>,
    /// Labels excluded because every lookup attempt failed
    pub failures: Vec<LabelFailure>,
    /// Labels answered by the cache
    pub cache_hits: usize,
    /// Lookups sent to the tree service, retries included
    pub service_calls: usize,
}

impl LabelResolution {
    pub fn accepts(&self, label: &str) -> bool {
        self.accepted.contains(label)
    }
}

/// Decide, once per distinct label, which labels pass `filter`.
///
/// `tree` is only consulted when the filter includes descendants; callers must
/// supply one in that case. Failed lookups are retried per `retry` and then
/// reported, never propagated.
pub fn resolve_labels(
    filter: &HaplogroupFilter,
    labels: &BTreeSet<String>,
    tree: &dyn TreeService,
    cache: Option<&TreeLookupCache>,
    retry: &RetryPolicy,
) -> LabelResolution {
    let mut resolution = LabelResolution::default();

    for label in labels {
        if *label == filter.ancestor {
            resolution.accepted.insert(label.clone());
            continue;
        }
        if !filter.include_descendants {
            continue;
        }

        if let Some(answer) = cache.and_then(|c| c.get(label, &filter.ancestor)) {
            resolution.cache_hits += 1;
            if answer {
                resolution.accepted.insert(label.clone());
            }
            continue;
        }

        match lookup_with_retry(tree, label, &filter.ancestor, retry, &mut resolution.service_calls) {
            Ok(answer) => {
                if let Some(cache) = cache {
                    cache.insert(label, &filter.ancestor, answer);
                }
                if answer {
                    resolution.accepted.insert(label.clone());
                }
            }
            Err((error, attempts)) => {
                warn!(
                    "Haplogroup lookup for '{}' failed after {} attempts: {}",
                    label, attempts, error
                );
                resolution.failures.push(LabelFailure {
                    label: label.clone(),
                    error: error.to_string(),
                    attempts,
                });
            }
        }
    }

    debug!(
        "Resolved {} haplogroup labels: {} accepted, {} failed, {} cache hits",
        labels.len(),
        resolution.accepted.len(),
        resolution.failures.len(),
        resolution.cache_hits
    );

    resolution
}

fn lookup_with_retry(
    tree: &dyn TreeService,
    label: &str,
    ancestor: &str,
    retry: &RetryPolicy,
    calls: &mut usize,
) -> Result<bool, (TreeServiceError, u32)> {
    let mut attempt = 0u32;
    loop {
        *calls += 1;
        match tree.is_descendant_or_equal(label, ancestor) {
            Ok(answer) => return Ok(answer),
            Err(e) if attempt < retry.max_retries => {
                let delay = retry.backoff(attempt);
                debug!(
                    "Lookup for '{}' failed ({}); retrying in {:?}",
                    label, e, delay
                );
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
                attempt += 1;
            }
            Err(e) => return Err((e, attempt + 1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haplogroup::tree::StaticTree;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn labels(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn tree() -> StaticTree {
        StaticTree::new()
            .with_edge("R-L21", "R-M269")
            .with_edge("R-DF13", "R-L21")
            .with_edge("R-U106", "R-M269")
    }

    fn no_wait() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            initial_backoff: Duration::ZERO,
        }
    }

    /// Fails for one label, counting calls
    struct Flaky {
        failing: &'static str,
        calls: AtomicUsize,
        inner: StaticTree,
    }

    impl TreeService for Flaky {
        fn is_descendant_or_equal(
            &self,
            candidate: &str,
            ancestor: &str,
        ) -> Result<bool, TreeServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if candidate == self.failing {
                return Err(TreeServiceError::Status {
                    status: 503,
                    label: candidate.to_string(),
                });
            }
            self.inner.is_descendant_or_equal(candidate, ancestor)
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            max_retries: 2,
            initial_backoff: Duration::from_millis(100),
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
    }

    #[test]
    fn test_descendants_accepted() {
        let filter = HaplogroupFilter::new("R-L21", true);
        let resolution = resolve_labels(
            &filter,
            &labels(&["R-L21", "R-DF13", "R-U106"]),
            &tree(),
            None,
            &no_wait(),
        );
        assert!(resolution.accepts("R-L21"));
        assert!(resolution.accepts("R-DF13"));
        assert!(!resolution.accepts("R-U106"));
        assert!(resolution.failures.is_empty());
    }

    #[test]
    fn test_exact_match_makes_no_calls() {
        let flaky = Flaky {
            failing: "",
            calls: AtomicUsize::new(0),
            inner: tree(),
        };
        let filter = HaplogroupFilter::new("R-L21", false);
        let resolution = resolve_labels(
            &filter,
            &labels(&["R-L21", "R-DF13"]),
            &flaky,
            None,
            &no_wait(),
        );
        assert!(resolution.accepts("R-L21"));
        assert!(!resolution.accepts("R-DF13"));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failure_retried_then_reported() {
        let flaky = Flaky {
            failing: "R-DF13",
            calls: AtomicUsize::new(0),
            inner: tree(),
        };
        let filter = HaplogroupFilter::new("R-M269", true);
        let resolution = resolve_labels(
            &filter,
            &labels(&["R-DF13", "R-U106"]),
            &flaky,
            None,
            &no_wait(),
        );

        assert!(!resolution.accepts("R-DF13"));
        assert!(resolution.accepts("R-U106"));
        assert_eq!(resolution.failures.len(), 1);
        assert_eq!(resolution.failures[0].label, "R-DF13");
        assert_eq!(resolution.failures[0].attempts, 3);
        // 3 attempts for the failing label + 1 for the healthy one
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 4);
        assert_eq!(resolution.service_calls, 4);
    }

    #[test]
    fn test_cache_avoids_repeat_calls() {
        let flaky = Flaky {
            failing: "",
            calls: AtomicUsize::new(0),
            inner: tree(),
        };
        let cache = TreeLookupCache::default();
        let filter = HaplogroupFilter::new("R-M269", true);
        let set = labels(&["R-DF13", "R-L21"]);

        let first = resolve_labels(&filter, &set, &flaky, Some(&cache), &no_wait());
        let second = resolve_labels(&filter, &set, &flaky, Some(&cache), &no_wait());

        assert_eq!(first.accepted, second.accepted);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
        assert_eq!(second.cache_hits, 2);
    }
}
