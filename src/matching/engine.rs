use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::panel::Panel;
use crate::catalog::store::MarkerCatalog;
use crate::core::profile::Profile;
use crate::core::types::CalculationMode;
use crate::haplogroup::cache::TreeLookupCache;
use crate::haplogroup::filter::{resolve_labels, HaplogroupFilter, LabelFailure, RetryPolicy};
use crate::haplogroup::tree::{StaticTree, TreeService};
use crate::matching::distance::{GeneticDistance, PreparedQuery};
use crate::repository::{ProfileRepository, RepositoryError};

#[derive(Error, Debug)]
pub enum MatchingError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Filtering on subclades of '{0}' requires a haplogroup tree service")]
    TreeServiceRequired(String),
}

/// A candidate that passed coverage and distance filtering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// The matched profile
    pub candidate: Profile,

    /// Distance details
    pub score: GeneticDistance,
}

/// Default cap on returned matches
pub const DEFAULT_MAX_RESULTS: usize = 1000;

/// Maximum distance used when neither the caller nor the panel gives one
pub const DEFAULT_MAX_DISTANCE: u32 = 25;

/// Profiles scored per parallel batch
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Configuration for the matching engine
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Markers compared
    pub panel: Panel,
    /// Inclusive upper bound on genetic distance
    pub max_distance: u32,
    /// Maximum number of results returned
    pub max_results: usize,
    pub mode: CalculationMode,
    pub haplogroup_filter: Option<HaplogroupFilter>,
    /// Profiles read from the repository before each parallel scoring pass
    pub chunk_size: usize,
    pub retry: RetryPolicy,
}

impl MatchingConfig {
    /// Defaults for a panel, using its default maximum distance
    pub fn for_panel(panel: &Panel) -> Self {
        Self {
            panel: panel.clone(),
            max_distance: panel.default_max_distance.unwrap_or(DEFAULT_MAX_DISTANCE),
            max_results: DEFAULT_MAX_RESULTS,
            mode: CalculationMode::default(),
            haplogroup_filter: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            retry: RetryPolicy::default(),
        }
    }
}

/// Matches plus the bookkeeping of one retrieval
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchReport {
    /// Ranked matches, at most `max_results`
    pub matches: Vec<MatchResult>,
    /// Candidates examined (the query itself excluded)
    pub scanned: usize,
    /// Candidates rejected by the coverage rule
    pub ineligible: usize,
    /// Eligible candidates beyond `max_distance`
    pub beyond_distance: usize,
    /// Candidates removed by the haplogroup filter
    pub haplogroup_excluded: usize,
    /// Labels whose ancestry lookup failed; their candidates were excluded
    pub haplogroup_failures: Vec<LabelFailure>,
}

impl MatchReport {
    /// True when some labels could not be resolved, so the haplogroup filter is incomplete
    pub fn is_haplogroup_filter_degraded(&self) -> bool {
        !self.haplogroup_failures.is_empty()
    }
}

/// Ranking order: distance ascending, then percent identical descending,
/// compared markers descending, and candidate id ascending.
pub fn rank_order(a: &MatchResult, b: &MatchResult) -> Ordering {
    a.score
        .distance
        .cmp(&b.score.distance)
        .then_with(|| b.score.percent_identical.total_cmp(&a.score.percent_identical))
        .then_with(|| b.score.compared_markers.cmp(&a.score.compared_markers))
        .then_with(|| a.candidate.id.cmp(&b.candidate.id))
}

/// The main matching engine
pub struct MatchingEngine<'a> {
    catalog: &'a MarkerCatalog,
    /// Panel, thresholds and filter settings
    config: MatchingConfig,
    tree: Option<&'a dyn TreeService>,
    cache: Option<&'a TreeLookupCache>,
}

impl<'a> MatchingEngine<'a> {
    /// Create a new matching engine
    pub fn new(catalog: &'a MarkerCatalog, config: MatchingConfig) -> Self {
        Self {
            catalog,
            config,
            tree: None,
            cache: None,
        }
    }

    /// Use a tree service for subclade filtering
    #[must_use]
    pub fn with_tree_service(mut self, tree: &'a dyn TreeService) -> Self {
        self.tree = Some(tree);
        self
    }

    /// Share a lookup cache across retrievals
    #[must_use]
    pub fn with_cache(mut self, cache: &'a TreeLookupCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Find the closest candidates to `query` in `repository`.
    ///
    /// # Errors
    ///
    /// Fails if the repository cannot be read, or if a subclade filter is
    /// requested without a tree service. Tree lookup failures are reported in
    /// the returned [`MatchReport`] instead.
    pub fn find_matches(
        &self,
        query: &Profile,
        repository: &dyn ProfileRepository,
    ) -> Result<MatchReport, MatchingError> {
        if let Some(filter) = &self.config.haplogroup_filter {
            if filter.include_descendants && self.tree.is_none() {
                return Err(MatchingError::TreeServiceRequired(filter.ancestor.clone()));
            }
        }

        let start = Instant::now();
        let prepared = PreparedQuery::new(self.catalog, query, &self.config.panel, self.config.mode);
        if prepared.active_markers() == 0 {
            warn!(
                "Query has no values on panel {}; every candidate is trivially eligible",
                self.config.panel.name()
            );
        }

        let mut report = MatchReport::default();
        let mut survivors = Vec::new();
        let chunk_size = self.config.chunk_size.max(1);
        let mut chunk = Vec::with_capacity(chunk_size);

        for item in repository.profiles()? {
            let profile = item?;
            if query.is_same_record(&profile) {
                continue;
            }
            chunk.push(profile);
            if chunk.len() >= chunk_size {
                self.score_chunk(&prepared, std::mem::take(&mut chunk), &mut survivors, &mut report);
            }
        }
        if !chunk.is_empty() {
            self.score_chunk(&prepared, chunk, &mut survivors, &mut report);
        }

        debug!(
            "Scanned {} candidates: {} within distance, {} ineligible, {} beyond distance",
            report.scanned,
            survivors.len(),
            report.ineligible,
            report.beyond_distance
        );

        if let Some(filter) = &self.config.haplogroup_filter {
            survivors = self.apply_haplogroup_filter(filter, survivors, &mut report);
        }

        survivors.par_sort_by(rank_order);
        survivors.truncate(self.config.max_results);
        report.matches = survivors;

        info!(
            "Found {} matches among {} candidates in {:?}",
            report.matches.len(),
            report.scanned,
            start.elapsed()
        );

        Ok(report)
    }

    fn score_chunk(
        &self,
        prepared: &PreparedQuery<'_>,
        chunk: Vec<Profile>,
        survivors: &mut Vec<MatchResult>,
        report: &mut MatchReport,
    ) {
        report.scanned += chunk.len();

        let scored: Vec<(Profile, GeneticDistance)> = chunk
            .into_par_iter()
            .map(|candidate| {
                let score = prepared.distance_to(&candidate);
                (candidate, score)
            })
            .collect();

        for (candidate, score) in scored {
            if !score.is_eligible {
                report.ineligible += 1;
            } else if score.distance > self.config.max_distance {
                report.beyond_distance += 1;
            } else {
                survivors.push(MatchResult { candidate, score });
            }
        }
    }

    fn apply_haplogroup_filter(
        &self,
        filter: &HaplogroupFilter,
        survivors: Vec<MatchResult>,
        report: &mut MatchReport,
    ) -> Vec<MatchResult> {
        let labels: BTreeSet<String> = survivors
            .iter()
            .filter_map(|m| m.candidate.haplogroup())
            .map(str::to_string)
            .collect();

        let resolution = match self.tree {
            Some(tree) => resolve_labels(filter, &labels, tree, self.cache, &self.config.retry),
            // Exact-label filtering never consults the tree
            None => resolve_labels(filter, &labels, &StaticTree::new(), None, &self.config.retry),
        };

        if !resolution.failures.is_empty() {
            warn!(
                "Haplogroup filter is incomplete: {} of {} labels could not be resolved",
                resolution.failures.len(),
                labels.len()
            );
        }

        let before = survivors.len();
        let kept: Vec<MatchResult> = survivors
            .into_iter()
            .filter(|m| m.candidate.haplogroup().is_some_and(|h| resolution.accepts(h)))
            .collect();

        report.haplogroup_excluded = before - kept.len();
        report.haplogroup_failures = resolution.failures;
        kept
    }

    /// Re-rank an existing result set after removing markers from the panel.
    ///
    /// Distances are recomputed for the given results only, without rescanning
    /// the repository; results that become ineligible or exceed `max_distance`
    /// are dropped and the rest are re-sorted with [`rank_order`].
    pub fn rerank_without<S: AsRef<str>>(
        &self,
        query: &Profile,
        results: Vec<MatchResult>,
        excluded: &[S],
    ) -> Vec<MatchResult> {
        let panel = self.config.panel.without(excluded);
        let prepared = PreparedQuery::new(self.catalog, query, &panel, self.config.mode);
        let before = results.len();

        let mut reranked: Vec<MatchResult> = results
            .into_par_iter()
            .map(|m| MatchResult {
                score: prepared.distance_to(&m.candidate),
                candidate: m.candidate,
            })
            .filter(|m| m.score.is_eligible && m.score.distance <= self.config.max_distance)
            .collect();

        reranked.sort_by(rank_order);
        reranked.truncate(self.config.max_results);

        debug!(
            "Re-ranked {} results over {} markers: {} kept",
            before,
            panel.len(),
            reranked.len()
        );
        reranked
    }

    /// Engine for a follow-up retrieval with markers removed from the panel
    #[must_use]
    pub fn excluding<S: AsRef<str>>(&self, excluded: &[S]) -> Self {
        let mut config = self.config.clone();
        config.panel = self.config.panel.without(excluded);
        Self {
            catalog: self.catalog,
            config,
            tree: self.tree,
            cache: self.cache,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haplogroup::tree::TreeServiceError;
    use crate::repository::{InMemoryRepository, ProfileIter};
    use std::time::Duration;

    const TWELVE: [(&str, &str); 12] = [
        ("DYS393", "13"),
        ("DYS390", "24"),
        ("DYS19", "14"),
        ("DYS391", "11"),
        ("DYS385", "11-14"),
        ("DYS426", "12"),
        ("DYS388", "12"),
        ("DYS439", "12"),
        ("DYS389i", "13"),
        ("DYS392", "13"),
        ("DYS389ii", "29"),
        ("DYS458", "17"),
    ];

    fn base(id: &str) -> Profile {
        let mut p = Profile::new(id);
        for (m, v) in TWELVE {
            p = p.with_marker(m, v);
        }
        p
    }

    fn config(catalog: &MarkerCatalog) -> MatchingConfig {
        let mut config = MatchingConfig::for_panel(catalog.panel("12").unwrap());
        config.chunk_size = 2;
        config
    }

    fn repository() -> InMemoryRepository {
        InMemoryRepository::new(vec![
            base("exact").with_haplogroup("R-L21"),
            base("one").with_marker("DYS19", "15").with_haplogroup("R-DF13"),
            base("two").with_marker("DYS439", "14").with_haplogroup("R-U106"),
            base("far")
                .with_marker("DYS19", "20")
                .with_marker("DYS390", "20")
                .with_marker("DYS458", "12"),
            base("sparse").with_marker("DYS393", "").with_marker("DYS390", "").with_marker("DYS19", ""),
            base("self"),
        ])
    }

    fn ids(matches: &[MatchResult]) -> Vec<&str> {
        matches.iter().map(|m| m.candidate.id.as_str()).collect()
    }

    #[test]
    fn test_find_matches_ranks_by_distance() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let engine = MatchingEngine::new(&catalog, config(&catalog));

        let report = engine.find_matches(&base("self"), &repository()).unwrap();
        assert_eq!(ids(&report.matches), ["exact", "one", "two"]);
        assert_eq!(report.scanned, 5);
        assert_eq!(report.ineligible, 1);
        assert_eq!(report.beyond_distance, 1);
    }

    #[test]
    fn test_self_match_suppressed() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let engine = MatchingEngine::new(&catalog, config(&catalog));
        let report = engine.find_matches(&base("self"), &repository()).unwrap();
        assert!(report.matches.iter().all(|m| m.candidate.id.as_str() != "self"));
    }

    #[test]
    fn test_ad_hoc_query_keeps_same_named_kit() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let engine = MatchingEngine::new(&catalog, config(&catalog));
        let query = Profile::query(TWELVE);
        let repo = InMemoryRepository::new(vec![base("query")]);

        let report = engine.find_matches(&query, &repo).unwrap();
        assert_eq!(report.scanned, 1);
        assert_eq!(ids(&report.matches), ["query"]);
    }

    #[test]
    fn test_max_results_truncates() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let mut config = config(&catalog);
        config.max_results = 2;
        let engine = MatchingEngine::new(&catalog, config);

        let report = engine.find_matches(&base("self"), &repository()).unwrap();
        assert_eq!(ids(&report.matches), ["exact", "one"]);
    }

    #[test]
    fn test_ties_broken_by_id() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let engine = MatchingEngine::new(&catalog, config(&catalog));
        let repo = InMemoryRepository::new(vec![base("c"), base("a"), base("b")]);

        let report = engine.find_matches(&base("self"), &repo).unwrap();
        assert_eq!(ids(&report.matches), ["a", "b", "c"]);
    }

    #[test]
    fn test_exact_haplogroup_filter() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let mut config = config(&catalog);
        config.haplogroup_filter = Some(HaplogroupFilter::new("R-L21", false));
        let engine = MatchingEngine::new(&catalog, config);

        let report = engine.find_matches(&base("self"), &repository()).unwrap();
        assert_eq!(ids(&report.matches), ["exact"]);
        assert_eq!(report.haplogroup_excluded, 2);
    }

    #[test]
    fn test_subclade_filter_requires_tree() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let mut config = config(&catalog);
        config.haplogroup_filter = Some(HaplogroupFilter::new("R-L21", true));
        let engine = MatchingEngine::new(&catalog, config);

        assert!(matches!(
            engine.find_matches(&base("self"), &repository()),
            Err(MatchingError::TreeServiceRequired(_))
        ));
    }

    #[test]
    fn test_subclade_filter() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let tree = StaticTree::new()
            .with_edge("R-L21", "R-M269")
            .with_edge("R-DF13", "R-L21")
            .with_edge("R-U106", "R-M269");
        let mut config = config(&catalog);
        config.haplogroup_filter = Some(HaplogroupFilter::new("R-L21", true));
        let engine = MatchingEngine::new(&catalog, config).with_tree_service(&tree);

        let report = engine.find_matches(&base("self"), &repository()).unwrap();
        assert_eq!(ids(&report.matches), ["exact", "one"]);
        assert!(!report.is_haplogroup_filter_degraded());
    }

    struct Unreachable;

    impl TreeService for Unreachable {
        fn is_descendant_or_equal(&self, candidate: &str, _: &str) -> Result<bool, TreeServiceError> {
            Err(TreeServiceError::Status {
                status: 502,
                label: candidate.to_string(),
            })
        }
    }

    #[test]
    fn test_tree_failure_is_not_fatal() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let mut config = config(&catalog);
        config.haplogroup_filter = Some(HaplogroupFilter::new("R-L21", true));
        config.retry = RetryPolicy {
            max_retries: 2,
            initial_backoff: Duration::ZERO,
        };
        let engine = MatchingEngine::new(&catalog, config).with_tree_service(&Unreachable);

        let report = engine.find_matches(&base("self"), &repository()).unwrap();
        // The exact label needs no lookup; the other two labels failed
        assert_eq!(ids(&report.matches), ["exact"]);
        assert!(report.is_haplogroup_filter_degraded());
        assert_eq!(report.haplogroup_failures.len(), 2);
    }

    struct Broken;

    impl ProfileRepository for Broken {
        fn profiles(&self) -> Result<ProfileIter<'_>, RepositoryError> {
            Err(RepositoryError::Unavailable("connection refused".to_string()))
        }
    }

    struct FailsMidway;

    impl ProfileRepository for FailsMidway {
        fn profiles(&self) -> Result<ProfileIter<'_>, RepositoryError> {
            Ok(Box::new(
                vec![
                    Ok(base("a")),
                    Err(RepositoryError::Unavailable("lost connection".to_string())),
                ]
                .into_iter(),
            ))
        }
    }

    #[test]
    fn test_repository_failure_is_fatal() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let engine = MatchingEngine::new(&catalog, config(&catalog));

        assert!(matches!(
            engine.find_matches(&base("self"), &Broken),
            Err(MatchingError::Repository(_))
        ));
        assert!(matches!(
            engine.find_matches(&base("self"), &FailsMidway),
            Err(MatchingError::Repository(_))
        ));
    }

    #[test]
    fn test_rerank_without_marker() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let mut config = config(&catalog);
        config.max_distance = 1;
        let engine = MatchingEngine::new(&catalog, config);
        let query = base("self");

        let report = engine.find_matches(&query, &repository()).unwrap();
        assert_eq!(ids(&report.matches), ["exact", "one"]);

        // Without DYS19 the "one" candidate becomes identical; tie broken by id
        let reranked = engine.rerank_without(&query, report.matches, &["DYS19"]);
        assert_eq!(ids(&reranked), ["exact", "one"]);
        assert!(reranked.iter().all(|m| m.score.distance == 0));
        assert!(reranked.iter().all(|m| m.score.compared_markers == 11));
    }

    #[test]
    fn test_excluding_builds_reduced_panel() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let engine = MatchingEngine::new(&catalog, config(&catalog));
        let reduced = engine.excluding(&["DYS19"]);
        assert_eq!(reduced.config().panel.len(), 11);
        assert_eq!(engine.config().panel.len(), 12);
    }
}
