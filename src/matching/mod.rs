//! Genetic distance, match ranking and marker annotations.
//!
//! This module provides the core matching functionality:
//!
//! - [`marker_difference`]: contribution of one marker to a genetic distance
//! - [`compute_distance`]: distance, coverage and identity over a panel
//! - [`MatchingEngine`]: scans a profile repository and ranks the closest candidates
//! - [`RarityTable`] / [`score_rarity`]: how common a value is among the matches
//! - [`order_by_mutation_rate`]: markers from most stable to most volatile
//!
//! ## Distance
//!
//! Each panel marker with a usable value in both profiles is compared. Simple
//! markers contribute the absolute difference of their repeat counts. Multi-copy
//! markers contribute the sum over their copies. In standard mode each marker's
//! contribution is capped at [`STANDARD_MODE_STEP_CAP`]; extended mode is uncapped.
//!
//! A candidate is eligible only when it shares at least 80% of the query's
//! usable panel markers.
//!
//! ## Ranking
//!
//! Matches are ordered by distance, then percent identical (descending), then
//! number of compared markers (descending), then candidate id.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ystr_matcher::{InMemoryRepository, MarkerCatalog, MatchingConfig, MatchingEngine, Profile};
//!
//! let catalog = MarkerCatalog::load_embedded().unwrap();
//! let panel = catalog.panel("12").unwrap();
//!
//! let query = Profile::query([("DYS393", "13"), ("DYS390", "24"), ("DYS19", "14")]);
//! let repository: InMemoryRepository = vec![
//!     Profile::new("kit-1").with_marker("DYS393", "13").with_marker("DYS390", "25"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let engine = MatchingEngine::new(&catalog, MatchingConfig::for_panel(panel));
//! let report = engine.find_matches(&query, &repository).unwrap();
//!
//! for m in &report.matches {
//!     println!("{}: GD {} ({:.1}% identical)",
//!         m.candidate.id,
//!         m.score.distance,
//!         m.score.percent_identical
//!     );
//! }
//! ```

pub mod difference;
pub mod distance;
pub mod engine;
pub mod mutation_order;
pub mod rarity;

pub use difference::{marker_difference, STANDARD_MODE_STEP_CAP};
pub use distance::{compare_markers, compute_distance, GeneticDistance, MarkerComparison};
pub use engine::{MatchReport, MatchResult, MatchingConfig, MatchingEngine, MatchingError};
pub use mutation_order::{order_by_mutation_rate, MutationCategory};
pub use rarity::{score_rarity, RarityAnnotation, RarityTable, RarityTier};
