//! # ystr-matcher
//!
//! A library for comparing Y-STR haplotypes and ranking genealogical matches.
//!
//! A Y-STR haplotype is a set of repeat counts at short tandem repeat markers on
//! the Y chromosome. Two men who share a recent paternal ancestor have similar
//! repeat counts, and the number of mutational steps separating their haplotypes
//! (the genetic distance) is the standard measure of relatedness used by
//! genealogy testing services.
//!
//! `ystr-matcher` computes that distance over standard marker panels and ranks
//! the closest candidates in a profile database.
//!
//! ## Features
//!
//! - **Panels**: the 12/25/37/67/111-marker panels and the GP set, or any custom subset
//! - **Multi-copy markers**: palindromic markers such as DYS385 and DYS464
//! - **Coverage rule**: candidates must share 80% of the query's markers
//! - **Haplogroup filtering**: restrict matches to a clade through a tree service
//! - **Rarity**: how common the query's values are among its matches
//! - **Mutation order**: markers ranked from most stable to most volatile
//!
//! ## Example
//!
//! ```rust,no_run
//! use ystr_matcher::{compute_distance, CalculationMode, MarkerCatalog, Profile};
//!
//! // Load the embedded marker catalog
//! let catalog = MarkerCatalog::load_embedded().unwrap();
//! let panel = catalog.panel("12").unwrap();
//!
//! let a = Profile::new("a").with_marker("DYS393", "13").with_marker("DYS385", "11-14");
//! let b = Profile::new("b").with_marker("DYS393", "14").with_marker("DYS385", "11-15");
//!
//! let score = compute_distance(&catalog, &a, &b, panel, CalculationMode::Standard);
//! println!("GD {} over {} markers", score.distance, score.compared_markers);
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Marker catalog and panels
//! - [`core`]: Markers, profiles and value normalization
//! - [`matching`]: Distance, ranking, rarity and mutation order
//! - [`haplogroup`]: Haplogroup tree lookups and filtering
//! - [`repository`]: Profile sources
//! - [`cli`]: Command-line interface implementation

pub mod catalog;
pub mod cli;
pub mod core;
pub mod haplogroup;
pub mod matching;
pub mod repository;
pub mod utils;

// Re-export commonly used types for convenience
pub use catalog::panel::Panel;
pub use catalog::store::{CatalogError, MarkerCatalog};
pub use crate::core::marker::Marker;
pub use crate::core::profile::Profile;
pub use crate::core::types::*;
pub use crate::core::value::{normalize, MarkerValue};
pub use haplogroup::{HaplogroupFilter, StaticTree, TreeLookupCache, TreeService};
pub use matching::distance::{compare_markers, compute_distance, GeneticDistance};
pub use matching::engine::{MatchReport, MatchResult, MatchingConfig, MatchingEngine};
pub use matching::mutation_order::order_by_mutation_rate;
pub use matching::rarity::{score_rarity, RarityTable};
pub use repository::{InMemoryRepository, JsonProfileRepository, ProfileRepository};
