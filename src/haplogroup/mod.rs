//! Haplogroup (subclade) filtering through an external phylogenetic tree service.
//!
//! The matching engine never interprets the tree itself. It collects the
//! distinct haplogroup labels among surviving candidates and asks a
//! [`TreeService`] once per label whether that label descends from (or equals)
//! the filter's ancestor. Answers can be shared across retrievals through a
//! [`TreeLookupCache`].
//!
//! - [`StaticTree`]: in-memory parent map, loaded from JSON
//! - [`HttpTreeService`]: remote lookup over HTTP with a bounded timeout
//!
//! Lookup failures are not fatal: after retrying with exponential backoff the
//! label is excluded from the filtered results and reported in
//! [`LabelResolution::failures`].

pub mod cache;
pub mod filter;
pub mod tree;

pub use cache::TreeLookupCache;
pub use filter::{HaplogroupFilter, LabelFailure, LabelResolution, RetryPolicy};
pub use tree::{HttpTreeService, StaticTree, TreeService, TreeServiceConfig, TreeServiceError};
