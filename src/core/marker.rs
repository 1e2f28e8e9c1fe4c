use serde::{Deserialize, Serialize};

use crate::core::types::MarkerId;

/// Weight assigned to markers with no known mutation rank; sorts them after ranked markers
pub const UNKNOWN_MUTATION_WEIGHT: f64 = 999.0;

/// A marker (STR locus) definition from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Marker name
    pub name: MarkerId,

    /// Position in the canonical catalog ordering
    #[serde(skip)]
    pub ordinal: usize,

    /// Number of numeric components (1 for simple markers)
    #[serde(default = "default_copies", skip_serializing_if = "is_single_copy")]
    pub copies: usize,

    /// Mutation speed rank, 1 = slowest (most stable)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation_rank: Option<u32>,

    /// Names of the panels this marker belongs to
    #[serde(skip)]
    pub panels: Vec<String>,
}

fn default_copies() -> usize {
    1
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde skip_serializing_if signature
fn is_single_copy(copies: &usize) -> bool {
    *copies == 1
}

impl Marker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: MarkerId::new(name),
            ordinal: 0,
            copies: 1,
            mutation_rank: None,
            panels: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_copies(mut self, copies: usize) -> Self {
        self.copies = copies;
        self
    }

    #[must_use]
    pub fn with_mutation_rank(mut self, rank: u32) -> Self {
        self.mutation_rank = Some(rank);
        self
    }

    /// Multi-copy ("palindromic") markers report several numeric components
    pub fn is_multi_copy(&self) -> bool {
        self.copies > 1
    }

    /// Mutation-rate weight; lower is more stable
    pub fn mutation_weight(&self) -> f64 {
        self.mutation_rank
            .map_or(UNKNOWN_MUTATION_WEIGHT, f64::from)
    }

    pub fn in_panel(&self, panel: &str) -> bool {
        self.panels.iter().any(|p| p == panel)
    }
}
