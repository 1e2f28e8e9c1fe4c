//! Marker value rarity within a cohort of matches.
//!
//! Frequencies are computed over a snapshot of the match list; pass an
//! immutable slice and recompute whenever the list changes.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::catalog::store::MarkerCatalog;
use crate::core::profile::Profile;
use crate::core::types::MarkerId;
use crate::core::value::MarkerValue;
use crate::matching::engine::MatchResult;

/// Cohorts smaller than this are not scored
pub const MIN_COHORT_SIZE: usize = 5;

/// Rarity classification of a marker value within a cohort
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RarityTier {
    ExtremelyRare,
    VeryRare,
    Rare,
    Uncommon,
    Common,
}

impl RarityTier {
    /// Classify a frequency fraction (inclusive upper bounds)
    #[must_use]
    pub fn from_fraction(fraction: f64) -> Self {
        if fraction <= 0.04 {
            Self::ExtremelyRare
        } else if fraction <= 0.08 {
            Self::VeryRare
        } else if fraction <= 0.15 {
            Self::Rare
        } else if fraction <= 0.25 {
            Self::Uncommon
        } else {
            Self::Common
        }
    }
}

impl std::fmt::Display for RarityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExtremelyRare => write!(f, "extremely-rare"),
            Self::VeryRare => write!(f, "very-rare"),
            Self::Rare => write!(f, "rare"),
            Self::Uncommon => write!(f, "uncommon"),
            Self::Common => write!(f, "common"),
        }
    }
}

/// Frequency of one marker value within a cohort
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RarityAnnotation {
    /// Fraction of the cohort carrying this value, in `[0, 1]`
    pub frequency_fraction: f64,
    pub tier: RarityTier,
}

impl RarityAnnotation {
    fn from_counts(count: usize, cohort_size: usize) -> Option<Self> {
        if cohort_size < MIN_COHORT_SIZE {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let frequency_fraction = count as f64 / cohort_size as f64;
        Some(Self {
            frequency_fraction,
            tier: RarityTier::from_fraction(frequency_fraction),
        })
    }
}

/// Score how common `value` is for `marker` across the cohort.
///
/// Returns `None` for cohorts below [`MIN_COHORT_SIZE`], unknown markers, or
/// values that do not normalize. Intended for the query's own value.
pub fn score_rarity(
    catalog: &MarkerCatalog,
    cohort: &[MatchResult],
    marker: &str,
    value: &str,
) -> Option<RarityAnnotation> {
    if cohort.len() < MIN_COHORT_SIZE {
        return None;
    }

    let marker = catalog.get(marker)?;
    let target = crate::core::value::normalize(marker, Some(value))?;

    let count = cohort
        .iter()
        .filter(|m| m.candidate.value(marker).as_ref() == Some(&target))
        .count();

    RarityAnnotation::from_counts(count, cohort.len())
}

/// Per-(marker, value) counts over one cohort snapshot
#[derive(Debug, Clone)]
pub struct RarityTable {
    counts: HashMap<MarkerId, HashMap<MarkerValue, usize>>,
    cohort_size: usize,
}

impl RarityTable {
    /// Count every catalog marker value carried by the cohort in a single pass
    pub fn build(catalog: &MarkerCatalog, cohort: &[MatchResult]) -> Self {
        let mut counts: HashMap<MarkerId, HashMap<MarkerValue, usize>> = HashMap::new();

        if cohort.len() >= MIN_COHORT_SIZE {
            for m in cohort {
                for marker in catalog.markers() {
                    if let Some(value) = m.candidate.value(marker) {
                        *counts
                            .entry(marker.name.clone())
                            .or_default()
                            .entry(value)
                            .or_default() += 1;
                    }
                }
            }
        }

        Self {
            counts,
            cohort_size: cohort.len(),
        }
    }

    pub fn cohort_size(&self) -> usize {
        self.cohort_size
    }

    /// Annotation for one normalized value
    pub fn get(&self, marker: &MarkerId, value: &MarkerValue) -> Option<RarityAnnotation> {
        let count = self
            .counts
            .get(marker)
            .and_then(|values| values.get(value))
            .copied()
            .unwrap_or(0);
        RarityAnnotation::from_counts(count, self.cohort_size)
    }

    /// Annotate each of the query's values against the cohort
    pub fn annotate(
        &self,
        catalog: &MarkerCatalog,
        query: &Profile,
    ) -> BTreeMap<MarkerId, RarityAnnotation> {
        if self.cohort_size < MIN_COHORT_SIZE {
            return BTreeMap::new();
        }

        catalog
            .markers()
            .iter()
            .filter_map(|marker| {
                let value = query.value(marker)?;
                let annotation = self.get(&marker.name, &value)?;
                Some((marker.name.clone(), annotation))
            })
            .collect()
    }
}
