use serde::Serialize;

use crate::catalog::panel::Panel;
use crate::catalog::store::MarkerCatalog;
use crate::core::marker::Marker;
use crate::core::profile::Profile;
use crate::core::types::{CalculationMode, MarkerId};
use crate::core::value::MarkerValue;
use crate::matching::difference::marker_difference;

/// Percentage of the query's active panel markers a candidate must share to be eligible
pub const MIN_COVERAGE_PERCENT: usize = 80;

/// Safely convert usize to f64 for percentage calculations
#[inline]
fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Minimum number of compared markers: `ceil(0.8 * active)`
pub fn min_required_markers(active: usize) -> usize {
    (active * MIN_COVERAGE_PERCENT).div_ceil(100)
}

/// Genetic distance between a query and one candidate over a panel
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeneticDistance {
    /// Summed per-marker contributions (0 when ineligible)
    pub distance: u32,

    /// Markers with comparable values on both sides
    pub compared_markers: usize,

    /// Compared markers whose contribution was 0
    pub identical_markers: usize,

    /// `identical / compared * 100`, 0 when ineligible
    pub percent_identical: f64,

    /// Whether the candidate met the minimum coverage rule
    pub is_eligible: bool,
}

impl GeneticDistance {
    fn ineligible(compared_markers: usize, identical_markers: usize) -> Self {
        Self {
            distance: 0,
            compared_markers,
            identical_markers,
            percent_identical: 0.0,
            is_eligible: false,
        }
    }
}

/// A query's panel values, normalized once and reused for every candidate
#[derive(Debug, Clone)]
pub struct PreparedQuery<'a> {
    entries: Vec<(&'a Marker, MarkerValue)>,
    mode: CalculationMode,
}

impl<'a> PreparedQuery<'a> {
    /// Restrict the panel to markers with a usable query value
    pub fn new(
        catalog: &'a MarkerCatalog,
        query: &Profile,
        panel: &Panel,
        mode: CalculationMode,
    ) -> Self {
        let entries = panel
            .markers()
            .iter()
            .filter_map(|id| catalog.get(id.as_str()))
            .filter_map(|marker| query.value(marker).map(|value| (marker, value)))
            .collect();

        Self { entries, mode }
    }

    /// Panel markers with a present query value
    pub fn active_markers(&self) -> usize {
        self.entries.len()
    }

    pub fn min_required(&self) -> usize {
        min_required_markers(self.active_markers())
    }

    pub fn mode(&self) -> CalculationMode {
        self.mode
    }

    /// Compute the distance from the query to `candidate`
    pub fn distance_to(&self, candidate: &Profile) -> GeneticDistance {
        let mut distance = 0u32;
        let mut compared = 0usize;
        let mut identical = 0usize;

        for (marker, query_value) in &self.entries {
            let Some(candidate_value) = candidate.value(marker) else {
                continue;
            };
            let Some(diff) = marker_difference(query_value, &candidate_value, self.mode) else {
                continue;
            };

            compared += 1;
            distance = distance.saturating_add(diff);
            if diff == 0 {
                identical += 1;
            }
        }

        if compared < self.min_required() {
            return GeneticDistance::ineligible(compared, identical);
        }

        let percent_identical = if compared == 0 {
            0.0
        } else {
            count_to_f64(identical) / count_to_f64(compared) * 100.0
        };

        GeneticDistance {
            distance,
            compared_markers: compared,
            identical_markers: identical,
            percent_identical,
            is_eligible: true,
        }
    }
}

/// Compute the genetic distance between a query and a candidate over a panel
pub fn compute_distance(
    catalog: &MarkerCatalog,
    query: &Profile,
    candidate: &Profile,
    panel: &Panel,
    mode: CalculationMode,
) -> GeneticDistance {
    PreparedQuery::new(catalog, query, panel, mode).distance_to(candidate)
}

/// Side-by-side values and difference for one panel marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerComparison {
    pub marker: MarkerId,
    pub query_value: Option<MarkerValue>,
    pub candidate_value: Option<MarkerValue>,
    /// `None` when the marker was not compared
    pub difference: Option<u32>,
}

/// Per-marker breakdown over every panel marker, in panel order
pub fn compare_markers(
    catalog: &MarkerCatalog,
    query: &Profile,
    candidate: &Profile,
    panel: &Panel,
    mode: CalculationMode,
) -> Vec<MarkerComparison> {
    panel
        .markers()
        .iter()
        .filter_map(|id| catalog.get(id.as_str()))
        .map(|marker| {
            let query_value = query.value(marker);
            let candidate_value = candidate.value(marker);
            let difference = match (&query_value, &candidate_value) {
                (Some(a), Some(b)) => marker_difference(a, b, mode),
                _ => None,
            };
            MarkerComparison {
                marker: marker.name.clone(),
                query_value,
                candidate_value,
                difference,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn profile(id: &str, values: &[(&str, &str)]) -> Profile {
        let mut p = Profile::new(id);
        for (m, v) in values {
            p = p.with_marker(*m, *v);
        }
        p
    }

    #[test]
    fn test_min_required_markers() {
        assert_eq!(min_required_markers(0), 0);
        assert_eq!(min_required_markers(1), 1);
        assert_eq!(min_required_markers(5), 4);
        assert_eq!(min_required_markers(12), 10);
        assert_eq!(min_required_markers(37), 30);
        assert_eq!(min_required_markers(100), 80);
    }

    #[test]
    fn test_identical_profiles() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let panel = catalog.panel("12").unwrap();
        let query = profile("q", &TWELVE);
        let candidate = profile("c", &TWELVE);

        let result = compute_distance(&catalog, &query, &candidate, panel, CalculationMode::Standard);
        assert!(result.is_eligible);
        assert_eq!(result.distance, 0);
        assert_eq!(result.compared_markers, 12);
        assert_eq!(result.identical_markers, 12);
        assert!((result.percent_identical - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_one_step_difference() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let panel = catalog.panel("12").unwrap();
        let query = profile("q", &TWELVE);
        let candidate = profile("c", &TWELVE).with_marker("DYS19", "15");

        let result = compute_distance(&catalog, &query, &candidate, panel, CalculationMode::Standard);
        assert_eq!(result.distance, 1);
        assert_eq!(result.compared_markers, 12);
        assert_eq!(result.identical_markers, 11);
        assert!((result.percent_identical - 91.666_666).abs() < 0.001);
    }

    #[test]
    fn test_palindrome_counts_once() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let panel = catalog.panel("12").unwrap();
        let query = profile("q", &TWELVE);
        let candidate = profile("c", &TWELVE).with_marker("DYS385", "11-18");

        let standard =
            compute_distance(&catalog, &query, &candidate, panel, CalculationMode::Standard);
        assert_eq!(standard.distance, 2);
        assert_eq!(standard.identical_markers, 11);

        let extended =
            compute_distance(&catalog, &query, &candidate, panel, CalculationMode::Extended);
        assert_eq!(extended.distance, 4);
    }

    #[test]
    fn test_missing_candidate_markers_not_compared() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let panel = catalog.panel("12").unwrap();
        let query = profile("q", &TWELVE);
        // Drop two markers: 10 of 12 compared, exactly at the 80% threshold
        let candidate = profile("c", &TWELVE[2..]);

        let result = compute_distance(&catalog, &query, &candidate, panel, CalculationMode::Standard);
        assert!(result.is_eligible);
        assert_eq!(result.compared_markers, 10);
    }

    #[test]
    fn test_insufficient_coverage_is_ineligible() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let panel = catalog.panel("12").unwrap();
        let query = profile("q", &TWELVE);
        let candidate = profile("c", &TWELVE[..8]).with_marker("DYS393", "15");

        let result = compute_distance(&catalog, &query, &candidate, panel, CalculationMode::Standard);
        assert!(!result.is_eligible);
        assert_eq!(result.distance, 0);
        assert_eq!(result.compared_markers, 8);
        assert!(result.percent_identical.abs() < f64::EPSILON);
    }

    #[test]
    fn test_malformed_query_values_are_inactive() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let panel = catalog.panel("12").unwrap();
        let query = profile("q", &TWELVE)
            .with_marker("DYS385", "11")
            .with_marker("DYS19", "n/a");

        let prepared = PreparedQuery::new(&catalog, &query, panel, CalculationMode::Standard);
        assert_eq!(prepared.active_markers(), 10);
        assert_eq!(prepared.min_required(), 8);
    }

    #[test]
    fn test_empty_query_is_trivially_eligible() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let panel = catalog.panel("12").unwrap();
        let query = Profile::new("q");
        let candidate = profile("c", &TWELVE);

        let result = compute_distance(&catalog, &query, &candidate, panel, CalculationMode::Standard);
        assert!(result.is_eligible);
        assert_eq!(result.compared_markers, 0);
        assert!(result.percent_identical.abs() < f64::EPSILON);
    }

    #[test]
    fn test_compare_markers_breakdown() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let panel = catalog.panel("12").unwrap();
        let query = profile("q", &TWELVE);
        let candidate = profile("c", &TWELVE[1..]).with_marker("DYS390", "26");

        let rows = compare_markers(&catalog, &query, &candidate, panel, CalculationMode::Standard);
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].marker.as_str(), "DYS393");
        assert!(rows[0].candidate_value.is_none());
        assert!(rows[0].difference.is_none());
        assert_eq!(rows[1].difference, Some(2));

        let total: u32 = rows.iter().filter_map(|r| r.difference).sum();
        let result = compute_distance(&catalog, &query, &candidate, panel, CalculationMode::Standard);
        assert_eq!(total, result.distance);
    }
}
