//! Ordering markers from most stable to most volatile.

use std::cmp::Ordering;

use serde::Serialize;

use crate::catalog::store::MarkerCatalog;
use crate::core::types::MarkerId;

/// Coarse mutation speed bucket derived from a marker's mutation rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MutationCategory {
    VerySlow,
    Slow,
    Medium,
    Fast,
    VeryFast,
    Unknown,
}

impl MutationCategory {
    #[must_use]
    pub fn from_rank(rank: Option<u32>) -> Self {
        match rank {
            None => Self::Unknown,
            Some(r) if r <= 20 => Self::VerySlow,
            Some(r) if r <= 40 => Self::Slow,
            Some(r) if r <= 70 => Self::Medium,
            Some(r) if r <= 90 => Self::Fast,
            Some(_) => Self::VeryFast,
        }
    }
}

impl std::fmt::Display for MutationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::VerySlow => "very-slow",
            Self::Slow => "slow",
            Self::Medium => "medium",
            Self::Fast => "fast",
            Self::VeryFast => "very-fast",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Order markers by mutation weight ascending, ties broken by catalog ordinal.
///
/// Names missing from the catalog go last, ordered by name. The result is
/// deterministic for a given input set regardless of input order.
pub fn order_by_mutation_rate<S: AsRef<str>>(catalog: &MarkerCatalog, markers: &[S]) -> Vec<MarkerId> {
    let mut keyed: Vec<(Option<(f64, usize)>, MarkerId)> = markers
        .iter()
        .map(|name| {
            let name = name.as_ref();
            let key = catalog
                .get(name)
                .map(|m| (m.mutation_weight(), m.ordinal));
            (key, MarkerId::new(name))
        })
        .collect();

    keyed.sort_by(|(ka, na), (kb, nb)| match (ka, kb) {
        (Some((wa, oa)), Some((wb, ob))) => wa.total_cmp(wb).then(oa.cmp(ob)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => na.cmp(nb),
    });
    keyed.dedup_by(|a, b| a.1 == b.1);

    keyed.into_iter().map(|(_, id)| id).collect()
}
