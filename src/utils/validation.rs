//! Validation of user-supplied query haplotypes.

use std::collections::HashSet;
use std::fmt;

use crate::catalog::store::MarkerCatalog;
use crate::core::profile::Profile;
use crate::core::value::{normalize, COMPONENT_SEPARATORS};

/// Maximum number of marker assignments accepted in one query
pub const MAX_QUERY_MARKERS: usize = 512;

/// Maximum length of a single raw marker value
pub const MAX_VALUE_LENGTH: usize = 64;

/// Check that a raw value is a repeat count or a separated list of repeat counts.
///
/// # Examples
///
/// ```
/// use ystr_matcher::utils::validation::is_valid_marker_value;
///
/// assert!(is_valid_marker_value("13"));
/// assert!(is_valid_marker_value("11-14"));
/// assert!(is_valid_marker_value("9,10,15,16"));
/// assert!(!is_valid_marker_value("11-"));
/// assert!(!is_valid_marker_value("13.2"));
/// ```
#[must_use]
pub fn is_valid_marker_value(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty()
        && s.len() <= MAX_VALUE_LENGTH
        && s.split(COMPONENT_SEPARATORS).all(|c| {
            let c = c.trim();
            !c.is_empty() && c.chars().all(|ch| ch.is_ascii_digit())
        })
}

/// Errors from parsing `MARKER=VALUE` assignment lists
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No marker assignments given")]
    Empty,
    #[error("Malformed assignment '{0}': expected MARKER=VALUE")]
    MalformedAssignment(String),
    #[error("Marker '{0}' assigned more than once")]
    DuplicateMarker(String),
    #[error("Too many markers: maximum is {MAX_QUERY_MARKERS}")]
    TooManyMarkers,
}

/// Parse `"DYS393=13,DYS390=24,DYS385=11,14"` into ordered pairs.
///
/// Assignments are separated by commas or semicolons. A comma-separated
/// fragment without `=` continues the previous value, so multi-copy values
/// may use either `-` or `,` between copies.
///
/// # Errors
///
/// Returns a [`ValidationError`] for empty input, fragments that cannot be
/// attached to an assignment, repeated markers, or too many assignments.
pub fn parse_marker_assignments(input: &str) -> Result<Vec<(String, String)>, ValidationError> {
    let mut pairs: Vec<(String, String)> = Vec::new();

    for group in input.split(';') {
        let mut continues_previous = false;
        for fragment in group.split(',') {
            let fragment = fragment.trim();
            if fragment.is_empty() {
                continue;
            }

            if let Some((marker, value)) = fragment.split_once('=') {
                let marker = marker.trim();
                if marker.is_empty() {
                    return Err(ValidationError::MalformedAssignment(fragment.to_string()));
                }
                if pairs.iter().any(|(m, _)| m == marker) {
                    return Err(ValidationError::DuplicateMarker(marker.to_string()));
                }
                if pairs.len() >= MAX_QUERY_MARKERS {
                    return Err(ValidationError::TooManyMarkers);
                }
                pairs.push((marker.to_string(), value.trim().to_string()));
                continues_previous = true;
            } else {
                match pairs.last_mut() {
                    Some((_, value)) if continues_previous => {
                        value.push(',');
                        value.push_str(fragment);
                    }
                    _ => return Err(ValidationError::MalformedAssignment(fragment.to_string())),
                }
            }
        }
    }

    if pairs.is_empty() {
        return Err(ValidationError::Empty);
    }
    Ok(pairs)
}

/// A problem with one query marker; the marker is ignored during matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryIssue {
    /// Not in the catalog and not a lettered copy of a multi-copy marker
    UnknownMarker(String),
    /// Present but not normalizable for the marker
    MalformedValue { marker: String, value: String },
}

impl fmt::Display for QueryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMarker(name) => write!(f, "unknown marker '{name}' ignored"),
            Self::MalformedValue { marker, value } => {
                write!(f, "value '{value}' for {marker} is not usable and was ignored")
            }
        }
    }
}

/// List the query markers that will not take part in matching.
///
/// Blank values are treated as absent and never reported.
pub fn validate_query(catalog: &MarkerCatalog, query: &Profile) -> Vec<QueryIssue> {
    let mut issues = Vec::new();
    let mut split_bases = HashSet::new();

    for (name, value) in &query.markers {
        if value.trim().is_empty() {
            continue;
        }

        if let Some(marker) = catalog.get(name) {
            if normalize(marker, Some(value)).is_none() {
                issues.push(QueryIssue::MalformedValue {
                    marker: name.clone(),
                    value: value.clone(),
                });
            }
            continue;
        }

        match split_copy_base(catalog, name) {
            Some(base) if is_valid_marker_value(value) && !value.contains(COMPONENT_SEPARATORS) => {
                split_bases.insert(base);
            }
            Some(_) => issues.push(QueryIssue::MalformedValue {
                marker: name.clone(),
                value: value.clone(),
            }),
            None => issues.push(QueryIssue::UnknownMarker(name.clone())),
        }
    }

    // Lettered copies only count when the full set is present
    for base in split_bases {
        if let Some(marker) = catalog.get(base) {
            if query.markers.get(base).is_none() && query.value(marker).is_none() {
                issues.push(QueryIssue::MalformedValue {
                    marker: base.to_string(),
                    value: "incomplete copy set".to_string(),
                });
            }
        }
    }

    issues
}

/// Base marker name for a lettered copy key such as `DYS385b`
fn split_copy_base<'a>(catalog: &MarkerCatalog, name: &'a str) -> Option<&'a str> {
    let suffix = name.chars().last()?;
    if !('a'..='f').contains(&suffix) {
        return None;
    }
    let base = &name[..name.len() - 1];
    catalog
        .get(base)
        .filter(|m| m.is_multi_copy())
        .map(|_| base)
}
