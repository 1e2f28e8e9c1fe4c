//! Marker value normalization.

use serde::Serialize;

use crate::core::marker::Marker;

/// Separators accepted between the components of a multi-copy value
pub const COMPONENT_SEPARATORS: [char; 2] = ['-', ','];

/// A marker value in comparable numeric form
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum MarkerValue {
    /// Repeat count of a simple marker
    Single(i32),
    /// Ordered repeat counts of a multi-copy marker
    Multi(Vec<i32>),
}

impl MarkerValue {
    /// Number of numeric components
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multi(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for MarkerValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(v) => write!(f, "{v}"),
            Self::Multi(values) => {
                let parts: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join("-"))
            }
        }
    }
}

/// Normalize a raw value for `marker`.
///
/// Returns `None` ("no value") for empty or whitespace-only input, non-numeric
/// components, or a multi-copy value whose component count differs from the
/// marker's copy count.
pub fn normalize(marker: &Marker, raw: Option<&str>) -> Option<MarkerValue> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    if marker.is_multi_copy() {
        let components = raw
            .split(COMPONENT_SEPARATORS)
            .map(parse_component)
            .collect::<Option<Vec<i32>>>()?;

        if components.len() != marker.copies {
            return None;
        }
        Some(MarkerValue::Multi(components))
    } else {
        parse_component(raw).map(MarkerValue::Single)
    }
}

/// Repeat counts are unsigned digit strings; signs are rejected
fn parse_component(s: &str) -> Option<i32> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<i32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple() -> Marker {
        Marker::new("DYS393")
    }

    fn palindrome() -> Marker {
        Marker::new("DYS385").with_copies(2)
    }

    #[test]
    fn test_simple_values() {
        assert_eq!(normalize(&simple(), Some("13")), Some(MarkerValue::Single(13)));
        assert_eq!(normalize(&simple(), Some("  13 ")), Some(MarkerValue::Single(13)));
    }

    #[test]
    fn test_missing_values() {
        assert_eq!(normalize(&simple(), None), None);
        assert_eq!(normalize(&simple(), Some("")), None);
        assert_eq!(normalize(&simple(), Some("   ")), None);
    }

    #[test]
    fn test_non_numeric_is_no_value() {
        assert_eq!(normalize(&simple(), Some("abc")), None);
        assert_eq!(normalize(&simple(), Some("13.2")), None);
        assert_eq!(normalize(&palindrome(), Some("11-x")), None);
    }

    #[test]
    fn test_signed_values_are_no_value() {
        assert_eq!(normalize(&simple(), Some("-5")), None);
        assert_eq!(normalize(&simple(), Some("+13")), None);
        assert_eq!(normalize(&palindrome(), Some("11--14")), None);
        assert_eq!(normalize(&palindrome(), Some("11,+14")), None);
    }

    #[test]
    fn test_multi_copy_separators() {
        let expected = Some(MarkerValue::Multi(vec![11, 14]));
        assert_eq!(normalize(&palindrome(), Some("11-14")), expected);
        assert_eq!(normalize(&palindrome(), Some("11,14")), expected);
        assert_eq!(normalize(&palindrome(), Some(" 11 - 14 ")), expected);
    }

    #[test]
    fn test_component_count_mismatch_is_no_value() {
        assert_eq!(normalize(&palindrome(), Some("11")), None);
        assert_eq!(normalize(&palindrome(), Some("11-14-15")), None);
        assert_eq!(normalize(&palindrome(), Some("11--14")), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(MarkerValue::Single(13).to_string(), "13");
        assert_eq!(MarkerValue::Multi(vec![11, 14]).to_string(), "11-14");
    }
}
