//! Per-marker difference scoring.

use crate::core::types::CalculationMode;
use crate::core::value::MarkerValue;

/// Maximum contribution of one marker in [`CalculationMode::Standard`].
///
/// Any difference of more than two repeats scores as two. For multi-copy markers the cap applies to the summed difference
/// across all components, not to each component.
pub const STANDARD_MODE_STEP_CAP: u32 = 2;

/// Difference between two normalized values of the same marker.
///
/// Returns `None` when the values are not comparable (different component
/// counts); callers treat that as "not compared".
pub fn marker_difference(a: &MarkerValue, b: &MarkerValue, mode: CalculationMode) -> Option<u32> {
    let raw = match (a, b) {
        (MarkerValue::Single(x), MarkerValue::Single(y)) => x.abs_diff(*y),
        (MarkerValue::Multi(xs), MarkerValue::Multi(ys)) if xs.len() == ys.len() => xs
            .iter()
            .zip(ys)
            .fold(0u32, |acc, (x, y)| acc.saturating_add(x.abs_diff(*y))),
        _ => return None,
    };

    Some(match mode {
        CalculationMode::Standard => raw.min(STANDARD_MODE_STEP_CAP),
        CalculationMode::Extended => raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use MarkerValue::{Multi, Single};

    const MODES: [CalculationMode; 2] = [CalculationMode::Standard, CalculationMode::Extended];

    #[test]
    fn test_identity_is_zero() {
        for mode in MODES {
            assert_eq!(marker_difference(&Single(13), &Single(13), mode), Some(0));
            assert_eq!(
                marker_difference(&Multi(vec![11, 14]), &Multi(vec![11, 14]), mode),
                Some(0)
            );
        }
    }

    #[test]
    fn test_simple_marker_symmetric() {
        for mode in MODES {
            for (a, b) in [(10, 13), (13, 10), (24, 25), (7, 30)] {
                assert_eq!(
                    marker_difference(&Single(a), &Single(b), mode),
                    marker_difference(&Single(b), &Single(a), mode)
                );
            }
        }
    }

    #[test]
    fn test_standard_mode_caps_simple_marker() {
        let mode = CalculationMode::Standard;
        assert_eq!(marker_difference(&Single(13), &Single(14), mode), Some(1));
        assert_eq!(marker_difference(&Single(13), &Single(15), mode), Some(2));
        assert_eq!(marker_difference(&Single(13), &Single(19), mode), Some(2));
    }

    #[test]
    fn test_extended_mode_uncapped() {
        let mode = CalculationMode::Extended;
        assert_eq!(marker_difference(&Single(13), &Single(19), mode), Some(6));
        assert_eq!(
            marker_difference(&Multi(vec![11, 14]), &Multi(vec![12, 18]), mode),
            Some(5)
        );
    }

    #[test]
    fn test_multi_copy_cap_applies_to_sum() {
        let mode = CalculationMode::Standard;
        // |11-11| + |14-18| = 4, capped to 2
        assert_eq!(
            marker_difference(&Multi(vec![11, 14]), &Multi(vec![11, 18]), mode),
            Some(2)
        );
        // 1 + 1 = 2 even though each component differs by only 1
        assert_eq!(
            marker_difference(&Multi(vec![11, 14]), &Multi(vec![12, 15]), mode),
            Some(2)
        );
        assert_eq!(
            marker_difference(&Multi(vec![11, 14]), &Multi(vec![11, 15]), mode),
            Some(1)
        );
    }

    #[test]
    fn test_mismatched_shapes_not_comparable() {
        let mode = CalculationMode::Standard;
        assert_eq!(marker_difference(&Single(11), &Multi(vec![11, 14]), mode), None);
        assert_eq!(
            marker_difference(&Multi(vec![11, 14]), &Multi(vec![11, 14, 15]), mode),
            None
        );
    }

    #[test]
    fn test_standard_mode_bounds() {
        for a in 5..=40 {
            for b in 5..=40 {
                let diff = marker_difference(&Single(a), &Single(b), CalculationMode::Standard)
                    .unwrap();
                assert!(diff <= STANDARD_MODE_STEP_CAP);
            }
        }
    }
}
