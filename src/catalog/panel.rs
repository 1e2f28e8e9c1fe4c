use std::collections::HashSet;

use crate::catalog::store::{CatalogError, MarkerCatalog};
use crate::core::types::MarkerId;

/// An ordered set of markers used as the comparison basis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    name: String,
    markers: Vec<MarkerId>,

    /// Maximum genetic distance used when the caller does not give one
    pub default_max_distance: Option<u32>,
}

impl Panel {
    /// Build a panel, checking that every marker exists in the catalog and appears once
    pub fn from_markers(
        catalog: &MarkerCatalog,
        name: impl Into<String>,
        markers: Vec<MarkerId>,
    ) -> Result<Self, CatalogError> {
        let name = name.into();
        let mut seen = HashSet::with_capacity(markers.len());
        for marker in &markers {
            catalog.require(marker.as_str())?;
            if !seen.insert(marker) {
                return Err(CatalogError::InvalidPanel {
                    name,
                    reason: format!("marker {marker} listed more than once"),
                });
            }
        }

        Ok(Self {
            name,
            markers,
            default_max_distance: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn markers(&self) -> &[MarkerId] {
        &self.markers
    }

    pub fn contains(&self, marker: &str) -> bool {
        self.markers.iter().any(|m| m.as_str() == marker)
    }

    /// Copy of this panel with the given markers removed
    #[must_use]
    pub fn without<S: AsRef<str>>(&self, excluded: &[S]) -> Self {
        let markers = self
            .markers
            .iter()
            .filter(|m| !excluded.iter().any(|e| e.as_ref() == m.as_str()))
            .cloned()
            .collect();

        Self {
            name: self.name.clone(),
            markers,
            default_max_distance: self.default_max_distance,
        }
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_preserves_order() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let panel = catalog.panel("12").unwrap();
        let reduced = panel.without(&["DYS19", "DYS391"]);

        assert_eq!(reduced.len(), 10);
        assert!(!reduced.contains("DYS19"));
        assert_eq!(reduced.markers()[0].as_str(), "DYS393");
        assert_eq!(reduced.markers()[2].as_str(), "DYS385");
        assert_eq!(reduced.name(), "12");
    }

    #[test]
    fn test_duplicate_marker_rejected() {
        let catalog = MarkerCatalog::load_embedded().unwrap();
        let result = catalog.custom_panel(["DYS393", "DYS393"]);
        assert!(matches!(result, Err(CatalogError::InvalidPanel { .. })));
    }
}
