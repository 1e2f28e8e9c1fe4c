use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::catalog::panel::Panel;
use crate::core::marker::Marker;
use crate::core::types::MarkerId;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Duplicate marker in catalog: {0}")]
    DuplicateMarker(String),

    #[error("Unknown marker: {0}")]
    UnknownMarker(String),

    #[error("Invalid marker '{name}': {reason}")]
    InvalidMarker { name: String, reason: String },

    #[error("Unknown panel: {0}")]
    UnknownPanel(String),

    #[error("Invalid panel '{name}': {reason}")]
    InvalidPanel { name: String, reason: String },
}

/// Catalog version for compatibility checking
pub const CATALOG_VERSION: &str = "1.0.0";

/// Serializable panel definition: either a prefix of the canonical order or an explicit list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelDefinition {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markers: Option<Vec<String>>,

    /// Maximum genetic distance used when the caller does not give one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_distance: Option<u32>,
}

/// Serializable catalog format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogData {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub markers: Vec<Marker>,
    #[serde(default)]
    pub panels: Vec<PanelDefinition>,
}

/// The marker catalog: canonical marker ordering, panels and mutation weights.
///
/// Built once and shared read-only; pass it by reference to the matching functions.
#[derive(Debug, Clone)]
pub struct MarkerCatalog {
    /// All markers in canonical order
    markers: Vec<Marker>,

    /// Index: marker name -> ordinal
    name_to_index: HashMap<MarkerId, usize>,

    /// Resolved panels in definition order
    panels: Vec<Panel>,
}

impl MarkerCatalog {
    /// Load the embedded default catalog
    pub fn load_embedded() -> Result<Self, CatalogError> {
        // Validated at compile time via build.rs
        const EMBEDDED_CATALOG: &str = include_str!("../../catalogs/ystr_markers.json");
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// Load catalog from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse catalog from JSON string
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let data: CatalogData = serde_json::from_str(json)?;

        // Version check (warn but don't fail)
        if data.version != CATALOG_VERSION {
            warn!(
                "Catalog version mismatch (expected {}, found {})",
                CATALOG_VERSION, data.version
            );
        }

        Self::from_parts(data.markers, &data.panels)
    }

    /// Build a catalog from markers in canonical order and panel definitions
    pub fn from_parts(
        markers: Vec<Marker>,
        panels: &[PanelDefinition],
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self {
            markers: Vec::with_capacity(markers.len()),
            name_to_index: HashMap::with_capacity(markers.len()),
            panels: Vec::with_capacity(panels.len()),
        };

        for mut marker in markers {
            if catalog.name_to_index.contains_key(&marker.name) {
                return Err(CatalogError::DuplicateMarker(marker.name.0));
            }
            if marker.copies == 0 {
                return Err(CatalogError::InvalidMarker {
                    name: marker.name.0,
                    reason: "copy count must be at least 1".to_string(),
                });
            }
            marker.ordinal = catalog.markers.len();
            marker.panels.clear();
            catalog.name_to_index.insert(marker.name.clone(), marker.ordinal);
            catalog.markers.push(marker);
        }

        for definition in panels {
            let panel = catalog.resolve_panel(definition)?;
            for id in panel.markers() {
                if let Some(&idx) = catalog.name_to_index.get(id) {
                    catalog.markers[idx].panels.push(panel.name().to_string());
                }
            }
            catalog.panels.push(panel);
        }

        Ok(catalog)
    }

    fn resolve_panel(&self, definition: &PanelDefinition) -> Result<Panel, CatalogError> {
        let invalid = |reason: &str| CatalogError::InvalidPanel {
            name: definition.name.clone(),
            reason: reason.to_string(),
        };

        let markers: Vec<MarkerId> = match (&definition.prefix, &definition.markers) {
            (Some(prefix), None) => {
                if *prefix == 0 || *prefix > self.markers.len() {
                    return Err(invalid("prefix out of range"));
                }
                self.markers[..*prefix]
                    .iter()
                    .map(|m| m.name.clone())
                    .collect()
            }
            (None, Some(names)) => names.iter().map(MarkerId::new).collect(),
            _ => return Err(invalid("expected exactly one of 'prefix' or 'markers'")),
        };

        let mut panel = Panel::from_markers(self, &definition.name, markers)?;
        panel.default_max_distance = definition.default_max_distance;
        Ok(panel)
    }

    /// Get a marker by name
    pub fn get(&self, name: &str) -> Option<&Marker> {
        self.name_to_index
            .get(name)
            .map(|&idx| &self.markers[idx])
    }

    /// Get a marker by name, failing for names outside the catalog
    pub fn require(&self, name: &str) -> Result<&Marker, CatalogError> {
        self.get(name)
            .ok_or_else(|| CatalogError::UnknownMarker(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All markers in canonical order
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Look up a predefined panel by name (e.g. `"37"` or `"GP"`)
    pub fn panel(&self, name: &str) -> Result<&Panel, CatalogError> {
        self.panels
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| CatalogError::UnknownPanel(name.to_string()))
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// Build a custom panel from an arbitrary marker subset
    pub fn custom_panel<I, S>(&self, markers: I) -> Result<Panel, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids = markers
            .into_iter()
            .map(|s| MarkerId::new(s.as_ref().trim()))
            .collect();
        Panel::from_markers(self, "custom", ids)
    }

    /// Names of the predefined panels a marker belongs to
    pub fn panel_memberships(&self, name: &str) -> Option<&[String]> {
        self.get(name).map(|m| m.panels.as_slice())
    }

    /// Export catalog to JSON
    pub fn to_json(&self) -> Result<String, CatalogError> {
        let panels = self
            .panels
            .iter()
            .map(|p| PanelDefinition {
                name: p.name().to_string(),
                prefix: None,
                markers: Some(p.markers().iter().map(|m| m.0.clone()).collect()),
                default_max_distance: p.default_max_distance,
            })
            .collect();

        let data = CatalogData {
            version: CATALOG_VERSION.to_string(),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
            markers: self.markers.clone(),
            panels,
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Number of markers in catalog
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Check if catalog is empty
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
