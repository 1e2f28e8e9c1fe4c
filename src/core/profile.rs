use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::marker::Marker;
use crate::core::types::ProfileId;
use crate::core::value::{normalize, MarkerValue};

/// Suffixes used when a multi-copy marker is stored as one key per copy
const COPY_SUFFIXES: [char; 6] = ['a', 'b', 'c', 'd', 'e', 'f'];

/// A haplotype record: identity, metadata and raw marker values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Stable identifier (kit number)
    pub id: ProfileId,

    #[serde(default, alias = "name", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Country or other origin description
    #[serde(default, alias = "country", skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,

    #[serde(default, alias = "haplogroup", skip_serializing_if = "Option::is_none")]
    pub haplogroup_label: Option<String>,

    /// Raw marker values by marker name
    #[serde(default)]
    pub markers: BTreeMap<String, String>,

    /// Set for queries built with [`Profile::query`]; their id is a placeholder
    #[serde(skip)]
    ad_hoc: bool,
}

impl Profile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: ProfileId::new(id),
            display_name: None,
            origin: None,
            haplogroup_label: None,
            markers: BTreeMap::new(),
            ad_hoc: false,
        }
    }

    /// Build an ad-hoc query profile that is never persisted
    pub fn query<K, V>(markers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut profile = Self::new("query");
        profile.ad_hoc = true;
        for (marker, value) in markers {
            profile.markers.insert(marker.into(), value.into());
        }
        profile
    }

    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>, value: impl Into<String>) -> Self {
        self.markers.insert(marker.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_haplogroup(mut self, label: impl Into<String>) -> Self {
        self.haplogroup_label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// True for ad-hoc queries, which have no stored identity
    pub fn is_ad_hoc(&self) -> bool {
        self.ad_hoc
    }

    /// Whether `other` is this profile's own stored record
    pub fn is_same_record(&self, other: &Profile) -> bool {
        !self.ad_hoc && !other.ad_hoc && self.id == other.id
    }

    /// Haplogroup label, if present and non-blank
    pub fn haplogroup(&self) -> Option<&str> {
        self.haplogroup_label
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Raw value for a marker; blank strings count as missing.
    ///
    /// Multi-copy markers stored as lettered keys (`DYS385a`, `DYS385b`) are
    /// joined into one value, but only when every copy is present.
    pub fn raw_value(&self, marker: &Marker) -> Option<Cow<'_, str>> {
        let name = marker.name.as_str();
        if let Some(value) = self.markers.get(name).filter(|v| !v.trim().is_empty()) {
            return Some(Cow::Borrowed(value.as_str()));
        }

        if !marker.is_multi_copy() || marker.copies > COPY_SUFFIXES.len() {
            return None;
        }

        let mut parts = Vec::with_capacity(marker.copies);
        for suffix in COPY_SUFFIXES.iter().take(marker.copies) {
            let value = self
                .markers
                .get(&format!("{name}{suffix}"))
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())?;
            parts.push(value);
        }
        Some(Cow::Owned(parts.join("-")))
    }

    /// Normalized value for a marker, or `None` if missing or malformed
    pub fn value(&self, marker: &Marker) -> Option<MarkerValue> {
        normalize(marker, self.raw_value(marker).as_deref())
    }
}
