use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeServiceError {
    #[error("Tree service request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Tree service returned HTTP {status} for '{label}'")]
    Status { status: u16, label: String },

    #[error("Failed to read haplogroup tree: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse haplogroup tree: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Haplogroup tree has a cycle through '{0}'")]
    Cycle(String),
}

/// Answers ancestry questions about haplogroup labels.
///
/// Implementations must be idempotent; the engine may retry a lookup.
pub trait TreeService: Send + Sync {
    /// True if `candidate` equals `ancestor` or lies below it in the tree
    fn is_descendant_or_equal(&self, candidate: &str, ancestor: &str)
        -> Result<bool, TreeServiceError>;
}

/// Serializable tree format: child label -> parent label
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeData {
    pub parents: HashMap<String, String>,
}

/// A haplogroup tree held in memory as a child-to-parent map
#[derive(Debug, Clone, Default)]
pub struct StaticTree {
    parents: HashMap<String, String>,
}

impl StaticTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a tree from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, TreeServiceError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a tree from JSON: `{"parents": {"child": "parent", ...}}`
    pub fn from_json(json: &str) -> Result<Self, TreeServiceError> {
        let data: TreeData = serde_json::from_str(json)?;
        Ok(Self {
            parents: data.parents,
        })
    }

    #[must_use]
    pub fn with_edge(mut self, child: impl Into<String>, parent: impl Into<String>) -> Self {
        self.parents.insert(child.into(), parent.into());
        self
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

impl TreeService for StaticTree {
    fn is_descendant_or_equal(
        &self,
        candidate: &str,
        ancestor: &str,
    ) -> Result<bool, TreeServiceError> {
        let mut current = candidate;
        // A valid path visits each edge at most once
        for _ in 0..=self.parents.len() {
            if current == ancestor {
                return Ok(true);
            }
            match self.parents.get(current) {
                Some(parent) => current = parent,
                None => return Ok(false),
            }
        }
        Err(TreeServiceError::Cycle(candidate.to_string()))
    }
}

/// Default request timeout for remote lookups
pub const DEFAULT_TREE_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection settings for [`HttpTreeService`]
#[derive(Debug, Clone)]
pub struct TreeServiceConfig {
    /// Base URL, e.g. `http://localhost:9003`
    pub base_url: String,
    pub timeout: Duration,
}

impl TreeServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TREE_TIMEOUT,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubcladeRequest<'a> {
    haplogroup: &'a str,
    parent_haplogroup: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubcladeResponse {
    is_subclade: bool,
}

/// Remote tree service reached over HTTP (`POST /api/check-subclade`)
pub struct HttpTreeService {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpTreeService {
    pub fn new(config: &TreeServiceConfig) -> Result<Self, TreeServiceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;
        let endpoint = format!("{}/api/check-subclade", config.base_url.trim_end_matches('/'));
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl TreeService for HttpTreeService {
    fn is_descendant_or_equal(
        &self,
        candidate: &str,
        ancestor: &str,
    ) -> Result<bool, TreeServiceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&SubcladeRequest {
                haplogroup: candidate,
                parent_haplogroup: ancestor,
            })
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(TreeServiceError::Status {
                status: status.as_u16(),
                label: candidate.to_string(),
            });
        }

        let body: SubcladeResponse = response.json()?;
        Ok(body.is_subclade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> StaticTree {
        StaticTree::new()
            .with_edge("R-M269", "R-M343")
            .with_edge("R-L21", "R-M269")
            .with_edge("R-U106", "R-M269")
            .with_edge("R-DF13", "R-L21")
    }

    #[test]
    fn test_descendants() {
        let t = tree();
        assert!(t.is_descendant_or_equal("R-DF13", "R-M269").unwrap());
        assert!(t.is_descendant_or_equal("R-L21", "R-L21").unwrap());
        assert!(!t.is_descendant_or_equal("R-U106", "R-L21").unwrap());
        assert!(!t.is_descendant_or_equal("R-M269", "R-L21").unwrap());
    }

    #[test]
    fn test_unknown_label_matches_only_itself() {
        let t = tree();
        assert!(!t.is_descendant_or_equal("I-M253", "R-M269").unwrap());
        assert!(t.is_descendant_or_equal("I-M253", "I-M253").unwrap());
    }

    #[test]
    fn test_cycle_detected() {
        let t = StaticTree::new().with_edge("A", "B").with_edge("B", "A");
        assert!(matches!(
            t.is_descendant_or_equal("A", "C"),
            Err(TreeServiceError::Cycle(_))
        ));
    }

    #[test]
    fn test_from_json() {
        let t = StaticTree::from_json(r#"{"parents": {"J-M172": "J", "J-L26": "J-M172"}}"#).unwrap();
        assert_eq!(t.len(), 2);
        assert!(t.is_descendant_or_equal("J-L26", "J").unwrap());
    }

    #[test]
    fn test_http_endpoint() {
        let service = HttpTreeService::new(&TreeServiceConfig::new("http://localhost:9003/")).unwrap();
        assert_eq!(service.endpoint(), "http://localhost:9003/api/check-subclade");
    }
}
