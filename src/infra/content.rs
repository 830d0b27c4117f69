//! File-backed content tree.
//!
//! ```toml
//! [[nodes]]
//! id = 1001
//! name = "Home"
//! path = "/"
//! template = "home"
//!
//! [nodes.properties]
//! headline = "Welcome"
//! ```

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    path::Path,
};

use serde::Deserialize;
use tracing::info;
use url::Url;

use crate::domain::{
    content::{ContentNode, normalize_path},
    error::DomainError,
};

use super::error::{ContentError, InfraError};

#[derive(Debug, Deserialize)]
struct RawContentFile {
    #[serde(default)]
    nodes: Vec<RawContentNode>,
}

#[derive(Debug, Deserialize)]
struct RawContentNode {
    id: i64,
    name: String,
    path: String,
    template: String,
    #[serde(default)]
    properties: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
pub struct ContentTree {
    by_path: HashMap<String, ContentNode>,
}

impl ContentTree {
    pub async fn load(path: &Path, base_url: &Url) -> Result<Self, InfraError> {
        let source = tokio::fs::read_to_string(path).await?;
        let tree = Self::from_toml_str(&source, base_url)
            .map_err(|source| InfraError::content(path.display().to_string(), source))?;
        info!(
            target: "veneer::content",
            path = %path.display(),
            nodes = tree.len(),
            "content tree loaded"
        );
        Ok(tree)
    }

    pub fn from_toml_str(source: &str, base_url: &Url) -> Result<Self, ContentError> {
        let raw: RawContentFile = toml::from_str(source)?;
        let nodes = raw
            .nodes
            .into_iter()
            .map(|node| build_node(node, base_url))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_nodes(nodes)?)
    }

    pub fn from_nodes(nodes: Vec<ContentNode>) -> Result<Self, DomainError> {
        let mut ids = HashSet::new();
        let mut by_path = HashMap::with_capacity(nodes.len());

        for node in nodes {
            if !ids.insert(node.id) {
                return Err(DomainError::validation(format!(
                    "duplicate content id {}",
                    node.id
                )));
            }
            if by_path.contains_key(&node.path) {
                return Err(DomainError::validation(format!(
                    "duplicate content path `{}`",
                    node.path
                )));
            }
            by_path.insert(node.path.clone(), node);
        }

        Ok(Self { by_path })
    }

    pub fn resolve(&self, path: &str) -> Option<&ContentNode> {
        self.by_path.get(&normalize_path(path))
    }

    /// Every node, ordered by path.
    pub fn nodes(&self) -> Vec<&ContentNode> {
        let mut nodes: Vec<_> = self.by_path.values().collect();
        nodes.sort_by(|a, b| a.path.cmp(&b.path));
        nodes
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}

fn build_node(raw: RawContentNode, base_url: &Url) -> Result<ContentNode, DomainError> {
    let name = raw.name.trim().to_string();
    if name.is_empty() {
        return Err(DomainError::validation(format!(
            "content {} has an empty name",
            raw.id
        )));
    }

    let template = raw.template.trim().to_string();
    if template.is_empty() {
        return Err(DomainError::validation(format!(
            "content {} has an empty template",
            raw.id
        )));
    }

    let path = normalize_path(&raw.path);
    let url = base_url
        .join(path.trim_start_matches('/'))
        .map_err(|err| DomainError::validation(format!("content {} url: {err}", raw.id)))?;

    Ok(ContentNode {
        id: raw.id,
        name,
        path,
        template,
        url,
        properties: raw.properties,
    })
}
